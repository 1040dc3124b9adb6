// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! Gas-cost number abstraction and the final step of turning a raw
//! `GasLeft` into gas used / return data, consuming the frame's `Ext`.

use ethereum_types::U256;
use std::{cmp, fmt, ops};
use vm::{Error, Ext, GasLeft, ReturnData, Result};

/// A numeric type usable as a gas counter.
///
/// Two implementations are provided: `u64`, the fast path used for the
/// overwhelming majority of transactions whose gas never approaches
/// 2^64, and `U256`, the fallback used whenever a caller supplies more
/// gas than that (or explicitly asks for the slow path). Both behave
/// identically with respect to wrapping/overflow detection; only their
/// width differs.
pub trait CostType:
    Sized
    + Copy
    + Clone
    + fmt::Debug
    + ops::Add<Output = Self>
    + ops::Sub<Output = Self>
    + ops::Mul<Output = Self>
    + ops::Div<Output = Self>
    + ops::Rem<Output = Self>
    + cmp::Ord
    + Send
{
    /// Converts this cost into `U256`.
    fn as_u256(&self) -> U256;
    /// Tries to fit `U256` into this `CostType`. Fails if the value is
    /// too large for the concrete width (only possible for `u64`).
    fn from_u256(val: U256) -> Result<Self>;
    /// Converts a plain `usize` gas constant into this cost type.
    fn from(val: usize) -> Self;
    /// Truncating conversion to `usize`, for values already known to
    /// be small (opcode counters, word counts).
    fn as_usize(&self) -> usize;
    /// Addition with overflow detection.
    fn overflow_add(self, other: Self) -> (Self, bool);
    /// Subtraction with underflow detection.
    fn overflow_sub(self, other: Self) -> (Self, bool);
    /// Multiplication with overflow detection.
    fn overflow_mul(self, other: Self) -> (Self, bool);
    /// `(self * other) / div`, using an intermediate wide enough that
    /// the multiplication itself cannot wrap silently.
    fn overflow_mul_div(self, other: Self, div: Self) -> (Self, bool);
}

impl CostType for U256 {
    fn as_u256(&self) -> U256 {
        *self
    }

    fn from_u256(val: U256) -> Result<Self> {
        Ok(val)
    }

    fn from(val: usize) -> Self {
        U256::from(val)
    }

    fn as_usize(&self) -> usize {
        self.low_u64() as usize
    }

    fn overflow_add(self, other: Self) -> (Self, bool) {
        self.overflowing_add(other)
    }

    fn overflow_sub(self, other: Self) -> (Self, bool) {
        self.overflowing_sub(other)
    }

    fn overflow_mul(self, other: Self) -> (Self, bool) {
        self.overflowing_mul(other)
    }

    fn overflow_mul_div(self, other: Self, div: Self) -> (Self, bool) {
        let (c, o) = self.overflowing_mul(other);
        (c / div, o)
    }
}

impl CostType for u64 {
    fn as_u256(&self) -> U256 {
        U256::from(*self)
    }

    fn from_u256(val: U256) -> Result<Self> {
        if val <= U256::from(u64::max_value()) {
            Ok(val.low_u64())
        } else {
            Err(Error::OutOfGas)
        }
    }

    fn from(val: usize) -> Self {
        val as u64
    }

    fn as_usize(&self) -> usize {
        *self as usize
    }

    fn overflow_add(self, other: Self) -> (Self, bool) {
        self.overflowing_add(other)
    }

    fn overflow_sub(self, other: Self) -> (Self, bool) {
        self.overflowing_sub(other)
    }

    fn overflow_mul(self, other: Self) -> (Self, bool) {
        self.overflowing_mul(other)
    }

    fn overflow_mul_div(self, other: Self, div: Self) -> (Self, bool) {
        let x = self as u128 * other as u128;
        let c = (x / div as u128) as u64;
        (c, x > u128::from(u64::max_value()))
    }
}

/// What a frame produced once fully finalized: gas remaining, whether
/// its effects should apply (false only on explicit REVERT), and any
/// output bytes.
#[derive(Debug)]
pub struct FinalizationResult {
    /// Gas left after the call.
    pub gas_left: U256,
    /// Whether the state changes should be applied.
    pub apply_state: bool,
    /// Return data buffer.
    pub return_data: ReturnData,
}

/// Finalize a raw interpreter step result against the frame's `Ext`,
/// consuming it. This is the one place `Ext::ret` is called, so a
/// frame's CREATE/SELFDESTRUCT-time bookkeeping runs exactly once.
pub trait Finalize {
    /// Consume the externalities, returning a final result.
    fn finalize<E: Ext>(self, ext: E) -> Result<FinalizationResult>;
}

impl Finalize for Result<GasLeft> {
    fn finalize<E: Ext>(self, ext: E) -> Result<FinalizationResult> {
        match self {
            Ok(GasLeft::Known(gas_left)) => Ok(FinalizationResult {
                gas_left,
                apply_state: true,
                return_data: ReturnData::empty(),
            }),
            Ok(GasLeft::NeedsReturn {
                gas_left,
                data,
                apply_state,
            }) => {
                let gas_left = ext.ret(&gas_left, &data, apply_state)?;
                Ok(FinalizationResult {
                    gas_left,
                    apply_state,
                    return_data: data,
                })
            }
            Err(err) => Err(err),
        }
    }
}
