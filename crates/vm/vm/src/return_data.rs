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

//! Output of a message call or contract creation.

use ethereum_types::{Address, U256};
use std::ops::Deref;

/// Output data for a call/create, sliced out of a frame's memory at
/// halt/revert time. Cheaply clonable (backed by an `Rc`-free owned
/// `Vec`, since frames never outlive the orchestrator loop that reads
/// this back).
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ReturnData {
    mem: Vec<u8>,
    offset: usize,
    size: usize,
}

impl ReturnData {
    /// Create an empty `ReturnData`.
    pub fn empty() -> Self {
        ReturnData {
            mem: Vec::new(),
            offset: 0,
            size: 0,
        }
    }

    /// Create `ReturnData` with a backing buffer and a window into it.
    pub fn new(mem: Vec<u8>, offset: usize, size: usize) -> Self {
        ReturnData { mem, offset, size }
    }
}

impl Deref for ReturnData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.mem[self.offset..self.offset + self.size]
    }
}

/// Gas Left: either it is a known value, or it needs to be computed by
/// processing a return instruction.
#[derive(Debug, Clone)]
pub enum GasLeft {
    /// Known gas left.
    Known(U256),
    /// Return or Revert instruction must be processed.
    NeedsReturn {
        /// Amount of gas left.
        gas_left: U256,
        /// Return data.
        data: ReturnData,
        /// Whether to apply the state changes.
        apply_state: bool,
    },
}

/// Result of externalities a message call.
#[derive(Debug)]
pub enum MessageCallResult {
    /// Successful execution.
    Success(U256, ReturnData),
    /// Call reverted. Includes gas left and output data.
    Reverted(U256, ReturnData),
    /// Call failed before a child frame could even be spawned
    /// (insufficient balance, depth limit).
    Failed,
}

/// Result of externalities a create call.
#[derive(Debug)]
pub enum ContractCreateResult {
    /// Returned when the contract was successfully created with the
    /// given address. Address is the address of the newly created
    /// contract, and gas left is the amount of gas left.
    Created(Address, U256),
    /// Returned when contract creation failed.
    /// Reverted state includes VM state up to the point of revert.
    Reverted(U256, ReturnData),
    /// Returned when contract creation failed before a child frame
    /// could even be spawned (balance/depth/address-collision check).
    Failed,
}
