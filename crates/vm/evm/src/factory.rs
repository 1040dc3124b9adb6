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

//! Constructs a fresh `Interpreter` for one frame, picking the
//! narrowest gas-counter width (`u64` vs `U256`) that can hold the
//! frame's gas allowance without overflow risk.

use std::sync::Arc;

use ethereum_types::U256;
use vm::{ActionParams, Exec, Schedule};

use interpreter::{Interpreter, SharedCache};
use vmtype::VMType;

/// Number of bits used by `u64`; gas amounts requiring more than this
/// many bits fall back to the `U256`-backed interpreter instantiation.
const U64_MAX_SAFE_GAS_BITS: usize = 63;

/// Builds `Interpreter` instances, reusing one `SharedCache` of
/// jump-destination analyses across every frame constructed from it.
#[derive(Default)]
pub struct Factory {
    evm_cache: Arc<SharedCache>,
}

impl Factory {
    /// Construct a factory backed by a fresh, empty `SharedCache`.
    pub fn new() -> Self {
        Factory {
            evm_cache: Arc::new(SharedCache::default()),
        }
    }

    /// Create a VM instance for the given parameters, picking the
    /// implementation (currently only `VMType::Interpreter`, the Rust
    /// EVM) and gas counter width.
    pub fn create(&self, params: ActionParams, schedule: &Schedule, depth: usize) -> Box<dyn Exec> {
        match VMType::Interpreter {
            VMType::Interpreter => {
                if Self::can_fit_in_u64(params.gas) {
                    Box::new(Interpreter::<u64>::new(
                        params,
                        self.evm_cache.clone(),
                        schedule,
                        depth,
                    ))
                } else {
                    Box::new(Interpreter::<U256>::new(
                        params,
                        self.evm_cache.clone(),
                        schedule,
                        depth,
                    ))
                }
            }
        }
    }

    fn can_fit_in_u64(gas: U256) -> bool {
        gas.bits() <= U64_MAX_SAFE_GAS_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_gas_uses_u64_path() {
        assert!(Factory::can_fit_in_u64(U256::from(30_000_000u64)));
    }

    #[test]
    fn huge_gas_falls_back_to_u256() {
        assert!(!Factory::can_fit_in_u64(U256::MAX));
    }
}
