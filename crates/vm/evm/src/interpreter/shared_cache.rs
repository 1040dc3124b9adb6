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

//! LRU cache of a contract's valid jump/subroutine destinations, keyed
//! by code hash and shared (via `Arc`) by every `Interpreter` running
//! that code.

use bit_set::BitSet;
use ethereum_types::H256;
use hash::KECCAK_EMPTY;
use lru::LruCache;
use parking_lot::Mutex;
use std::{num::NonZeroUsize, sync::Arc};

use instructions::{self, Instruction};

/// Default number of distinct code hashes kept in the shared cache.
const DEFAULT_CACHE_SIZE: usize = 4096;

/// `(jump destinations, subroutine entry points)` for one piece of code.
type Destinations = (Arc<BitSet>, Arc<BitSet>);

/// Scan `code`, returning two bitsets of byte offsets: valid JUMPDEST
/// targets and valid BEGINSUB targets (EIP-2315). A byte is eligible
/// for either only if it is not inside the immediate-data region of a
/// preceding PUSH1..PUSH32.
fn calculate_jump_and_sub_destinations(code: &[u8]) -> Destinations {
    let mut jump_dests = BitSet::with_capacity(code.len());
    let mut sub_entry_points = BitSet::with_capacity(code.len());
    let mut position = 0;

    while position < code.len() {
        let instruction = Instruction::from_u8(code[position]);

        if let Some(instruction) = instruction {
            match instruction {
                instructions::JUMPDEST => {
                    jump_dests.insert(position);
                }
                instructions::BEGINSUB => {
                    sub_entry_points.insert(position);
                }
                _ => {
                    if let Some(push_bytes) = instruction.push_bytes() {
                        position += push_bytes;
                    }
                }
            }
        }

        position += 1;
    }

    (Arc::new(jump_dests), Arc::new(sub_entry_points))
}

/// Shared, thread-safe cache of `calculate_jump_and_sub_destinations`
/// results. Entries are immutable once inserted; constructing the same
/// code hash from two frames concurrently just recomputes the
/// (value-equal) bitsets and one write wins — cheap, and correct under
/// this codebase's strictly single-threaded execution model (see the
/// concurrency section of the design docs).
pub struct SharedCache {
    cache: Mutex<LruCache<H256, Destinations>>,
}

impl SharedCache {
    /// Create a new cache with `max_size` code hashes retained.
    pub fn new(max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::new(1).expect("1 != 0; qed"));
        SharedCache {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get (computing and caching on miss) the valid jump and
    /// subroutine destinations for `code`, identified by `code_hash`.
    /// Code with no hash (e.g. raw init code never assigned one) is
    /// computed fresh every call and never cached.
    pub fn jump_and_sub_destinations(&self, code_hash: &Option<H256>, code: &[u8]) -> Destinations {
        match code_hash {
            Some(ref hash) if *hash != KECCAK_EMPTY => {
                if let Some(hit) = self.cache.lock().get(hash) {
                    return hit.clone();
                }
                let destinations = calculate_jump_and_sub_destinations(code);
                self.cache.lock().put(*hash, destinations.clone());
                destinations
            }
            _ => calculate_jump_and_sub_destinations(code),
        }
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        SharedCache::new(DEFAULT_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hex::FromHex;

    #[test]
    fn push_immediates_are_not_jump_destinations() {
        // PUSH1 0x5b (looks like JUMPDEST but is push data), then a
        // real JUMPDEST at offset 2.
        let code: Vec<u8> = "605b5b".from_hex().unwrap();
        let (jumps, _) = calculate_jump_and_sub_destinations(&code);
        assert!(!jumps.contains(1));
        assert!(jumps.contains(2));
    }

    #[test]
    fn cache_hits_return_equal_bitsets() {
        let cache = SharedCache::default();
        let code: Vec<u8> = "5b00".from_hex().unwrap();
        let hash = H256::from_low_u64_be(42);
        let a = cache.jump_and_sub_destinations(&Some(hash), &code);
        let b = cache.jump_and_sub_destinations(&Some(hash), &code);
        assert_eq!(*a.0, *b.0);
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn beginsub_is_recorded_separately_from_jumpdest() {
        let code: Vec<u8> = "5e5b".from_hex().unwrap();
        let (jumps, subs) = calculate_jump_and_sub_destinations(&code);
        assert!(subs.contains(0));
        assert!(jumps.contains(1));
    }
}
