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

//! Linear, word-addressed call memory.

use ethereum_types::U256;
use vm::ReturnData;

/// Checks whether offset and size is valid memory range.
pub fn is_valid_range(off: usize, size: usize) -> bool {
    // When size is zero we do not need to do any bounds checking and
    // even if offset is greater than `usize::max_value()` it still does
    // not matter because we are not actually reading anything.
    size > 0 && off.checked_add(size).is_some()
}

/// Cost, in gas, of expanding memory to hold `size_in_words` 32-byte
/// words: `3 * size + size^2 / 512`, the standard quadratic memory
/// expansion formula.
pub fn cost(size_in_words: usize) -> usize {
    const MEMORY_COST_GROWTH_DENOMINATOR: usize = 512;
    const MEMORY_COST_LINEAR: usize = 3;
    size_in_words
        .saturating_mul(MEMORY_COST_LINEAR)
        .saturating_add(size_in_words.saturating_mul(size_in_words) / MEMORY_COST_GROWTH_DENOMINATOR)
}

/// Returns number of words needed to hold `n` bytes, rounding up.
pub fn to_word_size(n: usize) -> usize {
    if n > usize::max_value() - 31 {
        return (usize::max_value() - 31) / 32 + 1;
    }
    (n + 31) / 32
}

/// Call-frame scratch memory: grows on demand, never shrinks, and is
/// always padded to a whole number of 32-byte words.
pub trait Memory {
    /// Retrieve current size of the memory
    fn size(&self) -> usize;
    /// Resize (shrink or expand) the memory to specified size (fills 0)
    fn resize(&mut self, new_size: usize);
    /// Resize the memory only if its smaller
    fn expand(&mut self, new_size: usize);
    /// Write single byte to memory
    fn write_byte(&mut self, offset: U256, value: U256);
    /// Write a word to memory. Assumes word is of size `WORD_SIZE`
    fn write(&mut self, offset: U256, value: U256);
    /// Read a word from memory
    fn read(&self, offset: U256) -> U256;
    /// Write slice of bytes to memory. Checks if `size` is correct
    fn write_slice(&mut self, offset: U256, slice: &[u8]);
    /// Retrieve part of the memory between offset and offset + size
    fn read_slice(&self, offset: U256, size: U256) -> &[u8];
    /// Retrieve writeable part of memory
    fn writeable_slice(&mut self, offset: U256, size: U256) -> &mut [u8];
    /// Convert memory into return data.
    fn into_return_data(self, offset: U256, size: U256) -> ReturnData;
}

/// Checks whether offset and size is valid memory range
fn valid_range(off: usize, size: usize) -> Option<(usize, usize)> {
    if !is_valid_range(off, size) {
        None
    } else {
        Some((off, off + size))
    }
}

impl Memory for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }

    fn read_slice(&self, init_off_u: U256, init_size_u: U256) -> &[u8] {
        let off = init_off_u.low_u64() as usize;
        let size = init_size_u.low_u64() as usize;
        match valid_range(off, size) {
            Some((off, to)) => &self[off..to],
            None => &[],
        }
    }

    fn read(&self, offset: U256) -> U256 {
        let off = offset.low_u64() as usize;
        U256::from(&self[off..off + 32])
    }

    fn write_slice(&mut self, offset: U256, slice: &[u8]) {
        if !slice.is_empty() {
            let off = offset.low_u64() as usize;
            self[off..off + slice.len()].copy_from_slice(slice);
        }
    }

    fn write(&mut self, offset: U256, value: U256) {
        let off = offset.low_u64() as usize;
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        self[off..off + 32].copy_from_slice(&bytes);
    }

    fn write_byte(&mut self, offset: U256, value: U256) {
        let off = offset.low_u64() as usize;
        let val = value.low_u64() as u64;
        self[off] = val as u8;
    }

    fn resize(&mut self, new_size: usize) {
        self.resize(new_size, 0);
    }

    fn expand(&mut self, size: usize) {
        if size > self.len() {
            Memory::resize(self, to_word_size(size) * 32)
        }
    }

    fn writeable_slice(&mut self, offset: U256, size: U256) -> &mut [u8] {
        let off = offset.low_u64() as usize;
        let s = size.low_u64() as usize;
        &mut self[off..off + s]
    }

    fn into_return_data(mut self, offset: U256, size: U256) -> ReturnData {
        let mut offset = offset.low_u64() as usize;
        let size = size.low_u64() as usize;
        if size == 0 {
            return ReturnData::empty();
        }

        if self.len() < offset + size {
            offset = 0;
            Memory::resize(&mut self, size);
        }
        ReturnData::new(self, offset, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_rounds_up_to_word() {
        let mut mem = Vec::new();
        Memory::expand(&mut mem, 1);
        assert_eq!(mem.size(), 32);
        Memory::expand(&mut mem, 32);
        assert_eq!(mem.size(), 32);
        Memory::expand(&mut mem, 33);
        assert_eq!(mem.size(), 64);
    }

    #[test]
    fn expand_never_shrinks() {
        let mut mem = Vec::new();
        Memory::expand(&mut mem, 64);
        Memory::expand(&mut mem, 1);
        assert_eq!(mem.size(), 64);
    }

    #[test]
    fn read_write_word_roundtrip() {
        let mut mem = Vec::new();
        Memory::expand(&mut mem, 32);
        Memory::write(&mut mem, U256::zero(), U256::from(0x1234));
        assert_eq!(Memory::read(&mem, U256::zero()), U256::from(0x1234));
    }

    #[test]
    fn cost_is_quadratic_for_large_sizes() {
        assert!(cost(1000) > cost(500) * 2);
    }

    #[test]
    fn out_of_range_read_returns_empty() {
        let mem: Vec<u8> = Vec::new();
        assert_eq!(mem.read_slice(U256::from(10), U256::zero()), &[] as &[u8]);
    }
}
