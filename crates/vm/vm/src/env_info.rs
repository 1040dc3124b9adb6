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

//! Environment information for the current block, as seen by opcodes
//! such as NUMBER, TIMESTAMP, COINBASE, DIFFICULTY, GASLIMIT, BASEFEE
//! and BLOCKHASH.

use ethereum_types::{Address, H256, U256};
use std::sync::Arc;

/// Information concerning the execution environment for a message-call/contract-creation.
#[derive(Debug, Clone)]
pub struct EnvInfo {
    /// The block number.
    pub number: u64,
    /// The block author.
    pub author: Address,
    /// The block timestamp.
    pub timestamp: u64,
    /// The block difficulty.
    pub difficulty: U256,
    /// The block gas limit.
    pub gas_limit: U256,
    /// The total gas used in the block up to and including this transaction.
    pub gas_used: U256,
    /// The most recent 256 block hashes, most recent first.
    pub last_hashes: Arc<Vec<H256>>,
    /// EIP-1559 base fee, if active.
    pub base_fee: Option<U256>,
}

impl Default for EnvInfo {
    fn default() -> Self {
        EnvInfo {
            number: 0,
            author: Address::zero(),
            timestamp: 0,
            difficulty: U256::zero(),
            gas_limit: U256::zero(),
            gas_used: U256::zero(),
            last_hashes: Arc::new(Vec::new()),
            base_fee: None,
        }
    }
}
