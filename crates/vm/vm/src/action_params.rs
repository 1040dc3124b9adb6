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

//! Evm input params.

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::sync::Arc;

/// Transaction value
#[derive(Clone, Debug)]
pub enum ActionValue {
    /// Value that should be transferred
    Transfer(U256),
    /// Value that should be apparent for a calling contract, but is
    /// actually unmoved (DELEGATECALL, STATICCALL, CALLCODE to self).
    Apparent(U256),
}

impl ActionValue {
    /// Returns action value as U256.
    pub fn value(&self) -> U256 {
        match *self {
            ActionValue::Transfer(x) | ActionValue::Apparent(x) => x,
        }
    }

    /// Returns the transfer action value of self.
    pub fn transfer(value: U256) -> ActionValue {
        ActionValue::Transfer(value)
    }

    /// Returns the apparent action value of self.
    pub fn apparent(value: U256) -> ActionValue {
        ActionValue::Apparent(value)
    }
}

/// Type of the way action params encoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamsType {
    /// Parameters are included in code.
    Embedded,
    /// Parameters are passed in data section.
    Separate,
}

/// The type of the call-like instruction that produced a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallType {
    /// Not a CALL.
    None,
    /// CALL.
    Call,
    /// CALLCODE.
    CallCode,
    /// DELEGATECALL.
    DelegateCall,
    /// STATICCALL.
    StaticCall,
}

/// How to determine the address of a newly created contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CreateContractAddress {
    /// CREATE: `keccak(rlp([sender, sender_nonce]))[12..]`.
    FromSenderAndNonce,
    /// CREATE2: `keccak(0xff ++ sender ++ salt ++ keccak(init_code))[12..]`.
    FromSenderSaltAndCodeHash(H256),
    /// Not used on mainnet; kept for completeness of the address-derivation contract.
    FromSenderAndCodeHash,
}

/// Tracks which addresses and storage keys a transaction has already
/// touched, per EIP-2929/2930. Pure bookkeeping: the `Schedule`-gated
/// cold/warm gas differential is applied by the gasometer, not here.
#[derive(Clone, Debug, Default)]
pub struct AccessList {
    enabled: bool,
    addresses: std::collections::HashSet<Address>,
    storage_keys: std::collections::HashSet<(Address, H256)>,
}

impl AccessList {
    /// Construct an access list; `enabled` should track `Schedule::eip2929`.
    pub fn new(enabled: bool) -> Self {
        AccessList {
            enabled,
            ..Default::default()
        }
    }

    /// Whether EIP-2929 accounting is active for this transaction.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record an address as touched.
    pub fn insert_address(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    /// Whether an address has already been touched.
    pub fn contains_address(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Record a storage key as touched.
    pub fn insert_storage_key(&mut self, address: Address, key: H256) -> bool {
        self.storage_keys.insert((address, key))
    }

    /// Whether a storage key has already been touched.
    pub fn contains_storage_key(&self, address: &Address, key: &H256) -> bool {
        self.storage_keys.contains(&(*address, *key))
    }
}

/// Action (call or create) input params. Everything required to
/// construct a fresh `Interpreter` for one frame.
#[derive(Clone, Debug)]
pub struct ActionParams {
    /// Address of currently executed code.
    pub code_address: Address,
    /// Hash of currently executed code.
    pub code_hash: Option<H256>,
    /// Receive address. Usually equal to `code_address`, except when
    /// called using CALLCODE.
    pub address: Address,
    /// Sender of current part of the transaction.
    pub sender: Address,
    /// Transaction initiator.
    pub origin: Address,
    /// Gas paid up front for transaction execution.
    pub gas: U256,
    /// Gas price.
    pub gas_price: U256,
    /// Transaction value.
    pub value: ActionValue,
    /// Code being executed.
    pub code: Option<Arc<Bytes>>,
    /// Input data.
    pub data: Option<Bytes>,
    /// Type of call.
    pub call_type: CallType,
    /// Param types encoding.
    pub params_type: ParamsType,
    /// Addresses and storage keys already touched in this transaction.
    pub access_list: AccessList,
}

impl Default for ActionParams {
    /// Returns default `ActionParams` initialized with zeros.
    fn default() -> ActionParams {
        ActionParams {
            code_address: Address::zero(),
            code_hash: Some(keccak_hash::KECCAK_EMPTY),
            address: Address::zero(),
            sender: Address::zero(),
            origin: Address::zero(),
            gas: U256::zero(),
            gas_price: U256::zero(),
            value: ActionValue::Transfer(U256::zero()),
            code: None,
            data: None,
            call_type: CallType::None,
            params_type: ParamsType::Separate,
            access_list: AccessList::default(),
        }
    }
}
