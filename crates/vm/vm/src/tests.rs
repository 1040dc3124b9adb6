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

//! A minimal `Ext` double for interpreter unit tests, plus helpers
//! shared by the interpreter/gasometer/instructions test modules.

use crate::{
    action_params::{CreateContractAddress, CallType},
    env_info::EnvInfo,
    error::{Error, Result},
    ext::Ext,
    return_data::{ContractCreateResult, GasLeft, MessageCallResult, ReturnData},
    schedule::Schedule,
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// What kind of externalities call was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FakeCallType {
    Call,
    Create,
}

/// One recorded call/create made through `FakeExt`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FakeCall {
    pub call_type: FakeCallType,
    pub create_scheme: Option<CreateContractAddress>,
    pub gas: U256,
    pub sender_address: Option<Address>,
    pub receive_address: Option<Address>,
    pub value: Option<U256>,
    pub data: Bytes,
    pub code_address: Option<Address>,
}

/// Fake externalities test structure.
///
/// Implements `Ext` with plain in-memory maps and no actual state
/// backend; `call`/`create` always record the attempt and report
/// `Failed` (never traps) unless a test overrides the closure-free
/// fields below.
pub struct FakeExt {
    pub schedule: Schedule,
    pub store: HashMap<H256, H256>,
    pub blockhashes: HashMap<U256, H256>,
    pub calls: HashSet<FakeCall>,
    pub sstore_clears: i128,
    pub depth: usize,
    pub blockhash_address: Address,
    pub balances: HashMap<Address, U256>,
    pub codes: HashMap<Address, Arc<Bytes>>,
    pub tracing: bool,
    pub is_static: bool,
    pub chain_id: u64,
    pub access_list_enabled: bool,
    pub accessed_addresses: HashSet<Address>,
    pub accessed_storage_keys: HashSet<(Address, H256)>,
}

impl Default for FakeExt {
    fn default() -> Self {
        FakeExt {
            schedule: Schedule::new_istanbul(),
            store: HashMap::new(),
            blockhashes: HashMap::new(),
            calls: HashSet::new(),
            sstore_clears: 0,
            depth: 0,
            blockhash_address: Address::zero(),
            balances: HashMap::new(),
            codes: HashMap::new(),
            tracing: false,
            is_static: false,
            chain_id: 1,
            access_list_enabled: false,
            accessed_addresses: HashSet::new(),
            accessed_storage_keys: HashSet::new(),
        }
    }
}

impl FakeExt {
    /// New fake externalities using the Istanbul schedule.
    pub fn new() -> Self {
        FakeExt::default()
    }

    /// New fake externalities using the Byzantium schedule.
    pub fn new_byzantium() -> Self {
        FakeExt {
            schedule: Schedule::new_byzantium(),
            ..FakeExt::default()
        }
    }

    /// New fake externalities using the Constantinople schedule.
    pub fn new_constantinople() -> Self {
        FakeExt {
            schedule: Schedule::new_constantinople(),
            ..FakeExt::default()
        }
    }

    /// New fake externalities using the frontier (pre-EIP150) schedule.
    pub fn new_frontier() -> Self {
        FakeExt {
            schedule: Schedule::new_frontier(),
            ..FakeExt::default()
        }
    }
}

impl Ext for FakeExt {
    fn initial_storage_at(&self, key: &H256) -> Result<H256> {
        Ok(self.store.get(key).cloned().unwrap_or_default())
    }

    fn storage_at(&self, key: &H256) -> Result<H256> {
        Ok(self.store.get(key).cloned().unwrap_or_default())
    }

    fn set_storage(&mut self, key: H256, value: H256) -> Result<()> {
        self.store.insert(key, value);
        Ok(())
    }

    fn exists(&self, address: &Address) -> Result<bool> {
        Ok(self.balances.contains_key(address))
    }

    fn exists_and_not_null(&self, address: &Address) -> Result<bool> {
        Ok(self
            .balances
            .get(address)
            .map_or(false, |b| !b.is_zero()))
    }

    fn origin_balance(&self) -> Result<U256> {
        Ok(U256::zero())
    }

    fn balance(&self, address: &Address) -> Result<U256> {
        Ok(self.balances.get(address).cloned().unwrap_or_default())
    }

    fn blockhash(&mut self, number: &U256) -> H256 {
        self.blockhashes.get(number).cloned().unwrap_or_default()
    }

    fn create(
        &mut self,
        gas: &U256,
        value: &U256,
        code: &[u8],
        address_scheme: CreateContractAddress,
        _trap: bool,
    ) -> std::result::Result<ContractCreateResult, crate::TrapKind> {
        self.calls.insert(FakeCall {
            call_type: FakeCallType::Create,
            create_scheme: Some(address_scheme),
            gas: *gas,
            sender_address: None,
            receive_address: None,
            value: Some(*value),
            data: code.to_vec(),
            code_address: None,
        });
        Ok(ContractCreateResult::Failed)
    }

    fn calc_address(&self, _code: &[u8], _address_scheme: CreateContractAddress) -> Option<Address> {
        None
    }

    fn call(
        &mut self,
        gas: &U256,
        sender_address: &Address,
        receive_address: &Address,
        value: Option<U256>,
        data: &[u8],
        code_address: &Address,
        call_type: CallType,
        _trap: bool,
    ) -> std::result::Result<MessageCallResult, crate::TrapKind> {
        self.calls.insert(FakeCall {
            call_type: FakeCallType::Call,
            create_scheme: None,
            gas: *gas,
            sender_address: Some(*sender_address),
            receive_address: Some(*receive_address),
            value,
            data: data.to_vec(),
            code_address: Some(*code_address),
        });
        let _ = call_type;
        Ok(MessageCallResult::Success(*gas, ReturnData::empty()))
    }

    fn extcode(&self, address: &Address) -> Result<Option<Arc<Bytes>>> {
        Ok(self.codes.get(address).cloned())
    }

    fn extcodehash(&self, _address: &Address) -> Result<Option<H256>> {
        Ok(None)
    }

    fn extcodesize(&self, address: &Address) -> Result<Option<usize>> {
        Ok(self.codes.get(address).map(|c| c.len()))
    }

    fn log(&mut self, _topics: Vec<H256>, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    fn ret(self, gas: &U256, _data: &ReturnData, _apply_state: bool) -> Result<U256>
    where
        Self: Sized,
    {
        Ok(*gas)
    }

    fn suicide(&mut self, _refund_address: &Address) -> Result<()> {
        Ok(())
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn env_info(&self) -> &EnvInfo {
        // Tests that need a populated `EnvInfo` construct their own
        // `Interpreter`/`ActionParams` fixtures directly; none of the
        // interpreter unit tests dereference this today.
        unimplemented!("FakeExt::env_info is not needed by current interpreter unit tests")
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn add_sstore_refund(&mut self, value: usize) {
        self.sstore_clears += value as i128;
    }

    fn sub_sstore_refund(&mut self, value: usize) {
        self.sstore_clears -= value as i128;
    }

    fn trace_next_instruction(&mut self, _pc: usize, _instruction: u8, _current_gas: U256) -> bool {
        self.tracing
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn al_is_enabled(&self) -> bool {
        self.access_list_enabled
    }

    fn al_contains_storage_key(&self, address: &Address, key: &H256) -> bool {
        self.accessed_storage_keys.contains(&(*address, *key))
    }

    fn al_insert_storage_key(&mut self, address: Address, key: H256) {
        self.accessed_storage_keys.insert((address, key));
    }

    fn al_contains_address(&self, address: &Address) -> bool {
        self.accessed_addresses.contains(address)
    }

    fn al_insert_address(&mut self, address: Address) {
        self.accessed_addresses.insert(address);
    }
}

/// Collapse a completed interpreter run into the gas left, surfacing
/// an error unchanged.
pub fn test_finalize(res: Result<GasLeft>) -> Result<U256> {
    match res {
        Ok(GasLeft::Known(gas)) => Ok(gas),
        Ok(GasLeft::NeedsReturn { gas_left, .. }) => Ok(gas_left),
        Err(e) => Err(e),
    }
}

#[test]
fn can_collapse_known_gas_left() {
    assert_eq!(test_finalize(Ok(GasLeft::Known(U256::from(5)))), Ok(U256::from(5)));
}

#[test]
fn can_propagate_error() {
    assert_eq!(test_finalize(Err(Error::OutOfGas)), Err(Error::OutOfGas));
}
