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

//! Adapts one frame's collaborators (`StateStore`, `StorageStore`,
//! `BlockHashOracle`, `Substate`) into the `vm::Ext` surface the
//! interpreter calls across. Mirrors the teacher's own
//! `Externalities<'a, T, V, B>`, minus the recursive `Executive` call —
//! `call`/`create` here always trap, handing the would-be child's
//! `ActionParams` back to the orchestrator instead of running it inline.

use std::sync::Arc;

use ethereum_types::{Address, H256, U256};
use log::trace;
use vm::{
    ActionParams, ActionValue, CallType, ContractCreateResult, CreateContractAddress, EnvInfo,
    Error, MessageCallResult, ParamsType, Result as VmResult, ReturnData, Schedule, TrapKind,
};

use crate::address::contract_address;
use crate::state::{BlockHashOracle, CleanupMode, StateStore, StorageStore};
use crate::substate::Substate;

/// Where a frame's `RETURN`/`REVERT` output goes.
pub enum OutputPolicy {
    /// An ordinary CALL-family frame: output is just data for the caller.
    Return,
    /// A CREATE-family frame: on a successful (non-reverted) halt, the
    /// output is the deployed contract's code, charged per EIP-170/3541.
    InitContract(Address),
}

/// One frame's externalities. Borrows the orchestrator's shared
/// `StateStore`/`StorageStore`/`BlockHashOracle` and this frame's own
/// `Substate` for the span of a single `Exec::exec`/`resume_*` call.
pub struct Externalities<'a, S, T, B> {
    state: &'a mut S,
    storage: &'a mut T,
    block_hash: &'a B,
    substate: &'a mut Substate,
    schedule: &'a Schedule,
    env_info: &'a EnvInfo,
    depth: usize,
    origin: Address,
    chain_id: u64,
    params: &'a ActionParams,
    static_flag: bool,
    output: OutputPolicy,
}

impl<'a, S, T, B> Externalities<'a, S, T, B>
where
    S: StateStore,
    T: StorageStore,
    B: BlockHashOracle,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: &'a mut S,
        storage: &'a mut T,
        block_hash: &'a B,
        substate: &'a mut Substate,
        schedule: &'a Schedule,
        env_info: &'a EnvInfo,
        depth: usize,
        origin: Address,
        chain_id: u64,
        params: &'a ActionParams,
        static_flag: bool,
        output: OutputPolicy,
    ) -> Self {
        Externalities {
            state,
            storage,
            block_hash,
            substate,
            schedule,
            env_info,
            depth,
            origin,
            chain_id,
            params,
            static_flag,
            output,
        }
    }

    fn cleanup_mode(&self) -> CleanupMode {
        if self.schedule.kill_empty {
            CleanupMode::KillEmpty
        } else {
            CleanupMode::NoEmpty
        }
    }
}

impl<'a, S, T, B> vm::Ext for Externalities<'a, S, T, B>
where
    S: StateStore,
    T: StorageStore,
    B: BlockHashOracle,
{
    fn initial_storage_at(&self, key: &H256) -> VmResult<H256> {
        Ok(self.storage.get(&self.params.address, key))
    }

    fn storage_at(&self, key: &H256) -> VmResult<H256> {
        Ok(self.storage.get(&self.params.address, key))
    }

    fn set_storage(&mut self, key: H256, value: H256) -> VmResult<()> {
        if self.static_flag {
            return Err(Error::MutableCallInStaticContext);
        }
        self.storage.set(self.params.address, key, value);
        Ok(())
    }

    fn exists(&self, address: &Address) -> VmResult<bool> {
        Ok(self.state.account_exists(address))
    }

    fn exists_and_not_null(&self, address: &Address) -> VmResult<bool> {
        Ok(self.state.account_exists(address) && !self.state.is_dead_account(address))
    }

    fn origin_balance(&self) -> VmResult<U256> {
        self.balance(&self.origin)
    }

    fn balance(&self, address: &Address) -> VmResult<U256> {
        Ok(self.state.get_balance(address))
    }

    fn blockhash(&mut self, number: &U256) -> H256 {
        self.block_hash
            .get(self.env_info.number, number)
            .unwrap_or_default()
    }

    fn create(
        &mut self,
        gas: &U256,
        value: &U256,
        code: &[u8],
        address_scheme: CreateContractAddress,
        _trap: bool,
    ) -> std::result::Result<ContractCreateResult, TrapKind> {
        let sender = self.params.address;
        let nonce = self.state.get_nonce(&sender);
        let (address, code_hash) = contract_address(address_scheme, &sender, &nonce, code);
        self.state.increment_nonce(&sender);

        let params = ActionParams {
            code_address: address,
            code_hash: code_hash.or(Some(keccak_hash::keccak(code))),
            address,
            sender,
            origin: self.origin,
            gas: *gas,
            gas_price: self.params.gas_price,
            value: ActionValue::Transfer(*value),
            code: Some(Arc::new(code.to_vec())),
            data: None,
            call_type: CallType::None,
            params_type: ParamsType::Embedded,
            access_list: self.substate.access_list.clone(),
        };
        Err(TrapKind::Create(params, address))
    }

    fn calc_address(&self, code: &[u8], address_scheme: CreateContractAddress) -> Option<Address> {
        let sender = self.params.address;
        let nonce = self.state.get_nonce(&sender);
        Some(contract_address(address_scheme, &sender, &nonce, code).0)
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
    ) -> std::result::Result<MessageCallResult, TrapKind> {
        let code_hash = self.state.get_code_hash(code_address);
        let code = code_hash.and_then(|h| self.state.get_code(&h));

        let action_value = match call_type {
            CallType::DelegateCall => ActionValue::Apparent(self.params.value.value()),
            _ => ActionValue::Transfer(value.unwrap_or_default()),
        };

        let params = ActionParams {
            code_address: *code_address,
            code_hash,
            address: *receive_address,
            sender: *sender_address,
            origin: self.origin,
            gas: *gas,
            gas_price: self.params.gas_price,
            value: action_value,
            code: code.map(|c| Arc::new((*c).clone())),
            data: Some(data.to_vec()),
            call_type,
            params_type: ParamsType::Separate,
            access_list: self.substate.access_list.clone(),
        };
        Err(TrapKind::Call(params))
    }

    fn extcode(&self, address: &Address) -> VmResult<Option<Arc<Vec<u8>>>> {
        Ok(self.state.get_code_hash(address).and_then(|h| self.state.get_code(&h)))
    }

    fn extcodehash(&self, address: &Address) -> VmResult<Option<H256>> {
        Ok(self.state.get_code_hash(address))
    }

    fn extcodesize(&self, address: &Address) -> VmResult<Option<usize>> {
        Ok(self.state.get_code_size(address))
    }

    fn log(&mut self, topics: Vec<H256>, data: &[u8]) -> VmResult<()> {
        if self.static_flag {
            return Err(Error::MutableCallInStaticContext);
        }
        self.substate.logs.push(crate::substate::LogEntry {
            address: self.params.address,
            topics,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn ret(self, gas: &U256, data: &ReturnData, apply_state: bool) -> VmResult<U256>
    where
        Self: Sized,
    {
        if !apply_state {
            return Ok(*gas);
        }
        match self.output {
            OutputPolicy::Return => Ok(*gas),
            OutputPolicy::InitContract(address) => {
                if self.schedule.eip3541 && !data.is_empty() && data[0] == 0xef {
                    return Err(Error::InvalidCode);
                }
                let return_cost = U256::from(data.len()) * U256::from(self.schedule.create_data_gas);
                if data.len() > self.schedule.create_data_limit || *gas < return_cost {
                    return if self.schedule.exceptional_failed_code_deposit {
                        Err(Error::OutOfGas)
                    } else {
                        Ok(*gas)
                    };
                }
                let hash = self.state.update_code(data.to_vec());
                self.state.update_code_hash(&address, hash);
                Ok(*gas - return_cost)
            }
        }
    }

    fn suicide(&mut self, refund_address: &Address) -> VmResult<()> {
        if self.static_flag {
            return Err(Error::MutableCallInStaticContext);
        }
        let address = self.params.address;
        let balance = self.state.get_balance(&address);
        trace!(target: "ext", "suicide: {:?} -> {:?}, balance {}", address, refund_address, balance);
        if address != *refund_address {
            self.state.transfer_balance(&address, refund_address, &balance, self.cleanup_mode());
        } else {
            // Burning funds to self is the same as not touching them,
            // except the account must still be wiped below.
            self.state.sub_balance(&address, &balance, self.cleanup_mode());
        }
        self.substate.suicides.insert((address, *refund_address));
        Ok(())
    }

    fn schedule(&self) -> &Schedule {
        self.schedule
    }

    fn env_info(&self) -> &EnvInfo {
        self.env_info
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn add_sstore_refund(&mut self, value: usize) {
        self.substate.sstore_clears_refund += value as i128;
    }

    fn sub_sstore_refund(&mut self, value: usize) {
        self.substate.sstore_clears_refund -= value as i128;
    }

    fn is_static(&self) -> bool {
        self.static_flag
    }

    fn al_is_enabled(&self) -> bool {
        self.substate.access_list.is_enabled()
    }

    fn al_contains_storage_key(&self, address: &Address, key: &H256) -> bool {
        self.substate.access_list.contains_storage_key(address, key)
    }

    fn al_insert_storage_key(&mut self, address: Address, key: H256) {
        self.substate.access_list.insert_storage_key(address, key);
    }

    fn al_contains_address(&self, address: &Address) -> bool {
        self.substate.access_list.contains_address(address)
    }

    fn al_insert_address(&mut self, address: Address) {
        self.substate.access_list.insert_address(address);
    }
}
