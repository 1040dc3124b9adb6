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

//! Interface of Evm externalities — the boundary the interpreter calls
//! across to reach state, storage, logs and the enclosing call stack.

use crate::{
    error::Result,
    return_data::{ContractCreateResult, MessageCallResult, ReturnData},
    schedule::Schedule,
    {ActionParams, CallType, CreateContractAddress, EnvInfo, TrapKind},
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::sync::Arc;

/// Result of externalities requiring a sub-call or creation.
///
/// Boxed trait objects capture the suspended interpreter so the
/// orchestrator can resume it once the child frame has run to
/// completion; see `Exec`/`ResumeCall`/`ResumeCreate` in this crate.
pub type TrapResult<T> = std::result::Result<T, TrapKind>;

/// Context (external) information for executing an instruction.
///
/// One instance of `Ext` is constructed per frame by the orchestrator
/// and handed to the interpreter for the lifetime of that frame. Every
/// CALL-family and CREATE-family opcode, every SLOAD/SSTORE, BALANCE,
/// EXTCODE*, LOG and SELFDESTRUCT routes through here rather than
/// touching state directly.
pub trait Ext {
    /// Returns the storage value for a given key if reversion happens
    /// on the current transaction. Needed by EIP-1283/2200 SSTORE gas
    /// metering to compute the "original" slot value.
    fn initial_storage_at(&self, key: &H256) -> Result<H256>;

    /// Returns a value for given key.
    fn storage_at(&self, key: &H256) -> Result<H256>;

    /// Stores a value for given key.
    fn set_storage(&mut self, key: H256, value: H256) -> Result<()>;

    /// Determine whether an account exists.
    fn exists(&self, address: &Address) -> Result<bool>;

    /// Determine whether an account exists and is not null (zero
    /// balance/nonce/code, per EIP-161).
    fn exists_and_not_null(&self, address: &Address) -> Result<bool>;

    /// Balance of the origin account.
    fn origin_balance(&self) -> Result<U256>;

    /// Returns address balance.
    fn balance(&self, address: &Address) -> Result<U256>;

    /// Returns the hash of one of the 256 most recent complete blocks.
    fn blockhash(&mut self, number: &U256) -> H256;

    /// Creates new contract.
    ///
    /// Returns either the result, or a `TrapKind` if `trap` is true,
    /// in which case the caller (the interpreter) must suspend
    /// itself and hand control to the orchestrator.
    fn create(
        &mut self,
        gas: &U256,
        value: &U256,
        code: &[u8],
        address_scheme: CreateContractAddress,
        trap: bool,
    ) -> TrapResult<ContractCreateResult>;

    /// Calculates address for newly created contract.
    fn calc_address(&self, code: &[u8], address_scheme: CreateContractAddress) -> Option<Address>;

    /// Message call.
    ///
    /// Returns either the result, or a `TrapKind` if `trap` is true,
    /// in which case the caller (the interpreter) must suspend
    /// itself and hand control to the orchestrator.
    #[allow(clippy::too_many_arguments)]
    fn call(
        &mut self,
        gas: &U256,
        sender_address: &Address,
        receive_address: &Address,
        value: Option<U256>,
        data: &[u8],
        code_address: &Address,
        call_type: CallType,
        trap: bool,
    ) -> TrapResult<MessageCallResult>;

    /// Returns code at given address.
    fn extcode(&self, address: &Address) -> Result<Option<Arc<Bytes>>>;

    /// Returns code hash at given address.
    fn extcodehash(&self, address: &Address) -> Result<Option<H256>>;

    /// Returns code size at given address.
    fn extcodesize(&self, address: &Address) -> Result<Option<usize>>;

    /// Creates log entry with given topics and data.
    fn log(&mut self, topics: Vec<H256>, data: &[u8]) -> Result<()>;

    /// Should be called when transaction calls `RETURN` opcode.
    /// Returns gas left (and possibly applies self-destruct rules) if
    /// operation is successful.
    fn ret(self, gas: &U256, data: &ReturnData, apply_state: bool) -> Result<U256>
    where
        Self: Sized;

    /// Should be called when contract commits suicide (SELFDESTRUCT).
    /// Address to which funds should be refunded.
    fn suicide(&mut self, refund_address: &Address) -> Result<()>;

    /// Returns schedule.
    fn schedule(&self) -> &Schedule;

    /// Returns environment info.
    fn env_info(&self) -> &EnvInfo;

    /// Returns the chain ID of the blockchain.
    fn chain_id(&self) -> u64;

    /// Returns current depth of execution.
    ///
    /// If contract A calls contract B, and contract B calls C,
    /// then A depth is 0, B is 1, C is 2 and so on.
    fn depth(&self) -> usize;

    /// Increments sstore refunds counter.
    fn add_sstore_refund(&mut self, value: usize);

    /// Decrements sstore refunds counter.
    fn sub_sstore_refund(&mut self, value: usize);

    /// Decide if any more operations should be traced. Passed the
    /// address of the contract being called as context.
    fn trace_next_instruction(&mut self, _pc: usize, _instruction: u8, _current_gas: U256) -> bool {
        false
    }

    /// Prepare to trace an operation. Passed the PC in bytecode, the
    /// instruction about to be executed, the gas cost, the memory
    /// written and the storage entry written.
    fn trace_prepare_execute(
        &mut self,
        _pc: usize,
        _instruction: u8,
        _gas_cost: U256,
        _mem_written: Option<(usize, usize)>,
        _store_written: Option<(U256, U256)>,
    ) {
    }

    /// Trace the finalised execution of a single instruction.
    fn trace_executed(&mut self, _gas_used: U256, _stack_push: &[U256], _mem: &[u8]) {}

    /// Mark the pending traced instruction as failed.
    fn trace_failed(&mut self) {}

    /// Check if running in static context.
    fn is_static(&self) -> bool;

    /// Whether EIP-2929/2930 access-list accounting is active.
    fn al_is_enabled(&self) -> bool {
        false
    }

    /// Whether storage key is already "warm".
    fn al_contains_storage_key(&self, _address: &Address, _key: &H256) -> bool {
        false
    }

    /// Mark a storage key "warm".
    fn al_insert_storage_key(&mut self, _address: Address, _key: H256) {}

    /// Whether address is already "warm".
    fn al_contains_address(&self, _address: &Address) -> bool {
        false
    }

    /// Mark an address "warm".
    fn al_insert_address(&mut self, _address: Address) {}
}
