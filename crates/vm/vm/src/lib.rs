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

//! Virtual machine support library. Defines the boundary between an
//! EVM bytecode interpreter and the call orchestrator that hosts it:
//! input parameters, environment info, gas schedule, error types and
//! the `Ext`/`Exec`/`ResumeCall`/`ResumeCreate` trait family used to
//! suspend and resume nested CALL/CREATE frames.

#[macro_use]
extern crate log;

pub mod action_params;
pub mod env_info;
pub mod error;
pub mod ext;
pub mod return_data;
pub mod schedule;
/// Not gated on `#[cfg(test)]`: `FakeExt` is consumed by other crates'
/// own test modules (e.g. `evm::interpreter::tests`), which only see
/// `vm` as an ordinary (non-test) dependency.
pub mod tests;

pub use crate::{
    action_params::{
        AccessList, ActionParams, ActionValue, CallType, CreateContractAddress, ParamsType,
    },
    env_info::EnvInfo,
    error::{Error, ExecTrapError, ExecTrapResult, Result, TrapError, TrapKind, TrapResult},
    ext::Ext,
    return_data::{ContractCreateResult, GasLeft, MessageCallResult, ReturnData},
    schedule::{CleanDustMode, Schedule},
};

/// Result of externalities a call finishing with.
pub type ActionValueTransfer = action_params::ActionValue;

/// An interpreter, suspended or ready to run.
///
/// One `Exec` is constructed per frame. Calling `exec` drives it
/// either to completion (`Ok`) or to a suspension point where a
/// CALL/CREATE opcode needs a child frame spawned (`Err`, carrying the
/// boxed continuation the orchestrator resumes via `ResumeCall`/
/// `ResumeCreate` once the child has run).
pub trait Exec: Send {
    /// This function should be used to execute the VM.
    fn exec(self: Box<Self>, ext: &mut dyn Ext) -> ExecTrapResult<return_data::GasLeft>;
}

/// Resume execution after a CALL-family opcode's child frame has run.
pub trait ResumeCall: Send {
    /// Resume execution after a CALL-like opcode resolves.
    fn resume_call(self: Box<Self>, result: return_data::MessageCallResult) -> Box<dyn Exec>;
}

/// Resume execution after a CREATE-family opcode's child frame has run.
pub trait ResumeCreate: Send {
    /// Resume execution after a CREATE-like opcode resolves.
    fn resume_create(self: Box<Self>, result: return_data::ContractCreateResult) -> Box<dyn Exec>;
}
