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

//! The call orchestrator: owns the explicit frame stack, drives each
//! frame's `Interpreter` (or a precompile) to a stopping point, and
//! folds the result into the frame below, exactly reproducing what the
//! teacher's recursive `Executive::call_with_stack_depth` does, just
//! with an explicit `Vec<Frame>` instead of the Rust call stack.

use ethereum_types::{Address, U256};
use evm::{Factory, Finalize};
use keccak_hash::KECCAK_EMPTY;
use log::{debug, warn};
use vm::{
    ActionParams, ActionValue, ContractCreateResult, EnvInfo, Error, Exec, MessageCallResult,
    ResumeCall, ResumeCreate, Result as VmResult, ReturnData, Schedule, TrapError,
};

use crate::externalities::{Externalities, OutputPolicy};
use crate::frame::{Continuation, ExecutionType, Frame};
use crate::precompiled;
use crate::state::{BlockHashOracle, CleanupMode, StateStore, StorageStore};
use crate::substate::Substate;

/// What one turn of driving the top frame produced.
enum StepOutcome {
    SuspendCall(ActionParams),
    SuspendCreate(ActionParams, Address),
    /// `RETURN`/`STOP`-style halt: gas left, output, `apply_state`.
    Halt(U256, ReturnData),
    /// `REVERT`: gas left, output. State/storage roll back; gas and
    /// output still reach the caller.
    Revert(U256, ReturnData),
    /// An `Error` fatal to the frame: its state/storage mutations and
    /// remaining gas are both lost.
    Fault(Error),
}

/// Owns the collaborators a transaction's whole call tree shares
/// (state, storage, block-hash oracle) and drives frames to
/// completion one at a time.
pub struct CallOrchestrator<'a, S, T, B> {
    state: &'a mut S,
    storage: &'a mut T,
    block_hash: &'a B,
    env_info: &'a EnvInfo,
    origin: Address,
    chain_id: u64,
    factory: Factory,
}

impl<'a, S, T, B> CallOrchestrator<'a, S, T, B>
where
    S: StateStore,
    T: StorageStore,
    B: BlockHashOracle,
{
    pub fn new(
        state: &'a mut S,
        storage: &'a mut T,
        block_hash: &'a B,
        env_info: &'a EnvInfo,
        origin: Address,
        chain_id: u64,
    ) -> Self {
        CallOrchestrator {
            state,
            storage,
            block_hash,
            env_info,
            origin,
            chain_id,
            factory: Factory::new(),
        }
    }

    fn cleanup_mode(&self, schedule: &Schedule) -> CleanupMode {
        if schedule.kill_empty {
            CleanupMode::KillEmpty
        } else {
            CleanupMode::NoEmpty
        }
    }

    /// Run a transaction's root frame (and everything it transitively
    /// calls/creates) to completion.
    ///
    /// Returns `Ok((output, substate))` when the root frame halts
    /// normally. A root-level `REVERT` or fatal error both surface as
    /// `Err` — `Error::Reverted` for the former, matching the comment
    /// on that variant that it exists so callers above the interpreter
    /// can report "reverted" uniformly; see DESIGN.md for why this
    /// repo's `run` doesn't thread revert output back through `Ok`.
    pub fn run(
        &mut self,
        kind: ExecutionType,
        params: ActionParams,
        depth: usize,
        schedule: &Schedule,
    ) -> VmResult<(Vec<u8>, Substate)> {
        let state_snapshot = self.state.take_snapshot();
        let storage_snapshot = self.storage.take_snapshot();
        let substate = Substate::new(params.access_list.clone());
        let static_flag = kind.is_static();

        let mut stack: Vec<Frame<S::Snapshot, T::Snapshot>> =
            vec![Frame::new(kind, depth, static_flag, params, state_snapshot, storage_snapshot, substate)];

        let mut pending_call: Option<MessageCallResult> = None;
        let mut pending_create: Option<ContractCreateResult> = None;

        loop {
            let top = stack.len() - 1;
            let outcome = self.drive_top(&mut stack, top, pending_call.take(), pending_create.take(), schedule);

            match outcome {
                StepOutcome::SuspendCall(child_params) => {
                    self.push_call_child(&mut stack, child_params, schedule);
                }
                StepOutcome::SuspendCreate(child_params, address) => {
                    if self.is_collision(&address) {
                        debug!(target: "executive", "contract creation at {:?} collided with an existing account", address);
                        pending_create = Some(ContractCreateResult::Failed);
                        continue;
                    }
                    self.push_create_child(&mut stack, child_params, address, schedule);
                }
                StepOutcome::Halt(gas_left, output) => {
                    let finished = stack.pop().expect("drive_top only returns once the top frame exists; qed");
                    if stack.is_empty() {
                        return Ok((output.to_vec(), finished.substate));
                    }
                    let parent = stack.len() - 1;
                    stack[parent].substate.accrue(finished.substate);
                    if finished.kind.is_create() {
                        pending_create = Some(ContractCreateResult::Created(finished.params.address, gas_left));
                    } else {
                        pending_call = Some(MessageCallResult::Success(gas_left, output));
                    }
                }
                StepOutcome::Revert(gas_left, output) => {
                    let finished = stack.pop().expect("drive_top only returns once the top frame exists; qed");
                    self.state.restore(finished.state_snapshot);
                    self.storage.restore(finished.storage_snapshot);
                    if stack.is_empty() {
                        return Err(Error::Reverted);
                    }
                    let parent = stack.len() - 1;
                    stack[parent].substate.accrue_access_list_only(finished.substate);
                    if finished.kind.is_create() {
                        pending_create = Some(ContractCreateResult::Reverted(gas_left, output));
                    } else {
                        pending_call = Some(MessageCallResult::Reverted(gas_left, output));
                    }
                }
                StepOutcome::Fault(err) => {
                    let finished = stack.pop().expect("drive_top only returns once the top frame exists; qed");
                    self.state.restore(finished.state_snapshot);
                    self.storage.restore(finished.storage_snapshot);
                    if stack.is_empty() {
                        return Err(err);
                    }
                    let parent = stack.len() - 1;
                    stack[parent].substate.accrue_access_list_only(finished.substate);
                    if finished.kind.is_create() {
                        pending_create = Some(ContractCreateResult::Failed);
                    } else {
                        pending_call = Some(MessageCallResult::Failed);
                    }
                }
            }
        }
    }

    /// EIP-684/161: CREATE/CREATE2 collides if the target address
    /// already has a nonce or code.
    fn is_collision(&self, address: &Address) -> bool {
        self.state.account_exists(address)
            && (self.state.get_nonce(address) != U256::zero()
                || self.state.get_code_hash(address).map_or(false, |h| h != KECCAK_EMPTY))
    }

    fn push_call_child(
        &mut self,
        stack: &mut Vec<Frame<S::Snapshot, T::Snapshot>>,
        params: ActionParams,
        schedule: &Schedule,
    ) {
        let parent = stack.last().expect("a child is only pushed from within drive_top on an existing top frame; qed");
        let depth = parent.depth + 1;
        let static_flag = parent.static_flag || matches!(params.call_type, vm::CallType::StaticCall);
        let kind = match params.call_type {
            vm::CallType::CallCode => ExecutionType::Callcode,
            vm::CallType::DelegateCall => ExecutionType::Delegatecall,
            vm::CallType::StaticCall => ExecutionType::Staticcall,
            _ => ExecutionType::Call,
        };

        let state_snapshot = self.state.take_snapshot();
        let storage_snapshot = self.storage.take_snapshot();

        if let ActionValue::Transfer(value) = params.value {
            self.state.transfer_balance(&params.sender, &params.address, &value, self.cleanup_mode(schedule));
        }

        if precompiled::lookup(&params.code_address, schedule).is_some() {
            let substate = Substate::new(params.access_list.clone());
            stack.push(Frame::new(ExecutionType::Precompile, depth, static_flag, params, state_snapshot, storage_snapshot, substate));
            return;
        }

        let substate = Substate::new(params.access_list.clone());
        stack.push(Frame::new(kind, depth, static_flag, params, state_snapshot, storage_snapshot, substate));
    }

    fn push_create_child(
        &mut self,
        stack: &mut Vec<Frame<S::Snapshot, T::Snapshot>>,
        params: ActionParams,
        address: Address,
        schedule: &Schedule,
    ) {
        let parent = stack.last().expect("a child is only pushed from within drive_top on an existing top frame; qed");
        let depth = parent.depth + 1;
        let static_flag = parent.static_flag;

        let state_snapshot = self.state.take_snapshot();
        let storage_snapshot = self.storage.take_snapshot();

        if !self.state.account_exists(&address) {
            self.state.create_account(address, U256::zero());
        }
        if let ActionValue::Transfer(value) = params.value {
            self.state.transfer_balance(&params.sender, &address, &value, self.cleanup_mode(schedule));
        }

        let substate = Substate::new(params.access_list.clone());
        stack.push(Frame::new(ExecutionType::Create, depth, static_flag, params, state_snapshot, storage_snapshot, substate));
    }

    /// Drive the top-of-stack frame for one turn: either starting it
    /// fresh or resuming its stashed continuation with a just-finished
    /// child's result, running until the next suspend/halt/revert/fault.
    fn drive_top(
        &mut self,
        stack: &mut [Frame<S::Snapshot, T::Snapshot>],
        idx: usize,
        call_result: Option<MessageCallResult>,
        create_result: Option<ContractCreateResult>,
        schedule: &Schedule,
    ) -> StepOutcome {
        if stack[idx].kind.is_precompile() {
            return self.run_precompile(&stack[idx].params, schedule);
        }

        let exec: Box<dyn Exec> = if let Some(continuation) = stack[idx].continuation.take() {
            match continuation {
                Continuation::Call(resume) => {
                    let result = call_result.expect("a Call continuation only resumes with a MessageCallResult; qed");
                    resume.resume_call(result)
                }
                Continuation::Create(resume) => {
                    let result = create_result.expect("a Create continuation only resumes with a ContractCreateResult; qed");
                    resume.resume_create(result)
                }
            }
        } else {
            stack[idx].started = true;
            self.factory.create(stack[idx].params.clone(), schedule, stack[idx].depth)
        };

        let frame = &mut stack[idx];
        let output_policy = if frame.kind.is_create() {
            OutputPolicy::InitContract(frame.params.address)
        } else {
            OutputPolicy::Return
        };

        let mut ext = Externalities::new(
            self.state,
            self.storage,
            self.block_hash,
            &mut frame.substate,
            schedule,
            self.env_info,
            frame.depth,
            self.origin,
            self.chain_id,
            &frame.params,
            frame.static_flag,
            output_policy,
        );

        match exec.exec(&mut ext) {
            Ok(result) => match result.finalize(ext) {
                Ok(fin) if fin.apply_state => StepOutcome::Halt(fin.gas_left, fin.return_data),
                Ok(fin) => StepOutcome::Revert(fin.gas_left, fin.return_data),
                Err(e) => StepOutcome::Fault(e),
            },
            Err(TrapError::Call(params, resume)) => {
                stack[idx].continuation = Some(Continuation::Call(resume));
                StepOutcome::SuspendCall(params)
            }
            Err(TrapError::Create(params, address, resume)) => {
                stack[idx].continuation = Some(Continuation::Create(resume));
                StepOutcome::SuspendCreate(params, address)
            }
        }
    }

    fn run_precompile(&mut self, params: &ActionParams, schedule: &Schedule) -> StepOutcome {
        let data = params.data.as_deref().unwrap_or(&[]);
        let cost = match precompiled::cost(&params.code_address, data, schedule) {
            Some(cost) => cost,
            None => return StepOutcome::Fault(Error::BuiltIn("not a precompile under this schedule")),
        };
        if params.gas < cost {
            return StepOutcome::Fault(Error::OutOfGas);
        }
        match precompiled::execute(&params.code_address, data, schedule) {
            Ok(output) => {
                let gas_left = params.gas - cost;
                let len = output.len();
                StepOutcome::Halt(gas_left, ReturnData::new(output, 0, len))
            }
            Err(name) => {
                warn!(target: "executive", "builtin at {:?} failed: {}", params.code_address, name);
                StepOutcome::Fault(Error::BuiltIn(name))
            }
        }
    }
}
