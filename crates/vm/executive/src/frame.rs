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

//! One entry of `Executive`'s explicit call stack.

use vm::{ActionParams, ResumeCall, ResumeCreate};

use crate::substate::Substate;

/// What produced this frame, and therefore how its outcome should be
/// folded back into its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionType {
    /// The root frame of a transaction that runs a contract's code.
    Transaction,
    /// The root frame of a transaction that creates a contract.
    DirectCreate,
    /// The root frame of a transaction that targets a precompile.
    DirectPrecompile,
    /// Nested CALL.
    Call,
    /// Nested CALLCODE.
    Callcode,
    /// Nested DELEGATECALL.
    Delegatecall,
    /// Nested STATICCALL.
    Staticcall,
    /// Nested CREATE/CREATE2.
    Create,
    /// Nested call into a precompiled contract.
    Precompile,
}

impl ExecutionType {
    /// Whether this frame's own opcode forces a static context,
    /// independent of whatever its parent already forced.
    pub fn is_static(self) -> bool {
        matches!(self, ExecutionType::Staticcall)
    }

    /// Whether this frame was produced by a CREATE-family opcode (or is
    /// the transaction's own top-level contract creation).
    pub fn is_create(self) -> bool {
        matches!(self, ExecutionType::Create | ExecutionType::DirectCreate)
    }

    /// Whether this frame is serviced by a precompile handler instead
    /// of the bytecode interpreter.
    pub fn is_precompile(self) -> bool {
        matches!(self, ExecutionType::Precompile | ExecutionType::DirectPrecompile)
    }
}

/// A suspended interpreter, parked waiting for its child frame to
/// finish so it can be resumed with the child's result.
pub enum Continuation {
    Call(Box<dyn ResumeCall>),
    Create(Box<dyn ResumeCreate>),
}

/// One entry of the orchestrator's explicit frame stack. The bottom of
/// the stack is the transaction's root frame; each CALL/CREATE opcode
/// that traps pushes one more on top.
///
/// `params` is kept (not moved out) for the frame's whole lifetime —
/// `Externalities` needs `params.address`/`gas_price`/`value` to build
/// any child `ActionParams` even after the frame's own `Interpreter`
/// has been constructed from a clone of it.
pub struct Frame<S, T> {
    pub kind: ExecutionType,
    pub depth: usize,
    pub static_flag: bool,
    pub params: ActionParams,
    /// Whether `Factory::create` has already been called for this
    /// frame. `false` exactly once, for a brand new frame.
    pub started: bool,
    pub continuation: Option<Continuation>,
    pub state_snapshot: S,
    pub storage_snapshot: T,
    pub substate: Substate,
}

impl<S, T> Frame<S, T> {
    pub fn new(
        kind: ExecutionType,
        depth: usize,
        static_flag: bool,
        params: ActionParams,
        state_snapshot: S,
        storage_snapshot: T,
        substate: Substate,
    ) -> Self {
        Frame {
            kind,
            depth,
            static_flag,
            params,
            started: false,
            continuation: None,
            state_snapshot,
            storage_snapshot,
            substate,
        }
    }
}
