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

//! Call/create orchestration layered on top of `evm`'s stepping
//! interpreter. Where `evm::Interpreter` runs a single frame until it
//! halts, reverts or needs a child frame, `executive::CallOrchestrator`
//! owns the whole call tree: it drives frames one at a time off an
//! explicit `Vec<Frame>`, applies a finished child's outcome to its
//! parent, and performs the state/storage snapshot-and-restore dance
//! around `REVERT` and fatal errors.
//!
//! This crate also ships the reference collaborators the interpreter
//! specification leaves external (`StateStore`, `StorageStore`,
//! `BlockHashOracle`) so the orchestrator is runnable end to end
//! without a real client database.

pub mod address;
pub mod executive;
pub mod externalities;
pub mod frame;
pub mod precompiled;
pub mod state;
pub mod substate;

pub use crate::{
    address::contract_address,
    executive::CallOrchestrator,
    externalities::{Externalities, OutputPolicy},
    frame::{Continuation, ExecutionType, Frame},
    state::{
        BlockHashOracle, CleanupMode, FixedBlockHashOracle, InMemoryStateStore,
        InMemoryStorageStore, NullBlockHashOracle, StateStore, StorageStore,
    },
    substate::{LogEntry, Substate},
};
