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

//! Rust EVM implementation: opcode table, gas-cost abstraction and the
//! stepping interpreter. Suspends on CALL/CREATE via the `vm::Exec`/
//! `TrapError` mechanism rather than reentering itself; see
//! `interpreter::Interpreter::exec`.

extern crate bit_set;
extern crate ethereum_types;
extern crate keccak_hash as hash;
#[macro_use]
extern crate log;
extern crate lru;
extern crate num_bigint;
extern crate parity_bytes as bytes;
extern crate parking_lot;
extern crate vm;

pub mod evm;
pub mod factory;
pub mod instructions;
pub mod interpreter;

pub use evm::{CostType, FinalizationResult, Finalize};
pub use factory::Factory;
pub use instructions::{Instruction, InstructionInfo};
pub use interpreter::{Interpreter, SharedCache};
pub use vmtype::VMType;

mod vmtype;
