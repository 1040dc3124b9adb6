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

//! Opt-in, per-instruction `trace!` logging of interpreter state.
//!
//! Disabled by default: `EvmInformant` is a zero-sized no-op unless
//! the crate is built with `--features evm-debug`, so the hot
//! dispatch loop pays nothing for it in production builds.

#[cfg(not(feature = "evm-debug"))]
macro_rules! evm_debug {
    ($x: expr) => {};
}

#[cfg(feature = "evm-debug")]
macro_rules! evm_debug {
    ($x: expr) => {
        $x
    };
}

#[cfg(not(feature = "evm-debug"))]
mod inner {
    /// No-op stand-in used in non-debug builds.
    pub struct EvmInformant;

    impl EvmInformant {
        pub fn new(_depth: usize) -> Self {
            EvmInformant
        }

        pub fn done(&mut self) {}
    }
}

#[cfg(feature = "evm-debug")]
mod inner {
    use ethereum_types::U256;
    use evm::CostType;
    use instructions::{Instruction, InstructionInfo};
    use interpreter::stack::Stack;

    /// Logs one `trace!` line per executed instruction, indented by
    /// call depth, when built with `--features evm-debug`.
    pub struct EvmInformant {
        depth: usize,
    }

    impl EvmInformant {
        pub fn new(depth: usize) -> Self {
            EvmInformant { depth }
        }

        fn indent(&self) -> String {
            "  ".repeat(self.depth)
        }

        pub fn before_instruction<Cost: CostType>(
            &mut self,
            pc: usize,
            instruction: Instruction,
            info: &InstructionInfo,
            current_gas: &Cost,
            stack: &dyn Stack<U256>,
        ) {
            trace!(target: "evm",
                "{}[{:04}] {:<12} gas={:?} args={} stack_top={:?}",
                self.indent(),
                pc,
                info.name,
                current_gas,
                info.args,
                stack.peek_top(std::cmp::min(info.args, stack.size())),
            );
            let _ = instruction;
        }

        pub fn after_instruction(&mut self, _instruction: Instruction) {}

        pub fn done(&mut self) {
            trace!(target: "evm", "{}--- done ---", self.indent());
        }
    }
}

pub use self::inner::EvmInformant;
