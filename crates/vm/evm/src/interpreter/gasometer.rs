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

//! Per-instruction gas accounting.

use ethereum_types::{Address, U256};

use evm::CostType;
use instructions::{self, Instruction, InstructionInfo};
use vm::{Ext, Result, Schedule};

use super::stack::Stack;
use super::memory;

macro_rules! overflowing {
    ($x: expr) => {{
        let (v, overflow) = $x;
        if overflow {
            return Err(::vm::Error::OutOfGas);
        }
        v
    }};
}

/// What an instruction needs before it can run: the gas it costs
/// (instruction cost plus any memory-expansion delta already folded
/// in), how much memory the frame must be expanded to, the new running
/// total of memory gas, and, for CALL*/CREATE*, how much gas to pass
/// down to the child frame.
pub struct InstructionRequirements<Gas> {
    /// Gas needed for this instruction, memory expansion included.
    pub gas_cost: Gas,
    /// Gas requirement for extra memory.
    pub provide_gas: Option<Gas>,
    /// Memory size in bytes the frame must be expanded to.
    pub memory_required_size: usize,
    /// New running total of gas spent purely on memory.
    pub memory_total_gas: Gas,
}

/// Tracks gas as it is spent across a single frame's execution.
pub struct Gasometer<Gas> {
    /// Gas remaining to be spent.
    pub current_gas: Gas,
    /// Gas spent so far purely for memory expansion.
    pub current_mem_gas: Gas,
}

impl<Gas: CostType> Gasometer<Gas> {
    /// Create a gasometer with `current_gas` available.
    pub fn new(current_gas: Gas) -> Self {
        Gasometer {
            current_gas,
            current_mem_gas: Gas::from(0),
        }
    }

    /// Errors with `OutOfGas` unless at least `gas_cost` remains.
    pub fn verify_gas(&self, gas_cost: &Gas) -> Result<()> {
        if self.current_gas < *gas_cost {
            Err(::vm::Error::OutOfGas)
        } else {
            Ok(())
        }
    }

    /// Determine the requirements for executing the given instruction.
    pub fn requirements(
        &mut self,
        ext: &dyn Ext,
        instruction: Instruction,
        info: &InstructionInfo,
        stack: &dyn Stack<U256>,
        current_address: &Address,
        current_mem_size: usize,
    ) -> Result<InstructionRequirements<Gas>> {
        let schedule = ext.schedule();
        let tier = instruction_tier(instruction);
        let default_gas = Gas::from(schedule.tier_step_gas[tier]);

        let mut gas = default_gas;
        let mut provided = None;
        let mem_size = mem_needed(instruction, stack)?;

        use instructions::*;
        match instruction {
            SSTORE => {
                let key = stack.peek(0);
                let _ = key;
                let current_val = {
                    let key = ::ethereum_types::BigEndianHash::from_uint(stack.peek(0));
                    ext.storage_at(&key)?
                };
                let val = stack.peek(1);

                let mut new_gas = if schedule.eip1283 {
                    // net-metered SSTORE under EIP-1283/2200: a minimal
                    // flat charge, refunds are handled separately.
                    if current_val.into_uint().is_zero() && !val.is_zero() {
                        Gas::from(schedule.sstore_set_gas)
                    } else {
                        Gas::from(schedule.sstore_reset_gas)
                    }
                } else if current_val.into_uint().is_zero() && !val.is_zero() {
                    Gas::from(schedule.sstore_set_gas)
                } else {
                    Gas::from(schedule.sstore_reset_gas)
                };

                // EIP-2929: an additional cold-slot surcharge on top of
                // whatever EIP-1283/2200 priced, mirrored by `al_insert_storage_key`
                // at the call site turning the slot warm for the rest of the frame.
                if schedule.eip2929 {
                    let storage_key = ::ethereum_types::BigEndianHash::from_uint(stack.peek(0));
                    if !ext.al_contains_storage_key(current_address, &storage_key) {
                        new_gas = new_gas + Gas::from(schedule.cold_sload_cost);
                    }
                }
                gas = new_gas;
            }
            SLOAD => {
                let storage_key = ::ethereum_types::BigEndianHash::from_uint(stack.peek(0));
                gas = if schedule.eip2929 {
                    if ext.al_contains_storage_key(current_address, &storage_key) {
                        Gas::from(schedule.warm_storage_read_cost)
                    } else {
                        Gas::from(schedule.cold_sload_cost)
                    }
                } else {
                    Gas::from(schedule.sload_gas)
                };
            }
            BALANCE => {
                let address = ::ethereum_types::Address::from(
                    ::ethereum_types::BigEndianHash::from_uint(stack.peek(0)),
                );
                gas = account_access_gas(schedule, ext, &address, schedule.balance_gas);
            }
            EXTCODESIZE => {
                let address = ::ethereum_types::Address::from(
                    ::ethereum_types::BigEndianHash::from_uint(stack.peek(0)),
                );
                gas = account_access_gas(schedule, ext, &address, schedule.extcodesize_gas);
            }
            EXTCODEHASH => {
                let address = ::ethereum_types::Address::from(
                    ::ethereum_types::BigEndianHash::from_uint(stack.peek(0)),
                );
                gas = account_access_gas(schedule, ext, &address, schedule.extcodehash_gas);
            }
            SUICIDE => {
                let mut suicide_gas = schedule.suicide_gas;
                let address = ::ethereum_types::Address::from(
                    ::ethereum_types::BigEndianHash::from_uint(stack.peek(0)),
                );
                let is_value_transfer = !ext.balance(current_address)?.is_zero();
                if (!schedule.no_empty && !ext.exists(&address)?)
                    || (schedule.no_empty
                        && is_value_transfer
                        && !ext.exists_and_not_null(&address)?)
                {
                    suicide_gas += schedule.suicide_to_new_account_cost;
                }
                gas = Gas::from(suicide_gas);
            }
            MLOAD | MSTORE => {
                gas = default_gas;
            }
            MSTORE8 => {
                gas = default_gas;
            }
            EXP => {
                let expon = stack.peek(1);
                let bytes = ((expon.bits() + 7) / 8) as usize;
                gas = Gas::from(schedule.exp_gas) + Gas::from(schedule.exp_byte_gas) * Gas::from(bytes);
            }
            SHA3 => {
                let words = memory::to_word_size(mem_size.map(|(_, s)| s).unwrap_or(0));
                gas = Gas::from(schedule.sha3_gas) + Gas::from(schedule.sha3_word_gas) * Gas::from(words);
            }
            CALLDATACOPY | CODECOPY | RETURNDATACOPY => {
                let words = memory::to_word_size(mem_size.map(|(_, s)| s).unwrap_or(0));
                gas = default_gas + Gas::from(schedule.copy_gas) * Gas::from(words);
            }
            EXTCODECOPY => {
                let address = ::ethereum_types::Address::from(
                    ::ethereum_types::BigEndianHash::from_uint(stack.peek(0)),
                );
                let words = memory::to_word_size(mem_size.map(|(_, s)| s).unwrap_or(0));
                gas = account_access_gas(schedule, ext, &address, schedule.extcodecopy_base_gas)
                    + Gas::from(schedule.copy_gas) * Gas::from(words);
            }
            LOG0 | LOG1 | LOG2 | LOG3 | LOG4 => {
                let topics = instruction
                    .log_topics()
                    .expect("log_topics always returns Some for LOG* instructions; qed");
                let data_len = stack.peek(1).low_u64() as usize;
                gas = Gas::from(schedule.log_gas)
                    + Gas::from(schedule.log_topic_gas) * Gas::from(topics)
                    + Gas::from(schedule.log_data_gas) * Gas::from(data_len);
            }
            CALL | CALLCODE | DELEGATECALL | STATICCALL => {
                let callee = ::ethereum_types::Address::from(
                    ::ethereum_types::BigEndianHash::from_uint(stack.peek(1)),
                );
                let mut call_gas = if schedule.eip2929 {
                    if ext.al_contains_address(&callee) {
                        schedule.warm_storage_read_cost
                    } else {
                        schedule.cold_account_access_cost
                    }
                } else {
                    schedule.call_gas
                };
                let value = match instruction {
                    CALL | CALLCODE => *stack.peek(2),
                    _ => U256::zero(),
                };
                if instruction == CALL && !value.is_zero() {
                    if (!schedule.no_empty && !ext.exists(&callee)?)
                        || (schedule.no_empty && !ext.exists_and_not_null(&callee)?)
                    {
                        call_gas += schedule.call_new_account_gas;
                    }
                }
                if !value.is_zero() {
                    call_gas += schedule.call_value_transfer_gas;
                }
                gas = Gas::from(call_gas);

                let requested = match instruction {
                    CALL | CALLCODE => *stack.peek(0),
                    DELEGATECALL | STATICCALL => *stack.peek(0),
                    _ => unreachable!(),
                };
                let available = self.current_gas.as_u256().saturating_sub(gas.as_u256());
                let provide_u256 = match schedule.sub_gas_cap_divisor {
                    Some(divisor) => {
                        let cap = available - available / U256::from(divisor);
                        ::std::cmp::min(requested, cap)
                    }
                    None => requested,
                };
                let mut provide = Gas::from_u256(provide_u256)?;
                if !value.is_zero() {
                    provide = provide + Gas::from(schedule.call_stipend);
                }
                provided = Some(provide);
                gas = gas + provide;
            }
            CREATE | CREATE2 => {
                let mut create_gas = Gas::from(schedule.create_gas);
                if instruction == CREATE2 {
                    let init_size = stack.peek(2).low_u64() as usize;
                    let words = memory::to_word_size(init_size);
                    create_gas = create_gas + Gas::from(schedule.sha3_word_gas) * Gas::from(words);
                }
                gas = create_gas;

                let available = self.current_gas.as_u256().saturating_sub(gas.as_u256());
                let provide_u256 = match schedule.sub_gas_cap_divisor {
                    Some(divisor) => available - available / U256::from(divisor),
                    None => available,
                };
                let provide = Gas::from_u256(provide_u256)?;
                provided = Some(provide);
                gas = gas + provide;
            }
            _ => {}
        }

        let (mem_gas_cost, mem_size_bytes, new_mem_gas) =
            self.mem_gas_cost(schedule, current_mem_size, &mem_size)?;
        let gas_cost = overflowing!(gas.overflow_add(mem_gas_cost));

        Ok(InstructionRequirements {
            gas_cost,
            provide_gas: provided,
            memory_required_size: mem_size_bytes,
            memory_total_gas: new_mem_gas,
        })
    }

    fn mem_gas_cost(
        &self,
        schedule: &Schedule,
        current_mem_size: usize,
        mem_size: &Option<(usize, usize)>,
    ) -> Result<(Gas, usize, Gas)> {
        let gas_for_mem = |size: usize| -> Result<Gas> {
            let words = Gas::from(memory::to_word_size(size));
            let linear = overflowing!(words.overflow_mul(Gas::from(schedule.memory_gas)));
            let (square, overflow) =
                words.overflow_mul_div(words, Gas::from(schedule.quad_coeff_div));
            if overflow {
                return Err(::vm::Error::OutOfGas);
            }
            let total = overflowing!(linear.overflow_add(square));
            Ok(total)
        };

        let (target_size, required_size) = match *mem_size {
            Some((offset, size)) => {
                let new_size =
                    memory::to_word_size(offset.saturating_add(size)).saturating_mul(32);
                (::std::cmp::max(new_size, current_mem_size), new_size)
            }
            None => (current_mem_size, current_mem_size),
        };

        if target_size <= current_mem_size {
            return Ok((Gas::from(0), current_mem_size, self.current_mem_gas));
        }

        let new_mem_gas = gas_for_mem(target_size)?;
        let (cost, overflow) = new_mem_gas.overflow_sub(self.current_mem_gas);
        if overflow {
            return Err(::vm::Error::OutOfGas);
        }
        Ok((cost, ::std::cmp::max(target_size, required_size), new_mem_gas))
    }
}

/// EIP-2929 cold/warm account-access price: `warm_storage_read_cost` if
/// `address` is already in the transaction's access list, otherwise
/// `cold_account_access_cost`; unchanged (`flat`) when EIP-2929 is off.
fn account_access_gas<Gas: CostType>(
    schedule: &Schedule,
    ext: &dyn Ext,
    address: &Address,
    flat: usize,
) -> Gas {
    if schedule.eip2929 {
        if ext.al_contains_address(address) {
            Gas::from(schedule.warm_storage_read_cost)
        } else {
            Gas::from(schedule.cold_account_access_cost)
        }
    } else {
        Gas::from(flat)
    }
}

/// Maps an instruction to its base ("tier") gas cost index into
/// `Schedule::tier_step_gas`, per the yellow paper's Zero/Base/VeryLow/
/// Low/Mid/High/Ext groupings. Instructions priced individually below
/// (SSTORE, SLOAD, CALL*, CREATE*, ...) still read a tier as their
/// starting point but overwrite it.
fn instruction_tier(instruction: Instruction) -> usize {
    use instructions::*;
    match instruction {
        STOP | RETURN | REVERT | SUICIDE => 0,
        ADDRESS | ORIGIN | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | GASPRICE
        | COINBASE | TIMESTAMP | NUMBER | DIFFICULTY | GASLIMIT | RETURNDATASIZE | POP
        | PC | MSIZE | GAS | JUMPDEST | CHAINID | SELFBALANCE | BASEFEE | BEGINSUB
        | JUMPSUB | RETURNSUB => 1,
        PUSH1 | PUSH2 | PUSH3 | PUSH4 | PUSH5 | PUSH6 | PUSH7 | PUSH8 | PUSH9 | PUSH10
        | PUSH11 | PUSH12 | PUSH13 | PUSH14 | PUSH15 | PUSH16 | PUSH17 | PUSH18 | PUSH19
        | PUSH20 | PUSH21 | PUSH22 | PUSH23 | PUSH24 | PUSH25 | PUSH26 | PUSH27 | PUSH28
        | PUSH29 | PUSH30 | PUSH31 | PUSH32 | DUP1 | DUP2 | DUP3 | DUP4 | DUP5 | DUP6
        | DUP7 | DUP8 | DUP9 | DUP10 | DUP11 | DUP12 | DUP13 | DUP14 | DUP15 | DUP16
        | SWAP1 | SWAP2 | SWAP3 | SWAP4 | SWAP5 | SWAP6 | SWAP7 | SWAP8 | SWAP9 | SWAP10
        | SWAP11 | SWAP12 | SWAP13 | SWAP14 | SWAP15 | SWAP16 | ADD | SUB | NOT | LT | GT
        | SLT | SGT | EQ | ISZERO | AND | OR | XOR | BYTE | SHL | SHR | SAR | CALLDATALOAD
        | MLOAD | MSTORE | MSTORE8 => 2,
        MUL | DIV | SDIV | MOD | SMOD | SIGNEXTEND => 3,
        ADDMOD | MULMOD | JUMP | JUMPI => 4,
        EXP => 5,
        BLOCKHASH => 6,
        _ => 0,
    }
}

/// Computes the `(offset, size)` of the memory region a given
/// instruction reads or writes, before that memory has been expanded.
/// Mirrors `Interpreter::mem_written`, but also covers CREATE/SHA3/LOG.
fn mem_needed(instruction: Instruction, stack: &dyn Stack<U256>) -> Result<Option<(usize, usize)>> {
    let read = |no_from_top: usize| -> usize { stack.peek(no_from_top).low_u64() as usize };

    use instructions::*;
    let needed = match instruction {
        MLOAD | MSTORE => Some((read(0), 32)),
        MSTORE8 => Some((read(0), 1)),
        CALLDATACOPY | CODECOPY | RETURNDATACOPY => Some((read(0), read(2))),
        EXTCODECOPY => Some((read(1), read(3))),
        SHA3 => Some((read(0), read(1))),
        LOG0 => Some((read(0), read(1))),
        LOG1 => Some((read(0), read(1))),
        LOG2 => Some((read(0), read(1))),
        LOG3 => Some((read(0), read(1))),
        LOG4 => Some((read(0), read(1))),
        CREATE => Some((read(1), read(2))),
        CREATE2 => Some((read(1), read(2))),
        CALL | CALLCODE => Some(merge_ranges(read(3), read(4), read(5), read(6))),
        DELEGATECALL | STATICCALL => Some(merge_ranges(read(2), read(3), read(4), read(5))),
        RETURN | REVERT => Some((read(0), read(1))),
        _ => None,
    };

    match needed {
        Some((offset, size)) if !memory::is_valid_range(offset, size) && size != 0 => {
            Err(::vm::Error::OutOfGas)
        }
        Some((_, 0)) => Ok(None),
        other => Ok(other),
    }
}

fn merge_ranges(off_a: usize, size_a: usize, off_b: usize, size_b: usize) -> (usize, usize) {
    let end_a = off_a.saturating_add(size_a);
    let end_b = off_b.saturating_add(size_b);
    let start = if size_a == 0 { off_b } else if size_b == 0 { off_a } else { off_a.min(off_b) };
    let end = end_a.max(end_b);
    (start, end.saturating_sub(start))
}

/// Applies the EIP-1283/2200 net-gas SSTORE refund rules (as adjusted
/// by EIP-3529's reduced clear refund when `schedule.max_refund_quotient`
/// differs from the classic value), crediting or debiting
/// `ext`'s refund counter based on the storage slot's original,
/// current and new values.
pub fn handle_eip1283_sstore_clears_refund(
    ext: &mut dyn Ext,
    original: &U256,
    current: &U256,
    new: &U256,
) {
    let schedule = ext.schedule();
    let sstore_clears_schedule = schedule.sstore_refund_gas;
    let sstore_set_gas = schedule.sstore_set_gas;
    let sstore_reset_gas = schedule.sstore_reset_gas;
    let sload_gas = schedule.sload_gas;

    if current == new {
        return;
    }

    if original == current {
        if !original.is_zero() && new.is_zero() {
            ext.add_sstore_refund(sstore_clears_schedule);
        }
    } else {
        if !original.is_zero() {
            if current.is_zero() {
                ext.sub_sstore_refund(sstore_clears_schedule);
            } else if new.is_zero() {
                ext.add_sstore_refund(sstore_clears_schedule);
            }
        }
        if original == new {
            if original.is_zero() {
                ext.add_sstore_refund(sstore_set_gas - sload_gas);
            } else {
                ext.add_sstore_refund(sstore_reset_gas - sload_gas);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::BigEndianHash;
    use vm::tests::FakeExt;

    #[test]
    fn zero_tier_instructions_are_cheap() {
        let schedule = Schedule::new_frontier();
        let mut gasometer = Gasometer::<u64>::new(100_000);
        let stack: super::super::stack::VecStack<U256> =
            super::super::stack::VecStack::with_capacity(16, U256::zero());
        let ext = FakeExt::new();
        let reqs = gasometer
            .requirements(&ext, instructions::STOP, instructions::STOP.info(), &stack, &Address::zero(), 0)
            .unwrap();
        assert_eq!(reqs.gas_cost, schedule.tier_step_gas[0] as u64);
    }

    #[test]
    fn sstore_set_costs_more_than_reset() {
        assert!(Schedule::new_frontier().sstore_set_gas > Schedule::new_frontier().sstore_reset_gas);
    }

    #[test]
    fn cold_balance_costs_more_than_warm_under_eip2929() {
        let schedule = Schedule::new_berlin();
        let mut gasometer = Gasometer::<u64>::new(1_000_000);
        let mut stack: super::super::stack::VecStack<U256> =
            super::super::stack::VecStack::with_capacity(16, U256::zero());
        let target = Address::from_low_u64_be(0x99);
        stack.push(::ethereum_types::H256::from(target).into_uint());

        let mut ext = FakeExt::new();
        ext.schedule = schedule.clone();
        let cold = gasometer
            .requirements(&ext, instructions::BALANCE, instructions::BALANCE.info(), &stack, &Address::zero(), 0)
            .unwrap();
        assert_eq!(cold.gas_cost, schedule.cold_account_access_cost as u64);

        ext.al_insert_address(target);
        let warm = gasometer
            .requirements(&ext, instructions::BALANCE, instructions::BALANCE.info(), &stack, &Address::zero(), 0)
            .unwrap();
        assert_eq!(warm.gas_cost, schedule.warm_storage_read_cost as u64);
    }
}
