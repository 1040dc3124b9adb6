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

//! End-to-end scenarios driven through `CallOrchestrator::run`, each
//! exercising one corner of the suspend/resume frame machinery that a
//! single-frame interpreter test can't reach.

use std::sync::Arc;

use ethereum_types::{Address, H256, U256};
use executive::{
    contract_address, CallOrchestrator, ExecutionType, FixedBlockHashOracle, InMemoryStateStore,
    InMemoryStorageStore, NullBlockHashOracle, StateStore,
};
use rustc_hex::FromHex;
use vm::{ActionParams, ActionValue, CreateContractAddress, EnvInfo, Error, Schedule};

fn env_info() -> EnvInfo {
    EnvInfo::default()
}

fn root_params(address: Address, code: &str, gas: u64) -> ActionParams {
    let mut params = ActionParams::default();
    params.address = address;
    params.code_address = address;
    params.sender = Address::from_low_u64_be(0xaaaa);
    params.origin = params.sender;
    params.gas = U256::from(gas);
    params.code = Some(Arc::new(code.from_hex().unwrap()));
    params
}

#[test]
fn s1_arithmetic_returns_product() {
    // PUSH1 3, PUSH1 5, MUL, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
    let code = "600360050260005260206000f3";
    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();
    let env = env_info();
    let oracle = NullBlockHashOracle;
    let schedule = Schedule::new_istanbul();
    let address = Address::from_low_u64_be(1);

    let params = root_params(address, code, 100_000);
    let mut orchestrator =
        CallOrchestrator::new(&mut state, &mut storage, &oracle, &env, params.origin, 1);
    let (output, _substate) = orchestrator
        .run(ExecutionType::Transaction, params, 0, &schedule)
        .expect("arithmetic contract halts normally");

    assert_eq!(output.len(), 32);
    assert_eq!(U256::from_big_endian(&output), U256::from(15));
}

#[test]
fn s2_add_on_empty_stack_is_stack_underflow() {
    let code = "01"; // ADD
    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();
    let env = env_info();
    let oracle = NullBlockHashOracle;
    let schedule = Schedule::new_istanbul();
    let address = Address::from_low_u64_be(2);

    let params = root_params(address, code, 100_000);
    let mut orchestrator =
        CallOrchestrator::new(&mut state, &mut storage, &oracle, &env, params.origin, 1);
    let err = orchestrator
        .run(ExecutionType::Transaction, params, 0, &schedule)
        .unwrap_err();

    match err {
        Error::StackUnderflow { wanted, on_stack, .. } => {
            assert_eq!(wanted, 2);
            assert_eq!(on_stack, 0);
        }
        other => panic!("expected StackUnderflow, got {other:?}"),
    }
}

#[test]
fn s3_jump_to_non_jumpdest_is_rejected() {
    // PUSH1 4, JUMP, STOP, STOP -- position 4 is a STOP, not JUMPDEST.
    let code = "6004560000";
    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();
    let env = env_info();
    let oracle = NullBlockHashOracle;
    let schedule = Schedule::new_istanbul();
    let address = Address::from_low_u64_be(3);

    let params = root_params(address, code, 100_000);
    let mut orchestrator =
        CallOrchestrator::new(&mut state, &mut storage, &oracle, &env, params.origin, 1);
    let err = orchestrator
        .run(ExecutionType::Transaction, params, 0, &schedule)
        .unwrap_err();

    assert_eq!(err, Error::BadJumpDestination { destination: 4 });
}

#[test]
fn s4_truncated_push32_zero_pads_and_ends_execution() {
    // A lone PUSH32 with no operand bytes: the pushed value is
    // zero-padded and the program counter lands at the end of code, so
    // the frame halts with no return data instead of faulting.
    let code = "7f";
    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();
    let env = env_info();
    let oracle = NullBlockHashOracle;
    let schedule = Schedule::new_istanbul();
    let address = Address::from_low_u64_be(4);

    let params = root_params(address, code, 100_000);
    let mut orchestrator =
        CallOrchestrator::new(&mut state, &mut storage, &oracle, &env, params.origin, 1);
    let (output, _substate) = orchestrator
        .run(ExecutionType::Transaction, params, 0, &schedule)
        .expect("truncated PUSH32 still halts, it doesn't fault");

    assert!(output.is_empty());
}

#[test]
fn s5_nested_revert_rolls_back_and_reports_to_caller() {
    let schedule = Schedule::new_istanbul();
    let root_address = Address::from_low_u64_be(10);
    let child_address = Address::from_low_u64_be(11);

    // Child: PUSH32 <0x11 * 32>, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, REVERT
    let mut child_code = vec![0x7f];
    child_code.extend_from_slice(&[0x11; 32]);
    child_code.extend_from_slice(&[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xfd]);

    // Root: CALL(gas=0xc350, child, value=0, in=0/0, out=0/32), store
    // the success flag at mem[0..32], RETURNDATASIZE at mem[32..64],
    // then RETURN both words so the test can inspect them.
    let mut root_code = vec![0x60, 0x20, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x73];
    root_code.extend_from_slice(child_address.as_bytes());
    root_code.extend_from_slice(&[0x61, 0xc3, 0x50, 0xf1]);
    root_code.extend_from_slice(&[0x60, 0x00, 0x52, 0x3d, 0x60, 0x20, 0x52, 0x60, 0x40, 0x60, 0x00, 0xf3]);

    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();

    state.create_account(root_address, U256::zero());
    let root_hash = state.update_code(root_code.clone());
    state.update_code_hash(&root_address, root_hash);

    state.create_account(child_address, U256::zero());
    let child_hash = state.update_code(child_code);
    state.update_code_hash(&child_address, child_hash);

    let env = env_info();
    let oracle = NullBlockHashOracle;

    let mut params = ActionParams::default();
    params.address = root_address;
    params.code_address = root_address;
    params.sender = Address::from_low_u64_be(0xaaaa);
    params.origin = params.sender;
    params.gas = U256::from(1_000_000);
    params.code = Some(Arc::new(root_code));

    let mut orchestrator =
        CallOrchestrator::new(&mut state, &mut storage, &oracle, &env, params.origin, 1);
    let (output, _substate) = orchestrator
        .run(ExecutionType::Transaction, params, 0, &schedule)
        .expect("the root frame itself halts normally even though its child reverted");

    assert_eq!(output.len(), 64);
    assert_eq!(U256::from_big_endian(&output[0..32]), U256::zero(), "CALL reports failure to its caller");
    assert_eq!(U256::from_big_endian(&output[32..64]), U256::from(32), "RETURNDATASIZE is the child's revert output length");
}

#[test]
fn s6_create_collision_only_charges_base_cost() {
    let schedule = Schedule::new_istanbul();
    let root_address = Address::from_low_u64_be(20);

    // PUSH1 0 (size), PUSH1 0 (offset), PUSH1 0 (value), CREATE,
    // PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
    let root_code: Vec<u8> = vec![
        0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0xf0, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
    ];

    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();

    state.create_account(root_address, U256::zero());
    let root_hash = state.update_code(root_code.clone());
    state.update_code_hash(&root_address, root_hash);

    let (collision_address, _) =
        contract_address(CreateContractAddress::FromSenderAndNonce, &root_address, &U256::zero(), &[]);
    state.create_account(collision_address, U256::zero());
    state.increment_nonce(&collision_address);

    let env = env_info();
    let oracle = NullBlockHashOracle;

    let mut params = ActionParams::default();
    params.address = root_address;
    params.code_address = root_address;
    params.sender = Address::from_low_u64_be(0xaaaa);
    params.origin = params.sender;
    params.gas = U256::from(100_000);
    params.code = Some(Arc::new(root_code));

    let mut orchestrator =
        CallOrchestrator::new(&mut state, &mut storage, &oracle, &env, params.origin, 1);
    let (output, _substate) = orchestrator
        .run(ExecutionType::Transaction, params, 0, &schedule)
        .expect("CREATE collision fails the child, not the caller");

    assert_eq!(output.len(), 32);
    assert_eq!(U256::from_big_endian(&output), U256::zero(), "a colliding CREATE pushes 0, no child frame ever ran");
}

#[test]
fn fixed_block_hash_oracle_is_usable_as_the_orchestrators_oracle() {
    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();
    let mut env = env_info();
    env.number = 10;
    let oracle = FixedBlockHashOracle::new(vec![Default::default(); 3]);
    let schedule = Schedule::new_istanbul();
    let address = Address::from_low_u64_be(30);

    // PUSH1 1, BLOCKHASH, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
    let code = "60014060005260206000f3";
    let params = root_params(address, code, 100_000);
    let mut orchestrator =
        CallOrchestrator::new(&mut state, &mut storage, &oracle, &env, params.origin, 1);
    let (output, _substate) = orchestrator
        .run(ExecutionType::Transaction, params, 0, &schedule)
        .expect("BLOCKHASH against a populated oracle halts normally");

    assert_eq!(output.len(), 32);
}

#[test]
fn staticcall_child_sstore_faults_and_leaves_storage_untouched() {
    let schedule = Schedule::new_istanbul();
    let root_address = Address::from_low_u64_be(40);
    let child_address = Address::from_low_u64_be(41);

    // Child: PUSH1 42, PUSH1 0, SSTORE, STOP -- illegal under STATICCALL.
    let child_code: Vec<u8> = vec![0x60, 0x2a, 0x60, 0x00, 0x55, 0x00];

    // Root: STATICCALL(gas=0xc350, child, in=0/0, out=0/32), store the
    // result word at mem[0..32], then RETURN it.
    let mut root_code = vec![0x60, 0x20, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x73];
    root_code.extend_from_slice(child_address.as_bytes());
    root_code.extend_from_slice(&[0x61, 0xc3, 0x50, 0xfa]);
    root_code.extend_from_slice(&[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3]);

    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();

    state.create_account(root_address, U256::zero());
    let root_hash = state.update_code(root_code.clone());
    state.update_code_hash(&root_address, root_hash);

    state.create_account(child_address, U256::zero());
    let child_hash = state.update_code(child_code);
    state.update_code_hash(&child_address, child_hash);

    let env = env_info();
    let oracle = NullBlockHashOracle;

    let mut params = ActionParams::default();
    params.address = root_address;
    params.code_address = root_address;
    params.sender = Address::from_low_u64_be(0xaaaa);
    params.origin = params.sender;
    params.gas = U256::from(1_000_000);
    params.code = Some(Arc::new(root_code));

    let mut orchestrator =
        CallOrchestrator::new(&mut state, &mut storage, &oracle, &env, params.origin, 1);
    let (output, _substate) = orchestrator
        .run(ExecutionType::Transaction, params, 0, &schedule)
        .expect("the root frame halts normally even though its static child faulted");

    assert_eq!(output.len(), 32);
    assert_eq!(U256::from_big_endian(&output), U256::zero(), "STATICCALL reports failure when its child hits SSTORE");
    assert_eq!(storage.get(&child_address, &H256::zero()), H256::zero(), "the rejected SSTORE never reached storage");
}
