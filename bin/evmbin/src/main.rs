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

//! `evm` is a thin debug harness around `executive::CallOrchestrator`:
//! it runs a single piece of bytecode (as a call or a contract
//! creation) against an empty in-memory state and reports the gas
//! spent and the output produced. It is an operator convenience, not
//! part of the interpreter itself — nothing under `crates/vm` depends
//! on this binary.

use std::sync::Arc;

use docopt::Docopt;
use ethereum_types::{Address, U256};
use executive::{CallOrchestrator, ExecutionType, InMemoryStateStore, InMemoryStorageStore, NullBlockHashOracle};
use rustc_hex::{FromHex, ToHex};
use serde::Deserialize;
use vm::{ActionParams, EnvInfo, Schedule};

const USAGE: &str = "
EVM implementation for Parity.

Usage:
    evm [options]
    evm [-h | --help]

Options:
    --code CODE          Contract code as hex (without 0x).
    --create              Treat the code as init code and run a contract creation instead of a call.
    --input DATA          Input data as hex (without 0x).
    --gas GAS             Gas to start with [default: 4700000].
    --gas-price WEI        Gas price [default: 0].
    --value WEI            Endowment/call value [default: 0].
    --sender ADDRESS        Sender/origin address [default: 0000000000000000000000000000000000000000].
    --schedule SCHEDULE     Gas schedule: frontier, homestead, byzantium, constantinople, istanbul, berlin, london [default: london].
    --chain-id ID           Chain id exposed to CHAINID [default: 1].
    -h, --help              Print this help text.

If --code is not given, it is read as a hex string from stdin.
";

#[derive(Debug, Deserialize)]
struct Args {
    flag_code: Option<String>,
    flag_create: bool,
    flag_input: Option<String>,
    flag_gas: String,
    flag_gas_price: String,
    flag_value: String,
    flag_sender: String,
    flag_schedule: String,
    flag_chain_id: u64,
}

#[derive(serde::Serialize)]
struct RunResult {
    success: bool,
    // `CallOrchestrator::run` reports only the root frame's output and
    // substate, not its leftover gas (see DESIGN.md) — this is the gas
    // the run started with, not what it spent.
    gas_provided: String,
    output: String,
    logs: usize,
    suicides: usize,
    error: Option<String>,
}

fn schedule_for(name: &str) -> Schedule {
    match name {
        "frontier" => Schedule::new_frontier(),
        "homestead" => Schedule::new_homestead(),
        "byzantium" => Schedule::new_byzantium(),
        "constantinople" => Schedule::new_constantinople(),
        "istanbul" => Schedule::new_istanbul(),
        "berlin" => Schedule::new_berlin(),
        "london" => Schedule::new_london(),
        other => {
            eprintln!("unknown schedule '{other}', falling back to london");
            Schedule::new_london()
        }
    }
}

fn parse_u256(label: &str, value: &str) -> U256 {
    U256::from_dec_str(value)
        .or_else(|_| U256::from_str_radix(value.trim_start_matches("0x"), 16))
        .unwrap_or_else(|_| panic!("invalid {label}: {value}"))
}

fn read_code(args: &Args) -> Vec<u8> {
    let hex = match &args.flag_code {
        Some(code) => code.clone(),
        None => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf).expect("reading code from stdin");
            buf.trim().to_owned()
        }
    };
    hex.trim_start_matches("0x").from_hex().expect("--code must be valid hex")
}

fn main() {
    env_logger::init();

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    let code = read_code(&args);
    let input = args
        .flag_input
        .as_deref()
        .map(|s| s.trim_start_matches("0x").from_hex().expect("--input must be valid hex"))
        .unwrap_or_default();
    let sender: Address = args.flag_sender.parse().expect("--sender must be a 20-byte hex address");
    let gas = parse_u256("--gas", &args.flag_gas);
    let gas_price = parse_u256("--gas-price", &args.flag_gas_price);
    let value = parse_u256("--value", &args.flag_value);
    let schedule = schedule_for(&args.flag_schedule);

    let mut params = ActionParams::default();
    params.sender = sender;
    params.origin = sender;
    params.gas = gas;
    params.gas_price = gas_price;
    params.value = vm::ActionValue::Transfer(value);
    params.data = Some(input);

    // Unlike a nested CREATE (which `executive::CallOrchestrator` seeds
    // itself via `push_create_child`), the root frame's target account
    // is this caller's responsibility — a real transaction executor
    // would create it and move `value` in before the init code runs.
    // This harness skips that: it's only exercising the interpreter.
    let kind = if args.flag_create {
        params.address = Address::from_low_u64_be(0xbeef);
        params.code = Some(Arc::new(code));
        ExecutionType::DirectCreate
    } else {
        params.address = Address::from_low_u64_be(0xf00d);
        params.code_address = params.address;
        params.code = Some(Arc::new(code));
        ExecutionType::Transaction
    };

    let mut state = InMemoryStateStore::new();
    let mut storage = InMemoryStorageStore::new();
    let block_hash = NullBlockHashOracle;
    let env_info = EnvInfo::default();

    let mut orchestrator = CallOrchestrator::new(&mut state, &mut storage, &block_hash, &env_info, sender, args.flag_chain_id);

    let result = match orchestrator.run(kind, params, 0, &schedule) {
        Ok((output, substate)) => RunResult {
            success: true,
            gas_provided: format!("0x{gas:x}"),
            output: format!("0x{}", output.to_hex::<String>()),
            logs: substate.logs.len(),
            suicides: substate.suicides.len(),
            error: None,
        },
        Err(err) => RunResult {
            success: false,
            gas_provided: format!("0x{gas:x}"),
            output: "0x".to_owned(),
            logs: 0,
            suicides: 0,
            error: Some(err.to_string()),
        },
    };

    println!("{}", serde_json::to_string_pretty(&result).expect("RunResult always serializes"));
}
