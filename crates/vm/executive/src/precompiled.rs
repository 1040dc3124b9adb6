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

//! Precompile address table and fork gating. `ethcore_builtin` ships
//! the handlers and pricers; this module decides which addresses are
//! reachable for a given `Schedule` and runs the gas-then-execute
//! sequence the orchestrator treats identically to a bytecode callee.

use bytes::BytesRef;
use ethereum_types::{Address, U256};
use ethcore_builtin::{standard_builtins, Builtin};
use vm::Schedule;

/// Returns the precompile at `address`, or `None` if the address isn't
/// a precompile or isn't active yet under `schedule`.
///
/// Addresses 0x01-0x04 (ecrecover/sha256/ripemd160/identity) are
/// active from Frontier. 0x05-0x08 (modexp, the two bn128 ops and
/// pairing) were introduced by EIP-198/196/197 in the same fork that
/// added STATICCALL, so they're gated on `have_static_call`. 0x09
/// (blake2_f, EIP-152) landed in Istanbul alongside CHAINID, so it's
/// gated on `have_chain_id`.
pub fn lookup(address: &Address, schedule: &Schedule) -> Option<Builtin> {
    let low = address.0[19];
    let active = match low {
        1..=4 => true,
        5..=8 => schedule.have_static_call,
        9 => schedule.have_chain_id,
        _ => false,
    };
    if !active {
        return None;
    }
    standard_builtins().remove(address)
}

/// Gas cost of running the precompile at `address` against `input`,
/// or `None` if `address` isn't an active precompile.
pub fn cost(address: &Address, input: &[u8], schedule: &Schedule) -> Option<U256> {
    lookup(address, schedule).map(|b| b.cost(input))
}

/// Run the precompile at `address`. Returns `Ok(output)` on success, or
/// `Err(name)` if the handler itself rejects the input (which does not
/// raise a VM exception — see §4.H: a malformed precompile input
/// yields an empty/zero result word, not a fault).
pub fn execute(address: &Address, input: &[u8], schedule: &Schedule) -> Result<Vec<u8>, &'static str> {
    let builtin = lookup(address, schedule).expect("caller checks `lookup` before `execute`; qed");
    let mut output = Vec::new();
    builtin.execute(input, &mut BytesRef::Flexible(&mut output))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm::Schedule;

    #[test]
    fn identity_is_active_on_every_fork() {
        let schedule = Schedule::new_frontier();
        assert!(lookup(&Address::from_low_u64_be(4), &schedule).is_some());
    }

    #[test]
    fn modexp_is_inactive_before_byzantium() {
        let schedule = Schedule::new_homestead();
        assert!(lookup(&Address::from_low_u64_be(5), &schedule).is_none());
    }

    #[test]
    fn modexp_is_active_from_byzantium() {
        let schedule = Schedule::new_byzantium();
        assert!(lookup(&Address::from_low_u64_be(5), &schedule).is_some());
    }

    #[test]
    fn blake2f_is_active_from_istanbul_only() {
        let byzantium = Schedule::new_byzantium();
        let istanbul = Schedule::new_istanbul();
        assert!(lookup(&Address::from_low_u64_be(9), &byzantium).is_none());
        assert!(lookup(&Address::from_low_u64_be(9), &istanbul).is_some());
    }

    #[test]
    fn non_precompile_address_is_none() {
        let schedule = Schedule::new_istanbul();
        assert!(lookup(&Address::from_low_u64_be(42), &schedule).is_none());
    }
}
