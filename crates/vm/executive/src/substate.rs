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

//! Per-frame accumulator for everything that must outlive the frame
//! that produced it but only become visible once that frame's parent
//! accepts its result: logs, the self-destruct set and the refund
//! counter.

use bytes::Bytes;
use ethereum_types::{Address, H256};
use std::collections::HashSet;
use vm::AccessList;

/// A single `LOGn` emission, recorded with the address of the
/// contract that emitted it (which is not necessarily the account
/// `CALL`ed at the top of the current frame, under `DELEGATECALL`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

/// State collected by a single frame's execution that is either
/// discarded (on revert) or folded into the parent's own substate (on
/// success).
#[derive(Debug, Clone)]
pub struct Substate {
    /// Logs emitted so far, in emission order.
    pub logs: Vec<LogEntry>,
    /// Accounts marked for deletion by `SUICIDE`, with the address
    /// that should receive their remaining balance.
    pub suicides: HashSet<(Address, Address)>,
    /// Net refund accrued from `SSTORE` clears, positive or negative.
    pub sstore_clears_refund: i128,
    /// Addresses and storage keys touched this transaction (EIP-2929/2930).
    pub access_list: AccessList,
}

impl Substate {
    /// A fresh substate sharing the given access list bookkeeping.
    pub fn new(access_list: AccessList) -> Substate {
        Substate {
            logs: Vec::new(),
            suicides: HashSet::new(),
            sstore_clears_refund: 0,
            access_list,
        }
    }

    /// Fold a completed child frame's substate into this one. Called
    /// only when the child's frame is accepted (it halted or the
    /// parent chooses to keep a reverted call's access-list side
    /// effects, which EIP-2929 requires even on revert).
    pub fn accrue(&mut self, mut child: Substate) {
        self.logs.append(&mut child.logs);
        self.suicides.extend(child.suicides);
        self.sstore_clears_refund += child.sstore_clears_refund;
        self.access_list = child.access_list;
    }

    /// Fold only the parts of a child substate that EIP-2929 requires
    /// to survive a revert: the accessed-address/storage-key sets.
    /// Logs, suicides and the SSTORE refund are dropped.
    pub fn accrue_access_list_only(&mut self, child: Substate) {
        self.access_list = child.access_list;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accrue_merges_logs_and_refund() {
        let mut parent = Substate::new(AccessList::new(false));
        let mut child = Substate::new(AccessList::new(false));
        child.logs.push(LogEntry { address: Address::zero(), topics: vec![], data: vec![1] });
        child.sstore_clears_refund = 15000;
        parent.accrue(child);
        assert_eq!(parent.logs.len(), 1);
        assert_eq!(parent.sstore_clears_refund, 15000);
    }

    #[test]
    fn revert_still_keeps_access_list() {
        let mut parent = Substate::new(AccessList::new(true));
        let mut child = Substate::new(AccessList::new(true));
        child.access_list.insert_address(Address::from_low_u64_be(9));
        parent.accrue_access_list_only(child);
        assert!(parent.access_list.contains_address(&Address::from_low_u64_be(9)));
    }
}
