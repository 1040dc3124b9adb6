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

//! In-memory reference implementation of the `StateStore`/`StorageStore`
//! collaborators the interpreter specification leaves external. This
//! stands in for the trie/database layer (out of scope, see crate
//! docs) so the orchestrator and its tests can run end to end without
//! a real client.

use std::{collections::HashMap, sync::Arc};

use ethereum_types::{Address, H256, U256};
use keccak_hash::{keccak, KECCAK_EMPTY};

/// How an account that becomes empty (nonce=0, balance=0, no code)
/// after a balance mutation should be treated, mirroring the
/// `no_empty`/`kill_empty` halves of `Schedule` a real client wires
/// through `state_db`'s cleanup mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Never delete empty accounts (pre-EIP-161 behaviour).
    NoEmpty,
    /// Delete an account if, after this mutation, it is dead.
    KillEmpty,
}

/// One account's mutable fields, as tracked by `InMemoryStateStore`.
#[derive(Debug, Clone)]
struct Account {
    balance: U256,
    nonce: U256,
    code_hash: H256,
}

impl Default for Account {
    fn default() -> Self {
        Account {
            balance: U256::zero(),
            nonce: U256::zero(),
            code_hash: KECCAK_EMPTY,
        }
    }
}

impl Account {
    fn is_dead(&self) -> bool {
        self.nonce.is_zero() && self.balance.is_zero() && self.code_hash == KECCAK_EMPTY
    }
}

/// One undoable mutation, appended to `InMemoryStateStore::journal` in
/// the order applied. `restore` replays the tail of this log backwards.
enum StateJournalEntry {
    /// Account didn't exist before; undo deletes it outright.
    Created(Address),
    /// Account existed with this snapshot of fields; undo restores it.
    Mutated(Address, Account),
    /// Account existed and was removed; undo reinstates it.
    Deleted(Address, Account),
}

/// Account/world-state collaborator the interpreter's orchestrator
/// reads and mutates but never owns directly (§6 of the design doc).
/// A real client backs this with a merkle-patricia trie; this crate
/// ships only the in-memory reference implementation below.
pub trait StateStore {
    type Snapshot;

    fn account_exists(&self, address: &Address) -> bool;
    fn create_account(&mut self, address: Address, balance: U256);
    fn add_balance(&mut self, address: &Address, incr: &U256, cleanup_mode: CleanupMode);
    fn sub_balance(&mut self, address: &Address, decr: &U256, cleanup_mode: CleanupMode);
    fn transfer_balance(&mut self, from: &Address, to: &Address, value: &U256, cleanup_mode: CleanupMode);
    fn get_balance(&self, address: &Address) -> U256;
    fn get_nonce(&self, address: &Address) -> U256;
    fn increment_nonce(&mut self, address: &Address);
    fn get_code_hash(&self, address: &Address) -> Option<H256>;
    fn get_code(&self, hash: &H256) -> Option<Arc<Vec<u8>>>;
    fn get_code_size(&self, address: &Address) -> Option<usize>;
    fn update_code(&mut self, code: Vec<u8>) -> H256;
    fn update_code_hash(&mut self, address: &Address, hash: H256);
    fn is_dead_account(&self, address: &Address) -> bool;
    fn delete_account(&mut self, address: &Address);
    fn take_snapshot(&mut self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: Self::Snapshot);
}

/// A`HashMap`-backed `StateStore`, with `take_snapshot`/`restore`
/// implemented as an append-only undo journal truncated on restore —
/// the in-memory analogue of a client's checkpoint stack over its
/// trie-backed `State`.
#[derive(Default)]
pub struct InMemoryStateStore {
    accounts: HashMap<Address, Account>,
    code_db: HashMap<H256, Arc<Vec<u8>>>,
    journal: Vec<StateJournalEntry>,
}

/// Opaque snapshot token: an index into the state journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot(usize);

impl InMemoryStateStore {
    pub fn new() -> Self {
        InMemoryStateStore::default()
    }

    fn entry(&mut self, address: Address) -> &mut Account {
        self.accounts.entry(address).or_insert_with(Account::default)
    }

    fn record_mutation(&mut self, address: Address, before: Option<Account>) {
        match before {
            None => self.journal.push(StateJournalEntry::Created(address)),
            Some(prev) => self.journal.push(StateJournalEntry::Mutated(address, prev)),
        }
    }

    pub fn account_exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    pub fn create_account(&mut self, address: Address, balance: U256) {
        let existed = self.accounts.contains_key(&address);
        let before = if existed { Some(self.accounts[&address].clone()) } else { None };
        self.accounts.insert(
            address,
            Account {
                balance,
                nonce: U256::zero(),
                code_hash: KECCAK_EMPTY,
            },
        );
        self.record_mutation(address, before);
    }

    pub fn get_balance(&self, address: &Address) -> U256 {
        self.accounts.get(address).map_or(U256::zero(), |a| a.balance)
    }

    pub fn get_nonce(&self, address: &Address) -> U256 {
        self.accounts.get(address).map_or(U256::zero(), |a| a.nonce)
    }

    pub fn increment_nonce(&mut self, address: &Address) {
        let before = self.accounts.get(address).cloned();
        let account = self.entry(*address);
        account.nonce = account.nonce + U256::one();
        self.record_mutation(*address, before);
    }

    pub fn add_balance(&mut self, address: &Address, incr: &U256, cleanup_mode: CleanupMode) {
        if incr.is_zero() && cleanup_mode == CleanupMode::KillEmpty {
            // A zero-value transfer still "touches" the recipient for
            // EIP-161 purposes; note the account but don't mutate it.
            self.entry(*address);
            return;
        }
        let before = self.accounts.get(address).cloned();
        let account = self.entry(*address);
        account.balance = account.balance + *incr;
        self.record_mutation(*address, before);
    }

    pub fn sub_balance(&mut self, address: &Address, decr: &U256, cleanup_mode: CleanupMode) {
        let before = self.accounts.get(address).cloned();
        let account = self.entry(*address);
        account.balance = account.balance - *decr;
        let dead = account.is_dead();
        self.record_mutation(*address, before);
        if cleanup_mode == CleanupMode::KillEmpty && dead {
            self.delete_account(address);
        }
    }

    pub fn transfer_balance(&mut self, from: &Address, to: &Address, value: &U256, cleanup_mode: CleanupMode) {
        self.sub_balance(from, value, cleanup_mode);
        self.add_balance(to, value, cleanup_mode);
    }

    pub fn get_code_hash(&self, address: &Address) -> Option<H256> {
        self.accounts.get(address).map(|a| a.code_hash)
    }

    pub fn get_code(&self, hash: &H256) -> Option<Arc<Vec<u8>>> {
        if *hash == KECCAK_EMPTY {
            return Some(Arc::new(Vec::new()));
        }
        self.code_db.get(hash).cloned()
    }

    pub fn get_code_size(&self, address: &Address) -> Option<usize> {
        self.get_code_hash(address).and_then(|h| self.get_code(&h)).map(|c| c.len())
    }

    /// Insert `code` into the content-addressed code store, returning
    /// its hash. Does not associate the code with any account; callers
    /// pair this with `update_code_hash`.
    pub fn update_code(&mut self, code: Vec<u8>) -> H256 {
        if code.is_empty() {
            return KECCAK_EMPTY;
        }
        let hash = keccak(&code);
        self.code_db.entry(hash).or_insert_with(|| Arc::new(code));
        hash
    }

    pub fn update_code_hash(&mut self, address: &Address, hash: H256) {
        let before = self.accounts.get(address).cloned();
        let account = self.entry(*address);
        account.code_hash = hash;
        self.record_mutation(*address, before);
    }

    /// EIP-158: dead iff nonce=0, balance=0, and no code. A never-seen
    /// address is vacuously dead.
    pub fn is_dead_account(&self, address: &Address) -> bool {
        self.accounts.get(address).map_or(true, Account::is_dead)
    }

    pub fn delete_account(&mut self, address: &Address) {
        if let Some(account) = self.accounts.remove(address) {
            self.journal.push(StateJournalEntry::Deleted(*address, account));
        }
    }

    pub fn take_snapshot(&mut self) -> StateSnapshot {
        StateSnapshot(self.journal.len())
    }

    pub fn restore(&mut self, snapshot: StateSnapshot) {
        while self.journal.len() > snapshot.0 {
            match self.journal.pop().expect("loop condition guards non-empty; qed") {
                StateJournalEntry::Created(address) => {
                    self.accounts.remove(&address);
                }
                StateJournalEntry::Mutated(address, prev) => {
                    self.accounts.insert(address, prev);
                }
                StateJournalEntry::Deleted(address, prev) => {
                    self.accounts.insert(address, prev);
                }
            }
        }
    }
}

impl StateStore for InMemoryStateStore {
    type Snapshot = StateSnapshot;

    fn account_exists(&self, address: &Address) -> bool {
        self.account_exists(address)
    }
    fn create_account(&mut self, address: Address, balance: U256) {
        self.create_account(address, balance)
    }
    fn add_balance(&mut self, address: &Address, incr: &U256, cleanup_mode: CleanupMode) {
        self.add_balance(address, incr, cleanup_mode)
    }
    fn sub_balance(&mut self, address: &Address, decr: &U256, cleanup_mode: CleanupMode) {
        self.sub_balance(address, decr, cleanup_mode)
    }
    fn transfer_balance(&mut self, from: &Address, to: &Address, value: &U256, cleanup_mode: CleanupMode) {
        self.transfer_balance(from, to, value, cleanup_mode)
    }
    fn get_balance(&self, address: &Address) -> U256 {
        self.get_balance(address)
    }
    fn get_nonce(&self, address: &Address) -> U256 {
        self.get_nonce(address)
    }
    fn increment_nonce(&mut self, address: &Address) {
        self.increment_nonce(address)
    }
    fn get_code_hash(&self, address: &Address) -> Option<H256> {
        self.get_code_hash(address)
    }
    fn get_code(&self, hash: &H256) -> Option<Arc<Vec<u8>>> {
        self.get_code(hash)
    }
    fn get_code_size(&self, address: &Address) -> Option<usize> {
        self.get_code_size(address)
    }
    fn update_code(&mut self, code: Vec<u8>) -> H256 {
        self.update_code(code)
    }
    fn update_code_hash(&mut self, address: &Address, hash: H256) {
        self.update_code_hash(address, hash)
    }
    fn is_dead_account(&self, address: &Address) -> bool {
        self.is_dead_account(address)
    }
    fn delete_account(&mut self, address: &Address) {
        self.delete_account(address)
    }
    fn take_snapshot(&mut self) -> StateSnapshot {
        self.take_snapshot()
    }
    fn restore(&mut self, snapshot: StateSnapshot) {
        self.restore(snapshot)
    }
}

/// Per-`(address, slot)` persistent storage collaborator, kept
/// separate from `StateStore` per §6 since a real client backs it with
/// a distinct per-account storage trie.
pub trait StorageStore {
    type Snapshot;

    fn get(&self, address: &Address, key: &H256) -> H256;
    fn set(&mut self, address: Address, key: H256, value: H256);
    fn take_snapshot(&mut self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: Self::Snapshot);
}

/// A `HashMap`-backed `StorageStore`, keyed by `(address, slot)`, with
/// the same undo-journal snapshot discipline as `InMemoryStateStore`.
/// Zero-valued writes are stored as an absent entry, matching the
/// convention callers rely on (missing == zero).
#[derive(Default)]
pub struct InMemoryStorageStore {
    slots: HashMap<(Address, H256), H256>,
    journal: Vec<((Address, H256), Option<H256>)>,
}

/// Opaque snapshot token: an index into the storage journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSnapshot(usize);

impl InMemoryStorageStore {
    pub fn new() -> Self {
        InMemoryStorageStore::default()
    }

    pub fn get(&self, address: &Address, key: &H256) -> H256 {
        self.slots.get(&(*address, *key)).copied().unwrap_or_default()
    }

    pub fn set(&mut self, address: Address, key: H256, value: H256) {
        let k = (address, key);
        let before = self.slots.get(&k).copied();
        if value.is_zero() {
            self.slots.remove(&k);
        } else {
            self.slots.insert(k, value);
        }
        self.journal.push((k, before));
    }

    pub fn take_snapshot(&mut self) -> StorageSnapshot {
        StorageSnapshot(self.journal.len())
    }

    pub fn restore(&mut self, snapshot: StorageSnapshot) {
        while self.journal.len() > snapshot.0 {
            let (key, before) = self.journal.pop().expect("loop condition guards non-empty; qed");
            match before {
                Some(value) => {
                    self.slots.insert(key, value);
                }
                None => {
                    self.slots.remove(&key);
                }
            }
        }
    }
}

impl StorageStore for InMemoryStorageStore {
    type Snapshot = StorageSnapshot;

    fn get(&self, address: &Address, key: &H256) -> H256 {
        self.get(address, key)
    }
    fn set(&mut self, address: Address, key: H256, value: H256) {
        self.set(address, key, value)
    }
    fn take_snapshot(&mut self) -> StorageSnapshot {
        self.take_snapshot()
    }
    fn restore(&mut self, snapshot: StorageSnapshot) {
        self.restore(snapshot)
    }
}

/// Resolves `BLOCKHASH`. `None` pushes 32 zero bytes onto the stack.
pub trait BlockHashOracle {
    fn get(&self, current_number: u64, block_number: &U256) -> Option<H256>;
}

/// Always misses — used when a caller has no block history available
/// (e.g. the debug CLI running raw bytecode with no chain behind it).
pub struct NullBlockHashOracle;

impl BlockHashOracle for NullBlockHashOracle {
    fn get(&self, _current_number: u64, _block_number: &U256) -> Option<H256> {
        None
    }
}

/// Serves a fixed window of recent hashes, most-recent-first, matching
/// `EnvInfo::last_hashes`'s convention.
pub struct FixedBlockHashOracle {
    last_hashes: Vec<H256>,
}

impl FixedBlockHashOracle {
    pub fn new(last_hashes: Vec<H256>) -> Self {
        FixedBlockHashOracle { last_hashes }
    }
}

impl BlockHashOracle for FixedBlockHashOracle {
    fn get(&self, current_number: u64, block_number: &U256) -> Option<H256> {
        if *block_number >= U256::from(current_number) {
            return None;
        }
        let distance = current_number - block_number.low_u64();
        if distance == 0 || distance > 256 || distance as usize > self.last_hashes.len() {
            return None;
        }
        Some(self.last_hashes[distance as usize - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_account_is_dead() {
        let store = InMemoryStateStore::new();
        assert!(store.is_dead_account(&Address::zero()));
    }

    #[test]
    fn add_balance_then_restore_is_a_no_op() {
        let mut store = InMemoryStateStore::new();
        let addr = Address::from_low_u64_be(1);
        let snap = store.take_snapshot();
        store.add_balance(&addr, &U256::from(100), CleanupMode::NoEmpty);
        assert_eq!(store.get_balance(&addr), U256::from(100));
        store.restore(snap);
        assert_eq!(store.get_balance(&addr), U256::zero());
        assert!(!store.account_exists(&addr));
    }

    #[test]
    fn sub_balance_to_zero_kills_empty_account() {
        let mut store = InMemoryStateStore::new();
        let addr = Address::from_low_u64_be(2);
        store.add_balance(&addr, &U256::from(50), CleanupMode::NoEmpty);
        store.sub_balance(&addr, &U256::from(50), CleanupMode::KillEmpty);
        assert!(!store.account_exists(&addr));
    }

    #[test]
    fn code_is_content_addressed() {
        let mut store = InMemoryStateStore::new();
        let hash1 = store.update_code(vec![1, 2, 3]);
        let hash2 = store.update_code(vec![1, 2, 3]);
        assert_eq!(hash1, hash2);
        assert_eq!(&*store.get_code(&hash1).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn empty_code_hash_is_keccak_empty() {
        let mut store = InMemoryStateStore::new();
        assert_eq!(store.update_code(Vec::new()), KECCAK_EMPTY);
        assert_eq!(store.get_code(&KECCAK_EMPTY).unwrap().len(), 0);
    }

    #[test]
    fn storage_snapshot_restore_round_trips() {
        let mut store = InMemoryStorageStore::new();
        let addr = Address::from_low_u64_be(3);
        let key = H256::from_low_u64_be(7);
        store.set(addr, key, H256::from_low_u64_be(9));
        let snap = store.take_snapshot();
        store.set(addr, key, H256::from_low_u64_be(42));
        assert_eq!(store.get(&addr, &key), H256::from_low_u64_be(42));
        store.restore(snap);
        assert_eq!(store.get(&addr, &key), H256::from_low_u64_be(9));
    }

    #[test]
    fn zero_value_write_is_stored_as_absent() {
        let mut store = InMemoryStorageStore::new();
        let addr = Address::from_low_u64_be(4);
        let key = H256::from_low_u64_be(1);
        store.set(addr, key, H256::from_low_u64_be(5));
        store.set(addr, key, H256::zero());
        assert_eq!(store.get(&addr, &key), H256::zero());
        assert!(!store.slots.contains_key(&(addr, key)));
    }

    #[test]
    fn fixed_block_hash_oracle_windows_correctly() {
        let hashes: Vec<H256> = (1u64..=5).map(H256::from_low_u64_be).collect();
        let oracle = FixedBlockHashOracle::new(hashes.clone());
        assert_eq!(oracle.get(10, &U256::from(9)), Some(hashes[0]));
        assert_eq!(oracle.get(10, &U256::from(5)), Some(hashes[4]));
        assert_eq!(oracle.get(10, &U256::from(4)), None);
        assert_eq!(oracle.get(10, &U256::from(10)), None);
    }
}
