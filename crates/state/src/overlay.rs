//! Per-call request cache.
//!
//! One [`Overlay`] lives for the duration of one outermost precompile call.
//! Reads fall through to the host store and are cached; writes stay in the
//! overlay, marked dirty, until [`Overlay::finish`] flushes them in
//! deterministic order — synchronously, on the calling thread. Every
//! mutation is journaled so a nested peer call can be unwound with
//! [`Overlay::revert_to`] without touching the rest of the call's writes.
//! Emitted logs ride in the journal too: a reverted frame drops its logs.

use crate::error::{Result, StateError};
use crate::kv::StateKv;
use alloy_primitives::{Address, Bytes, LogData, U256};
use std::collections::{BTreeSet, HashMap};

/// A log emitted by a precompile, pending until the call commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Emitting contract.
    pub address: Address,
    /// Topics and data, ABI-encoded exactly as the Solidity event would be.
    pub data: LogData,
}

/// Opaque rollback point returned by [`Overlay::snapshot`].
#[derive(Debug, Clone, Copy)]
pub struct Snapshot(usize);

enum JournalEntry {
    Storage {
        key: (Address, U256),
        prev: Option<U256>,
        was_dirty: bool,
    },
    Balance {
        address: Address,
        prev: Option<U256>,
        was_dirty: bool,
    },
    Nonce {
        address: Address,
        prev: Option<u64>,
        was_dirty: bool,
    },
    Code {
        address: Address,
        prev: Option<Bytes>,
        was_dirty: bool,
    },
    Log,
}

/// Journaled write-back cache over a host store.
pub struct Overlay<'h> {
    host: &'h dyn StateKv,

    storage: HashMap<(Address, U256), U256>,
    dirty_storage: BTreeSet<(Address, U256)>,

    balances: HashMap<Address, U256>,
    dirty_balances: BTreeSet<Address>,

    nonces: HashMap<Address, u64>,
    dirty_nonces: BTreeSet<Address>,

    codes: HashMap<Address, Bytes>,
    dirty_codes: BTreeSet<Address>,

    logs: Vec<LogRecord>,
    journal: Vec<JournalEntry>,
}

impl<'h> Overlay<'h> {
    /// Create an overlay over the given host store.
    pub fn new(host: &'h dyn StateKv) -> Self {
        Self {
            host,
            storage: HashMap::new(),
            dirty_storage: BTreeSet::new(),
            balances: HashMap::new(),
            dirty_balances: BTreeSet::new(),
            nonces: HashMap::new(),
            dirty_nonces: BTreeSet::new(),
            codes: HashMap::new(),
            dirty_codes: BTreeSet::new(),
            logs: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// Read a storage word, through the cache.
    pub fn storage(&mut self, address: Address, slot: U256) -> Result<U256> {
        if let Some(value) = self.storage.get(&(address, slot)) {
            return Ok(*value);
        }
        let value = self.host.storage(address, slot)?;
        self.storage.insert((address, slot), value);
        Ok(value)
    }

    /// Write a storage word into the cache and mark it dirty.
    pub fn set_storage(&mut self, address: Address, slot: U256, value: U256) {
        let key = (address, slot);
        let prev = self.storage.insert(key, value);
        let was_dirty = !self.dirty_storage.insert(key);
        self.journal.push(JournalEntry::Storage {
            key,
            prev,
            was_dirty,
        });
    }

    /// Read an account balance, through the cache.
    pub fn balance(&mut self, address: Address) -> Result<U256> {
        if let Some(value) = self.balances.get(&address) {
            return Ok(*value);
        }
        let value = self.host.balance(address)?;
        self.balances.insert(address, value);
        Ok(value)
    }

    /// Set an account balance.
    pub fn set_balance(&mut self, address: Address, value: U256) {
        let prev = self.balances.insert(address, value);
        let was_dirty = !self.dirty_balances.insert(address);
        self.journal.push(JournalEntry::Balance {
            address,
            prev,
            was_dirty,
        });
    }

    /// Credit an account. Overflow is a fatal chain bug surfaced as an error.
    pub fn add_balance(&mut self, address: Address, amount: U256) -> Result<()> {
        let current = self.balance(address)?;
        let updated = current
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow(address))?;
        self.set_balance(address, updated);
        Ok(())
    }

    /// Debit an account, failing on insufficient funds.
    pub fn sub_balance(&mut self, address: Address, amount: U256) -> Result<()> {
        let current = self.balance(address)?;
        let updated = current
            .checked_sub(amount)
            .ok_or(StateError::InsufficientBalance(address))?;
        self.set_balance(address, updated);
        Ok(())
    }

    /// Move value between accounts.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        if amount.is_zero() || from == to {
            return Ok(());
        }
        self.sub_balance(from, amount)?;
        self.add_balance(to, amount)
    }

    /// Read an account nonce, through the cache.
    pub fn nonce(&mut self, address: Address) -> Result<u64> {
        if let Some(value) = self.nonces.get(&address) {
            return Ok(*value);
        }
        let value = self.host.nonce(address)?;
        self.nonces.insert(address, value);
        Ok(value)
    }

    /// Set an account nonce.
    pub fn set_nonce(&mut self, address: Address, value: u64) {
        let prev = self.nonces.insert(address, value);
        let was_dirty = !self.dirty_nonces.insert(address);
        self.journal.push(JournalEntry::Nonce {
            address,
            prev,
            was_dirty,
        });
    }

    /// Read account code, through the cache.
    pub fn code(&mut self, address: Address) -> Result<Bytes> {
        if let Some(code) = self.codes.get(&address) {
            return Ok(code.clone());
        }
        let code = self.host.code(address)?;
        self.codes.insert(address, code.clone());
        Ok(code)
    }

    /// Set account code.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        let prev = self.codes.insert(address, code);
        let was_dirty = !self.dirty_codes.insert(address);
        self.journal.push(JournalEntry::Code {
            address,
            prev,
            was_dirty,
        });
    }

    /// Buffer a log; it only survives if the emitting frame commits.
    pub fn emit_log(&mut self, address: Address, data: LogData) {
        self.logs.push(LogRecord { address, data });
        self.journal.push(JournalEntry::Log);
    }

    /// Logs emitted so far (pending).
    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    /// Take a rollback point before entering a nested call frame.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.journal.len())
    }

    /// Unwind every mutation made after `snapshot`.
    pub fn revert_to(&mut self, snapshot: Snapshot) {
        while self.journal.len() > snapshot.0 {
            match self.journal.pop().expect("journal is non-empty") {
                JournalEntry::Storage {
                    key,
                    prev,
                    was_dirty,
                } => {
                    match prev {
                        Some(value) => {
                            self.storage.insert(key, value);
                        }
                        None => {
                            self.storage.remove(&key);
                        }
                    }
                    if !was_dirty {
                        self.dirty_storage.remove(&key);
                    }
                }
                JournalEntry::Balance {
                    address,
                    prev,
                    was_dirty,
                } => {
                    match prev {
                        Some(value) => {
                            self.balances.insert(address, value);
                        }
                        None => {
                            self.balances.remove(&address);
                        }
                    }
                    if !was_dirty {
                        self.dirty_balances.remove(&address);
                    }
                }
                JournalEntry::Nonce {
                    address,
                    prev,
                    was_dirty,
                } => {
                    match prev {
                        Some(value) => {
                            self.nonces.insert(address, value);
                        }
                        None => {
                            self.nonces.remove(&address);
                        }
                    }
                    if !was_dirty {
                        self.dirty_nonces.remove(&address);
                    }
                }
                JournalEntry::Code {
                    address,
                    prev,
                    was_dirty,
                } => {
                    match prev {
                        Some(code) => {
                            self.codes.insert(address, code);
                        }
                        None => {
                            self.codes.remove(&address);
                        }
                    }
                    if !was_dirty {
                        self.dirty_codes.remove(&address);
                    }
                }
                JournalEntry::Log => {
                    self.logs.pop();
                }
            }
        }
    }

    /// Flush dirty entries to the host in deterministic order and return the
    /// committed logs. Drains the overlay; on revert, drop it unflushed
    /// instead.
    pub fn finish(&mut self) -> Result<Vec<LogRecord>> {
        let slots = self.dirty_storage.len();
        for key in &self.dirty_storage {
            let value = self.storage[key];
            self.host.set_storage(key.0, key.1, value)?;
        }
        for address in &self.dirty_balances {
            self.host.set_balance(*address, self.balances[address])?;
        }
        for address in &self.dirty_nonces {
            self.host.set_nonce(*address, self.nonces[address])?;
        }
        for address in &self.dirty_codes {
            self.host.set_code(*address, self.codes[address].clone())?;
        }
        self.dirty_storage.clear();
        self.dirty_balances.clear();
        self.dirty_nonces.clear();
        self.dirty_codes.clear();
        self.journal.clear();
        let logs = std::mem::take(&mut self.logs);
        tracing::debug!(slots, logs = logs.len(), "flushed request cache");
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKv;
    use alloy_primitives::B256;

    fn log(topic: u8) -> LogData {
        LogData::new_unchecked(vec![B256::repeat_byte(topic)], Bytes::new())
    }

    #[test]
    fn reads_fall_through_and_cache() {
        let kv = InMemoryKv::new();
        let addr = Address::repeat_byte(1);
        kv.set_storage(addr, U256::from(7), U256::from(42)).unwrap();

        let mut overlay = Overlay::new(&kv);
        assert_eq!(overlay.storage(addr, U256::from(7)).unwrap(), U256::from(42));

        // Host changes after the first read are not observed again.
        kv.set_storage(addr, U256::from(7), U256::from(43)).unwrap();
        assert_eq!(overlay.storage(addr, U256::from(7)).unwrap(), U256::from(42));
    }

    #[test]
    fn writes_stay_pending_until_finish() {
        let kv = InMemoryKv::new();
        let addr = Address::repeat_byte(2);

        let mut overlay = Overlay::new(&kv);
        overlay.set_storage(addr, U256::from(1), U256::from(10));
        assert_eq!(kv.storage(addr, U256::from(1)).unwrap(), U256::ZERO);

        overlay.finish().unwrap();
        assert_eq!(kv.storage(addr, U256::from(1)).unwrap(), U256::from(10));
    }

    #[test]
    fn dropping_the_overlay_discards_writes() {
        let kv = InMemoryKv::new();
        let addr = Address::repeat_byte(3);
        {
            let mut overlay = Overlay::new(&kv);
            overlay.set_storage(addr, U256::from(1), U256::from(10));
            overlay.set_balance(addr, U256::from(5));
        }
        assert_eq!(kv.storage(addr, U256::from(1)).unwrap(), U256::ZERO);
        assert_eq!(kv.balance(addr).unwrap(), U256::ZERO);
    }

    #[test]
    fn revert_unwinds_storage_balances_and_logs() {
        let kv = InMemoryKv::new();
        let addr = Address::repeat_byte(4);
        kv.set_balance(addr, U256::from(100)).unwrap();

        let mut overlay = Overlay::new(&kv);
        overlay.set_storage(addr, U256::from(1), U256::from(11));
        overlay.emit_log(addr, log(1));

        let snap = overlay.snapshot();
        overlay.set_storage(addr, U256::from(1), U256::from(22));
        overlay.set_storage(addr, U256::from(2), U256::from(33));
        overlay.sub_balance(addr, U256::from(40)).unwrap();
        overlay.emit_log(addr, log(2));
        overlay.revert_to(snap);

        assert_eq!(overlay.storage(addr, U256::from(1)).unwrap(), U256::from(11));
        assert_eq!(overlay.storage(addr, U256::from(2)).unwrap(), U256::ZERO);
        assert_eq!(overlay.balance(addr).unwrap(), U256::from(100));
        assert_eq!(overlay.logs().len(), 1);

        // The pre-snapshot write still flushes; the unwound ones do not.
        overlay.finish().unwrap();
        assert_eq!(kv.storage(addr, U256::from(1)).unwrap(), U256::from(11));
        assert_eq!(kv.storage(addr, U256::from(2)).unwrap(), U256::ZERO);
        assert_eq!(kv.balance(addr).unwrap(), U256::from(100));
    }

    #[test]
    fn nested_snapshots_unwind_in_order() {
        let kv = InMemoryKv::new();
        let addr = Address::repeat_byte(5);

        let mut overlay = Overlay::new(&kv);
        overlay.set_storage(addr, U256::from(1), U256::from(1));
        let outer = overlay.snapshot();
        overlay.set_storage(addr, U256::from(1), U256::from(2));
        let inner = overlay.snapshot();
        overlay.set_storage(addr, U256::from(1), U256::from(3));

        overlay.revert_to(inner);
        assert_eq!(overlay.storage(addr, U256::from(1)).unwrap(), U256::from(2));
        overlay.revert_to(outer);
        assert_eq!(overlay.storage(addr, U256::from(1)).unwrap(), U256::from(1));
    }

    #[test]
    fn transfer_moves_value_and_checks_funds() {
        let kv = InMemoryKv::new();
        let from = Address::repeat_byte(6);
        let to = Address::repeat_byte(7);
        kv.set_balance(from, U256::from(50)).unwrap();

        let mut overlay = Overlay::new(&kv);
        overlay.transfer(from, to, U256::from(20)).unwrap();
        assert_eq!(overlay.balance(from).unwrap(), U256::from(30));
        assert_eq!(overlay.balance(to).unwrap(), U256::from(20));

        let err = overlay.transfer(from, to, U256::from(31)).unwrap_err();
        assert!(matches!(err, StateError::InsufficientBalance(a) if a == from));
    }

    #[test]
    fn flush_order_is_deterministic() {
        // Two overlays writing the same set in different orders leave the
        // host stores byte-identical.
        let addr_a = Address::repeat_byte(8);
        let addr_b = Address::repeat_byte(9);

        let kv1 = InMemoryKv::new();
        let mut o1 = Overlay::new(&kv1);
        o1.set_storage(addr_b, U256::from(2), U256::from(22));
        o1.set_storage(addr_a, U256::from(1), U256::from(11));
        o1.finish().unwrap();

        let kv2 = InMemoryKv::new();
        let mut o2 = Overlay::new(&kv2);
        o2.set_storage(addr_a, U256::from(1), U256::from(11));
        o2.set_storage(addr_b, U256::from(2), U256::from(22));
        o2.finish().unwrap();

        assert_eq!(kv1.storage_of(addr_a), kv2.storage_of(addr_a));
        assert_eq!(kv1.storage_of(addr_b), kv2.storage_of(addr_b));
    }
}
