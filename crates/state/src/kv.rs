//! Host key-value store abstraction.
//!
//! The node's account database is an external collaborator; the precompiles
//! only need flat access to storage words, balances, nonces and code. The
//! trait decouples the suite from the storage backend the same way the
//! execution layer's provider trait does for the EVM database.

use crate::error::Result;
use alloy_primitives::{Address, Bytes, U256};
use dashmap::DashMap;
use std::sync::Arc;

/// Flat account-state access as the host EVM exposes it to native contracts.
///
/// Missing entries read as zero/empty; implementations must not distinguish
/// "absent" from "zero" because the Solidity semantics don't.
pub trait StateKv: Send + Sync {
    /// Read a storage word.
    fn storage(&self, address: Address, slot: U256) -> Result<U256>;

    /// Write a storage word.
    fn set_storage(&self, address: Address, slot: U256, value: U256) -> Result<()>;

    /// Read an account balance.
    fn balance(&self, address: Address) -> Result<U256>;

    /// Set an account balance.
    fn set_balance(&self, address: Address, value: U256) -> Result<()>;

    /// Read an account nonce.
    fn nonce(&self, address: Address) -> Result<u64>;

    /// Set an account nonce.
    fn set_nonce(&self, address: Address, value: u64) -> Result<()>;

    /// Read account code.
    fn code(&self, address: Address) -> Result<Bytes>;

    /// Set account code.
    fn set_code(&self, address: Address, code: Bytes) -> Result<()>;
}

/// In-memory host store for tests and genesis construction.
///
/// Stores state in concurrent hash maps; not persistent.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKv {
    storage: Arc<DashMap<(Address, U256), U256>>,
    balances: Arc<DashMap<Address, U256>>,
    nonces: Arc<DashMap<Address, u64>>,
    codes: Arc<DashMap<Address, Bytes>>,
}

impl InMemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (nonzero) storage entries, across all contracts.
    pub fn storage_len(&self) -> usize {
        self.storage.len()
    }

    /// Snapshot all storage words of one contract in slot order.
    ///
    /// Test helper for byte-identical state comparisons.
    pub fn storage_of(&self, address: Address) -> std::collections::BTreeMap<U256, U256> {
        self.storage
            .iter()
            .filter(|entry| entry.key().0 == address)
            .map(|entry| (entry.key().1, *entry.value()))
            .collect()
    }
}

impl StateKv for InMemoryKv {
    fn storage(&self, address: Address, slot: U256) -> Result<U256> {
        Ok(self
            .storage
            .get(&(address, slot))
            .map(|entry| *entry)
            .unwrap_or(U256::ZERO))
    }

    fn set_storage(&self, address: Address, slot: U256, value: U256) -> Result<()> {
        if value.is_zero() {
            self.storage.remove(&(address, slot));
        } else {
            self.storage.insert((address, slot), value);
        }
        Ok(())
    }

    fn balance(&self, address: Address) -> Result<U256> {
        Ok(self
            .balances
            .get(&address)
            .map(|entry| *entry)
            .unwrap_or(U256::ZERO))
    }

    fn set_balance(&self, address: Address, value: U256) -> Result<()> {
        if value.is_zero() {
            self.balances.remove(&address);
        } else {
            self.balances.insert(address, value);
        }
        Ok(())
    }

    fn nonce(&self, address: Address) -> Result<u64> {
        Ok(self.nonces.get(&address).map(|entry| *entry).unwrap_or(0))
    }

    fn set_nonce(&self, address: Address, value: u64) -> Result<()> {
        self.nonces.insert(address, value);
        Ok(())
    }

    fn code(&self, address: Address) -> Result<Bytes> {
        Ok(self
            .codes
            .get(&address)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }

    fn set_code(&self, address: Address, code: Bytes) -> Result<()> {
        self.codes.insert(address, code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entries_read_as_zero() {
        let kv = InMemoryKv::new();
        let addr = Address::repeat_byte(1);
        assert_eq!(kv.storage(addr, U256::from(5)).unwrap(), U256::ZERO);
        assert_eq!(kv.balance(addr).unwrap(), U256::ZERO);
        assert_eq!(kv.nonce(addr).unwrap(), 0);
        assert!(kv.code(addr).unwrap().is_empty());
    }

    #[test]
    fn zero_writes_erase_entries() {
        let kv = InMemoryKv::new();
        let addr = Address::repeat_byte(2);
        kv.set_storage(addr, U256::from(1), U256::from(9)).unwrap();
        assert_eq!(kv.storage_len(), 1);
        kv.set_storage(addr, U256::from(1), U256::ZERO).unwrap();
        assert_eq!(kv.storage_len(), 0);
    }
}
