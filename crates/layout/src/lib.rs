//! Solidity storage-layout arithmetic for the native SFC suite.
//!
//! Every read and write performed by the precompiles must land on the exact
//! storage slot the Solidity compiler would have assigned, because external
//! contracts and off-chain indexers address the same slots directly. Three
//! shapes cover the whole layout:
//!
//! - scalar at slot `s` → address `s`
//! - `mapping(K => V)` at base `s`, key `k` → `keccak256(pad32(k) ‖ pad32(s))`
//! - dynamic array at base `s` → length at `s`, element `i` at
//!   `keccak256(pad32(s)) + i`
//!
//! Struct fields add a constant offset to their base; nested lookups treat
//! the outer element slot as the inner base. The functions here are the
//! evaluator for those shapes; [`SlotCache`] memoizes the keccak-heavy ones.

use alloy_primitives::{keccak256, Address, B256, U256};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

pub mod cm;
pub mod codec;
pub mod driver;
pub mod sfc;

/// A `uint256` mapping key, left-padded to 32 bytes.
#[inline]
pub fn u256_key(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

/// An `address` mapping key, left-padded to 32 bytes.
#[inline]
pub fn address_key(addr: Address) -> B256 {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_slice());
    B256::from(word)
}

/// Slot of `mapping[key]` for a mapping rooted at `base`:
/// `keccak256(pad32(key) ‖ pad32(base))`.
pub fn mapping_slot(base: U256, key: B256) -> U256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(key.as_slice());
    buf[32..].copy_from_slice(&base.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

/// First data slot of a dynamic array (or long `bytes`) rooted at `base`:
/// `keccak256(pad32(base))`.
pub fn array_data_slot(base: U256) -> U256 {
    U256::from_be_bytes(keccak256(base.to_be_bytes::<32>()).0)
}

/// Struct field at `base + offset`. Wraps modulo 2^256 like the EVM does.
#[inline]
pub fn field(base: U256, offset: u64) -> U256 {
    base.wrapping_add(U256::from(offset))
}

/// Element `index` of a dynamic array rooted at `base`.
#[inline]
pub fn array_elem(data_base: U256, index: u64) -> U256 {
    data_base.wrapping_add(U256::from(index))
}

/// Memoizing evaluator for the keccak-bearing shapes.
///
/// A single handler resolves dozens of slots and the sealing engine thousands,
/// most of them repeats over the same `(base, key)` pairs (validator IDs,
/// delegator addresses, the current epoch). The caches are scoped to a chain
/// context, not process-global, so independent chains in one process do not
/// share them.
pub struct SlotCache {
    mappings: Mutex<LruCache<(U256, B256), U256>>,
    array_bases: Mutex<LruCache<U256, U256>>,
}

impl SlotCache {
    /// Default capacity fits the working set of a full epoch seal.
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is nonzero");
        Self {
            mappings: Mutex::new(LruCache::new(capacity)),
            array_bases: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Memoized [`mapping_slot`].
    pub fn mapping_slot(&self, base: U256, key: B256) -> U256 {
        let mut cache = self.mappings.lock();
        if let Some(slot) = cache.get(&(base, key)) {
            return *slot;
        }
        let slot = mapping_slot(base, key);
        cache.put((base, key), slot);
        slot
    }

    /// Memoized [`array_data_slot`].
    pub fn array_data_slot(&self, base: U256) -> U256 {
        let mut cache = self.array_bases.lock();
        if let Some(slot) = cache.get(&base) {
            return *slot;
        }
        let slot = array_data_slot(base);
        cache.put(base, slot);
        slot
    }
}

impl Default for SlotCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
