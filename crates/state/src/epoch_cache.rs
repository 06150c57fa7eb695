//! Epoch-scoped read cache.
//!
//! Sealing an epoch spans two privileged calls (`sealEpochValidators`, then
//! `sealEpoch`) plus the internal passes each makes over the validator set.
//! The request cache dies with each call; this tier carries hot snapshot
//! reads across the pair. It is keyed by the epoch being sealed and must be
//! emptied the moment the `currentSealedEpoch` sentinel moves, otherwise a
//! read from the previous boundary could leak into the next one.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;

/// Read memo for the epoch currently being sealed.
#[derive(Debug, Default)]
pub struct EpochCache {
    epoch: Option<U256>,
    entries: HashMap<(Address, U256), U256>,
}

impl EpochCache {
    /// Create an empty, unbound cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the cache to the epoch being sealed, dropping entries kept for a
    /// different epoch.
    pub fn begin(&mut self, epoch: U256) {
        if self.epoch != Some(epoch) {
            if self.epoch.is_some() {
                tracing::debug!(entries = self.entries.len(), "epoch cache rebound");
            }
            self.entries.clear();
            self.epoch = Some(epoch);
        }
    }

    /// The epoch the cache is bound to, if any.
    pub fn epoch(&self) -> Option<U256> {
        self.epoch
    }

    /// React to a write of the `currentSealedEpoch` sentinel: once the
    /// boundary commits, everything cached for it is stale.
    pub fn on_sentinel_change(&mut self, new_sealed_epoch: U256) {
        if let Some(epoch) = self.epoch {
            if epoch <= new_sealed_epoch {
                tracing::debug!(
                    entries = self.entries.len(),
                    %new_sealed_epoch,
                    "epoch cache invalidated at boundary"
                );
                self.entries.clear();
                self.epoch = None;
            }
        }
    }

    /// Drop all entries and unbind. Used when the call that populated the
    /// cache reverts, so values read from its discarded overlay cannot leak.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.epoch = None;
    }

    /// Cached value for a slot, if bound and present.
    pub fn get(&self, epoch: U256, address: Address, slot: U256) -> Option<U256> {
        if self.epoch != Some(epoch) {
            return None;
        }
        self.entries.get(&(address, slot)).copied()
    }

    /// Memoize a value for a slot. No-op when bound to another epoch.
    pub fn put(&mut self, epoch: U256, address: Address, slot: U256, value: U256) {
        if self.epoch == Some(epoch) {
            self.entries.insert((address, slot), value);
        }
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> Address {
        Address::repeat_byte(0xfc)
    }

    #[test]
    fn entries_survive_within_one_epoch() {
        let mut cache = EpochCache::new();
        cache.begin(U256::from(2));
        cache.put(U256::from(2), addr(), U256::from(1), U256::from(77));
        assert_eq!(
            cache.get(U256::from(2), addr(), U256::from(1)),
            Some(U256::from(77))
        );
    }

    #[test]
    fn rebinding_to_a_new_epoch_clears_entries() {
        let mut cache = EpochCache::new();
        cache.begin(U256::from(2));
        cache.put(U256::from(2), addr(), U256::from(1), U256::from(77));
        cache.begin(U256::from(3));
        assert_eq!(cache.get(U256::from(3), addr(), U256::from(1)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn sentinel_change_invalidates_the_sealed_epoch() {
        let mut cache = EpochCache::new();
        cache.begin(U256::from(2));
        cache.put(U256::from(2), addr(), U256::from(1), U256::from(77));

        // currentSealedEpoch advances to 2: epoch 2 is now sealed history.
        cache.on_sentinel_change(U256::from(2));
        assert_eq!(cache.get(U256::from(2), addr(), U256::from(1)), None);
        assert_eq!(cache.epoch(), None);
    }

    #[test]
    fn reads_for_other_epochs_miss() {
        let mut cache = EpochCache::new();
        cache.begin(U256::from(2));
        cache.put(U256::from(2), addr(), U256::from(1), U256::from(77));
        assert_eq!(cache.get(U256::from(9), addr(), U256::from(1)), None);
        // Writes for a foreign epoch are ignored rather than mixed in.
        cache.put(U256::from(9), addr(), U256::from(1), U256::from(1));
        assert_eq!(cache.len(), 1);
    }
}
