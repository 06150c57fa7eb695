//! Storage-word codecs.
//!
//! Scalars occupy one 32-byte word each. Dynamic `bytes` use the Solidity
//! short/long form: values shorter than 32 bytes are packed into the base
//! slot with `2·len` in the lowest byte; longer values store `2·len + 1` at
//! the base and the data left-aligned in consecutive words starting at
//! `keccak256(pad32(base))`. The short-form optimization must be preserved
//! bit-exactly — indexers read pubkeys from the raw slots.

use crate::{array_data_slot, array_elem};
use alloy_primitives::{Address, U256};

/// Decode an `address` stored left-padded in a word.
#[inline]
pub fn word_to_address(word: U256) -> Address {
    Address::from_slice(&word.to_be_bytes::<32>()[12..])
}

/// Encode an `address` into a left-padded word.
#[inline]
pub fn address_to_word(addr: Address) -> U256 {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(addr.as_slice());
    U256::from_be_bytes(bytes)
}

/// Decode a `bool` (any nonzero word is true).
#[inline]
pub fn word_to_bool(word: U256) -> bool {
    !word.is_zero()
}

/// Read a dynamic `bytes` value rooted at `base` through `read`.
pub fn read_dyn_bytes(mut read: impl FnMut(U256) -> U256, base: U256) -> Vec<u8> {
    let head = read(base).to_be_bytes::<32>();
    let marker = head[31];
    if marker & 1 == 0 {
        // Short form: data and 2*len share the base word.
        let len = (marker / 2) as usize;
        return head[..len.min(31)].to_vec();
    }
    let len_word = U256::from_be_bytes(head);
    let len = ((len_word - U256::from(1)) >> 1).saturating_to::<usize>();
    let data_base = array_data_slot(base);
    let mut out = Vec::with_capacity(len);
    let mut i = 0u64;
    while out.len() < len {
        let word = read(array_elem(data_base, i)).to_be_bytes::<32>();
        let take = (len - out.len()).min(32);
        out.extend_from_slice(&word[..take]);
        i += 1;
    }
    out
}

/// Write a dynamic `bytes` value rooted at `base` through `write`, clearing
/// any data words left over from a previously longer value. `old_words` is
/// the stored word count of the previous value, from [`stored_word_count`];
/// callers whose read and write paths share mutable state resolve it first.
pub fn write_dyn_bytes(mut write: impl FnMut(U256, U256), base: U256, data: &[u8], old_words: u64) {
    if data.len() < 32 {
        let mut word = [0u8; 32];
        word[..data.len()].copy_from_slice(data);
        word[31] = (data.len() as u8) * 2;
        write(base, U256::from_be_bytes(word));
    } else {
        write(base, U256::from(data.len() as u64 * 2 + 1));
        let data_base = array_data_slot(base);
        for (i, chunk) in data.chunks(32).enumerate() {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            write(array_elem(data_base, i as u64), U256::from_be_bytes(word));
        }
    }

    // Solidity zeroes trailing words when a value shrinks.
    let new_words = if data.len() < 32 {
        0
    } else {
        data.len().div_ceil(32) as u64
    };
    if old_words > new_words {
        let data_base = array_data_slot(base);
        for i in new_words..old_words {
            write(array_elem(data_base, i), U256::ZERO);
        }
    }
}

/// Data-word count of the `bytes` value currently stored at `base` (zero for
/// the short form, which has no out-of-line words).
pub fn stored_word_count(mut read: impl FnMut(U256) -> U256, base: U256) -> u64 {
    let head = read(base).to_be_bytes::<32>();
    if head[31] & 1 == 0 {
        return 0;
    }
    let len = ((U256::from_be_bytes(head) - U256::from(1)) >> 1).saturating_to::<u64>();
    len.div_ceil(32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Slots(RefCell<BTreeMap<U256, U256>>);

    impl Slots {
        fn get(&self, slot: U256) -> U256 {
            self.0.borrow().get(&slot).copied().unwrap_or(U256::ZERO)
        }

        fn set(&self, slot: U256, value: U256) {
            if value.is_zero() {
                self.0.borrow_mut().remove(&slot);
            } else {
                self.0.borrow_mut().insert(slot, value);
            }
        }

        fn write(&self, base: U256, data: &[u8]) {
            let old_words = stored_word_count(|s| self.get(s), base);
            write_dyn_bytes(|s, v| self.set(s, v), base, data, old_words);
        }

        fn read(&self, base: U256) -> Vec<u8> {
            read_dyn_bytes(|s| self.get(s), base)
        }

        fn len(&self) -> usize {
            self.0.borrow().len()
        }

        fn contains(&self, slot: U256) -> bool {
            self.0.borrow().contains_key(&slot)
        }
    }

    fn round_trip(data: &[u8]) -> (Vec<u8>, Slots) {
        let store = Slots::default();
        let base = U256::from(0x6a);
        store.write(base, data);
        (store.read(base), store)
    }

    #[test]
    fn short_bytes_pack_into_the_base_slot() {
        let pubkey = [0xaa; 20];
        let (out, store) = round_trip(&pubkey);
        assert_eq!(out, pubkey);
        assert_eq!(store.len(), 1, "short form uses exactly the base slot");

        let head = store.get(U256::from(0x6a)).to_be_bytes::<32>();
        assert_eq!(head[31], 40, "low byte carries 2*len");
        assert_eq!(&head[..20], &pubkey);
    }

    #[test]
    fn long_bytes_store_length_marker_and_data_words() {
        let pubkey: Vec<u8> = (0u8..66).collect();
        let (out, store) = round_trip(&pubkey);
        assert_eq!(out, pubkey);

        let base = U256::from(0x6a);
        assert_eq!(store.get(base), U256::from(66u64 * 2 + 1));
        let data_base = array_data_slot(base);
        assert_eq!(
            store.get(data_base).to_be_bytes::<32>().to_vec(),
            pubkey[..32].to_vec()
        );
        // Third word holds the 2-byte tail, left-aligned.
        let tail = store.get(array_elem(data_base, 2)).to_be_bytes::<32>();
        assert_eq!(&tail[..2], &pubkey[64..]);
        assert_eq!(&tail[2..], &[0u8; 30]);
    }

    #[test]
    fn boundary_lengths() {
        for len in [0usize, 1, 31, 32, 33, 64] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let (out, _) = round_trip(&data);
            assert_eq!(out, data, "length {len}");
        }
    }

    #[test]
    fn shrinking_clears_leftover_words() {
        let store = Slots::default();
        let base = U256::from(0x6a);

        let long: Vec<u8> = (0u8..96).collect();
        store.write(base, &long);
        let short = [0x01u8; 8];
        store.write(base, &short);

        assert_eq!(store.read(base), short);
        let data_base = array_data_slot(base);
        for i in 0..3 {
            assert!(!store.contains(array_elem(data_base, i)));
        }
    }

    #[test]
    fn address_word_round_trip() {
        let addr = Address::repeat_byte(0x5c);
        assert_eq!(word_to_address(address_to_word(addr)), addr);
        let word = address_to_word(addr).to_be_bytes::<32>();
        assert_eq!(&word[..12], &[0u8; 12]);
    }
}
