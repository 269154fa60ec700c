use alloy_primitives::Bytes;

use crate::cursor::{Cursor, DupCursor, DupSortCursor, OrderedCursor};
use crate::error::KvError;

/// A key split into up to three parts by fixed byte offsets, plus the value
/// found there. Mirrors `silkworm::rpc::SplittedKeyValue` from
/// `storage_walker.cpp`: composite keys such as the storage change-set key
/// (address || incarnation || location) are decomposed so callers can match
/// on a prefix without re-parsing it themselves.
#[derive(Debug, Clone, Default)]
pub struct SplittedKeyValue {
    pub key1: Bytes,
    pub key2: Bytes,
    pub key3: Bytes,
    pub value: Bytes,
}

fn split(key: &[u8], value: &[u8], part1_end: usize, part2_start: usize, part3_start: usize) -> SplittedKeyValue {
    let part2_end = part3_start.max(part2_start);
    SplittedKeyValue {
        key1: Bytes::copy_from_slice(&key[..part1_end.min(key.len())]),
        key2: Bytes::copy_from_slice(&key[part1_end.min(key.len())..part2_end.min(key.len())]),
        key3: Bytes::copy_from_slice(&key[part3_start.min(key.len())..]),
        value: Bytes::copy_from_slice(value),
    }
}

/// Ordered-cursor-based split cursor: composite key lives entirely in the
/// main key (part3 is the tail of `key`, part1/part2 its head), `value` is
/// unused for matching. Grounds the plain `SplitCursor` class used by
/// `walk_of_storages` over non dup-sorted change-set tables.
pub struct SplitCursor {
    inner: OrderedCursor,
    match_bits: u32,
    part1_end: usize,
    part2_start: usize,
    part3_start: usize,
}

impl SplitCursor {
    pub fn new(
        inner: OrderedCursor,
        match_bits: u32,
        part1_end: usize,
        part2_start: usize,
        part3_start: usize,
    ) -> Self {
        Self { inner, match_bits, part1_end, part2_start, part3_start }
    }

    fn matches(&self, key: &[u8], target_prefix: &[u8]) -> bool {
        prefix_matches(key, target_prefix, self.match_bits)
    }

    /// Seeks to the first entry whose key has `key_prefix` as its leading
    /// `match_bits` bits, returning the split key/value or `None` if no such
    /// entry exists.
    pub async fn seek(&mut self, key_prefix: &[u8]) -> Result<Option<SplittedKeyValue>, KvError> {
        let found = self.inner.seek(key_prefix).await?;
        Ok(match found {
            Some(kv) if self.matches(&kv.key, key_prefix) => {
                Some(split(&kv.key, &kv.value, self.part1_end, self.part2_start, self.part3_start))
            }
            _ => None,
        })
    }

    /// Advances to the next entry, stopping (returning `None`) once the
    /// `match_bits`-bit prefix no longer matches `key_prefix`.
    pub async fn next(&mut self, key_prefix: &[u8]) -> Result<Option<SplittedKeyValue>, KvError> {
        let found = self.inner.next().await?;
        Ok(match found {
            Some(kv) if self.matches(&kv.key, key_prefix) => {
                Some(split(&kv.key, &kv.value, self.part1_end, self.part2_start, self.part3_start))
            }
            _ => None,
        })
    }

    pub async fn close(self) -> Result<(), KvError> {
        self.inner.close().await
    }
}

/// Dup-sort-based split cursor: the composite key is `main_key || subkey`
/// where `subkey` is the dup-sorted value, so positioning uses
/// `seek_both`/`next_dup` instead of `seek`/`next`. Grounds
/// `SplitCursorDupSort`, used by `walk_of_storages` over `PlainState`'s
/// dup-sorted storage entries (address+incarnation as the main key,
/// location||value as the dup-sorted value).
pub struct SplitCursorDupSort {
    inner: DupCursor,
    part1_end: usize,
    part2_start: usize,
    value_offset: usize,
}

impl SplitCursorDupSort {
    pub fn new(inner: DupCursor, part1_end: usize, part2_start: usize, value_offset: usize) -> Self {
        Self { inner, part1_end, part2_start, value_offset }
    }

    fn split_dup(&self, main_key: &[u8], dup_value: &[u8]) -> SplittedKeyValue {
        let offset = self.value_offset.min(dup_value.len());
        SplittedKeyValue {
            key1: Bytes::copy_from_slice(&main_key[..self.part1_end.min(main_key.len())]),
            key2: Bytes::copy_from_slice(&dup_value[..offset]),
            key3: Bytes::copy_from_slice(&main_key[self.part2_start.min(main_key.len())..]),
            value: Bytes::copy_from_slice(&dup_value[offset..]),
        }
    }

    /// Seeks to `main_key`, then within its duplicates to the first one
    /// whose leading bytes equal `subkey_prefix`.
    pub async fn seek_both(
        &mut self,
        main_key: &[u8],
        subkey_prefix: &[u8],
    ) -> Result<Option<SplittedKeyValue>, KvError> {
        let found = self.inner.seek_both(main_key, subkey_prefix).await?;
        Ok(found.map(|dup_value| self.split_dup(main_key, &dup_value)))
    }

    /// Advances within the current main key's duplicates.
    pub async fn next_dup(&mut self, main_key: &[u8]) -> Result<Option<SplittedKeyValue>, KvError> {
        let found = self.inner.next_dup().await?;
        Ok(found.map(|kv| self.split_dup(main_key, &kv.value)))
    }

    pub async fn close(self) -> Result<(), KvError> {
        self.inner.close().await
    }
}

/// True if `key`'s leading `match_bits` bits equal `prefix`'s.
fn prefix_matches(key: &[u8], prefix: &[u8], match_bits: u32) -> bool {
    if match_bits == 0 {
        return true;
    }
    let full_bytes = (match_bits / 8) as usize;
    let remaining_bits = match_bits % 8;
    if key.len() < full_bytes || prefix.len() < full_bytes {
        return false;
    }
    if key[..full_bytes] != prefix[..full_bytes] {
        return false;
    }
    if remaining_bits == 0 {
        return true;
    }
    let mask = 0xFFu8 << (8 - remaining_bits);
    match (key.get(full_bytes), prefix.get(full_bytes)) {
        (Some(k), Some(p)) => (k & mask) == (p & mask),
        _ => false,
    }
}
