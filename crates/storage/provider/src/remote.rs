use alloy_primitives::Bytes;
use async_trait::async_trait;

use silkrpc_kv_client::{Cursor, DupCursor, DupSortCursor, KvTransaction, OrderedCursor};
use silkrpc_primitives::{KeyValue, ViewId};

use crate::error::ProviderError;
use crate::reader::DbReader;

/// [`DbReader`] backed directly by a remote KV transaction.
pub struct RemoteReader {
    txn: KvTransaction,
}

impl RemoteReader {
    pub fn new(txn: KvTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl DbReader for RemoteReader {
    fn view_id(&self) -> ViewId {
        self.txn.view_id()
    }

    async fn get(&self, table: &'static str, key: &[u8]) -> Result<KeyValue, ProviderError> {
        let mut cursor = OrderedCursor::open(&self.txn, table).await?;
        let found = cursor.seek_exact(key).await?;
        cursor.close().await?;
        Ok(found.unwrap_or_default())
    }

    async fn get_both_range(
        &self,
        table: &'static str,
        key: &[u8],
        subkey: &[u8],
    ) -> Result<Option<Bytes>, ProviderError> {
        let mut cursor = DupCursor::open(&self.txn, table).await?;
        let found = cursor.seek_both(key, subkey).await?;
        cursor.close().await?;
        Ok(found)
    }

    async fn walk(
        &self,
        table: &'static str,
        start_key: &[u8],
        fixed_bits: u32,
        visitor: &mut dyn FnMut(&KeyValue) -> bool,
    ) -> Result<(), ProviderError> {
        let mut cursor = OrderedCursor::open(&self.txn, table).await?;
        let mut current = cursor.seek(start_key).await?;
        while let Some(kv) = current {
            if !prefix_matches(&kv.key, start_key, fixed_bits) {
                break;
            }
            if !visitor(&kv) {
                break;
            }
            current = cursor.next().await?;
        }
        cursor.close().await?;
        Ok(())
    }
}

/// True if `key`'s leading `fixed_bits` bits equal `prefix`'s.
fn prefix_matches(key: &[u8], prefix: &[u8], fixed_bits: u32) -> bool {
    if fixed_bits == 0 {
        return true;
    }
    let full_bytes = (fixed_bits / 8) as usize;
    let remaining_bits = fixed_bits % 8;
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

#[cfg(test)]
mod tests {
    use super::prefix_matches;

    #[test]
    fn byte_aligned_prefix() {
        assert!(prefix_matches(&[0xAB, 0xCD, 0x01], &[0xAB, 0xCD], 16));
        assert!(!prefix_matches(&[0xAB, 0xCE, 0x01], &[0xAB, 0xCD], 16));
    }

    #[test]
    fn sub_byte_prefix() {
        // top 4 bits of 0xA3 (0xA) match top 4 bits of 0xAF (0xA)
        assert!(prefix_matches(&[0xA3], &[0xAF], 4));
        assert!(!prefix_matches(&[0x53], &[0xAF], 4));
    }

    #[test]
    fn zero_bits_always_matches() {
        assert!(prefix_matches(&[], &[0x01, 0x02], 0));
    }

    #[test]
    fn short_key_does_not_match() {
        assert!(!prefix_matches(&[0xAB], &[0xAB, 0xCD], 16));
    }
}
