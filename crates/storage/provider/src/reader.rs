use alloy_primitives::Bytes;
use async_trait::async_trait;

use silkrpc_primitives::{KeyValue, ViewId};

use crate::error::ProviderError;

/// Table-level view over one remote transaction (spec.md 4.3).
///
/// Mirrors the shape `silkworm::rpc::ethdb::Transaction`/`TransactionDatabase`
/// exposes in the original implementation over `kv-client`'s lower-level
/// cursor API: callers ask for a table and a key, never a raw cursor op.
#[async_trait]
pub trait DbReader: Send + Sync {
    fn view_id(&self) -> ViewId;

    /// Point lookup. Returns an empty `KV` (empty key and value) on miss,
    /// matching `Transaction::get`'s "empty value on miss" contract.
    async fn get(&self, table: &'static str, key: &[u8]) -> Result<KeyValue, ProviderError>;

    /// Convenience wrapper returning just the value bytes, empty on miss.
    async fn get_one(&self, table: &'static str, key: &[u8]) -> Result<Bytes, ProviderError> {
        Ok(self.get(table, key).await?.value)
    }

    /// First dup-sorted value under `key` that is `>= subkey`.
    async fn get_both_range(
        &self,
        table: &'static str,
        key: &[u8],
        subkey: &[u8],
    ) -> Result<Option<Bytes>, ProviderError>;

    /// Range scan starting at `start_key`, stopping once the leading
    /// `fixed_bits` bits of the current key no longer match `start_key`'s.
    /// `visitor` returns `false` to stop early.
    async fn walk(
        &self,
        table: &'static str,
        start_key: &[u8],
        fixed_bits: u32,
        visitor: &mut dyn FnMut(&KeyValue) -> bool,
    ) -> Result<(), ProviderError>;

    /// `walk` with a bit-aligned prefix: `fixed_bits = 8 * prefix.len()`.
    async fn for_prefix(
        &self,
        table: &'static str,
        prefix: &[u8],
        visitor: &mut dyn FnMut(&KeyValue) -> bool,
    ) -> Result<(), ProviderError> {
        self.walk(table, prefix, 8 * prefix.len() as u32, visitor).await
    }
}
