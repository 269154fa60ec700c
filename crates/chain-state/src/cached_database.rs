use std::sync::Arc;

use alloy_primitives::Bytes;
use async_trait::async_trait;

use silkrpc_primitives::{tables, KeyValue, ViewId};
use silkrpc_provider::{DbReader, ProviderError};

use crate::cache::CoherentStateCache;

/// Implements the DB reader contract by delegating `PlainState`/`Code` reads
/// to the coherent cache (C5), and everything else straight through to the
/// underlying reader (spec.md 4.6). A cache miss falls through to the
/// underlying reader but never re-populates it — only the ingest path
/// (`CoherentStateCache::on_new_block`) writes to the cache.
pub struct CachedDatabase<R> {
    underlying: R,
    cache: Arc<CoherentStateCache>,
}

impl<R: DbReader> CachedDatabase<R> {
    pub fn new(underlying: R, cache: Arc<CoherentStateCache>) -> Self {
        Self { underlying, cache }
    }
}

#[async_trait]
impl<R: DbReader> DbReader for CachedDatabase<R> {
    fn view_id(&self) -> ViewId {
        self.underlying.view_id()
    }

    async fn get(&self, table: &'static str, key: &[u8]) -> Result<KeyValue, ProviderError> {
        if table == tables::PLAIN_STATE {
            if let Some(value) = self.cache.get(self.view_id(), key) {
                return Ok(KeyValue::new(Bytes::copy_from_slice(key), value));
            }
            return self.underlying.get(table, key).await;
        }
        if table == tables::CODE {
            if key.len() == 32 {
                let code_hash = alloy_primitives::B256::from_slice(key);
                if let Some(value) = self.cache.get_code(self.view_id(), code_hash) {
                    return Ok(KeyValue::new(Bytes::copy_from_slice(key), value));
                }
            }
            return self.underlying.get(table, key).await;
        }
        self.underlying.get(table, key).await
    }

    async fn get_both_range(
        &self,
        table: &'static str,
        key: &[u8],
        subkey: &[u8],
    ) -> Result<Option<Bytes>, ProviderError> {
        self.underlying.get_both_range(table, key, subkey).await
    }

    async fn walk(
        &self,
        table: &'static str,
        start_key: &[u8],
        fixed_bits: u32,
        visitor: &mut dyn FnMut(&KeyValue) -> bool,
    ) -> Result<(), ProviderError> {
        self.underlying.walk(table, start_key, fixed_bits, visitor).await
    }
}

/// Looks up contract code through the cache, falling through to `Code` on
/// miss. Kept separate from the `DbReader` impl above since bytecode is
/// keyed by hash rather than address and the cache exposes it through
/// `get_code`/`insert_code`, not the generic table API.
pub async fn get_code<R: DbReader>(
    db: &CachedDatabase<R>,
    code_hash: alloy_primitives::B256,
) -> Result<Bytes, ProviderError> {
    if let Some(code) = db.cache.get_code(db.view_id(), code_hash) {
        return Ok(code);
    }
    let value = db.underlying.get_one(tables::CODE, code_hash.as_slice()).await?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use silkrpc_primitives::{AccountChange, ChangeAction, ChangeBatch, StateChangeBatch, ViewId};

    use crate::config::CoherentCacheConfig;

    /// Underlying reader that always misses, so tests can tell a cache hit
    /// apart from a DB fall-through.
    struct AlwaysMiss;

    #[async_trait]
    impl DbReader for AlwaysMiss {
        fn view_id(&self) -> ViewId {
            ViewId::new(1)
        }

        async fn get(&self, _table: &'static str, key: &[u8]) -> Result<KeyValue, ProviderError> {
            Ok(KeyValue::new(Bytes::copy_from_slice(key), Bytes::new()))
        }

        async fn get_both_range(
            &self,
            _table: &'static str,
            _key: &[u8],
            _subkey: &[u8],
        ) -> Result<Option<Bytes>, ProviderError> {
            Ok(None)
        }

        async fn walk(
            &self,
            _table: &'static str,
            _start_key: &[u8],
            _fixed_bits: u32,
            _visitor: &mut dyn FnMut(&KeyValue) -> bool,
        ) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    #[serial]
    async fn plain_state_read_hits_cache_before_underlying() {
        let cache =
            Arc::new(CoherentStateCache::new(CoherentCacheConfig::default().validate().unwrap()));
        let addr = alloy_primitives::Address::repeat_byte(0x07);
        let mut change = AccountChange::new(addr, ChangeAction::Upsert);
        change.data = Some(Bytes::copy_from_slice(b"cached"));
        cache.on_new_block(&StateChangeBatch {
            database_view_id: ViewId::new(1),
            change_batches: vec![ChangeBatch { changes: vec![change] }],
        });

        let db = CachedDatabase::new(AlwaysMiss, cache);
        let found = db.get(tables::PLAIN_STATE, addr.as_slice()).await.unwrap();
        assert_eq!(&found.value[..], b"cached");
    }

    #[tokio::test]
    #[serial]
    async fn plain_state_miss_falls_through_without_caching() {
        let cache =
            Arc::new(CoherentStateCache::new(CoherentCacheConfig::default().validate().unwrap()));
        let db = CachedDatabase::new(AlwaysMiss, cache);
        let found = db.get(tables::PLAIN_STATE, b"unknown").await.unwrap();
        assert!(found.value.is_empty());
    }
}
