use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{keccak256, Bytes, B256};
use parking_lot::RwLock;
use tracing::{debug, trace};

use silkrpc_primitives::{AccountChange, ChangeAction, StateChangeBatch, ViewId};

use crate::cache::root::{CoherentStateRoot, EvictionList};
use crate::config::CoherentCacheConfig;

/// Composite key for a storage slot: `address || incarnation || location`,
/// matching spec.md 4.5's `composite_key(address, incarnation, location)`.
pub fn storage_key(address: &[u8], incarnation: u64, location: &[u8]) -> Bytes {
    let mut buf = Vec::with_capacity(address.len() + 8 + location.len());
    buf.extend_from_slice(address);
    buf.extend_from_slice(&incarnation.to_be_bytes());
    buf.extend_from_slice(location);
    Bytes::from(buf)
}

/// Per-view cache of plain-state and code entries (spec.md 4.5).
///
/// Grounded in `silkworm::rpc::ethdb::kv::CoherentStateCache`
/// (`state_cache.cpp`): one `RwLock`-guarded map of `ViewId -> root`, plus
/// eviction lists that apply only to the latest view.
pub struct CoherentStateCache {
    config: CoherentCacheConfig,
    roots: RwLock<BTreeMap<ViewId, CoherentStateRoot>>,
    latest_view_id: RwLock<Option<ViewId>>,
    state_evictions: RwLock<EvictionList<Bytes>>,
    code_evictions: RwLock<EvictionList<B256>>,
    state_hit_count: AtomicU64,
    state_miss_count: AtomicU64,
    code_hit_count: AtomicU64,
    code_miss_count: AtomicU64,
    state_eviction_count: AtomicU64,
    code_eviction_count: AtomicU64,
}

impl CoherentStateCache {
    pub fn new(config: CoherentCacheConfig) -> Self {
        Self {
            config,
            roots: RwLock::new(BTreeMap::new()),
            latest_view_id: RwLock::new(None),
            state_evictions: RwLock::new(EvictionList::default()),
            code_evictions: RwLock::new(EvictionList::default()),
            state_hit_count: AtomicU64::new(0),
            state_miss_count: AtomicU64::new(0),
            code_hit_count: AtomicU64::new(0),
            code_miss_count: AtomicU64::new(0),
            state_eviction_count: AtomicU64::new(0),
            code_eviction_count: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> CoherentCacheConfig {
        self.config
    }

    pub fn state_hit_count(&self) -> u64 {
        self.state_hit_count.load(Ordering::Relaxed)
    }

    pub fn state_miss_count(&self) -> u64 {
        self.state_miss_count.load(Ordering::Relaxed)
    }

    pub fn code_hit_count(&self) -> u64 {
        self.code_hit_count.load(Ordering::Relaxed)
    }

    pub fn code_miss_count(&self) -> u64 {
        self.code_miss_count.load(Ordering::Relaxed)
    }

    pub fn state_eviction_count(&self) -> u64 {
        self.state_eviction_count.load(Ordering::Relaxed)
    }

    pub fn code_eviction_count(&self) -> u64 {
        self.code_eviction_count.load(Ordering::Relaxed)
    }

    /// Looks up a plain-state key at `view_id`. Returns `None` if the root
    /// is absent, not ready, or the key is absent from it — the caller falls
    /// through to a direct DB read and must call [`Self::insert_state`] to
    /// populate on miss (spec.md 4.5 step 2/4).
    pub fn get(&self, view_id: ViewId, key: &[u8]) -> Option<Bytes> {
        let roots = self.roots.read();
        let root = roots.get(&view_id)?;
        if !root.ready {
            return None;
        }
        let value = root.cache.get(key).cloned();
        drop(roots);
        if value.is_some() && self.is_latest(view_id) {
            self.state_evictions.write().touch_front(&Bytes::copy_from_slice(key));
        }
        if value.is_some() {
            self.state_hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.state_miss_count.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    pub fn get_code(&self, view_id: ViewId, code_hash: B256) -> Option<Bytes> {
        let roots = self.roots.read();
        let root = roots.get(&view_id)?;
        if !root.ready {
            return None;
        }
        let value = root.code_cache.get(&code_hash).cloned();
        drop(roots);
        if value.is_some() && self.is_latest(view_id) {
            self.code_evictions.write().touch_front(&code_hash);
        }
        if value.is_some() {
            self.code_hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.code_miss_count.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Populates a plain-state key after a DB read-through miss. No-op if
    /// `view_id`'s root no longer exists (it may have been evicted between
    /// the miss and this call).
    pub fn insert_state(&self, view_id: ViewId, key: Bytes, value: Bytes) {
        let mut roots = self.roots.write();
        let Some(root) = roots.get_mut(&view_id) else { return };
        root.cache.insert(key.clone(), value);
        drop(roots);
        if self.is_latest(view_id) {
            let mut evictions = self.state_evictions.write();
            evictions.touch_front(&key);
            if evictions.len() > self.config.max_state_keys {
                if let Some(evicted) = evictions.pop_back() {
                    self.state_eviction_count.fetch_add(1, Ordering::Relaxed);
                    if let Some(r) = self.roots.write().get_mut(&view_id) {
                        r.cache.remove(&evicted);
                    }
                }
            }
        }
    }

    pub fn insert_code(&self, view_id: ViewId, code_hash: B256, code: Bytes) {
        let mut roots = self.roots.write();
        let Some(root) = roots.get_mut(&view_id) else { return };
        root.code_cache.insert(code_hash, code);
        drop(roots);
        if self.is_latest(view_id) {
            let mut evictions = self.code_evictions.write();
            evictions.touch_front(&code_hash);
            if evictions.len() > self.config.max_code_keys {
                if let Some(evicted) = evictions.pop_back() {
                    self.code_eviction_count.fetch_add(1, Ordering::Relaxed);
                    if let Some(r) = self.roots.write().get_mut(&view_id) {
                        r.code_cache.remove(&evicted);
                    }
                }
            }
        }
    }

    fn is_latest(&self, view_id: ViewId) -> bool {
        *self.latest_view_id.read() == Some(view_id)
    }

    /// Applies one incoming state-change batch (spec.md 4.5 "Ingest").
    pub fn on_new_block(&self, batch: &StateChangeBatch) {
        if batch.is_empty() {
            debug!(view_id = %batch.database_view_id, "skipping empty state change batch");
            return;
        }
        let view_id = batch.database_view_id;
        self.advance_root(view_id);
        for change_batch in &batch.change_batches {
            for account in &change_batch.changes {
                self.apply_account_change(view_id, account);
            }
        }
        let mut roots = self.roots.write();
        if let Some(root) = roots.get_mut(&view_id) {
            root.ready = true;
        }
        drop(roots);
        trace!(view_id = %view_id, "state change batch applied");
    }

    fn advance_root(&self, view_id: ViewId) {
        let mut roots = self.roots.write();

        let inherited = view_id
            .checked_prev()
            .and_then(|prev| roots.get(&prev))
            .filter(|prev_root| prev_root.canonical)
            .map(|prev_root| (prev_root.cache.clone(), prev_root.code_cache.clone()));

        let mut root = CoherentStateRoot::default();
        let fresh_start = match inherited {
            Some((cache, code_cache)) => {
                root.cache = cache;
                root.code_cache = code_cache;
                false
            }
            None => true,
        };
        root.canonical = true;
        roots.insert(view_id, root);

        if fresh_start {
            let keys: Vec<Bytes> = roots.get(&view_id).unwrap().cache.keys().cloned().collect();
            let code_keys: Vec<B256> =
                roots.get(&view_id).unwrap().code_cache.keys().copied().collect();
            self.state_evictions.write().rebuild_from(keys.into_iter());
            self.code_evictions.write().rebuild_from(code_keys.into_iter());
        }

        // Evict old roots: either by view distance from the new latest, or
        // (wrap-around at ViewId(0)) drop everything but the new latest.
        if view_id.get() == 0 {
            roots.retain(|&v, _| v == view_id);
        } else if roots.len() as u64 > self.config.max_views {
            let drop_threshold = view_id.get().saturating_sub(self.config.max_views) + 1;
            roots.retain(|&v, _| v.get() > drop_threshold);
        }

        drop(roots);
        *self.latest_view_id.write() = Some(view_id);
    }

    /// Routes every ingest-time write through [`Self::insert_state`]/
    /// [`Self::insert_code`] rather than touching a root's maps directly, so
    /// batch ingest enforces `max_state_keys`/`max_code_keys` the same way a
    /// read-through miss does (mirrors `state_cache.cpp`'s
    /// `process_upsert_change`/`process_code_change`/`process_delete_change`/
    /// `process_storage_change`, which all funnel through `add()`/`add_code()`).
    fn apply_account_change(&self, view_id: ViewId, change: &AccountChange) {
        let address_key = Bytes::copy_from_slice(change.address.as_slice());
        match change.action {
            ChangeAction::Upsert => {
                if let Some(data) = &change.data {
                    self.insert_state(view_id, address_key, data.clone());
                }
            }
            ChangeAction::UpsertCode => {
                if let Some(data) = &change.data {
                    self.insert_state(view_id, address_key, data.clone());
                }
                if let Some(code) = &change.code {
                    self.insert_code(view_id, keccak256(code), code.clone());
                }
            }
            ChangeAction::Remove => {
                // Tombstone: an empty value still goes through insert_state so
                // it's subject to the same eviction bookkeeping as a real write.
                self.insert_state(view_id, address_key, Bytes::new());
            }
            ChangeAction::Storage => {
                if self.config.with_storage {
                    for storage_change in &change.storage_changes {
                        let key = storage_key(
                            change.address.as_slice(),
                            change.incarnation,
                            storage_change.location.as_slice(),
                        );
                        self.insert_state(view_id, key, storage_change.data.clone());
                    }
                }
            }
            ChangeAction::Code => {
                if let Some(code) = &change.code {
                    self.insert_code(view_id, keccak256(code), code.clone());
                }
            }
        }
    }
}
