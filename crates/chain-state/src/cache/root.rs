use std::collections::{HashMap, VecDeque};

use alloy_primitives::{Bytes, B256};

/// Snapshot of the cache at one `ViewId` (spec.md 3, "Coherent state root").
///
/// `ready` is set once the ingest batch that produced this root has been
/// fully applied; lookups treat a not-ready root as absent. `canonical` is
/// set when this root was built by inheriting its predecessor's contents
/// rather than starting fresh.
#[derive(Debug, Default)]
pub(crate) struct CoherentStateRoot {
    pub(crate) cache: HashMap<Bytes, Bytes>,
    pub(crate) code_cache: HashMap<B256, Bytes>,
    pub(crate) ready: bool,
    pub(crate) canonical: bool,
}

/// Eviction order for one root's state/code maps. Only the latest view's
/// root carries a populated eviction list (spec.md 4.5, "Eviction lists are
/// not maintained for non-latest views").
///
/// Move-to-front and pop-from-tail are linear scans over a `VecDeque` rather
/// than an O(1) intrusive list — simple and correct, adequate at the
/// `max_state_keys`/`max_code_keys` sizes this cache is configured for.
#[derive(Debug, Default)]
pub(crate) struct EvictionList<K> {
    order: VecDeque<K>,
}

impl<K: PartialEq + Clone> EvictionList<K> {
    pub(crate) fn touch_front(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_front(key.clone());
    }

    pub(crate) fn pop_back(&mut self) -> Option<K> {
        self.order.pop_back()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn rebuild_from(&mut self, keys: impl Iterator<Item = K>) {
        self.order = keys.collect();
    }
}
