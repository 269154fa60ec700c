//! Coherent state cache over per-view snapshots (C5), the cached database
//! built on it (C6), and the state-change subscription that feeds it (C4).
//!
//! Grounded directly in the teacher's `reth-chain-state` crate's cache
//! module (`cache/{mod,plain_state,cached_provider}.rs`) for its texture —
//! `lazy_static`/`parking_lot`-backed global state, a thin provider wrapper
//! delegating to the cache — generalized to the per-`ViewId` root structure
//! and eviction semantics of `silkworm::rpc::ethdb::kv::CoherentStateCache`
//! (`state_cache.cpp`).

pub mod cache;
mod cached_database;
mod config;
mod subscription;

pub use cache::CoherentStateCache;
pub use cached_database::{get_code, CachedDatabase};
pub use config::{CacheConfigError, CoherentCacheConfig};
pub use subscription::{run_subscription, StateChangeSource, StateChangeStream, SubscriptionError};
