//! Table name constants for the remote KV store (spec.md section 6).
//!
//! These are opaque strings as far as this crate is concerned; the remote
//! KV service is responsible for mapping them to its own storage.

pub const PLAIN_STATE: &str = "PlainState";
pub const CODE: &str = "Code";
pub const CANONICAL_HASHES: &str = "CanonicalHashes";
pub const CONFIG: &str = "Config";
pub const PLAIN_STORAGE_CHANGE_SET: &str = "PlainStorageChangeSet";
pub const ACCOUNT_CHANGE_SET: &str = "AccountChangeSet";
pub const STORAGE_HISTORY: &str = "StorageHistory";
pub const ACCOUNT_HISTORY: &str = "AccountHistory";
pub const BLOCK_BODY: &str = "BlockBody";
pub const BLOCK_RECEIPTS: &str = "BlockReceipts";
pub const HEADERS: &str = "Headers";
pub const SYNC_STAGE_PROGRESS: &str = "SyncStageProgress";
