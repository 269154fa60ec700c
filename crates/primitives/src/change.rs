use alloy_primitives::{Address, Bytes, B256};

use crate::ViewId;

/// The action carried by one [`AccountChange`], mirroring the remote KV
/// service's `remote.Action` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Upsert,
    UpsertCode,
    Remove,
    Storage,
    Code,
}

/// One storage-slot delta within an [`AccountChange`] of action `STORAGE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub location: B256,
    pub data: Bytes,
}

/// Per-address record within a [`ChangeBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountChange {
    pub address: Address,
    pub action: ChangeAction,
    /// Present for `UPSERT`/`UPSERT_CODE`: the RLP-ish encoded account data.
    pub data: Option<Bytes>,
    /// Present for `UPSERT_CODE`/`CODE`: the contract bytecode.
    pub code: Option<Bytes>,
    pub incarnation: u64,
    /// Present for `STORAGE`.
    pub storage_changes: Vec<StorageChange>,
}

impl AccountChange {
    pub const fn new(address: Address, action: ChangeAction) -> Self {
        Self { address, action, data: None, code: None, incarnation: 0, storage_changes: Vec::new() }
    }
}

/// One batch of [`AccountChange`]s, as delivered within a
/// [`StateChangeBatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub changes: Vec<AccountChange>,
}

/// `{databaseViewId, [ChangeBatch]}` as delivered by the state-change
/// subscription (C4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChangeBatch {
    pub database_view_id: ViewId,
    pub change_batches: Vec<ChangeBatch>,
}

impl StateChangeBatch {
    /// A batch is "empty" (and must be skipped-and-logged by the cache
    /// ingest path, `4.5`) when it carries no change batches or every change
    /// batch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.change_batches.iter().all(|b| b.changes.is_empty())
    }
}
