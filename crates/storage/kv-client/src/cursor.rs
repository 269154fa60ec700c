use alloy_primitives::Bytes;
use async_trait::async_trait;

use silkrpc_primitives::KeyValue;

use crate::client::KvTransaction;
use crate::error::KvError;
use crate::wire::{CursorOp, Op};

/// A cursor over an ordered (non dup-sorted) table.
///
/// Grounds spec.md 4.2's generic cursor description directly in the ordered
/// half of `silkworm::rpc::ethdb::kv::CursorDupSort`'s base `Cursor`
/// interface: `seek`, `seek_exact`, `next`, `close`.
#[async_trait]
pub trait Cursor: Send + Sync {
    /// Positions the cursor at the first key >= `key`, or past the end.
    async fn seek(&mut self, key: &[u8]) -> Result<Option<KeyValue>, KvError>;

    /// Positions the cursor exactly at `key`, or past the end if absent.
    async fn seek_exact(&mut self, key: &[u8]) -> Result<Option<KeyValue>, KvError>;

    /// Advances to the next entry in key order.
    async fn next(&mut self) -> Result<Option<KeyValue>, KvError>;

    async fn close(self) -> Result<(), KvError>;
}

/// A cursor over a dup-sorted table, adding `seek_both`/`next_dup` on top of
/// the ordered cursor's operations (spec.md 4.2).
#[async_trait]
pub trait DupSortCursor: Cursor {
    /// Positions the cursor at `(key, subkey)` or the next subkey >= `subkey`
    /// under the same `key`.
    async fn seek_both(&mut self, key: &[u8], subkey: &[u8]) -> Result<Option<Bytes>, KvError>;

    /// Advances within the current key's duplicate values.
    async fn next_dup(&mut self) -> Result<Option<KeyValue>, KvError>;
}

/// Concrete ordered-cursor handle, opened against one bucket of one
/// transaction.
pub struct OrderedCursor {
    txn: KvTransaction,
    bucket: String,
    cursor_id: u32,
}

impl OrderedCursor {
    pub async fn open(txn: &KvTransaction, bucket: &str) -> Result<Self, KvError> {
        let cursor_id = txn.open_cursor(bucket, false).await?;
        Ok(Self { txn: txn.clone(), bucket: bucket.to_string(), cursor_id })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl Cursor for OrderedCursor {
    async fn seek(&mut self, key: &[u8]) -> Result<Option<KeyValue>, KvError> {
        seek_op(&self.txn, self.cursor_id, Op::Seek, key).await
    }

    async fn seek_exact(&mut self, key: &[u8]) -> Result<Option<KeyValue>, KvError> {
        seek_op(&self.txn, self.cursor_id, Op::SeekExact, key).await
    }

    async fn next(&mut self) -> Result<Option<KeyValue>, KvError> {
        let op = CursorOp {
            op: Op::Next as i32,
            cursor_id: Some(self.cursor_id),
            bucket_name: None,
            key: None,
            value: None,
        };
        reply_to_kv(self.txn.call(op).await?)
    }

    async fn close(self) -> Result<(), KvError> {
        self.txn.close_cursor(self.cursor_id).await
    }
}

/// Concrete dup-sort cursor handle.
pub struct DupCursor {
    txn: KvTransaction,
    bucket: String,
    cursor_id: u32,
}

impl DupCursor {
    pub async fn open(txn: &KvTransaction, bucket: &str) -> Result<Self, KvError> {
        let cursor_id = txn.open_cursor(bucket, true).await?;
        Ok(Self { txn: txn.clone(), bucket: bucket.to_string(), cursor_id })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl Cursor for DupCursor {
    async fn seek(&mut self, key: &[u8]) -> Result<Option<KeyValue>, KvError> {
        seek_op(&self.txn, self.cursor_id, Op::Seek, key).await
    }

    async fn seek_exact(&mut self, key: &[u8]) -> Result<Option<KeyValue>, KvError> {
        seek_op(&self.txn, self.cursor_id, Op::SeekExact, key).await
    }

    async fn next(&mut self) -> Result<Option<KeyValue>, KvError> {
        let op = CursorOp {
            op: Op::Next as i32,
            cursor_id: Some(self.cursor_id),
            bucket_name: None,
            key: None,
            value: None,
        };
        reply_to_kv(self.txn.call(op).await?)
    }

    async fn close(self) -> Result<(), KvError> {
        self.txn.close_cursor(self.cursor_id).await
    }
}

#[async_trait]
impl DupSortCursor for DupCursor {
    async fn seek_both(&mut self, key: &[u8], subkey: &[u8]) -> Result<Option<Bytes>, KvError> {
        let op = CursorOp {
            op: Op::SeekBoth as i32,
            cursor_id: Some(self.cursor_id),
            bucket_name: None,
            key: Some(key.to_vec()),
            value: Some(subkey.to_vec()),
        };
        let reply = self.txn.call(op).await?;
        Ok(reply.value.map(Bytes::from))
    }

    async fn next_dup(&mut self) -> Result<Option<KeyValue>, KvError> {
        let op = CursorOp {
            op: Op::NextDup as i32,
            cursor_id: Some(self.cursor_id),
            bucket_name: None,
            key: None,
            value: None,
        };
        reply_to_kv(self.txn.call(op).await?)
    }
}

async fn seek_op(
    txn: &KvTransaction,
    cursor_id: u32,
    op: Op,
    key: &[u8],
) -> Result<Option<KeyValue>, KvError> {
    let op = CursorOp {
        op: op as i32,
        cursor_id: Some(cursor_id),
        bucket_name: None,
        key: Some(key.to_vec()),
        value: None,
    };
    reply_to_kv(txn.call(op).await?)
}

fn reply_to_kv(reply: crate::wire::CursorReply) -> Result<Option<KeyValue>, KvError> {
    match (reply.key, reply.value) {
        (Some(key), Some(value)) if !key.is_empty() || !value.is_empty() => {
            Ok(Some(KeyValue::new(Bytes::from(key), Bytes::from(value))))
        }
        _ => Ok(None),
    }
}
