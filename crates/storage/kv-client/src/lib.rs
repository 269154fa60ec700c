//! Client for the remote KV store's bidirectional `Tx` stream, and the
//! cursor abstractions layered on top of it.
//!
//! Grounded in `silkworm::rpc::ethdb::kv` (`remote_database.cpp`,
//! `remote_cursor.cpp`) from the original implementation: a single stream
//! per transaction, cursors opened/closed as operations on that stream, and
//! split cursors decomposing composite keys for change-set and dup-sorted
//! walks (`storage_walker.cpp`).

mod client;
mod cursor;
mod error;
mod split_cursor;
mod transport;
mod wire;

pub use client::{KvClient, KvTransaction};
pub use cursor::{Cursor, DupCursor, DupSortCursor, OrderedCursor};
pub use error::KvError;
pub use split_cursor::{SplitCursor, SplitCursorDupSort, SplittedKeyValue};
pub use transport::{op_stream::OpStream, GrpcKvRpc, KvRpc};
pub use wire::{CursorOp, CursorReply, Op};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tonic::{Response, Status};

    use crate::transport::ReplyStream;

    /// In-memory fake standing in for the remote KV service: echoes back a
    /// ViewId on the first reply, then a fixed key/value for every `Seek`,
    /// and `None` afterwards — enough to exercise [`KvClient::begin`] and
    /// [`OrderedCursor::seek`] without a network.
    struct FakeKvRpc {
        view_id: u64,
    }

    #[async_trait::async_trait]
    impl KvRpc for FakeKvRpc {
        async fn tx(&self, mut request: OpStream) -> Result<Response<ReplyStream>, Status> {
            let (reply_tx, reply_rx) = mpsc::channel::<Result<CursorReply, Status>>(16);
            let view_id = self.view_id;
            tokio::spawn(async move {
                use futures_util::StreamExt;
                let _ = reply_tx
                    .send(Ok(CursorReply {
                        cursor_id: None,
                        key: None,
                        value: None,
                        view_id: Some(view_id),
                    }))
                    .await;
                let next_id = AtomicU32::new(1);
                while let Some(op) = request.next().await {
                    let reply = match Op::try_from(op.op).unwrap_or(Op::Close) {
                        Op::Open | Op::OpenDupSort => CursorReply {
                            cursor_id: Some(next_id.fetch_add(1, Ordering::SeqCst)),
                            key: None,
                            value: None,
                            view_id: None,
                        },
                        Op::Seek | Op::SeekExact => CursorReply {
                            cursor_id: op.cursor_id,
                            key: Some(b"k".to_vec()),
                            value: Some(b"v".to_vec()),
                            view_id: None,
                        },
                        _ => CursorReply {
                            cursor_id: op.cursor_id,
                            key: None,
                            value: None,
                            view_id: None,
                        },
                    };
                    if reply_tx.send(Ok(reply)).await.is_err() {
                        break;
                    }
                }
            });
            let stream = tokio_stream::wrappers::ReceiverStream::new(reply_rx);
            Ok(Response::new(Box::pin(stream) as ReplyStream))
        }
    }

    #[tokio::test]
    async fn begin_assigns_view_id_from_first_reply() {
        let client = KvClient::new(Arc::new(FakeKvRpc { view_id: 42 }));
        let txn = client.begin().await.expect("begin");
        assert_eq!(txn.view_id().get(), 42);
    }

    #[tokio::test]
    async fn ordered_cursor_seek_round_trips() {
        let client = KvClient::new(Arc::new(FakeKvRpc { view_id: 7 }));
        let txn = client.begin().await.expect("begin");
        let mut cursor = OrderedCursor::open(&txn, "PlainState").await.expect("open");
        let found = cursor.seek(b"anything").await.expect("seek").expect("some");
        assert_eq!(&found.key[..], b"k");
        assert_eq!(&found.value[..], b"v");
        cursor.close().await.expect("close");
    }
}
