use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use silkrpc_primitives::ViewId;

use crate::error::KvError;
use crate::transport::op_stream::OpStream;
use crate::transport::{KvRpc, ReplyStream};
use crate::wire::{CursorOp, CursorReply, Op};

/// Entry point for opening transactions against the remote KV store.
///
/// Mirrors the factory role `silkworm::rpc::ethdb::kv::CoherentStateCache`'s
/// neighbour, the raw `Database`/`Transaction` pair, plays in
/// `ethdb/kv/remote_database.cpp`: a cheap handle that hands out a fresh
/// bidirectional stream per call to [`KvClient::begin`].
#[derive(Clone)]
pub struct KvClient {
    rpc: Arc<dyn KvRpc>,
}

impl KvClient {
    pub fn new(rpc: Arc<dyn KvRpc>) -> Self {
        Self { rpc }
    }

    /// Opens a new remote transaction, returning its [`ViewId`] and a handle
    /// to issue cursor operations on it.
    pub async fn begin(&self) -> Result<KvTransaction, KvError> {
        let (tx, rx) = mpsc::channel::<CursorOp>(16);
        let request = OpStream(rx);
        let response = self.rpc.tx(request).await.map_err(KvError::Transport)?;
        let inbound = response.into_inner();

        let mut txn = KvTransaction {
            inner: Arc::new(Mutex::new(TxnInner {
                outbound: tx,
                inbound,
                open_cursors: HashMap::new(),
                closed: false,
            })),
            view_id: ViewId::new(0),
        };
        // The opening exchange has no explicit op: the remote side pushes an
        // initial reply on stream creation carrying the transaction's ViewId
        // (spec.md 4.1, "Opening a transaction returns a ViewId").
        let first = txn.recv_raw().await?;
        txn.view_id = ViewId::new(first.view_id.ok_or(KvError::MalformedReply(
            "first reply on a fresh Tx stream must carry view_id",
        ))?);
        Ok(txn)
    }
}

struct TxnInner {
    outbound: mpsc::Sender<CursorOp>,
    inbound: ReplyStream,
    open_cursors: HashMap<u32, String>,
    closed: bool,
}

/// One remote transaction's request/reply cycle.
///
/// Per spec.md 4.1 ("Operations on cursors are strictly serialized over that
/// stream") and section 5 ("order of completion equals order of issue"), at
/// most one request is ever in flight on the underlying stream: callers
/// serialize through the `Mutex` and each call sends exactly one [`CursorOp`]
/// then awaits exactly one [`CursorReply`] before releasing it. This keeps
/// cursor multiplexing simple at the cost of request pipelining, matching
/// the synchronous cursor API the rest of this daemon is built against.
#[derive(Clone)]
pub struct KvTransaction {
    inner: Arc<Mutex<TxnInner>>,
    view_id: ViewId,
}

impl KvTransaction {
    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    async fn recv_raw(&self) -> Result<CursorReply, KvError> {
        let mut guard = self.inner.lock().await;
        recv_locked(&mut guard).await
    }

    /// Sends one op and awaits its reply, enforcing the single-in-flight
    /// invariant described on the type.
    pub(crate) async fn call(&self, op: CursorOp) -> Result<CursorReply, KvError> {
        let mut guard = self.inner.lock().await;
        if guard.closed {
            return Err(KvError::TransactionClosed);
        }
        guard.outbound.send(op).await.map_err(|_| KvError::StreamClosed)?;
        recv_locked(&mut guard).await
    }

    /// Opens a cursor on `bucket`, returning its server-assigned id.
    pub(crate) async fn open_cursor(&self, bucket: &str, dup_sort: bool) -> Result<u32, KvError> {
        let op = CursorOp {
            op: if dup_sort { Op::OpenDupSort } else { Op::Open } as i32,
            cursor_id: None,
            bucket_name: Some(bucket.to_string()),
            key: None,
            value: None,
        };
        let reply = self.call(op).await?;
        let cursor_id = reply
            .cursor_id
            .ok_or(KvError::MalformedReply("open reply missing cursor_id"))?;
        let mut guard = self.inner.lock().await;
        guard.open_cursors.insert(cursor_id, bucket.to_string());
        Ok(cursor_id)
    }

    pub(crate) async fn close_cursor(&self, cursor_id: u32) -> Result<(), KvError> {
        let op = CursorOp {
            op: Op::Close as i32,
            cursor_id: Some(cursor_id),
            bucket_name: None,
            key: None,
            value: None,
        };
        self.call(op).await?;
        let mut guard = self.inner.lock().await;
        guard.open_cursors.remove(&cursor_id);
        Ok(())
    }

    /// Closes the transaction. Any cursors still open on it become invalid.
    pub async fn close(self) -> Result<(), KvError> {
        let mut guard = self.inner.lock().await;
        guard.closed = true;
        drop(guard.outbound.clone());
        Ok(())
    }
}

async fn recv_locked(guard: &mut TxnInner) -> Result<CursorReply, KvError> {
    use futures_util::StreamExt;
    guard.inbound.next().await.ok_or(KvError::StreamClosed)?.map_err(KvError::Transport)
}
