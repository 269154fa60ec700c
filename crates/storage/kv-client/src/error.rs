/// Failures from the remote KV transport.
///
/// Per spec.md 4.1: "any transport error on the stream aborts every
/// outstanding request with a retriable error. The client never retries
/// transparently — the RPC handler may open a new transaction."
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("remote KV transport error: {0}")]
    Transport(#[from] tonic::Status),

    #[error("remote KV stream closed unexpectedly")]
    StreamClosed,

    #[error("cursor {0} is not open on this transaction")]
    UnknownCursor(u32),

    #[error("transaction is closed")]
    TransactionClosed,

    #[error("remote KV service returned a malformed reply: {0}")]
    MalformedReply(&'static str),
}

impl KvError {
    /// All `KvError` variants are transport/protocol failures and therefore
    /// retriable by opening a fresh transaction, per spec.md 4.1 and 7.
    pub const fn is_retriable(&self) -> bool {
        true
    }
}
