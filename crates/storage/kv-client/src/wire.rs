//! Wire messages for the remote KV `Tx` bidirectional stream.
//!
//! Per spec.md section 6, the gRPC wire format of the remote services is
//! opaque and out of scope; these are the concrete message shapes this
//! daemon speaks, matching the `{op, cursor_id?, bucket_name?, key?, value?}`
//! / `{cursor_id?, key?, value?}` contract described in spec.md 4.1. They are
//! hand-derived `prost::Message` impls rather than generated from a `.proto`
//! file, since the upstream schema itself is out of scope here.

/// One operation sent from client to server on the `Tx` stream.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct CursorOp {
    #[prost(enumeration = "Op", tag = "1")]
    pub op: i32,
    #[prost(uint32, optional, tag = "2")]
    pub cursor_id: Option<u32>,
    #[prost(string, optional, tag = "3")]
    pub bucket_name: Option<String>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub key: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "5")]
    pub value: Option<Vec<u8>>,
}

/// The server's reply to one [`CursorOp`]. The very first reply on a fresh
/// stream additionally carries `view_id`, assigning this transaction's
/// [`silkrpc_primitives::ViewId`].
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct CursorReply {
    #[prost(uint32, optional, tag = "1")]
    pub cursor_id: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub key: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub value: Option<Vec<u8>>,
    #[prost(uint64, optional, tag = "4")]
    pub view_id: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ::prost::Enumeration)]
#[repr(i32)]
pub enum Op {
    Open = 0,
    OpenDupSort = 1,
    Seek = 2,
    SeekExact = 3,
    SeekBoth = 4,
    SeekBothExact = 5,
    Next = 6,
    NextDup = 7,
    Close = 8,
}
