use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};

use crate::transport::op_stream::OpStream;
use crate::wire::CursorOp;
use crate::wire::CursorReply;

/// Boxed inbound half of a `Tx` stream. Kept as a trait object (rather than
/// the concrete `tonic::Streaming<CursorReply>`) so [`KvRpc`] implementors
/// backed by something other than a live gRPC channel — an in-memory fake in
/// tests — can produce one without reaching into `tonic`'s private
/// constructors.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<CursorReply, Status>> + Send>>;

/// Abstracts the single RPC this client needs from the remote KV service, so
/// the transaction/cursor logic can be exercised against an in-memory fake
/// in tests instead of a live gRPC channel.
#[async_trait]
pub trait KvRpc: Send + Sync + 'static {
    async fn tx(&self, request: OpStream) -> Result<Response<ReplyStream>, Status>;
}

/// Hand-written equivalent of what `tonic-build` would generate for
/// `rpc Tx(stream CursorOp) returns (stream CursorReply)` — the `remote.KV`
/// service's wire format itself is treated as opaque (spec.md section 6), so
/// there is no `.proto` to compile and this talks directly to `tonic`'s
/// generic streaming client.
#[derive(Clone, Debug)]
pub struct GrpcKvRpc {
    inner: Grpc<Channel>,
}

impl GrpcKvRpc {
    pub fn new(channel: Channel) -> Self {
        Self { inner: Grpc::new(channel) }
    }
}

#[async_trait]
impl KvRpc for GrpcKvRpc {
    async fn tx(&self, request: OpStream) -> Result<Response<ReplyStream>, Status> {
        let mut inner = self.inner.clone();
        inner.ready().await.map_err(|e| Status::unknown(e.to_string()))?;
        let codec = ProstCodec::default();
        let path = PathAndQuery::from_static("/remote.KV/Tx");
        let response = inner.streaming(Request::new(request), path, codec).await?;
        Ok(response.map(|streaming| Box::pin(streaming) as ReplyStream))
    }
}

/// A nameable `Stream<Item = CursorOp>` fed by an mpsc channel, so the
/// transaction loop can push ops onto the outbound half of the `Tx` stream
/// while driving the inbound half concurrently.
pub mod op_stream {
    use futures_util::Stream;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::sync::mpsc::Receiver;

    use crate::wire::CursorOp;

    #[derive(Debug)]
    pub struct OpStream(pub Receiver<CursorOp>);

    impl Stream for OpStream {
        type Item = CursorOp;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.0.poll_recv(cx)
        }
    }
}
