//! Method dispatch and JSON-RPC error shaping (C13): the [`Dispatcher`]
//! table, the success/error envelope, and the handful of trivial
//! `net_*`/`web3_*` handlers and `ots_*`/`txpool_*` stubs that don't need
//! their own crate.
//!
//! Ported from `silkrpc::commands::RpcApiTable` and the error-wrapping
//! pattern shared by every `handle_*` method in `silkworm::rpc::commands`.

mod dispatch;
mod envelope;
mod net_web3;

pub use dispatch::{BoxFuture, DispatchError, Dispatcher, UnaryHandler};
pub use envelope::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use net_web3::{net_listening, net_peer_count, net_version, web3_client_version, web3_sha3, NodeInfoBackend};
