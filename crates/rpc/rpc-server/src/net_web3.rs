use alloy_primitives::keccak256;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dispatch::DispatchError;

/// Backs `net_peerCount`/`net_version`/`web3_clientVersion`, the handful of
/// trivial methods that still need a round-trip to the backend (4.13,
/// ported from `silkrpc::commands::NetRpcApi`/`Web3RpcApi`).
#[async_trait]
pub trait NodeInfoBackend: Send + Sync {
    async fn peer_count(&self) -> Result<u64, DispatchError>;
    async fn net_version(&self) -> Result<u64, DispatchError>;
    async fn client_version(&self) -> Result<String, DispatchError>;
}

/// `net_listening` never needs the backend: a running node is always
/// listening.
pub async fn net_listening(_params: Value) -> Result<Value, DispatchError> {
    Ok(json!(true))
}

pub async fn net_peer_count(backend: &dyn NodeInfoBackend) -> Result<Value, DispatchError> {
    let count = backend.peer_count().await?;
    Ok(json!(to_quantity(count)))
}

pub async fn net_version(backend: &dyn NodeInfoBackend) -> Result<Value, DispatchError> {
    let version = backend.net_version().await?;
    Ok(json!(version.to_string()))
}

pub async fn web3_client_version(backend: &dyn NodeInfoBackend) -> Result<Value, DispatchError> {
    let version = backend.client_version().await?;
    Ok(json!(version))
}

/// `web3_sha3`: keccak256 of the single hex-encoded input parameter. Pure,
/// needs no backend.
pub async fn web3_sha3(params: Value) -> Result<Value, DispatchError> {
    let array = params
        .as_array()
        .filter(|a| a.len() == 1)
        .ok_or_else(|| DispatchError::InvalidParams { method: "web3_sha3".to_string(), params: params.clone() })?;

    let input = array[0]
        .as_str()
        .ok_or_else(|| DispatchError::InvalidParamsType(format!("invalid input: {}", array[0])))?;
    let bytes = alloy_primitives::hex::decode(input.trim_start_matches("0x"))
        .map_err(|_| DispatchError::InvalidParamsType(format!("invalid input: {input}")))?;

    let hash = keccak256(&bytes);
    Ok(json!(format!("0x{}", alloy_primitives::hex::encode(hash))))
}

fn to_quantity(value: u64) -> String {
    format!("0x{value:x}")
}
