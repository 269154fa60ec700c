use alloy_primitives::{B256, U256};
use alloy_rpc_types_engine::{ExecutionPayloadV1, ForkchoiceState, ForkchoiceUpdated, PayloadAttributes, PayloadId, PayloadStatus};
use async_trait::async_trait;

/// `engine_exchangeTransitionConfigurationV1`'s request/response shape (4.11
/// step 6). Defined locally rather than reused from `alloy-rpc-types-engine`
/// since its exact field types weren't confirmed from the corpus; see
/// DESIGN.md.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfiguration {
    pub terminal_total_difficulty: U256,
    pub terminal_block_hash: B256,
    pub terminal_block_number: u64,
}

/// Errors the `engine_*` handlers raise. `Domain` carries the exact reject
/// message spec.md 4.11 names and is shaped into JSON-RPC code 100 by the
/// dispatch layer (4.13); `Provider` surfaces as an internal/upstream error.
#[derive(Debug, thiserror::Error)]
pub enum EngineApiError {
    #[error("{0}")]
    Domain(String),

    #[error(transparent)]
    Provider(#[from] silkrpc_provider::ProviderError),
}

/// The consensus-layer-facing backend each `engine_*` method forwards to
/// once local validation passes. Ported from `silkworm::rpc::ethbackend::BackEnd`'s
/// `engine_get_payload_v1`/`engine_new_payload_v1`/`engine_forkchoice_updated_v1`.
#[async_trait]
pub trait EngineBackend: Send + Sync {
    async fn get_payload_v1(&self, payload_id: PayloadId) -> Result<ExecutionPayloadV1, EngineApiError>;

    async fn new_payload_v1(&self, payload: ExecutionPayloadV1) -> Result<PayloadStatus, EngineApiError>;

    async fn forkchoice_updated_v1(
        &self,
        state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated, EngineApiError>;
}
