//! `engine_*` method handlers (C11): `getPayloadV1`, `newPayloadV1`,
//! `forkchoiceUpdatedV1` forward to an [`EngineBackend`]; `exchangeTransitionConfigurationV1`
//! is validated locally against the genesis chain config.

mod api;
mod types;

pub use api::EngineApi;
pub use types::{EngineApiError, EngineBackend, TransitionConfiguration};
