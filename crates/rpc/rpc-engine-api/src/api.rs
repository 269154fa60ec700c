use alloy_primitives::{B256, U256};
use alloy_rpc_types_engine::{ExecutionPayloadV1, ForkchoiceState, ForkchoiceUpdated, PayloadAttributes, PayloadId, PayloadStatus};

use silkrpc_primitives::tables;
use silkrpc_provider::DbReader;

use crate::types::{EngineApiError, EngineBackend, TransitionConfiguration};

/// `engine_*` method handlers (4.11): local validation in front of a
/// backend that owns actual payload building/execution.
///
/// Ported from `silkworm::rpc::commands::EngineRpcApi` (`engine_api.cpp`).
pub struct EngineApi<Backend, Db> {
    backend: Backend,
    db: Db,
}

impl<Backend: EngineBackend, Db: DbReader> EngineApi<Backend, Db> {
    pub fn new(backend: Backend, db: Db) -> Self {
        Self { backend, db }
    }

    pub async fn get_payload_v1(&self, payload_id: PayloadId) -> Result<ExecutionPayloadV1, EngineApiError> {
        self.backend.get_payload_v1(payload_id).await
    }

    pub async fn new_payload_v1(&self, payload: ExecutionPayloadV1) -> Result<PayloadStatus, EngineApiError> {
        self.backend.new_payload_v1(payload).await
    }

    pub async fn forkchoice_updated_v1(
        &self,
        state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated, EngineApiError> {
        if state.finalized_block_hash.is_zero() {
            return Err(EngineApiError::Domain("finalized block hash is empty".to_string()));
        }
        if state.safe_block_hash.is_zero() {
            return Err(EngineApiError::Domain("safe block hash is empty".to_string()));
        }
        self.backend.forkchoice_updated_v1(state, payload_attributes).await
    }

    /// 4.11 step 1-6: genesis hash -> chain config -> TTD/block-number checks.
    pub async fn exchange_transition_configuration_v1(
        &self,
        request: TransitionConfiguration,
    ) -> Result<TransitionConfiguration, EngineApiError> {
        let genesis_hash_bytes = self.db.get_one(tables::CANONICAL_HASHES, &0u64.to_be_bytes()).await?;
        let genesis_hash = to_b256(&genesis_hash_bytes)?;

        let config_bytes = self.db.get_one(tables::CONFIG, genesis_hash.as_slice()).await?;
        let config: serde_json::Value = serde_json::from_slice(&config_bytes)
            .map_err(|e| EngineApiError::Domain(format!("invalid chain config: {e}")))?;

        let Some(config_ttd) = config.get("terminalTotalDifficulty").and_then(|v| v.as_str()).map(parse_hex_u256) else {
            return Err(EngineApiError::Domain("execution layer does not have terminal total difficulty".to_string()));
        };
        let config_ttd = config_ttd?;

        if request.terminal_total_difficulty != config_ttd {
            return Err(EngineApiError::Domain("incorrect terminal total difficulty".to_string()));
        }
        if request.terminal_block_number != 0 {
            return Err(EngineApiError::Domain("consensus layer terminal block number is not zero".to_string()));
        }

        let terminal_block_hash = config
            .get("terminalBlockHash")
            .and_then(|v| v.as_str())
            .map(|s| parse_hex_b256(s))
            .transpose()?
            .unwrap_or(B256::ZERO);
        let terminal_block_number =
            config.get("terminalBlockNumber").and_then(|v| v.as_str()).map(parse_hex_u64).transpose()?.unwrap_or(0);

        Ok(TransitionConfiguration {
            terminal_total_difficulty: config_ttd,
            terminal_block_hash,
            terminal_block_number,
        })
    }
}

fn to_b256(bytes: &[u8]) -> Result<B256, EngineApiError> {
    if bytes.len() != 32 {
        return Err(EngineApiError::Domain("malformed canonical hash entry".to_string()));
    }
    Ok(B256::from_slice(bytes))
}

fn parse_hex_u256(s: &str) -> Result<U256, EngineApiError> {
    U256::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| EngineApiError::Domain(format!("invalid terminal total difficulty: {e}")))
}

fn parse_hex_b256(s: &str) -> Result<B256, EngineApiError> {
    let stripped = s.trim_start_matches("0x");
    let bytes = alloy_primitives::hex::decode(stripped)
        .map_err(|e| EngineApiError::Domain(format!("invalid terminal block hash: {e}")))?;
    to_b256(&bytes)
}

fn parse_hex_u64(s: &str) -> Result<u64, EngineApiError> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| EngineApiError::Domain(format!("invalid terminal block number: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use async_trait::async_trait;
    use silkrpc_primitives::{KeyValue, ViewId};
    use silkrpc_provider::ProviderError;
    use std::collections::HashMap;

    struct FakeDb(HashMap<(&'static str, Vec<u8>), Vec<u8>>);

    #[async_trait]
    impl DbReader for FakeDb {
        fn view_id(&self) -> ViewId {
            ViewId::new(1)
        }

        async fn get(&self, table: &'static str, key: &[u8]) -> Result<KeyValue, ProviderError> {
            let value = self.0.get(&(table, key.to_vec())).cloned().unwrap_or_default();
            Ok(KeyValue::new(Bytes::copy_from_slice(key), Bytes::from(value)))
        }

        async fn get_both_range(
            &self,
            _table: &'static str,
            _key: &[u8],
            _subkey: &[u8],
        ) -> Result<Option<Bytes>, ProviderError> {
            Ok(None)
        }

        async fn walk(
            &self,
            _table: &'static str,
            _start_key: &[u8],
            _fixed_bits: u32,
            _visitor: &mut dyn FnMut(&KeyValue) -> bool,
        ) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    struct UnusedBackend;
    #[async_trait]
    impl EngineBackend for UnusedBackend {
        async fn get_payload_v1(&self, _payload_id: PayloadId) -> Result<ExecutionPayloadV1, EngineApiError> {
            unreachable!("not exercised by these tests")
        }
        async fn new_payload_v1(&self, _payload: ExecutionPayloadV1) -> Result<PayloadStatus, EngineApiError> {
            unreachable!("not exercised by these tests")
        }
        async fn forkchoice_updated_v1(
            &self,
            _state: ForkchoiceState,
            _payload_attributes: Option<PayloadAttributes>,
        ) -> Result<ForkchoiceUpdated, EngineApiError> {
            unreachable!("not exercised by these tests")
        }
    }

    fn db_with_config(config_json: &str) -> FakeDb {
        let genesis_hash = B256::repeat_byte(7);
        let mut rows = HashMap::new();
        rows.insert((tables::CANONICAL_HASHES, 0u64.to_be_bytes().to_vec()), genesis_hash.to_vec());
        rows.insert((tables::CONFIG, genesis_hash.to_vec()), config_json.as_bytes().to_vec());
        FakeDb(rows)
    }

    #[tokio::test]
    async fn matching_ttd_and_zero_block_number_succeeds() {
        let api = EngineApi::new(UnusedBackend, db_with_config(r#"{"terminalTotalDifficulty":"0xa4a470"}"#));
        let request = TransitionConfiguration {
            terminal_total_difficulty: U256::from(0xa4a470u64),
            terminal_block_hash: B256::ZERO,
            terminal_block_number: 0,
        };
        let reply = api.exchange_transition_configuration_v1(request).await.unwrap();
        assert_eq!(reply.terminal_total_difficulty, U256::from(0xa4a470u64));
        assert_eq!(reply.terminal_block_hash, B256::ZERO);
        assert_eq!(reply.terminal_block_number, 0);
    }

    #[tokio::test]
    async fn mismatched_ttd_is_rejected() {
        let api = EngineApi::new(UnusedBackend, db_with_config(r#"{"terminalTotalDifficulty":"0xa4a470"}"#));
        let request = TransitionConfiguration {
            terminal_total_difficulty: U256::from(0xf4242u64),
            terminal_block_hash: B256::ZERO,
            terminal_block_number: 0,
        };
        let err = api.exchange_transition_configuration_v1(request).await.unwrap_err();
        assert!(matches!(err, EngineApiError::Domain(msg) if msg == "incorrect terminal total difficulty"));
    }

    #[tokio::test]
    async fn missing_ttd_in_config_is_rejected() {
        let api = EngineApi::new(UnusedBackend, db_with_config(r#"{}"#));
        let request = TransitionConfiguration {
            terminal_total_difficulty: U256::from(1u64),
            terminal_block_hash: B256::ZERO,
            terminal_block_number: 0,
        };
        let err = api.exchange_transition_configuration_v1(request).await.unwrap_err();
        assert!(matches!(err, EngineApiError::Domain(msg) if msg == "execution layer does not have terminal total difficulty"));
    }

    #[tokio::test]
    async fn nonzero_terminal_block_number_is_rejected() {
        let api = EngineApi::new(UnusedBackend, db_with_config(r#"{"terminalTotalDifficulty":"0xa4a470"}"#));
        let request = TransitionConfiguration {
            terminal_total_difficulty: U256::from(0xa4a470u64),
            terminal_block_hash: B256::ZERO,
            terminal_block_number: 1,
        };
        let err = api.exchange_transition_configuration_v1(request).await.unwrap_err();
        assert!(matches!(err, EngineApiError::Domain(msg) if msg == "consensus layer terminal block number is not zero"));
    }

    #[tokio::test]
    async fn forkchoice_updated_rejects_empty_finalized_hash() {
        let api = EngineApi::new(UnusedBackend, db_with_config(r#"{}"#));
        let state = ForkchoiceState {
            head_block_hash: B256::repeat_byte(1),
            safe_block_hash: B256::repeat_byte(1),
            finalized_block_hash: B256::ZERO,
        };
        let err = api.forkchoice_updated_v1(state, None).await.unwrap_err();
        assert!(matches!(err, EngineApiError::Domain(msg) if msg == "finalized block hash is empty"));
    }

    #[tokio::test]
    async fn forkchoice_updated_rejects_empty_safe_hash() {
        let api = EngineApi::new(UnusedBackend, db_with_config(r#"{}"#));
        let state = ForkchoiceState {
            head_block_hash: B256::repeat_byte(1),
            safe_block_hash: B256::ZERO,
            finalized_block_hash: B256::repeat_byte(1),
        };
        let err = api.forkchoice_updated_v1(state, None).await.unwrap_err();
        assert!(matches!(err, EngineApiError::Domain(msg) if msg == "safe block hash is empty"));
    }
}
