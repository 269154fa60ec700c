use silkrpc_rpc_server::{net_listening, web3_sha3, DispatchError, Dispatcher};

/// Methods recognized but intentionally not implemented by this daemon
/// (SPEC_FULL's supplemented `ots_*`/`txpool_*` surface): registered so
/// they resolve to a deliberate `-32601` rather than falling through the
/// unknown-method path.
const STUBBED_METHODS: &[&str] = &[
    "txpool_content",
    "txpool_status",
    "txpool_inspect",
    "ots_getApiLevel",
    "ots_getInternalOperations",
    "ots_hasCode",
    "ots_traceTransaction",
    "ots_getTransactionError",
    "ots_getBlockDetails",
    "ots_getBlockTransactions",
    "ots_searchTransactionsBefore",
    "ots_searchTransactionsAfter",
];

/// Builds the dispatch table's always-available portion: `net_*`/`web3_*`
/// handlers that need no remote state, plus the `ots_*`/`txpool_*` stubs.
///
/// `eth_*`/`trace_*`/`engine_*`/`debug_trace*` handlers need a
/// request-scoped transaction and are registered per connection by the
/// caller once a `DbReader`/`EvmExecutor` pair is available; wiring a real
/// `revm`-backed `EvmExecutor` is future work (DESIGN.md).
pub fn build_base_dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();

    dispatcher.register("net_listening", |params| net_listening(params));
    dispatcher.register("web3_sha3", |params| web3_sha3(params));
    dispatcher.register("net_peerCount", |_params| async {
        Err(DispatchError::Internal("backend client not wired".to_string()))
    });

    for method in STUBBED_METHODS {
        dispatcher.register_stub(method);
    }

    dispatcher
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use silkrpc_rpc_server::JsonRpcRequest;

    #[tokio::test]
    async fn net_listening_and_stubs_are_both_registered() {
        let dispatcher = build_base_dispatcher();

        let listening = dispatcher
            .dispatch(JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: Value::from(1),
                method: "net_listening".to_string(),
                params: Value::Array(vec![]),
            })
            .await;
        assert_eq!(listening.result, Some(json!(true)));

        let stub = dispatcher
            .dispatch(JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: Value::from(1),
                method: "txpool_content".to_string(),
                params: Value::Array(vec![]),
            })
            .await;
        assert_eq!(stub.error.unwrap().code, -32601);
    }
}
