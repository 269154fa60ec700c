use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use alloy_primitives::Bytes;
use serde_json::Value;

use crate::envelope::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Failures a handler can raise, shaped into JSON-RPC error codes by
/// [`Dispatcher::dispatch`] per 4.13/section 6/7.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Parameter shape (wrong arity, missing field): code `100`.
    #[error("invalid {method} params: {params}")]
    InvalidParams { method: String, params: Value },

    /// Parameter type coercion failure: code `-32602`.
    #[error("invalid params: {0}")]
    InvalidParamsType(String),

    /// Domain rejection with a caller-visible message: code `100`.
    #[error("{0}")]
    Domain(String),

    /// Transport/upstream/unexpected failure: code `-32000`.
    #[error("{0}")]
    Internal(String),

    /// EVM execution reverted: code `3`, revert payload carried in `data`.
    #[error("execution reverted")]
    Reverted { data: Bytes },

    /// Registered but intentionally unimplemented (`ots_*`/`txpool_*`
    /// stubs): code `-32601`, same as an unknown method.
    #[error("method not found")]
    NotImplemented,
}

impl From<&DispatchError> for JsonRpcError {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::InvalidParams { method, params } => {
                JsonRpcError::new(100, format!("invalid {method} params: {params}"))
            }
            DispatchError::InvalidParamsType(msg) => JsonRpcError::new(-32602, msg.clone()),
            DispatchError::Domain(msg) => JsonRpcError::new(100, msg.clone()),
            DispatchError::Internal(msg) => JsonRpcError::new(-32000, msg.clone()),
            DispatchError::Reverted { data } => {
                JsonRpcError::with_data(3, "execution reverted", data.clone())
            }
            DispatchError::NotImplemented => JsonRpcError::method_not_found(),
        }
    }
}

/// A registered method handler: `params -> result`, matching the table's
/// `(request, reply) -> ()` shape generalized to Rust's `Fn`+`Future`
/// convention (ported from `silkworm::commands::RpcApiTable`'s per-method
/// registration).
pub trait UnaryHandler: Send + Sync {
    fn call(&self, params: Value) -> BoxFuture<Result<Value, DispatchError>>;
}

impl<F, Fut> UnaryHandler for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
{
    fn call(&self, params: Value) -> BoxFuture<Result<Value, DispatchError>> {
        Box::pin(self(params))
    }
}

/// Compile-time-known-shape method table mapping method name to handler
/// (4.13). Built at startup by `bin/daemon`; read-only for the lifetime of
/// the server.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, Arc<dyn UnaryHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: &'static str, handler: impl UnaryHandler + 'static) {
        self.handlers.insert(method, Arc::new(handler));
    }

    /// Registers `method` as recognized but deliberately unimplemented:
    /// dispatch succeeds in finding it, but it always returns
    /// [`DispatchError::NotImplemented`] (`-32601`), the same code an
    /// unknown method gets. Used for the `ots_*`/`txpool_*` surface.
    pub fn register_stub(&mut self, method: &'static str) {
        self.register(method, |_params: Value| async { Err(DispatchError::NotImplemented) });
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let Some(handler) = self.handlers.get(request.method.as_str()) else {
            tracing::debug!(method = %request.method, "unknown method");
            return JsonRpcResponse::error(request.id, JsonRpcError::method_not_found());
        };

        match handler.call(request.params).await {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(err) => {
                tracing::warn!(method = %request.method, error = %err, "rpc handler failed");
                JsonRpcResponse::error(request.id, JsonRpcError::from(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let dispatcher = Dispatcher::new();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Value::from(1),
            method: "eth_nonexistent".to_string(),
            params: Value::Array(vec![]),
        };
        let response = dispatcher.dispatch(request).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn registered_method_is_invoked() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("web3_echo", |params: Value| async move { Ok(params) });
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Value::from(1),
            method: "web3_echo".to_string(),
            params: Value::from("hello"),
        };
        let response = dispatcher.dispatch(request).await;
        assert_eq!(response.result.unwrap(), Value::from("hello"));
    }

    #[tokio::test]
    async fn domain_error_maps_to_code_100() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("engine_exchangeTransitionConfigurationV1", |_: Value| async {
            Err(DispatchError::Domain("finalized block hash is empty".to_string()))
        });
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Value::from(1),
            method: "engine_exchangeTransitionConfigurationV1".to_string(),
            params: Value::Array(vec![]),
        };
        let response = dispatcher.dispatch(request).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, 100);
        assert_eq!(error.message, "finalized block hash is empty");
    }

    #[tokio::test]
    async fn stubbed_method_reports_not_found() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register_stub("txpool_content");
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Value::from(1),
            method: "txpool_content".to_string(),
            params: Value::Array(vec![]),
        };
        let response = dispatcher.dispatch(request).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }
}
