//! `silkrpc-daemon`: the read/trace JSON-RPC daemon's process entrypoint.
//!
//! Wires config, logging, the context pool, the remote KV client, and the
//! method dispatch table. Binding an actual HTTP/WebSocket listener is out
//! of scope (no such dependency is in this workspace and spec.md treats the
//! transport as opaque); this ties the pieces together and keeps the
//! context pool alive until shutdown, the way `bin/reth` drives its node
//! runner.

mod config;
mod context_pool;
mod dispatch_table;

use std::sync::Arc;

use clap::Parser;
use tonic::transport::{Channel, Endpoint};

use silkrpc_kv_client::{GrpcKvRpc, KvClient};

use config::DaemonConfig;
use context_pool::ContextPool;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = DaemonConfig::parse();
    init_tracing();

    tracing::info!(
        kv_endpoint = %config.kv_endpoint,
        backend_endpoint = %config.backend_endpoint,
        context_pool_size = config.context_pool_size,
        "starting silkrpc-daemon"
    );

    let pool = ContextPool::new(config.context_pool_size)?;
    let _pool_threads = pool.drive_in_background();

    let kv_channel = connect(&config.kv_endpoint).await?;
    let kv_client = Arc::new(KvClient::new(Arc::new(GrpcKvRpc::new(kv_channel))));
    tracing::debug!("connected to remote KV service");

    let cache = Arc::new(silkrpc_chain_state::CoherentStateCache::new(config.cache_config()));
    tracing::debug!(max_views = config.cache_max_views, "coherent state cache initialized");

    let dispatcher = dispatch_table::build_base_dispatcher();
    tracing::info!(registered_methods = dispatcher.len(), "dispatch table ready, entering shutdown wait");

    drop(kv_client);
    drop(cache);
    drop(dispatcher);
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    Ok(())
}

async fn connect(endpoint: &str) -> eyre::Result<Channel> {
    Ok(Endpoint::from_shared(endpoint.to_string())?.connect().await?)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
