use std::pin::Pin;
use std::sync::Arc;

use futures_util::Stream;
use tracing::{error, info};

use silkrpc_primitives::StateChangeBatch;

use crate::cache::CoherentStateCache;

/// A stream of state-change batches from the remote backend, as delivered by
/// its server-streaming subscription RPC.
pub type StateChangeStream = Pin<Box<dyn Stream<Item = Result<StateChangeBatch, SubscriptionError>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("state change subscription transport error: {0}")]
    Transport(String),
}

/// Opens the remote backend's state-change subscription. Implemented by the
/// backend client in `bin/daemon`; kept as a trait here so the subscriber
/// task below can be tested without a live backend.
#[async_trait::async_trait]
pub trait StateChangeSource: Send + Sync + 'static {
    async fn subscribe(&self) -> Result<StateChangeStream, SubscriptionError>;
}

/// Long-lived task that feeds [`CoherentStateCache`] from a state-change
/// subscription (spec.md 4.4, C4).
///
/// Applies batches to the cache strictly in arrival order, never
/// concurrently. If the stream breaks, reconnects and leaves the cache
/// as-is: readers whose `ViewId` is still resident continue to hit, others
/// miss and fall through to a direct DB read until a fresh batch arrives.
pub async fn run_subscription(source: Arc<dyn StateChangeSource>, cache: Arc<CoherentStateCache>) {
    loop {
        let mut stream = match source.subscribe().await {
            Ok(stream) => stream,
            Err(err) => {
                error!(%err, "state change subscription failed to open, retrying");
                continue;
            }
        };

        info!("state change subscription established");
        use futures_util::StreamExt;
        loop {
            match stream.next().await {
                Some(Ok(batch)) => cache.on_new_block(&batch),
                Some(Err(err)) => {
                    error!(%err, "state change stream error, reconnecting");
                    break;
                }
                None => {
                    info!("state change stream closed, reconnecting");
                    break;
                }
            }
        }
    }
}
