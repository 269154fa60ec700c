//! The trace executor (C10): `trace_block_transactions`, `trace_call` and
//! `trace_filter`, built on top of the C9 tracers and an [`EvmExecutor`]
//! seam standing in for the EVM itself.

mod composite_tracer;
mod executor;
mod filter;
mod reward;
mod types;

pub use composite_tracer::CompositeTracer;
pub use executor::TraceExecutor;
pub use filter::{trace_filter, BlockSource, TraceFilterParams, TraceSink};
pub use reward::{base_block_reward_pre_merge, block_reward, extract_reward_traces, ommer_reward};
pub use types::{
    BlockHeaderInfo, CallOutcome, EvmExecutor, ExecutorError, OmmerHeader, PendingTransaction, TraceCallTraces,
    TraceConfig, TracedBlock,
};
