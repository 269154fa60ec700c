//! EVM tracers driven by the [`EvmTracer`] hook contract (C9): VM-trace,
//! call-trace, state-diff, and the intra-block-state overlay that threads
//! state across a block's transactions.
//!
//! The EVM interpreter itself is an external collaborator; these tracers
//! only observe the six hooks it calls around each executed call/create.

mod call_tracer;
mod intra_block_state;
mod state_diff_tracer;
mod vm_tracer;
mod types;

pub use call_tracer::CallTracer;
pub use intra_block_state::IntraBlockStateTracer;
pub use state_diff_tracer::{AccountDiffEntry, DiffValue, StateDiff, StateDiffTracer};
pub use types::{
    CallMessage, CallResult, EvmTracer, ExecutionResult, ExecutionState, IntraBlockState, Revision, Status,
};
pub use vm_tracer::{MemoryDelta, TraceEx, TraceOp, VmTrace, VmTracer};
