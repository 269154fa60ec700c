use alloy_primitives::{Address, Bytes, B256};

use silkrpc_evm_tracing::{CallMessage, EvmTracer, IntraBlockState, StateDiff, VmTrace};

/// An uncle header, just enough of it to compute uncle rewards.
#[derive(Debug, Clone, Copy)]
pub struct OmmerHeader {
    pub beneficiary: Address,
    pub number: u64,
}

/// Just the header fields the trace executor needs: identity, beneficiary
/// and ommers for reward synthesis.
#[derive(Debug, Clone)]
pub struct BlockHeaderInfo {
    pub hash: B256,
    pub number: u64,
    pub beneficiary: Address,
    pub ommers: Vec<OmmerHeader>,
}

/// One already-decoded transaction, ready to hand to the EVM.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub hash: B256,
    pub message: CallMessage,
}

#[derive(Debug, Clone)]
pub struct TracedBlock {
    pub header: BlockHeaderInfo,
    pub transactions: Vec<PendingTransaction>,
}

/// Which of the VM/call/state-diff tracers to run for a given trace request
/// (spec.md 4.10's `vmTrace`/`trace`/`stateDiff` selection).
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceConfig {
    pub vm_trace: bool,
    pub trace: bool,
    pub state_diff: bool,
}

/// Result of tracing one transaction. Mirrors the shape of the real
/// `alloy_rpc_types_trace::parity::TraceResults`, but carries this crate's
/// own `VmTrace`/`StateDiff` types (4.9's bespoke tracer output shapes)
/// instead of the generic ones the wire format would otherwise imply.
#[derive(Debug, Clone)]
pub struct TraceCallTraces {
    pub output: Bytes,
    pub trace: Vec<alloy_rpc_types_trace::parity::TransactionTrace>,
    pub vm_trace: Option<VmTrace>,
    pub state_diff: Option<StateDiff>,
    pub pre_check_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub output: Bytes,
    pub gas_used: u64,
    pub success: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Failed before the first instruction ran: insufficient balance,
    /// nonce mismatch, intrinsic gas floor not met. The trace executor
    /// reports this as `pre_check_error` and moves on to the next
    /// transaction rather than failing the whole block (4.10).
    #[error("{0}")]
    GasPreCheck(String),

    #[error("evm execution failed: {0}")]
    Internal(String),
}

/// Seam to the EVM itself, which spec.md treats as an external collaborator
/// out of scope for this workspace. A concrete implementation backed by
/// `revm` is wired in by the daemon binary; this crate only orchestrates
/// tracer selection and state threading around calls to it.
pub trait EvmExecutor: Send + Sync {
    fn execute(
        &self,
        base_state: &dyn IntraBlockState,
        message: &CallMessage,
        refund: bool,
        gas_bailout: bool,
        tracer: &mut dyn EvmTracer,
    ) -> Result<CallOutcome, ExecutorError>;
}
