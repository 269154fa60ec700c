use alloy_primitives::Bytes;

use silkrpc_evm_tracing::{CallMessage, CallTracer, EvmTracer, IntraBlockState, IntraBlockStateTracer, StateDiffTracer, VmTracer};

use crate::composite_tracer::CompositeTracer;
use crate::types::{CallOutcome, EvmExecutor, ExecutorError, TraceCallTraces, TraceConfig, TracedBlock};

/// Drives `vmTrace`/`trace`/`stateDiff` tracer selection and state
/// threading around an [`EvmExecutor`] (4.10).
///
/// Ported from `silkworm::rpc::TraceCallExecutor` (`evm_trace.cpp`).
pub struct TraceExecutor<Evm> {
    evm: Evm,
}

impl<Evm: EvmExecutor> TraceExecutor<Evm> {
    pub fn new(evm: Evm) -> Self {
        Self { evm }
    }

    /// `trace_block_transactions`: runs every transaction of `block` in
    /// order, threading state across them via the intra-block overlay so
    /// transaction N sees transaction N-1's final state.
    pub fn trace_block_transactions(
        &self,
        block: &TracedBlock,
        base_state: &dyn IntraBlockState,
        config: &TraceConfig,
    ) -> Vec<TraceCallTraces> {
        let mut overlay = IntraBlockStateTracer::new(base_state);
        let mut out = Vec::with_capacity(block.transactions.len());

        for tx in &block.transactions {
            let mut vm_tracer = config.vm_trace.then(VmTracer::new);
            let mut call_tracer = config.trace.then(CallTracer::new);
            let mut diff_tracer = StateDiffTracer::new();

            let result = {
                let mut tracers: Vec<&mut dyn EvmTracer> = Vec::new();
                if let Some(t) = vm_tracer.as_mut() {
                    tracers.push(t);
                }
                if let Some(t) = call_tracer.as_mut() {
                    tracers.push(t);
                }
                tracers.push(&mut diff_tracer);
                let mut composite = CompositeTracer::new(tracers);
                self.evm.execute(&overlay, &tx.message, true, true, &mut composite)
            };

            match result {
                Err(ExecutorError::GasPreCheck(reason)) => {
                    out.push(empty_traces(reason));
                }
                Err(ExecutorError::Internal(reason)) => {
                    tracing::warn!(tx_hash = %tx.hash, error = %reason, "transaction trace failed");
                    out.push(empty_traces(reason));
                }
                Ok(outcome) => {
                    if let Some(diff) = &diff_tracer.diff {
                        overlay.apply_diff(diff);
                    }
                    out.push(TraceCallTraces {
                        output: outcome.output,
                        trace: call_tracer.map(|t| t.traces).unwrap_or_default(),
                        vm_trace: vm_tracer.and_then(|t| t.root),
                        state_diff: if config.state_diff { diff_tracer.diff } else { None },
                        pre_check_error: None,
                    });
                }
            }
        }
        out
    }

    /// `trace_call`: replays transactions `0..tx_index` with only the
    /// intra-block tracer to establish state, then traces `call` with the
    /// selected tracers.
    pub fn trace_call(
        &self,
        block: &TracedBlock,
        tx_index: usize,
        call: &CallMessage,
        base_state: &dyn IntraBlockState,
        config: &TraceConfig,
    ) -> Result<TraceCallTraces, ExecutorError> {
        let mut overlay = IntraBlockStateTracer::new(base_state);
        for tx in &block.transactions[..tx_index] {
            let mut replay_diff = StateDiffTracer::new();
            self.evm.execute(&overlay, &tx.message, true, true, &mut replay_diff)?;
            if let Some(diff) = &replay_diff.diff {
                overlay.apply_diff(diff);
            }
        }

        let mut vm_tracer = config.vm_trace.then(VmTracer::new);
        let mut call_tracer = config.trace.then(CallTracer::new);
        let mut diff_tracer = StateDiffTracer::new();
        let outcome = {
            let mut tracers: Vec<&mut dyn EvmTracer> = Vec::new();
            if let Some(t) = vm_tracer.as_mut() {
                tracers.push(t);
            }
            if let Some(t) = call_tracer.as_mut() {
                tracers.push(t);
            }
            tracers.push(&mut diff_tracer);
            let mut composite = CompositeTracer::new(tracers);
            self.evm.execute(&overlay, call, true, true, &mut composite)?
        };

        Ok(TraceCallTraces {
            output: outcome.output,
            trace: call_tracer.map(|t| t.traces).unwrap_or_default(),
            vm_trace: vm_tracer.and_then(|t| t.root),
            state_diff: if config.state_diff { diff_tracer.diff } else { None },
            pre_check_error: None,
        })
    }
}

fn empty_traces(pre_check_error: String) -> TraceCallTraces {
    TraceCallTraces {
        output: Bytes::new(),
        trace: Vec::new(),
        vm_trace: None,
        state_diff: None,
        pre_check_error: Some(pre_check_error),
    }
}
