use alloy_primitives::{Bytes, U256};

use silkrpc_evm_tracing::{CallMessage, CallResult, EvmTracer, ExecutionResult, ExecutionState, IntraBlockState, Revision};

/// Fans out each hook call to every tracer selected for one call/create, so
/// the executor only has to drive a single [`EvmTracer`] per transaction
/// regardless of how many of `vmTrace`/`trace`/`stateDiff` were requested.
pub struct CompositeTracer<'a> {
    tracers: Vec<&'a mut dyn EvmTracer>,
}

impl<'a> CompositeTracer<'a> {
    pub fn new(tracers: Vec<&'a mut dyn EvmTracer>) -> Self {
        Self { tracers }
    }
}

impl EvmTracer for CompositeTracer<'_> {
    fn on_execution_start(&mut self, revision: Revision, message: &CallMessage, code: &Bytes) {
        for tracer in &mut self.tracers {
            tracer.on_execution_start(revision, message, code);
        }
    }

    fn on_instruction_start(
        &mut self,
        pc: usize,
        stack_top: &[U256],
        stack_height: usize,
        state: &ExecutionState,
        ibs: &dyn IntraBlockState,
    ) {
        for tracer in &mut self.tracers {
            tracer.on_instruction_start(pc, stack_top, stack_height, state, ibs);
        }
    }

    fn on_execution_end(&mut self, result: &ExecutionResult, ibs: &dyn IntraBlockState) {
        for tracer in &mut self.tracers {
            tracer.on_execution_end(result, ibs);
        }
    }

    fn on_precompiled_run(&mut self, result: &ExecutionResult, gas: u64, ibs: &dyn IntraBlockState) {
        for tracer in &mut self.tracers {
            tracer.on_precompiled_run(result, gas, ibs);
        }
    }

    fn on_reward_granted(&mut self, call_result: &CallResult, ibs: &dyn IntraBlockState) {
        for tracer in &mut self.tracers {
            tracer.on_reward_granted(call_result, ibs);
        }
    }

    fn on_creation_completed(&mut self, result: &ExecutionResult, ibs: &dyn IntraBlockState) {
        for tracer in &mut self.tracers {
            tracer.on_creation_completed(result, ibs);
        }
    }
}
