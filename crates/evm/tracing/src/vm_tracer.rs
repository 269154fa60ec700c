use alloy_primitives::{Bytes, U256};
use alloy_rpc_types_trace::parity::CallType;

use crate::types::{CallMessage, EvmTracer, ExecutionResult, ExecutionState, IntraBlockState, Revision, Status};

/// One step of a [`VmTrace`] (spec.md 4.9).
#[derive(Debug, Clone)]
pub struct TraceOp {
    pub pc: usize,
    pub op_name: String,
    pub gas_cost: u64,
    pub idx: String,
    pub sub: Option<VmTrace>,
    pub trace_ex: TraceEx,
}

#[derive(Debug, Clone, Default)]
pub struct TraceEx {
    pub memory: Option<MemoryDelta>,
    pub stack: Vec<U256>,
    pub storage: Option<(U256, U256)>,
    pub used: u64,
}

#[derive(Debug, Clone)]
pub struct MemoryDelta {
    pub offset: usize,
    pub data: Bytes,
}

/// Tree of executed instructions for one call, rooted at the top-level call.
#[derive(Debug, Clone, Default)]
pub struct VmTrace {
    pub code: Bytes,
    pub ops: Vec<TraceOp>,
}

struct PendingOp {
    pc: usize,
    op_name: String,
    gas_before: u64,
    stack: Vec<U256>,
}

/// Records a tree of executed instructions with per-op gas accounting.
///
/// Ported from `silkworm::rpc::VmTraceTracer` (`evm_trace.cpp`): a stack of
/// in-progress [`VmTrace`]s (one per call depth), each with at most one
/// not-yet-closed [`PendingOp`] whose `gas_cost` is only known once the next
/// instruction starts (or the call ends).
#[derive(Default)]
pub struct VmTracer {
    frames: Vec<VmTrace>,
    pending: Vec<Option<PendingOp>>,
    op_counts: Vec<usize>,
    call_types: Vec<CallType>,
    callee_start_gas: Vec<u64>,
    /// Set once the outermost frame closes.
    pub root: Option<VmTrace>,
}

impl VmTracer {
    pub fn new() -> Self {
        Self::default()
    }

    fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn idx(&self, depth: usize) -> String {
        let mut parts: Vec<String> = vec!["tx".to_string()];
        parts.extend(self.op_counts[..depth].iter().map(|n| n.to_string()));
        parts.push(self.op_counts[depth].to_string());
        parts.join("-")
    }

    fn push_op(&mut self, depth: usize, pending: PendingOp, gas_cost: u64, sub: Option<VmTrace>) {
        let idx = self.idx(depth);
        let op = TraceOp {
            pc: pending.pc,
            op_name: pending.op_name,
            gas_cost,
            idx,
            sub,
            trace_ex: TraceEx { stack: pending.stack, used: gas_cost, ..Default::default() },
        };
        self.frames[depth].ops.push(op);
        self.op_counts[depth] += 1;
    }

    /// Finalizes the pending op at `parent_depth` (a CALL/CREATE) once its
    /// callee frame has finished, using the nested-cost rule for
    /// CALL/STATICCALL/DELEGATECALL/CALLCODE (4.9).
    fn close_parent_call(&mut self, parent_depth: usize, _child_call_type: CallType, child_start_gas: u64, child_frame: VmTrace) {
        let Some(pending) = self.pending[parent_depth].take() else {
            if let Some(last) = self.frames[parent_depth].ops.last_mut() {
                last.sub = Some(child_frame);
            }
            return;
        };
        // CALL/STATICCALL/DELEGATECALL/CALLCODE and CREATE all use the same
        // nested-cost rule here: the caller's gas just before the call minus
        // the gas the callee started with (4.9).
        let gas_cost = pending.gas_before.saturating_sub(child_start_gas);
        self.push_op(parent_depth, pending, gas_cost, Some(child_frame));
    }
}

impl EvmTracer for VmTracer {
    fn on_execution_start(&mut self, _revision: Revision, message: &CallMessage, code: &Bytes) {
        self.frames.push(VmTrace { code: code.clone(), ops: Vec::new() });
        self.pending.push(None);
        self.op_counts.push(0);
        self.call_types.push(message.call_type);
        self.callee_start_gas.push(message.gas);
    }

    fn on_instruction_start(
        &mut self,
        pc: usize,
        stack_top: &[U256],
        _stack_height: usize,
        state: &ExecutionState,
        _ibs: &dyn IntraBlockState,
    ) {
        let depth = self.depth();
        if let Some(prev) = self.pending[depth].take() {
            let gas_cost = prev.gas_before.saturating_sub(state.gas_remaining);
            self.push_op(depth, prev, gas_cost, None);
        }
        let op_name = self.frames[depth]
            .code
            .get(pc)
            .map(|&byte| opcode_name(byte))
            .unwrap_or("STOP")
            .to_string();
        self.pending[depth] =
            Some(PendingOp { pc, op_name, gas_before: state.gas_remaining, stack: stack_top.to_vec() });
    }

    fn on_execution_end(&mut self, result: &ExecutionResult, _ibs: &dyn IntraBlockState) {
        let depth = self.depth();
        if let Some(prev) = self.pending[depth].take() {
            let gas_cost = match result.status {
                Status::Success | Status::Revert => prev.gas_before.saturating_sub(result.gas_left),
                _ => prev.gas_before,
            };
            self.push_op(depth, prev, gas_cost, None);
        }

        let frame = self.frames.pop().expect("frame pushed in on_execution_start");
        self.pending.pop();
        self.op_counts.pop();
        let call_type = self.call_types.pop().expect("call type pushed alongside frame");
        let start_gas = self.callee_start_gas.pop().expect("start gas pushed alongside frame");

        if self.frames.is_empty() {
            self.root = Some(frame);
            return;
        }
        let parent_depth = self.depth();
        self.close_parent_call(parent_depth, call_type, start_gas, frame);
    }

    fn on_precompiled_run(&mut self, _result: &ExecutionResult, _gas: u64, _ibs: &dyn IntraBlockState) {
        tracing::trace!("precompile run, deferring to on_execution_end for frame close");
    }

    fn on_reward_granted(&mut self, _call_result: &crate::types::CallResult, _ibs: &dyn IntraBlockState) {}

    fn on_creation_completed(&mut self, _result: &ExecutionResult, _ibs: &dyn IntraBlockState) {}
}

/// Best-effort mnemonic for a raw opcode byte. Falls back to a hex label for
/// bytes this table does not name explicitly — sufficient for trace
/// readability, not a full opcode table.
fn opcode_name(byte: u8) -> &'static str {
    match byte {
        0x00 => "STOP",
        0x01 => "ADD",
        0x02 => "MUL",
        0x03 => "SUB",
        0x10 => "LT",
        0x11 => "GT",
        0x14 => "EQ",
        0x20 => "SHA3",
        0x35 => "CALLDATALOAD",
        0x51 => "MLOAD",
        0x52 => "MSTORE",
        0x54 => "SLOAD",
        0x55 => "SSTORE",
        0x56 => "JUMP",
        0x57 => "JUMPI",
        0x5b => "JUMPDEST",
        0xf0 => "CREATE",
        0xf1 => "CALL",
        0xf2 => "CALLCODE",
        0xf3 => "RETURN",
        0xf4 => "DELEGATECALL",
        0xf5 => "CREATE2",
        0xfa => "STATICCALL",
        0xfd => "REVERT",
        0xff => "SELFDESTRUCT",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use crate::types::IntraBlockState;

    struct NullState;
    impl IntraBlockState for NullState {
        fn balance(&self, _address: Address) -> U256 {
            U256::ZERO
        }
        fn nonce(&self, _address: Address) -> u64 {
            0
        }
        fn code(&self, _address: Address) -> Bytes {
            Bytes::new()
        }
        fn storage(&self, _address: Address, _key: U256) -> U256 {
            U256::ZERO
        }
    }

    fn message(gas: u64) -> CallMessage {
        CallMessage {
            call_type: CallType::Call,
            from: Address::ZERO,
            to: Some(Address::ZERO),
            gas,
            input: Bytes::new(),
            init: None,
            value: U256::ZERO,
        }
    }

    #[test]
    fn single_frame_gas_costs_by_subtraction() {
        let mut tracer = VmTracer::new();
        let code = Bytes::from_static(&[0x60, 0x01]); // not used for these pcs, pc only looks up byte 0
        let ibs = NullState;
        tracer.on_execution_start(Revision::Cancun, &message(1000), &code);
        tracer.on_instruction_start(0, &[], 0, &ExecutionState { gas_remaining: 1000 }, &ibs);
        tracer.on_instruction_start(1, &[], 0, &ExecutionState { gas_remaining: 997 }, &ibs);
        tracer.on_execution_end(
            &ExecutionResult { status: Status::Success, gas_left: 990, output: Bytes::new() },
            &ibs,
        );

        let root = tracer.root.expect("root frame set");
        assert_eq!(root.ops.len(), 2);
        assert_eq!(root.ops[0].gas_cost, 3); // 1000 - 997
        assert_eq!(root.ops[1].gas_cost, 7); // 997 - 990
        assert_eq!(root.ops[0].idx, "tx-0");
        assert_eq!(root.ops[1].idx, "tx-1");
    }

    #[test]
    fn nested_call_cost_uses_caller_gas_before_minus_callee_start_gas() {
        let mut tracer = VmTracer::new();
        let ibs = NullState;
        let outer_code = Bytes::from_static(&[0xf1]); // CALL
        tracer.on_execution_start(Revision::Cancun, &message(10_000), &outer_code);
        tracer.on_instruction_start(0, &[], 0, &ExecutionState { gas_remaining: 10_000 }, &ibs);

        let inner_code = Bytes::from_static(&[0x00]);
        tracer.on_execution_start(Revision::Cancun, &message(9_000), &inner_code);
        tracer.on_instruction_start(0, &[], 0, &ExecutionState { gas_remaining: 9_000 }, &ibs);
        tracer.on_execution_end(
            &ExecutionResult { status: Status::Success, gas_left: 8_900, output: Bytes::new() },
            &ibs,
        );

        tracer.on_execution_end(
            &ExecutionResult { status: Status::Success, gas_left: 900, output: Bytes::new() },
            &ibs,
        );

        let root = tracer.root.expect("root frame set");
        assert_eq!(root.ops.len(), 1);
        assert_eq!(root.ops[0].gas_cost, 1_000); // 10_000 - 9_000 (callee start gas)
        assert!(root.ops[0].sub.is_some());
    }
}
