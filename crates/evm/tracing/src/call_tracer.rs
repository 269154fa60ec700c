use alloy_primitives::{Address, Bytes, U256};
use alloy_rpc_types_trace::parity::{
    Action, CallAction, CallOutput, CreateAction, CreateOutput, RewardAction, RewardType, TraceOutput,
    TransactionTrace,
};

use crate::types::{CallMessage, CallResult, EvmTracer, ExecutionResult, ExecutionState, IntraBlockState, Revision, Status};

struct OpenFrame {
    trace_address: Vec<usize>,
    action: Action,
    children: usize,
}

/// Records every call frame as a [`TransactionTrace`], assigning each a
/// `trace_address` path and filling in `gas_used`/`error` on completion.
///
/// Ported from `silkworm::rpc::CallTracer` (`evm_trace.cpp`).
#[derive(Default)]
pub struct CallTracer {
    open: Vec<OpenFrame>,
    /// Completed traces in the order their frames closed (post-order); the
    /// `trace_address` field already encodes tree position for sorting.
    pub traces: Vec<TransactionTrace>,
}

impl CallTracer {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_trace_address(&self) -> Vec<usize> {
        match self.open.last() {
            None => vec![],
            Some(parent) => {
                let mut addr = parent.trace_address.clone();
                addr.push(parent.children);
                addr
            }
        }
    }

    /// A synthetic reward trace, appended by the trace executor (C10) rather
    /// than emitted by the EVM hook contract.
    pub fn reward_trace(author: Address, reward_type: RewardType, value: U256) -> TransactionTrace {
        TransactionTrace {
            trace_address: vec![],
            subtraces: 0,
            action: Action::Reward(RewardAction { author, reward_type, value }),
            error: None,
            result: None,
        }
    }
}

impl EvmTracer for CallTracer {
    fn on_execution_start(&mut self, _revision: Revision, message: &CallMessage, _code: &Bytes) {
        let trace_address = self.next_trace_address();
        if let Some(parent) = self.open.last_mut() {
            parent.children += 1;
        }
        let action = match message.init {
            Some(ref init) => Action::Create(CreateAction {
                from: message.from,
                gas: message.gas,
                init: init.clone(),
                value: message.value,
            }),
            None => Action::Call(CallAction {
                from: message.from,
                call_type: message.call_type,
                gas: message.gas,
                input: message.input.clone(),
                to: message.to.unwrap_or_default(),
                value: message.value,
            }),
        };
        self.open.push(OpenFrame { trace_address, action, children: 0 });
    }

    fn on_instruction_start(
        &mut self,
        _pc: usize,
        _stack_top: &[U256],
        _stack_height: usize,
        _state: &ExecutionState,
        _ibs: &dyn IntraBlockState,
    ) {
    }

    fn on_execution_end(&mut self, result: &ExecutionResult, _ibs: &dyn IntraBlockState) {
        let frame = self.open.pop().expect("frame pushed in on_execution_start");
        let error = result.status.error_message().map(str::to_string);
        let start_gas = match &frame.action {
            Action::Call(call) => call.gas,
            Action::Create(create) => create.gas,
            _ => 0,
        };
        let gas_used = start_gas.saturating_sub(result.gas_left);
        // A revert still yields a complete trace result (error = "Reverted"
        // carries the failure); only the hard-failure statuses drop it.
        let trace_result = match result.status {
            Status::Success | Status::Revert => match &frame.action {
                // filled in by `on_creation_completed`, which knows the
                // deployed address/code this hook does not.
                Action::Create(_) => None,
                _ => Some(TraceOutput::Call(CallOutput { gas_used, output: result.output.clone() })),
            },
            _ => None,
        };

        self.traces.push(TransactionTrace {
            trace_address: frame.trace_address,
            subtraces: frame.children,
            action: frame.action,
            error,
            result: trace_result,
        });
    }

    fn on_precompiled_run(&mut self, _result: &ExecutionResult, _gas: u64, _ibs: &dyn IntraBlockState) {}

    fn on_reward_granted(&mut self, _call_result: &CallResult, _ibs: &dyn IntraBlockState) {}

    fn on_creation_completed(&mut self, result: &ExecutionResult, _ibs: &dyn IntraBlockState) {
        // The matching `Action::Create` trace was already pushed by
        // `on_execution_end` for the init-code run; attach the deployed
        // code/address/gas_used the call tracer needs that the init-code
        // execution itself doesn't carry.
        if let Some(last) = self.traces.last_mut() {
            let start_gas = match &last.action {
                Action::Create(create) => Some(create.gas),
                _ => None,
            };
            if let Some(start_gas) = start_gas {
                if matches!(result.status, Status::Success | Status::Revert) {
                    let gas_used = start_gas.saturating_sub(result.gas_left);
                    last.result = Some(TraceOutput::Create(CreateOutput {
                        address: Address::ZERO,
                        code: result.output.clone(),
                        gas_used,
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rpc_types_trace::parity::CallType;

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

    fn call_message(to: Address) -> CallMessage {
        CallMessage {
            call_type: CallType::Call,
            from: Address::repeat_byte(1),
            to: Some(to),
            gas: 1000,
            input: Bytes::new(),
            init: None,
            value: U256::ZERO,
        }
    }

    #[test]
    fn nested_calls_get_increasing_trace_addresses() {
        // A calls B, B calls D (nested), then A calls C (sibling of B).
        let mut tracer = CallTracer::new();
        let ibs = NullState;
        let code = Bytes::new();
        let end = |gas_left: u64| ExecutionResult { status: Status::Success, gas_left, output: Bytes::new() };

        tracer.on_execution_start(Revision::Cancun, &call_message(Address::repeat_byte(2)), &code); // A
        tracer.on_execution_start(Revision::Cancun, &call_message(Address::repeat_byte(3)), &code); // A.B
        tracer.on_execution_start(Revision::Cancun, &call_message(Address::repeat_byte(5)), &code); // A.B.D
        tracer.on_execution_end(&end(950), &ibs); // D ends
        tracer.on_execution_end(&end(900), &ibs); // B ends
        tracer.on_execution_start(Revision::Cancun, &call_message(Address::repeat_byte(4)), &code); // A.C
        tracer.on_execution_end(&end(800), &ibs); // C ends
        tracer.on_execution_end(&end(700), &ibs); // A ends

        assert_eq!(tracer.traces.len(), 4);
        assert_eq!(tracer.traces[0].trace_address, vec![0usize, 0]); // D
        assert_eq!(tracer.traces[1].trace_address, vec![0usize]); // B
        assert_eq!(tracer.traces[2].trace_address, vec![1usize]); // C
        assert_eq!(tracer.traces[3].trace_address, Vec::<usize>::new()); // A
        assert_eq!(tracer.traces[1].subtraces, 1);
        assert_eq!(tracer.traces[3].subtraces, 2);

        let gas_used = |trace: &TransactionTrace| match trace.result.as_ref().unwrap() {
            TraceOutput::Call(call) => call.gas_used,
            TraceOutput::Create(create) => create.gas_used,
        };
        assert_eq!(gas_used(&tracer.traces[0]), 50); // D: 1000 - 950
        assert_eq!(gas_used(&tracer.traces[1]), 100); // B: 1000 - 900
        assert_eq!(gas_used(&tracer.traces[2]), 200); // C: 1000 - 800
        assert_eq!(gas_used(&tracer.traces[3]), 300); // A: 1000 - 700
    }

    #[test]
    fn revert_sets_error_message() {
        let mut tracer = CallTracer::new();
        let ibs = NullState;
        tracer.on_execution_start(Revision::Cancun, &call_message(Address::repeat_byte(2)), &Bytes::new());
        tracer.on_execution_end(
            &ExecutionResult { status: Status::Revert, gas_left: 400, output: Bytes::new() },
            &ibs,
        );
        assert_eq!(tracer.traces[0].error.as_deref(), Some("Reverted"));
        match tracer.traces[0].result.as_ref().expect("revert still carries a trace result") {
            TraceOutput::Call(call) => assert_eq!(call.gas_used, 600),
            TraceOutput::Create(_) => panic!("expected a call output"),
        }
    }

    #[test]
    fn hard_failure_clears_trace_result() {
        let mut tracer = CallTracer::new();
        let ibs = NullState;
        tracer.on_execution_start(Revision::Cancun, &call_message(Address::repeat_byte(2)), &Bytes::new());
        tracer.on_execution_end(
            &ExecutionResult { status: Status::OutOfGas, gas_left: 0, output: Bytes::new() },
            &ibs,
        );
        assert!(tracer.traces[0].result.is_none());
    }
}
