use alloy_primitives::{Address, Bytes, U256};
use alloy_rpc_types_trace::parity::CallType;

/// EVM hardfork in effect for the call being traced. The interpreter itself
/// is an external collaborator (spec.md 1); this is the minimal slice of its
/// state a tracer needs to vary VM-trace/call-trace behavior across forks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    Frontier,
    Byzantium,
    Istanbul,
    London,
    Paris,
    Shanghai,
    Cancun,
}

/// Parameters of one call/create the EVM is about to execute.
#[derive(Debug, Clone)]
pub struct CallMessage {
    pub call_type: CallType,
    pub from: Address,
    pub to: Option<Address>,
    pub gas: u64,
    pub input: Bytes,
    pub init: Option<Bytes>,
    pub value: U256,
}

/// Terminal status of one call/create, driving the error-string mapping in
/// the call tracer (4.9) and the VM tracer's end-of-op gas adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Revert,
    OutOfGas,
    StackOverflow,
    StackUnderflow,
    UndefinedInstruction,
    InvalidInstruction,
    BadJumpDestination,
}

impl Status {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Error string the call tracer attaches to a failed frame (4.9).
    pub const fn error_message(self) -> Option<&'static str> {
        match self {
            Self::Success => None,
            Self::Revert => Some("Reverted"),
            Self::OutOfGas | Self::StackOverflow => Some("Out of gas"),
            Self::UndefinedInstruction | Self::InvalidInstruction => Some("Bad instruction"),
            Self::StackUnderflow => Some("Stack underflow"),
            Self::BadJumpDestination => Some("Bad jump destination"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: Status,
    pub gas_left: u64,
    pub output: Bytes,
}

#[derive(Debug, Clone, Copy)]
pub struct CallResult {
    pub gas_used: u64,
    pub success: bool,
}

/// Gas bracketing one instruction, passed to `on_instruction_start` so the
/// VM tracer can compute `gas_before - gas_after` for the *previous* op once
/// the next one starts (4.9).
#[derive(Debug, Clone, Copy)]
pub struct ExecutionState {
    pub gas_remaining: u64,
}

/// Read-only view of account/storage state as of the current instruction.
/// Owned and advanced by whatever drives the EVM; tracers only read it.
pub trait IntraBlockState {
    fn balance(&self, address: Address) -> U256;
    fn nonce(&self, address: Address) -> u64;
    fn code(&self, address: Address) -> Bytes;
    fn storage(&self, address: Address, key: U256) -> U256;
}

/// The six-hook callback contract the EVM invokes a tracer with, in this
/// exact order around nested calls (spec.md 4.9).
pub trait EvmTracer: Send {
    fn on_execution_start(&mut self, revision: Revision, message: &CallMessage, code: &Bytes);

    fn on_instruction_start(
        &mut self,
        pc: usize,
        stack_top: &[U256],
        stack_height: usize,
        state: &ExecutionState,
        ibs: &dyn IntraBlockState,
    );

    fn on_execution_end(&mut self, result: &ExecutionResult, ibs: &dyn IntraBlockState);

    fn on_precompiled_run(&mut self, result: &ExecutionResult, gas: u64, ibs: &dyn IntraBlockState);

    fn on_reward_granted(&mut self, call_result: &CallResult, ibs: &dyn IntraBlockState);

    fn on_creation_completed(&mut self, result: &ExecutionResult, ibs: &dyn IntraBlockState);
}
