use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};

use crate::types::{CallMessage, CallResult, EvmTracer, ExecutionResult, ExecutionState, IntraBlockState, Revision};

const SSTORE: u8 = 0x55;

/// A field's pre/post state in an [`AccountDiffEntry`] (spec.md 4.9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffValue<T> {
    Born { to: T },
    Died { from: T },
    Changed { from: T, to: T },
    Same,
}

impl<T> DiffValue<T> {
    pub const fn is_same(&self) -> bool {
        matches!(self, Self::Same)
    }
}

#[derive(Debug, Clone)]
pub struct AccountDiffEntry {
    pub balance: DiffValue<U256>,
    pub nonce: DiffValue<u64>,
    pub code: DiffValue<Bytes>,
    pub storage: BTreeMap<U256, DiffValue<U256>>,
}

impl AccountDiffEntry {
    fn is_entirely_unchanged(&self) -> bool {
        self.balance.is_same()
            && self.nonce.is_same()
            && self.code.is_same()
            && self.storage.values().all(DiffValue::is_same)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateDiff(pub BTreeMap<Address, AccountDiffEntry>);

#[derive(Clone)]
struct InitialAccount {
    balance: U256,
    nonce: u64,
    code: Bytes,
}

/// Compares initial vs. final balance/nonce/code per touched address, and
/// each storage slot touched by an `SSTORE`.
///
/// Ported from `silkworm::rpc::StateDiffTracer` (`evm_trace.cpp`).
#[derive(Default)]
pub struct StateDiffTracer {
    address_stack: Vec<Address>,
    code_stack: Vec<Bytes>,
    initial_accounts: BTreeMap<Address, InitialAccount>,
    initial_storage: BTreeMap<(Address, U256), U256>,
    /// Set once the outermost call/create returns.
    pub diff: Option<StateDiff>,
}

impl StateDiffTracer {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot_account(&mut self, address: Address, ibs: &dyn IntraBlockState) {
        self.initial_accounts.entry(address).or_insert_with(|| InitialAccount {
            balance: ibs.balance(address),
            nonce: ibs.nonce(address),
            code: ibs.code(address),
        });
    }

    /// Builds the diff from the outermost call's final state.
    fn build_diff(&self, ibs: &dyn IntraBlockState) -> StateDiff {
        let mut out = BTreeMap::new();
        for (&address, initial) in &self.initial_accounts {
            let final_balance = ibs.balance(address);
            let final_nonce = ibs.nonce(address);
            let final_code = ibs.code(address);

            let mut storage = BTreeMap::new();
            for (&(slot_addr, key), &initial_value) in &self.initial_storage {
                if slot_addr != address {
                    continue;
                }
                let final_value = ibs.storage(address, key);
                storage.insert(key, diff_u256(initial_value, final_value));
            }

            let entry = AccountDiffEntry {
                balance: diff_u256(initial.balance, final_balance),
                nonce: diff_u64(initial.nonce, final_nonce),
                code: diff_bytes(&initial.code, &final_code),
                storage,
            };
            if !entry.is_entirely_unchanged() {
                out.insert(address, entry);
            }
        }
        StateDiff(out)
    }
}

fn diff_u256(initial: U256, final_: U256) -> DiffValue<U256> {
    match (initial.is_zero(), final_.is_zero()) {
        (true, true) => DiffValue::Same,
        _ if initial == final_ => DiffValue::Same,
        (true, false) => DiffValue::Born { to: final_ },
        (false, true) => DiffValue::Died { from: initial },
        (false, false) => DiffValue::Changed { from: initial, to: final_ },
    }
}

fn diff_u64(initial: u64, final_: u64) -> DiffValue<u64> {
    match (initial == 0, final_ == 0) {
        (true, true) => DiffValue::Same,
        _ if initial == final_ => DiffValue::Same,
        (true, false) => DiffValue::Born { to: final_ },
        (false, true) => DiffValue::Died { from: initial },
        (false, false) => DiffValue::Changed { from: initial, to: final_ },
    }
}

fn diff_bytes(initial: &Bytes, final_: &Bytes) -> DiffValue<Bytes> {
    match (initial.is_empty(), final_.is_empty()) {
        (true, true) => DiffValue::Same,
        _ if initial == final_ => DiffValue::Same,
        (true, false) => DiffValue::Born { to: final_.clone() },
        (false, true) => DiffValue::Died { from: initial.clone() },
        (false, false) => DiffValue::Changed { from: initial.clone(), to: final_.clone() },
    }
}

impl EvmTracer for StateDiffTracer {
    fn on_execution_start(&mut self, _revision: Revision, message: &CallMessage, code: &Bytes) {
        let address = message.to.unwrap_or(message.from);
        self.address_stack.push(address);
        self.code_stack.push(code.clone());
    }

    fn on_instruction_start(
        &mut self,
        pc: usize,
        stack_top: &[U256],
        _stack_height: usize,
        _state: &ExecutionState,
        ibs: &dyn IntraBlockState,
    ) {
        let Some(&address) = self.address_stack.last() else { return };
        self.snapshot_account(address, ibs);

        let is_sstore = self.code_stack.last().and_then(|code| code.get(pc)).is_some_and(|&b| b == SSTORE);
        if is_sstore {
            if let Some(&key) = stack_top.first() {
                self.initial_storage
                    .entry((address, key))
                    .or_insert_with(|| ibs.storage(address, key));
            }
        }
    }

    fn on_execution_end(&mut self, _result: &ExecutionResult, ibs: &dyn IntraBlockState) {
        if let Some(address) = self.address_stack.pop() {
            self.snapshot_account(address, ibs);
        }
        self.code_stack.pop();
        if self.address_stack.is_empty() {
            self.diff = Some(self.build_diff(ibs));
        }
    }

    fn on_precompiled_run(&mut self, _result: &ExecutionResult, _gas: u64, _ibs: &dyn IntraBlockState) {}

    fn on_reward_granted(&mut self, _call_result: &CallResult, _ibs: &dyn IntraBlockState) {}

    fn on_creation_completed(&mut self, _result: &ExecutionResult, _ibs: &dyn IntraBlockState) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rpc_types_trace::parity::CallType;
    use std::collections::HashMap;

    struct FakeState {
        balances: HashMap<Address, U256>,
        storage: HashMap<(Address, U256), U256>,
    }

    impl IntraBlockState for FakeState {
        fn balance(&self, address: Address) -> U256 {
            self.balances.get(&address).copied().unwrap_or(U256::ZERO)
        }
        fn nonce(&self, _address: Address) -> u64 {
            0
        }
        fn code(&self, _address: Address) -> Bytes {
            Bytes::new()
        }
        fn storage(&self, address: Address, key: U256) -> U256 {
            self.storage.get(&(address, key)).copied().unwrap_or(U256::ZERO)
        }
    }

    #[test]
    fn balance_change_is_reported_and_unchanged_addresses_are_elided() {
        let addr = Address::repeat_byte(9);
        let mut tracer = StateDiffTracer::new();
        let before = FakeState { balances: HashMap::from([(addr, U256::from(100))]), storage: HashMap::new() };
        let after = FakeState { balances: HashMap::from([(addr, U256::from(40))]), storage: HashMap::new() };

        let message = CallMessage {
            call_type: CallType::Call,
            from: Address::ZERO,
            to: Some(addr),
            gas: 1000,
            input: Bytes::new(),
            init: None,
            value: U256::ZERO,
        };
        tracer.on_execution_start(Revision::Cancun, &message, &Bytes::new());
        tracer.on_instruction_start(0, &[], 0, &ExecutionState { gas_remaining: 1000 }, &before);
        tracer.on_execution_end(
            &ExecutionResult { status: crate::types::Status::Success, gas_left: 900, output: Bytes::new() },
            &after,
        );

        let diff = tracer.diff.expect("diff set once outermost call closes");
        let entry = diff.0.get(&addr).expect("balance changed, entry retained");
        assert_eq!(entry.balance, DiffValue::Changed { from: U256::from(100), to: U256::from(40) });
    }

    #[test]
    fn sstore_records_storage_diff() {
        let addr = Address::repeat_byte(3);
        let key = U256::from(7);
        let mut tracer = StateDiffTracer::new();
        let before = FakeState { balances: HashMap::new(), storage: HashMap::new() };
        let after = FakeState {
            balances: HashMap::new(),
            storage: HashMap::from([((addr, key), U256::from(42))]),
        };

        let message = CallMessage {
            call_type: CallType::Call,
            from: Address::ZERO,
            to: Some(addr),
            gas: 1000,
            input: Bytes::new(),
            init: None,
            value: U256::ZERO,
        };
        let code = Bytes::from_static(&[SSTORE]);
        tracer.on_execution_start(Revision::Cancun, &message, &code);
        tracer.on_instruction_start(0, &[key], 1, &ExecutionState { gas_remaining: 1000 }, &before);
        tracer.on_execution_end(
            &ExecutionResult { status: crate::types::Status::Success, gas_left: 900, output: Bytes::new() },
            &after,
        );

        let diff = tracer.diff.expect("diff set once outermost call closes");
        let entry = diff.0.get(&addr).expect("storage changed, entry retained");
        assert_eq!(entry.storage.get(&key), Some(&DiffValue::Born { to: U256::from(42) }));
    }
}
