use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};

use crate::state_diff_tracer::{DiffValue, StateDiff};
use crate::types::IntraBlockState;

#[derive(Default, Clone)]
struct AccountOverlay {
    balance: Option<U256>,
    nonce: Option<u64>,
    code: Option<Bytes>,
}

fn final_value<T: Default + Clone>(diff: &DiffValue<T>) -> Option<T> {
    match diff {
        DiffValue::Born { to } | DiffValue::Changed { to, .. } => Some(to.clone()),
        DiffValue::Died { .. } => Some(T::default()),
        DiffValue::Same => None,
    }
}

/// Wraps a per-block base reader with an overlay folded in after each
/// transaction, so the next transaction's tracers observe the previous
/// transaction's final balance/nonce/code/storage rather than the block's
/// opening state.
///
/// Ported from `silkworm::rpc::IntraBlockState` (`evm_trace.cpp`), which
/// threads state the same way across a block's transactions.
pub struct IntraBlockStateTracer<'a> {
    base: &'a dyn IntraBlockState,
    accounts: BTreeMap<Address, AccountOverlay>,
    storage: BTreeMap<(Address, U256), U256>,
}

impl<'a> IntraBlockStateTracer<'a> {
    pub fn new(base: &'a dyn IntraBlockState) -> Self {
        Self { base, accounts: BTreeMap::new(), storage: BTreeMap::new() }
    }

    /// Folds a finished transaction's [`StateDiff`] into the overlay.
    pub fn apply_diff(&mut self, diff: &StateDiff) {
        for (&address, entry) in &diff.0 {
            let overlay = self.accounts.entry(address).or_default();
            if let Some(value) = final_value(&entry.balance) {
                overlay.balance = Some(value);
            }
            if let Some(value) = final_value(&entry.nonce) {
                overlay.nonce = Some(value);
            }
            if let Some(value) = final_value(&entry.code) {
                overlay.code = Some(value);
            }
            for (&key, slot) in &entry.storage {
                if let Some(value) = final_value(slot) {
                    self.storage.insert((address, key), value);
                }
            }
        }
    }
}

impl IntraBlockState for IntraBlockStateTracer<'_> {
    fn balance(&self, address: Address) -> U256 {
        self.accounts.get(&address).and_then(|o| o.balance).unwrap_or_else(|| self.base.balance(address))
    }

    fn nonce(&self, address: Address) -> u64 {
        self.accounts.get(&address).and_then(|o| o.nonce).unwrap_or_else(|| self.base.nonce(address))
    }

    fn code(&self, address: Address) -> Bytes {
        self.accounts
            .get(&address)
            .and_then(|o| o.code.clone())
            .unwrap_or_else(|| self.base.code(address))
    }

    fn storage(&self, address: Address, key: U256) -> U256 {
        self.storage.get(&(address, key)).copied().unwrap_or_else(|| self.base.storage(address, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_diff_tracer::AccountDiffEntry;
    use std::collections::BTreeMap as Map;

    struct ZeroState;
    impl IntraBlockState for ZeroState {
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

    #[test]
    fn second_transaction_observes_first_transactions_final_state() {
        let base = ZeroState;
        let addr = Address::repeat_byte(1);
        let key = U256::from(5);

        let mut overlay = IntraBlockStateTracer::new(&base);
        assert_eq!(overlay.balance(addr), U256::ZERO);

        let mut storage = Map::new();
        storage.insert(key, DiffValue::Born { to: U256::from(77) });
        let mut diff = Map::new();
        diff.insert(
            addr,
            AccountDiffEntry {
                balance: DiffValue::Born { to: U256::from(500) },
                nonce: DiffValue::Born { to: 1 },
                code: DiffValue::Same,
                storage,
            },
        );
        overlay.apply_diff(&StateDiff(diff));

        assert_eq!(overlay.balance(addr), U256::from(500));
        assert_eq!(overlay.nonce(addr), 1);
        assert_eq!(overlay.storage(addr, key), U256::from(77));
        // untouched address still falls through to base.
        assert_eq!(overlay.balance(Address::repeat_byte(9)), U256::ZERO);
    }

    #[test]
    fn died_field_resets_to_default() {
        let base = ZeroState;
        let addr = Address::repeat_byte(2);
        let mut overlay = IntraBlockStateTracer::new(&base);

        let mut diff = Map::new();
        diff.insert(
            addr,
            AccountDiffEntry {
                balance: DiffValue::Died { from: U256::from(10) },
                nonce: DiffValue::Same,
                code: DiffValue::Same,
                storage: Map::new(),
            },
        );
        overlay.apply_diff(&StateDiff(diff));
        assert_eq!(overlay.balance(addr), U256::ZERO);
    }
}
