use alloy_primitives::U256;
use alloy_rpc_types_trace::parity::{LocalizedTransactionTrace, RewardType, TransactionTrace};

use silkrpc_evm_tracing::CallTracer;

use crate::types::BlockHeaderInfo;

// Mainnet fork blocks that change the base block reward. No chain-spec
// type exists in this workspace (spec.md's Non-goals exclude chain-specific
// genesis tables), so these are hardcoded mainnet constants rather than
// read from configuration — an Open Question decision, see DESIGN.md.
const BYZANTIUM_BLOCK: u64 = 4_370_000;
const CONSTANTINOPLE_BLOCK: u64 = 7_280_000;
const PARIS_BLOCK: u64 = 15_537_394;

const FRONTIER_BLOCK_REWARD: u128 = 5_000_000_000_000_000_000;
const BYZANTIUM_BLOCK_REWARD: u128 = 3_000_000_000_000_000_000;
const CONSTANTINOPLE_BLOCK_REWARD: u128 = 2_000_000_000_000_000_000;

/// `None` once Paris (the merge) has activated: no more block rewards.
pub fn base_block_reward_pre_merge(block_number: u64) -> Option<u128> {
    if block_number >= PARIS_BLOCK {
        return None;
    }
    Some(if block_number >= CONSTANTINOPLE_BLOCK {
        CONSTANTINOPLE_BLOCK_REWARD
    } else if block_number >= BYZANTIUM_BLOCK {
        BYZANTIUM_BLOCK_REWARD
    } else {
        FRONTIER_BLOCK_REWARD
    })
}

pub fn block_reward(base: u128, ommers_count: usize) -> u128 {
    base + (base / 32) * ommers_count as u128
}

pub fn ommer_reward(base: u128, block_number: u64, uncle_number: u64) -> u128 {
    let depth = (uncle_number + 8).saturating_sub(block_number);
    base * u128::from(depth) / 8
}

/// Synthesizes the block-reward and uncle-reward traces for one block, or
/// an empty vec once Paris has activated (4.9/4.10's "Append a synthetic
/// reward trace" behavior, shared by `trace_block` and `trace_filter`).
pub fn extract_reward_traces(header: &BlockHeaderInfo) -> Vec<LocalizedTransactionTrace> {
    let Some(base) = base_block_reward_pre_merge(header.number) else {
        return Vec::new();
    };

    let mut traces = Vec::with_capacity(header.ommers.len() + 1);
    traces.push(localize(
        header,
        CallTracer::reward_trace(header.beneficiary, RewardType::Block, U256::from(block_reward(base, header.ommers.len()))),
    ));
    for ommer in &header.ommers {
        let reward = ommer_reward(base, header.number, ommer.number);
        traces.push(localize(
            header,
            CallTracer::reward_trace(ommer.beneficiary, RewardType::Uncle, U256::from(reward)),
        ));
    }
    traces
}

fn localize(header: &BlockHeaderInfo, trace: TransactionTrace) -> LocalizedTransactionTrace {
    LocalizedTransactionTrace {
        block_hash: Some(header.hash),
        block_number: Some(header.number),
        transaction_hash: None,
        transaction_position: None,
        trace,
    }
}
