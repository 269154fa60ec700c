//! Historical state resolution (C7) and the gas-price oracle (C8) shared by
//! the `eth_*` and `trace_*` RPC handlers.
//!
//! Grounded in `silkworm::rpc::state::StateReader` (`storage_walker.cpp`) and
//! `silkworm::rpc::GasPriceOracle` (`gas_price_oracle.cpp`) respectively.

mod gas_oracle;
mod history;

pub use gas_oracle::{BlockFeeProvider, BlockFeeSample, GasOracleError, GasPriceOracle, TxFeeInfo};
pub use history::{HistoricalStateReader, HistoryError};
