//! Table-level transaction/DB reader (spec.md 4.3), binding a remote
//! transaction to `get`/`get_one`/`get_both_range`/`walk`/`for_prefix`.
//!
//! Grounded in `silkworm::rpc::ethdb::TransactionDatabase`, the layer the
//! original implementation places directly above its cursor API.

mod error;
mod reader;
mod remote;

pub use error::ProviderError;
pub use reader::DbReader;
pub use remote::RemoteReader;
