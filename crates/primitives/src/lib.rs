//! Wire-adjacent value types shared by the KV client, the state cache and
//! the historical state reader.
//!
//! Nothing in this crate talks to a socket; it only defines the shapes that
//! cross those boundaries so the rest of the workspace can depend on one
//! definition of "view id", "key-value pair" and "state change".

mod change;
mod kv;
mod view;

pub mod tables;

pub use change::{AccountChange, ChangeAction, ChangeBatch, StateChangeBatch, StorageChange};
pub use kv::KeyValue;
pub use view::ViewId;
