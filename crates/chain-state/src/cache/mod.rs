mod root;
mod state_cache;

pub use state_cache::{storage_key, CoherentStateCache};
