use silkrpc_chain_state::CoherentCacheConfig;

/// Process configuration. CLI parsing is out of scope per spec.md's section
/// 6 ("CLI surface / environment / persisted state: out of scope"), so this
/// is constructible directly for tests and only optionally via
/// [`clap::Parser`] from `main`.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "silkrpc-daemon", about = "Read/trace JSON-RPC daemon")]
pub struct DaemonConfig {
    /// Remote KV service endpoint (`silkrpc::ethdb::kv`).
    #[arg(long, default_value = "http://127.0.0.1:9090")]
    pub kv_endpoint: String,

    /// Remote backend (consensus-facing) service endpoint.
    #[arg(long, default_value = "http://127.0.0.1:9090")]
    pub backend_endpoint: String,

    /// Number of single-threaded contexts in the pool (5.0's "pool of OS
    /// threads").
    #[arg(long, default_value_t = 4)]
    pub context_pool_size: usize,

    #[arg(long, default_value_t = 5)]
    pub cache_max_views: u64,

    #[arg(long, default_value_t = 1_000_000)]
    pub cache_max_state_keys: usize,

    #[arg(long, default_value_t = 10_000)]
    pub cache_max_code_keys: usize,

    #[arg(long, default_value_t = true)]
    pub cache_with_storage: bool,
}

impl DaemonConfig {
    pub fn cache_config(&self) -> CoherentCacheConfig {
        CoherentCacheConfig {
            max_views: self.cache_max_views,
            max_state_keys: self.cache_max_state_keys,
            max_code_keys: self.cache_max_code_keys,
            with_storage: self.cache_with_storage,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            kv_endpoint: "http://127.0.0.1:9090".to_string(),
            backend_endpoint: "http://127.0.0.1:9090".to_string(),
            context_pool_size: 4,
            cache_max_views: 5,
            cache_max_state_keys: 1_000_000,
            cache_max_code_keys: 10_000,
            cache_with_storage: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_a_cache_config() {
        let config = DaemonConfig::default();
        let cache = config.cache_config();
        assert_eq!(cache.max_views, 5);
        assert!(cache.with_storage);
    }
}
