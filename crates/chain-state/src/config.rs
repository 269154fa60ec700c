/// Sizing and behavior knobs for [`crate::cache::CoherentStateCache`].
///
/// Named and shaped after the `CacheConfig`/`state_cache.hpp` constants in
/// the original implementation; `max_views = 0` is rejected by
/// [`CoherentCacheConfig::validate`] the same way the original asserts on
/// construction.
#[derive(Debug, Clone, Copy)]
pub struct CoherentCacheConfig {
    pub max_views: u64,
    pub max_state_keys: usize,
    pub max_code_keys: usize,
    pub with_storage: bool,
}

impl CoherentCacheConfig {
    pub const fn validate(self) -> Result<Self, CacheConfigError> {
        if self.max_views == 0 {
            return Err(CacheConfigError::ZeroMaxViews);
        }
        Ok(self)
    }
}

impl Default for CoherentCacheConfig {
    fn default() -> Self {
        Self { max_views: 5, max_state_keys: 1_000_000, max_code_keys: 10_000, with_storage: true }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheConfigError {
    #[error("CoherentCacheConfig::max_views must be non-zero")]
    ZeroMaxViews,
}
