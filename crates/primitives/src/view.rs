use std::fmt;

/// Monotonically non-decreasing identifier assigned by the remote KV service
/// when a transaction begins. Two transactions with the same `ViewId` see
/// identical state.
///
/// The one documented exception to monotonicity is wrap-around at
/// `u64::MAX`, after which the counter resumes at zero; callers that evict
/// by view distance must special-case `ViewId(0)` as described in
/// `CoherentStateCache::advance_root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(pub u64);

impl ViewId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// `ViewId` immediately preceding this one, saturating at zero rather
    /// than wrapping (wrap-around is handled explicitly by callers, since it
    /// has distinct cache-eviction semantics from ordinary decrement).
    pub const fn checked_prev(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ViewId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
