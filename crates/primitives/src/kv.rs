use alloy_primitives::Bytes;

/// An ordered key-value pair as returned by a cursor. An empty `key` is the
/// end-of-range sentinel used throughout the cursor abstractions (`4.2`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyValue {
    pub key: Bytes,
    pub value: Bytes,
}

impl KeyValue {
    pub const fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }

    /// A `KeyValue` with an empty `key`, i.e. the cursor exhaustion sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.key.is_empty()
    }
}
