/// Failures reading through a transaction/DB reader.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Kv(#[from] silkrpc_kv_client::KvError),

    #[error("table {0} is not dup-sorted, cannot call get_both_range")]
    NotDupSorted(&'static str),
}
