use alloy_primitives::{Address, BlockNumber, Bytes, StorageKey, StorageValue, B256};
use reth_errors::ProviderResult;
use reth_primitives::{Account, Bytecode};
use reth_storage_api::{
    AccountReader, BlockHashReader, StateProofProvider, StateProvider, StateProviderBox,
    StateRootProvider, StorageRootProvider,
};
use reth_trie::{
    updates::TrieUpdates, AccountProof, HashedPostState, HashedStorage, MultiProof, StorageProof,
    TrieInput,
};

/// Cached state provider struct
#[allow(missing_debug_implementations)]
pub struct CachedStateProvider {
    pub(crate) underlying: Box<dyn StateProvider>,
}

impl CachedStateProvider {
    /// Create a new `CachedStateProvider`
    pub fn new(underlying: Box<dyn StateProvider>) -> Self {
        Self { underlying }
    }

    /// Turn this state provider into a [`StateProviderBox`]
    pub fn boxed(self) -> StateProviderBox {
        Box::new(self)
    }
}

impl BlockHashReader for CachedStateProvider {
    fn block_hash(&self, number: BlockNumber) -> ProviderResult<Option<B256>> {
        BlockHashReader::block_hash(&self.underlying, number)
    }

    fn canonical_hashes_range(
        &self,
        start: BlockNumber,
        end: BlockNumber,
    ) -> ProviderResult<Vec<B256>> {
        let hashes = self.underlying.canonical_hashes_range(start, end)?;
        Ok(hashes)
    }
}

impl AccountReader for CachedStateProvider {
    fn basic_account(&self, address: Address) -> ProviderResult<Option<Account>> {
        // Check cache first
        if let Some(v) = crate::cache::get_account(&address) {
            return Ok(Some(v))
        }
        // Fallback to underlying provider
        if let Some(value) = AccountReader::basic_account(&self.underlying, address)? {
            crate::cache::insert_account(address, value);
            return Ok(Some(value))
        }
        Ok(None)
    }
}

impl StateRootProvider for CachedStateProvider {
    fn state_root(&self, state: HashedPostState) -> ProviderResult<B256> {
        self.state_root_from_nodes(TrieInput::from_state(state))
    }

    fn state_root_from_nodes(&self, input: TrieInput) -> ProviderResult<B256> {
        self.underlying.state_root_from_nodes(input)
    }

    fn state_root_with_updates(
        &self,
        state: HashedPostState,
    ) -> ProviderResult<(B256, TrieUpdates)> {
        self.state_root_from_nodes_with_updates(TrieInput::from_state(state))
    }

    fn state_root_from_nodes_with_updates(
        &self,
        input: TrieInput,
    ) -> ProviderResult<(B256, TrieUpdates)> {
        self.underlying.state_root_from_nodes_with_updates(input)
    }
}

impl StorageRootProvider for CachedStateProvider {
    fn storage_root(&self, address: Address, storage: HashedStorage) -> ProviderResult<B256> {
        self.underlying.storage_root(address, storage)
    }

    fn storage_proof(
        &self,
        address: Address,
        slot: B256,
        hashed_storage: HashedStorage,
    ) -> ProviderResult<StorageProof> {
        self.underlying.storage_proof(address, slot, hashed_storage)
    }
}

impl StateProofProvider for CachedStateProvider {
    fn proof(
        &self,
        input: TrieInput,
        address: Address,
        slots: &[B256],
    ) -> ProviderResult<AccountProof> {
        self.underlying.proof(input, address, slots)
    }

    fn multiproof(
        &self,
        input: TrieInput,
        targets: alloy_primitives::map::HashMap<B256, alloy_primitives::map::HashSet<B256>>,
    ) -> ProviderResult<MultiProof> {
        self.underlying.multiproof(input, targets)
    }

    fn witness(
        &self,
        input: TrieInput,
        target: HashedPostState,
    ) -> ProviderResult<alloy_primitives::map::HashMap<B256, Bytes>> {
        self.underlying.witness(input, target)
    }
}

impl StateProvider for CachedStateProvider {
    fn storage(
        &self,
        address: Address,
        storage_key: StorageKey,
    ) -> ProviderResult<Option<StorageValue>> {
        let key = (address, storage_key);
        // Check cache first
        if let Some(v) = crate::cache::get_storage(&key) {
            return Ok(Some(v))
        }
        // Fallback to underlying provider
        if let Some(value) = StateProvider::storage(&self.underlying, address, storage_key)? {
            crate::cache::insert_storage(key, value);
            return Ok(Some(value))
        }
        Ok(None)
    }

    fn bytecode_by_hash(&self, code_hash: B256) -> ProviderResult<Option<Bytecode>> {
        // Check cache first
        if let Some(v) = crate::cache::get_code(&code_hash) {
            return Ok(Some(v))
        }
        // Fallback to underlying provider
        if let Some(value) = StateProvider::bytecode_by_hash(&self.underlying, code_hash)? {
            crate::cache::insert_code(code_hash, value.clone());
            return Ok(Some(value))
        }
        Ok(None)
    }
}
