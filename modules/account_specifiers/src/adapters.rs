//! Chain adapters asking the wallet for the first receive address

use anyhow::Result;
use async_trait::async_trait;
use portfolio_common::{
    wallet::{bip32_to_address_n_list, default_address_path, ChainAdapter, ChainAdapters, Wallet},
    ChainType,
};
use std::sync::Arc;

/// Adapter deriving the address at `m/44'/coin'/0'/0/0`
pub struct StandardChainAdapter {
    chain: ChainType,
}

impl StandardChainAdapter {
    pub fn new(chain: ChainType) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl ChainAdapter for StandardChainAdapter {
    fn chain_type(&self) -> ChainType {
        self.chain
    }

    async fn get_address(&self, wallet: &dyn Wallet) -> Result<Option<String>> {
        let address_n_list = bip32_to_address_n_list(&default_address_path(self.chain))?;
        wallet.get_address(self.chain, &address_n_list).await
    }
}

/// Adapters in configured order
pub struct ChainAdapterRegistry {
    adapters: Vec<Arc<dyn ChainAdapter>>,
}

impl ChainAdapterRegistry {
    pub fn new(adapters: Vec<Arc<dyn ChainAdapter>>) -> Self {
        Self { adapters }
    }

    /// One standard adapter per chain, duplicates dropped
    pub fn standard(chains: &[ChainType]) -> Self {
        let mut adapters: Vec<Arc<dyn ChainAdapter>> = Vec::new();
        for chain in chains {
            if !adapters.iter().any(|adapter| adapter.chain_type() == *chain) {
                adapters.push(Arc::new(StandardChainAdapter::new(*chain)));
            }
        }
        Self::new(adapters)
    }
}

impl ChainAdapters for ChainAdapterRegistry {
    fn supported_chains(&self) -> Vec<ChainType> {
        self.adapters.iter().map(|adapter| adapter.chain_type()).collect()
    }

    fn by_chain(&self, chain: ChainType) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters.iter().find(|adapter| adapter.chain_type() == chain).cloned()
    }
}
