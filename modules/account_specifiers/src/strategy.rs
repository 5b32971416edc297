use portfolio_common::ChainType;

/// How account specifiers are derived for a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationStrategy {
    /// One address from the chain adapter
    AccountBased {
        /// Addresses are case-insensitive, store them lowercase
        lowercase: bool,
    },

    /// One extended public key per configured account type
    UtxoBased,
}

impl DerivationStrategy {
    pub fn for_chain(chain: ChainType) -> Self {
        match chain {
            ChainType::Ethereum => DerivationStrategy::AccountBased { lowercase: true },
            ChainType::Cosmos | ChainType::Osmosis => {
                DerivationStrategy::AccountBased { lowercase: false }
            }
            ChainType::Bitcoin => DerivationStrategy::UtxoBased,
        }
    }
}
