use std::str::FromStr;
use std::sync::Arc;

use config::Config;
use portfolio_common::{wallet::UtxoAccountType, ChainType};
use tracing::warn;

const DEFAULT_SUPPORTED_CHAINS: (&str, &[ChainType]) = (
    "supported-chains",
    &[ChainType::Ethereum, ChainType::Bitcoin, ChainType::Cosmos, ChainType::Osmosis],
);
const DEFAULT_BITCOIN_ACCOUNT_TYPES: (&str, &[UtxoAccountType]) = (
    "bitcoin-account-types",
    &[UtxoAccountType::SegwitNative, UtxoAccountType::SegwitP2sh, UtxoAccountType::P2pkh],
);
const DEFAULT_UTXO_ACCOUNT_NUMBER: (&str, u32) = ("utxo-account-number", 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriverConfig {
    /// Chain adapters to register, in derivation order
    pub supported_chains: Vec<ChainType>,

    /// Bitcoin account types, in derivation order
    pub bitcoin_account_types: Vec<UtxoAccountType>,

    /// BIP-44 account index for UTXO chains
    pub utxo_account_number: u32,
}

impl Default for DeriverConfig {
    fn default() -> Self {
        Self {
            supported_chains: DEFAULT_SUPPORTED_CHAINS.1.to_vec(),
            bitcoin_account_types: DEFAULT_BITCOIN_ACCOUNT_TYPES.1.to_vec(),
            utxo_account_number: DEFAULT_UTXO_ACCOUNT_NUMBER.1,
        }
    }
}

/// Parse a list of names, dropping ones we don't know
fn read_list<T: FromStr + Clone>(config: &Config, key: &str, default: &[T]) -> Vec<T> {
    let Ok(names) = config.get::<Vec<String>>(key) else {
        return default.to_vec();
    };
    names
        .iter()
        .filter_map(|name| {
            T::from_str(name)
                .inspect_err(|_| warn!(key, name = name.as_str(), "Ignoring unknown entry"))
                .ok()
        })
        .collect()
}

impl From<Arc<Config>> for DeriverConfig {
    fn from(config: Arc<Config>) -> Self {
        Self {
            supported_chains: read_list(
                &config,
                DEFAULT_SUPPORTED_CHAINS.0,
                DEFAULT_SUPPORTED_CHAINS.1,
            ),
            bitcoin_account_types: read_list(
                &config,
                DEFAULT_BITCOIN_ACCOUNT_TYPES.0,
                DEFAULT_BITCOIN_ACCOUNT_TYPES.1,
            ),
            utxo_account_number: config
                .get::<u32>(DEFAULT_UTXO_ACCOUNT_NUMBER.0)
                .unwrap_or(DEFAULT_UTXO_ACCOUNT_NUMBER.1),
        }
    }
}
