//! Supported chains and networks

use crate::caip::{
    AssetId, ChainId, ParseError, NAMESPACE_BIP122, NAMESPACE_COSMOS, NAMESPACE_EIP155,
    REFERENCE_BITCOIN_MAINNET, REFERENCE_COSMOSHUB_MAINNET, REFERENCE_ETHEREUM_MAINNET,
    REFERENCE_OSMOSIS_MAINNET,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Chain families the engine knows how to derive accounts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Ethereum,
    Bitcoin,
    Cosmos,
    Osmosis,
}

/// Network of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkType {
    Mainnet,
    CosmosHubMainnet,
    OsmosisMainnet,
}

impl ChainType {
    /// Network used for account derivation on this chain
    pub fn default_network(&self) -> NetworkType {
        match self {
            ChainType::Ethereum | ChainType::Bitcoin => NetworkType::Mainnet,
            ChainType::Cosmos => NetworkType::CosmosHubMainnet,
            ChainType::Osmosis => NetworkType::OsmosisMainnet,
        }
    }

    /// SLIP-44 coin type of the chain's native asset
    pub fn slip44(&self) -> u32 {
        match self {
            ChainType::Ethereum => 60,
            ChainType::Bitcoin => 0,
            ChainType::Cosmos | ChainType::Osmosis => 118,
        }
    }

    /// Coin name understood by wallet devices
    pub fn coin_name(&self) -> &'static str {
        match self {
            ChainType::Ethereum => "Ethereum",
            ChainType::Bitcoin => "Bitcoin",
            ChainType::Cosmos => "Atom",
            ChainType::Osmosis => "Osmo",
        }
    }

    /// Canonical native asset id on the default network
    pub fn native_asset_id(&self) -> Result<AssetId, ParseError> {
        let chain_id = to_chain_id(*self, self.default_network())?;
        Ok(AssetId::slip44(chain_id, self.slip44()))
    }
}

impl Display for ChainType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ChainType::Ethereum => write!(f, "ethereum"),
            ChainType::Bitcoin => write!(f, "bitcoin"),
            ChainType::Cosmos => write!(f, "cosmos"),
            ChainType::Osmosis => write!(f, "osmosis"),
        }
    }
}

impl FromStr for ChainType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" => Ok(ChainType::Ethereum),
            "bitcoin" => Ok(ChainType::Bitcoin),
            "cosmos" => Ok(ChainType::Cosmos),
            "osmosis" => Ok(ChainType::Osmosis),
            _ => Err(ParseError::Unknown {
                kind: "chain",
                value: s.to_string(),
            }),
        }
    }
}

impl Display for NetworkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NetworkType::Mainnet => write!(f, "mainnet"),
            NetworkType::CosmosHubMainnet => write!(f, "cosmoshub-mainnet"),
            NetworkType::OsmosisMainnet => write!(f, "osmosis-mainnet"),
        }
    }
}

/// Build the CAIP-2 chain id for a chain and network
pub fn to_chain_id(chain: ChainType, network: NetworkType) -> Result<ChainId, ParseError> {
    let (namespace, reference) = match (chain, network) {
        (ChainType::Ethereum, NetworkType::Mainnet) => {
            (NAMESPACE_EIP155, REFERENCE_ETHEREUM_MAINNET)
        }
        (ChainType::Bitcoin, NetworkType::Mainnet) => (NAMESPACE_BIP122, REFERENCE_BITCOIN_MAINNET),
        (ChainType::Cosmos, NetworkType::CosmosHubMainnet) => {
            (NAMESPACE_COSMOS, REFERENCE_COSMOSHUB_MAINNET)
        }
        (ChainType::Osmosis, NetworkType::OsmosisMainnet) => {
            (NAMESPACE_COSMOS, REFERENCE_OSMOSIS_MAINNET)
        }
        _ => {
            return Err(ParseError::UnsupportedNetwork {
                chain: chain.to_string(),
                network: network.to_string(),
            })
        }
    };
    ChainId::new(namespace, reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids_for_default_networks() {
        let ids: Vec<String> =
            [ChainType::Ethereum, ChainType::Bitcoin, ChainType::Cosmos, ChainType::Osmosis]
                .iter()
                .map(|chain| to_chain_id(*chain, chain.default_network()).unwrap().to_string())
                .collect();
        assert_eq!(
            ids,
            vec![
                "eip155:1",
                "bip122:000000000019d6689c085ae165831e93",
                "cosmos:cosmoshub-4",
                "cosmos:osmosis-1",
            ]
        );
    }

    #[test]
    fn mismatched_network_is_rejected() {
        assert!(to_chain_id(ChainType::Bitcoin, NetworkType::OsmosisMainnet).is_err());
    }

    #[test]
    fn native_asset_ids() {
        assert_eq!(
            ChainType::Cosmos.native_asset_id().unwrap().to_string(),
            "cosmos:cosmoshub-4/slip44:118"
        );
        assert_eq!(
            ChainType::Bitcoin.native_asset_id().unwrap().to_string(),
            "bip122:000000000019d6689c085ae165831e93/slip44:0"
        );
    }

    #[test]
    fn chain_type_from_config_string() {
        assert_eq!(ChainType::from_str("Bitcoin").unwrap(), ChainType::Bitcoin);
        assert!(ChainType::from_str("dogecoin").is_err());
    }
}
