//! CAIP-2 chain and CAIP-19 asset identifiers

use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid chain id '{0}'")]
    InvalidChainId(String),

    #[error("invalid asset id '{0}'")]
    InvalidAssetId(String),

    #[error("invalid account specifier '{0}'")]
    InvalidAccountSpecifier(String),

    #[error("invalid transaction id '{0}'")]
    InvalidTxId(String),

    #[error("invalid derivation path '{0}'")]
    InvalidDerivationPath(String),

    #[error("unsupported network {network} for chain {chain}")]
    UnsupportedNetwork { chain: String, network: String },

    #[error("unknown {kind} '{value}'")]
    Unknown { kind: &'static str, value: String },
}

pub const NAMESPACE_EIP155: &str = "eip155";
pub const NAMESPACE_BIP122: &str = "bip122";
pub const NAMESPACE_COSMOS: &str = "cosmos";

pub const REFERENCE_ETHEREUM_MAINNET: &str = "1";
pub const REFERENCE_BITCOIN_MAINNET: &str = "000000000019d6689c085ae165831e93";
pub const REFERENCE_COSMOSHUB_MAINNET: &str = "cosmoshub-4";
pub const REFERENCE_OSMOSIS_MAINNET: &str = "osmosis-1";

pub const ASSET_NAMESPACE_SLIP44: &str = "slip44";

fn valid_namespace(s: &str) -> bool {
    (3..=8).contains(&s.len())
        && s.chars().all(|c| c == '-' || c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn valid_chain_reference(s: &str) -> bool {
    (1..=32).contains(&s.len())
        && s.chars().all(|c| c == '-' || c == '_' || c.is_ascii_alphanumeric())
}

fn valid_asset_reference(s: &str) -> bool {
    (1..=128).contains(&s.len())
        && s.chars().all(|c| matches!(c, '-' | '.' | '%') || c.is_ascii_alphanumeric())
}

/// CAIP-2 chain identifier, `namespace:reference`, e.g. `cosmos:cosmoshub-4`
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct ChainId {
    namespace: String,
    reference: String,
}

impl ChainId {
    pub fn new(namespace: &str, reference: &str) -> Result<Self, ParseError> {
        if !valid_namespace(namespace) || !valid_chain_reference(reference) {
            return Err(ParseError::InvalidChainId(format!("{namespace}:{reference}")));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            reference: reference.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl FromStr for ChainId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, reference) =
            s.split_once(':').ok_or_else(|| ParseError::InvalidChainId(s.to_string()))?;
        Self::new(namespace, reference).map_err(|_| ParseError::InvalidChainId(s.to_string()))
    }
}

/// CAIP-19 asset identifier, `chainId/assetNamespace:assetReference`,
/// e.g. `cosmos:cosmoshub-4/slip44:118`
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct AssetId {
    chain_id: ChainId,
    asset_namespace: String,
    asset_reference: String,
}

impl AssetId {
    pub fn new(
        chain_id: ChainId,
        asset_namespace: &str,
        asset_reference: &str,
    ) -> Result<Self, ParseError> {
        if !valid_namespace(asset_namespace) || !valid_asset_reference(asset_reference) {
            return Err(ParseError::InvalidAssetId(format!(
                "{chain_id}/{asset_namespace}:{asset_reference}"
            )));
        }
        Ok(Self {
            chain_id,
            asset_namespace: asset_namespace.to_string(),
            asset_reference: asset_reference.to_string(),
        })
    }

    /// Native asset of a chain, identified by its SLIP-44 coin type
    pub fn slip44(chain_id: ChainId, coin_type: u32) -> Self {
        Self {
            chain_id,
            asset_namespace: ASSET_NAMESPACE_SLIP44.to_string(),
            asset_reference: coin_type.to_string(),
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn asset_namespace(&self) -> &str {
        &self.asset_namespace
    }

    pub fn asset_reference(&self) -> &str {
        &self.asset_reference
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.chain_id, self.asset_namespace, self.asset_reference)
    }
}

impl FromStr for AssetId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidAssetId(s.to_string());
        let (chain, asset) = s.split_once('/').ok_or_else(invalid)?;
        let (namespace, reference) = asset.split_once(':').ok_or_else(invalid)?;
        let chain_id = ChainId::from_str(chain).map_err(|_| invalid())?;
        Self::new(chain_id, namespace, reference).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_parses_and_displays() {
        let chain_id = ChainId::from_str("cosmos:cosmoshub-4").unwrap();
        assert_eq!(chain_id.namespace(), "cosmos");
        assert_eq!(chain_id.reference(), "cosmoshub-4");
        assert_eq!(chain_id.to_string(), "cosmos:cosmoshub-4");
    }

    #[test]
    fn chain_id_rejects_malformed_input() {
        assert!(ChainId::from_str("cosmoshub-4").is_err());
        assert!(ChainId::from_str("ab:1").is_err());
        assert!(ChainId::from_str("EIP155:1").is_err());
        assert!(ChainId::from_str("eip155:").is_err());
    }

    #[test]
    fn asset_id_parses_and_displays() {
        let asset_id = AssetId::from_str("cosmos:cosmoshub-4/slip44:118").unwrap();
        assert_eq!(asset_id.chain_id().to_string(), "cosmos:cosmoshub-4");
        assert_eq!(asset_id.asset_namespace(), "slip44");
        assert_eq!(asset_id.asset_reference(), "118");
        assert_eq!(asset_id.to_string(), "cosmos:cosmoshub-4/slip44:118");
    }

    #[test]
    fn asset_id_rejects_missing_parts() {
        assert!(AssetId::from_str("cosmos:cosmoshub-4").is_err());
        assert!(AssetId::from_str("cosmos:cosmoshub-4/slip44").is_err());
        assert!(AssetId::from_str("cosmoshub-4/slip44:118").is_err());
    }

    #[test]
    fn ids_serialise_as_strings() {
        let asset_id = AssetId::slip44(
            ChainId::new(NAMESPACE_BIP122, REFERENCE_BITCOIN_MAINNET).unwrap(),
            0,
        );
        let json = serde_json::to_string(&asset_id).unwrap();
        assert_eq!(json, "\"bip122:000000000019d6689c085ae165831e93/slip44:0\"");
        let back: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, asset_id);
    }
}
