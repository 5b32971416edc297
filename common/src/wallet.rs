//! Wallet and chain adapter capability seams, plus UTXO account parameters

use crate::caip::ParseError;
use crate::chain::ChainType;
use crate::types::Asset;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::Arc;

/// Hardened derivation offset
pub const HARDENED: u32 = 0x8000_0000;

const XPUB_LENGTH: usize = 78;

/// Connected wallet as announced by the wallet service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    /// Stable id of the device or software wallet
    pub device_id: String,

    /// User-visible label
    pub label: String,

    /// Chains the wallet declares support for
    pub supported_chains: Vec<ChainType>,
}

/// UTXO account flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtxoAccountType {
    SegwitNative,
    SegwitP2sh,
    P2pkh,
}

impl UtxoAccountType {
    /// BIP-44 purpose for this account type
    pub fn purpose(&self) -> u32 {
        match self {
            UtxoAccountType::SegwitNative => 84,
            UtxoAccountType::SegwitP2sh => 49,
            UtxoAccountType::P2pkh => 44,
        }
    }

    pub fn script_type(&self) -> ScriptType {
        match self {
            UtxoAccountType::SegwitNative => ScriptType::SegwitNative,
            UtxoAccountType::SegwitP2sh => ScriptType::SegwitP2sh,
            UtxoAccountType::P2pkh => ScriptType::P2pkh,
        }
    }

    /// SLIP-132 extended public key version bytes
    fn xpub_version(&self) -> [u8; 4] {
        match self {
            UtxoAccountType::SegwitNative => [0x04, 0xb2, 0x47, 0x46], // zpub
            UtxoAccountType::SegwitP2sh => [0x04, 0x9d, 0x7c, 0xb2], // ypub
            UtxoAccountType::P2pkh => [0x04, 0x88, 0xb2, 0x1e], // xpub
        }
    }
}

impl Display for UtxoAccountType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UtxoAccountType::SegwitNative => write!(f, "segwit-native"),
            UtxoAccountType::SegwitP2sh => write!(f, "segwit-p2sh"),
            UtxoAccountType::P2pkh => write!(f, "p2pkh"),
        }
    }
}

impl FromStr for UtxoAccountType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "segwit-native" => Ok(UtxoAccountType::SegwitNative),
            "segwit-p2sh" => Ok(UtxoAccountType::SegwitP2sh),
            "p2pkh" => Ok(UtxoAccountType::P2pkh),
            _ => Err(ParseError::Unknown {
                kind: "account type",
                value: s.to_string(),
            }),
        }
    }
}

/// Script type requested from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptType {
    #[serde(rename = "p2wpkh")]
    SegwitNative,

    #[serde(rename = "p2sh-p2wpkh")]
    SegwitP2sh,

    #[serde(rename = "p2pkh")]
    P2pkh,
}

/// BIP-44 account level parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bip44Params {
    pub purpose: u32,
    pub coin_type: u32,
    pub account_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoAccountParams {
    pub bip44_params: Bip44Params,
    pub script_type: ScriptType,
}

/// Derivation parameters for one UTXO account type on the asset's chain
pub fn utxo_account_params(
    asset: &Asset,
    account_type: UtxoAccountType,
    account_number: u32,
) -> UtxoAccountParams {
    UtxoAccountParams {
        bip44_params: Bip44Params {
            purpose: account_type.purpose(),
            coin_type: asset.slip44,
            account_number,
        },
        script_type: account_type.script_type(),
    }
}

/// Account level path, e.g. `m/84'/0'/0'`
pub fn to_root_derivation_path(params: &Bip44Params) -> String {
    format!("m/{}'/{}'/{}'", params.purpose, params.coin_type, params.account_number)
}

/// Default receive address path for account based chains, `m/44'/coin'/0'/0/0`
pub fn default_address_path(chain: ChainType) -> String {
    format!("m/44'/{}'/0'/0/0", chain.slip44())
}

/// Convert a BIP-32 path string into device address indices
pub fn bip32_to_address_n_list(path: &str) -> Result<Vec<u32>, ParseError> {
    let invalid = || ParseError::InvalidDerivationPath(path.to_string());
    let mut parts = path.split('/');
    if parts.next() != Some("m") {
        return Err(invalid());
    }
    parts
        .map(|part| {
            let (index, hardened) = match part.strip_suffix('\'') {
                Some(index) => (index, true),
                None => (part, false),
            };
            let index: u32 = index.parse().map_err(|_| invalid())?;
            if index >= HARDENED {
                return Err(invalid());
            }
            Ok(if hardened { index + HARDENED } else { index })
        })
        .collect()
}

/// Rewrite the version bytes of an extended public key for the account type.
/// None if the key is not a valid base58check 78 byte extended key.
pub fn convert_xpub_version(xpub: &str, account_type: UtxoAccountType) -> Option<String> {
    let mut payload = bs58::decode(xpub).with_check(None).into_vec().ok()?;
    if payload.len() != XPUB_LENGTH {
        return None;
    }
    payload[..4].copy_from_slice(&account_type.xpub_version());
    Some(bs58::encode(payload).with_check().into_string())
}

/// Public key request sent to the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRequest {
    /// Device coin name
    pub coin: String,

    /// Derivation indices
    pub address_n_list: Vec<u32>,

    /// Curve name
    pub curve: String,

    /// Script type for UTXO keys
    pub script_type: Option<ScriptType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub xpub: String,
}

/// Connected wallet handle. Devices accept one command at a time, so callers
/// await each request before issuing the next.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Capability check gating whether a chain is attempted at all
    fn supports(&self, chain: ChainType) -> bool;

    async fn get_address(&self, chain: ChainType, address_n_list: &[u32])
        -> Result<Option<String>>;

    async fn get_public_keys(
        &self,
        requests: &[PublicKeyRequest],
    ) -> Result<Option<Vec<Option<PublicKey>>>>;
}

/// Per-chain capability provider
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain_type(&self) -> ChainType;

    /// Coin name for device requests
    fn coin_type(&self) -> String {
        self.chain_type().coin_name().to_string()
    }

    async fn get_address(&self, wallet: &dyn Wallet) -> Result<Option<String>>;
}

/// Registry of chain adapters in a fixed iteration order
pub trait ChainAdapters: Send + Sync {
    fn supported_chains(&self) -> Vec<ChainType>;

    fn by_chain(&self, chain: ChainType) -> Option<Arc<dyn ChainAdapter>>;
}
