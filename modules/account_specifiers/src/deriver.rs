//! Account specifier derivation against a connected wallet

use crate::configuration::DeriverConfig;
use crate::strategy::DerivationStrategy;
use imbl::HashMap;
use portfolio_common::{
    chain::to_chain_id,
    wallet::{
        bip32_to_address_n_list, convert_xpub_version, to_root_derivation_path,
        utxo_account_params, ChainAdapter, ChainAdapters, PublicKeyRequest, UtxoAccountType,
        Wallet,
    },
    AccountSpecifierMap, Asset, AssetId, ChainId, ChainType, ParseError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

const CURVE_SECP256K1: &str = "secp256k1";

#[derive(Debug, Error)]
pub enum DerivationError {
    /// The wallet answered without the key it was asked for
    #[error("No {account_type} public key returned for {chain}")]
    MissingPublicKey {
        chain: ChainType,
        account_type: UtxoAccountType,
    },

    #[error("Wallet request for {chain} failed: {message}")]
    Wallet { chain: ChainType, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub struct AccountSpecifierDeriver {
    adapters: Arc<dyn ChainAdapters>,
    bitcoin_account_types: Vec<UtxoAccountType>,
    utxo_account_number: u32,
}

impl AccountSpecifierDeriver {
    pub fn new(adapters: Arc<dyn ChainAdapters>, config: &DeriverConfig) -> Self {
        Self {
            adapters,
            bitcoin_account_types: config.bitcoin_account_types.clone(),
            utxo_account_number: config.utxo_account_number,
        }
    }

    /// Derive every account the wallet supports, in adapter order. A chain
    /// that fails keeps what it derived so far and the rest still run.
    pub async fn derive(
        &self,
        wallet: &dyn Wallet,
        assets: &HashMap<AssetId, Asset>,
    ) -> Vec<AccountSpecifierMap> {
        let mut account_specifiers = Vec::new();

        for chain in self.adapters.supported_chains() {
            if !wallet.supports(chain) {
                debug!(%chain, "Wallet does not support chain");
                continue;
            }
            let Some(adapter) = self.adapters.by_chain(chain) else {
                continue;
            };

            let derived = match DerivationStrategy::for_chain(chain) {
                DerivationStrategy::AccountBased { lowercase } => {
                    self.derive_account_based(chain, adapter.as_ref(), wallet, lowercase)
                        .await
                        .map(|specifier| specifier.into_iter().collect::<Vec<_>>())
                }
                DerivationStrategy::UtxoBased => {
                    self.derive_utxo_based(chain, adapter.as_ref(), wallet, assets).await
                }
            };

            match derived {
                Ok(derived) => account_specifiers.extend(derived),
                Err((derived, e)) => {
                    error!(%chain, "Account derivation failed: {e}");
                    account_specifiers.extend(derived);
                }
            }
        }

        info!(count = account_specifiers.len(), "Derived account specifiers");
        account_specifiers
    }

    async fn derive_account_based(
        &self,
        chain: ChainType,
        adapter: &dyn ChainAdapter,
        wallet: &dyn Wallet,
        lowercase: bool,
    ) -> Result<Option<AccountSpecifierMap>, (Vec<AccountSpecifierMap>, DerivationError)> {
        let fail = |e: DerivationError| (Vec::new(), e);

        let address = adapter.get_address(wallet).await.map_err(|e| {
            fail(DerivationError::Wallet {
                chain,
                message: e.to_string(),
            })
        })?;
        let Some(address) = address else {
            debug!(%chain, "No address returned");
            return Ok(None);
        };

        let chain_id = Self::chain_id(chain).map_err(fail)?;
        let address = if lowercase { address.to_lowercase() } else { address };
        Ok(Some(AccountSpecifierMap::single(chain_id, address)))
    }

    /// One request at a time in configured account type order, the device
    /// only handles a single command
    async fn derive_utxo_based(
        &self,
        chain: ChainType,
        adapter: &dyn ChainAdapter,
        wallet: &dyn Wallet,
        assets: &HashMap<AssetId, Asset>,
    ) -> Result<Vec<AccountSpecifierMap>, (Vec<AccountSpecifierMap>, DerivationError)> {
        let mut derived = Vec::new();

        let asset_id =
            chain.native_asset_id().map_err(|e| (Vec::new(), DerivationError::from(e)))?;
        let Some(asset) = assets.get(&asset_id) else {
            debug!(%chain, %asset_id, "No asset record, skipping chain");
            return Ok(derived);
        };
        let chain_id = Self::chain_id(chain).map_err(|e| (Vec::new(), e))?;

        for account_type in &self.bitcoin_account_types {
            match self.derive_utxo_account(chain, adapter, wallet, asset, *account_type).await {
                Ok(Some(account)) => {
                    derived.push(AccountSpecifierMap::single(chain_id.clone(), account))
                }
                Ok(None) => debug!(%chain, %account_type, "Unusable public key, skipping"),
                Err(e) => return Err((derived, e)),
            }
        }
        Ok(derived)
    }

    async fn derive_utxo_account(
        &self,
        chain: ChainType,
        adapter: &dyn ChainAdapter,
        wallet: &dyn Wallet,
        asset: &Asset,
        account_type: UtxoAccountType,
    ) -> Result<Option<String>, DerivationError> {
        let params = utxo_account_params(asset, account_type, self.utxo_account_number);
        let path = to_root_derivation_path(&params.bip44_params);
        let request = PublicKeyRequest {
            coin: adapter.coin_type(),
            address_n_list: bip32_to_address_n_list(&path)?,
            curve: CURVE_SECP256K1.to_string(),
            script_type: Some(params.script_type),
        };

        let public_keys = wallet.get_public_keys(&[request]).await.map_err(|e| {
            DerivationError::Wallet {
                chain,
                message: e.to_string(),
            }
        })?;

        let xpub = public_keys
            .and_then(|keys| keys.into_iter().next().flatten())
            .map(|key| key.xpub)
            .filter(|xpub| !xpub.is_empty())
            .ok_or(DerivationError::MissingPublicKey {
                chain,
                account_type,
            })?;

        Ok(convert_xpub_version(&xpub, account_type))
    }

    fn chain_id(chain: ChainType) -> Result<ChainId, DerivationError> {
        Ok(to_chain_id(chain, chain.default_network())?)
    }
}
