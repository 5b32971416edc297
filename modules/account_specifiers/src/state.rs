//! Account specifier state: connected wallet, known assets and the derived list

use anyhow::Result;
use imbl::HashMap;
use portfolio_common::{
    messages::SessionMessage, session::WalletSession, wallet::WalletInfo, AccountSpecifierMap,
    Asset, AssetId,
};
use tracing::info;

/// What the module must do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reaction {
    /// Publish an empty list, the wallet changed
    pub clear: bool,

    /// Run a derivation
    pub derive: bool,
}

#[derive(Debug, Default, Clone)]
pub struct State {
    session: WalletSession,

    /// Known asset records by id
    assets: HashMap<AssetId, Asset>,

    /// Last published list
    account_specifiers: Vec<AccountSpecifierMap>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wallet(&self) -> Option<&WalletInfo> {
        self.session.current()
    }

    pub fn assets(&self) -> &HashMap<AssetId, Asset> {
        &self.assets
    }

    pub fn account_specifiers(&self) -> &[AccountSpecifierMap] {
        &self.account_specifiers
    }

    fn can_derive(&self) -> bool {
        self.session.current().is_some() && !self.assets.is_empty()
    }

    /// A different wallet drops the derived list, and derives again if the
    /// assets are known
    pub fn handle_session(&mut self, event: &SessionMessage) -> Reaction {
        if !self.session.handle(event) {
            return Reaction::default();
        }
        self.account_specifiers.clear();
        Reaction {
            clear: true,
            derive: self.can_derive(),
        }
    }

    /// Replace the asset records. Derivation runs only when assets first
    /// become available.
    pub fn handle_assets(&mut self, assets: &[Asset]) -> Reaction {
        let was_empty = self.assets.is_empty();
        self.assets =
            assets.iter().map(|asset| (asset.asset_id.clone(), asset.clone())).collect();
        Reaction {
            clear: false,
            derive: was_empty && self.can_derive(),
        }
    }

    pub fn set_account_specifiers(&mut self, account_specifiers: Vec<AccountSpecifierMap>) {
        self.account_specifiers = account_specifiers;
    }

    pub async fn tick(&self) -> Result<()> {
        info!(
            wallet = self.session.current().map(|w| w.label.as_str()).unwrap_or("none"),
            assets = self.assets.len(),
            account_specifiers = self.account_specifiers.len(),
            "Account specifiers"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use portfolio_common::ChainType;

    fn wallet(device_id: &str) -> SessionMessage {
        SessionMessage::WalletConnected(WalletInfo {
            device_id: device_id.to_string(),
            label: "KeepKey".to_string(),
            supported_chains: vec![ChainType::Bitcoin, ChainType::Ethereum],
        })
    }

    #[test]
    fn no_derivation_without_assets() {
        let mut state = State::new();
        let reaction = state.handle_session(&wallet("a"));
        assert_eq!(
            reaction,
            Reaction {
                clear: true,
                derive: false
            }
        );
    }

    #[test]
    fn assets_arriving_after_wallet_triggers_once() {
        let mut state = State::new();
        state.handle_session(&wallet("a"));

        assert!(state.handle_assets(&[bitcoin_asset()]).derive);
        // Later asset updates keep the derived list
        assert!(!state.handle_assets(&[bitcoin_asset(), ethereum_asset()]).derive);
        assert_eq!(state.assets().len(), 2);
    }

    #[test]
    fn empty_assets_do_not_trigger() {
        let mut state = State::new();
        state.handle_session(&wallet("a"));
        assert!(!state.handle_assets(&[]).derive);
    }

    #[test]
    fn assets_without_wallet_do_not_trigger() {
        let mut state = State::new();
        assert!(!state.handle_assets(&[bitcoin_asset()]).derive);

        let reaction = state.handle_session(&wallet("a"));
        assert!(reaction.clear && reaction.derive);
    }

    #[test]
    fn reconnecting_same_wallet_is_ignored() {
        let mut state = State::new();
        state.handle_assets(&[bitcoin_asset()]);
        state.handle_session(&wallet("a"));
        state.set_account_specifiers(vec![AccountSpecifierMap::single(btc_chain_id(), zpub())]);

        assert_eq!(state.handle_session(&wallet("a")), Reaction::default());
        assert_eq!(state.account_specifiers().len(), 1);
    }

    #[test]
    fn switching_wallet_clears_and_derives() {
        let mut state = State::new();
        state.handle_assets(&[bitcoin_asset()]);
        state.handle_session(&wallet("a"));
        state.set_account_specifiers(vec![AccountSpecifierMap::single(btc_chain_id(), zpub())]);

        let reaction = state.handle_session(&wallet("b"));
        assert!(reaction.clear && reaction.derive);
        assert!(state.account_specifiers().is_empty());
        assert_eq!(state.wallet().map(|w| w.device_id.as_str()), Some("b"));
    }

    #[test]
    fn disconnect_clears_without_deriving() {
        let mut state = State::new();
        state.handle_assets(&[bitcoin_asset()]);
        state.handle_session(&wallet("a"));
        state.set_account_specifiers(vec![AccountSpecifierMap::single(btc_chain_id(), zpub())]);

        let reaction = state.handle_session(&SessionMessage::WalletDisconnected);
        assert_eq!(
            reaction,
            Reaction {
                clear: true,
                derive: false
            }
        );
        assert!(state.account_specifiers().is_empty());
        assert!(state.wallet().is_none());
    }
}
