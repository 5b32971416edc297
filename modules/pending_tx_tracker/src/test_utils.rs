use anyhow::Result;
use async_trait::async_trait;
use portfolio_common::{
    commands::FetchCommand,
    publisher::FetchSink,
    AccountSpecifier, AccountSpecifierMap, ChainId, StakingAction, Tx, TxStatus, UniqueTxId,
};
use std::str::FromStr;
use std::sync::Mutex;

pub const ETH_ADDRESS: &str = "0x8f7a9b2c3d4e5f60718293a4b5c6d7e8f9012345";
pub const FOREIGN_ETH_ADDRESS: &str = "0x0000000000000000000000000000000000000001";
pub const BTC_ZPUB: &str = "zpub6rFR7y4Q2AijBEqTUquhVz398htDFrtymD9xYYfG1m4wAcvPhXNfE3EfH1r1ADqtfSdVCToUG868RvUUkgDKf31mGDtKsAYz2oz2AGutZYs";
pub const COSMOS_ADDRESS: &str = "cosmos1wc4rv7dv8lafv38s50pfp5qsgv7eknetyml669";

pub fn eth_chain_id() -> ChainId {
    ChainId::from_str("eip155:1").unwrap()
}

pub fn btc_chain_id() -> ChainId {
    ChainId::from_str("bip122:000000000019d6689c085ae165831e93").unwrap()
}

pub fn cosmos_chain_id() -> ChainId {
    ChainId::from_str("cosmos:cosmoshub-4").unwrap()
}

pub fn eth_specifier_map() -> AccountSpecifierMap {
    AccountSpecifierMap::single(eth_chain_id(), ETH_ADDRESS)
}

pub fn btc_specifier_map() -> AccountSpecifierMap {
    AccountSpecifierMap::single(btc_chain_id(), BTC_ZPUB)
}

pub fn cosmos_specifier_map() -> AccountSpecifierMap {
    AccountSpecifierMap::single(cosmos_chain_id(), COSMOS_ADDRESS)
}

pub fn account_specifiers() -> Vec<AccountSpecifierMap> {
    vec![eth_specifier_map(), btc_specifier_map(), cosmos_specifier_map()]
}

fn tx(
    chain_id: ChainId,
    account: &str,
    tx_id: &str,
    status: TxStatus,
    staking_action: Option<StakingAction>,
) -> Tx {
    Tx {
        id: UniqueTxId::new(AccountSpecifier::new(chain_id.clone(), account), tx_id),
        chain_id,
        address: account.to_string(),
        status,
        staking_action,
    }
}

pub fn eth_tx(tx_id: &str, status: TxStatus) -> Tx {
    tx(eth_chain_id(), ETH_ADDRESS, tx_id, status, None)
}

pub fn foreign_eth_tx(tx_id: &str, status: TxStatus) -> Tx {
    tx(eth_chain_id(), FOREIGN_ETH_ADDRESS, tx_id, status, None)
}

pub fn btc_tx(tx_id: &str, status: TxStatus) -> Tx {
    tx(btc_chain_id(), BTC_ZPUB, tx_id, status, None)
}

/// Cosmos feeds only deliver confirmed transactions
pub fn cosmos_tx(tx_id: &str, staking_action: Option<StakingAction>) -> Tx {
    tx(cosmos_chain_id(), COSMOS_ADDRESS, tx_id, TxStatus::Confirmed, staking_action)
}

/// Fetch sink that records every command in order
#[derive(Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<FetchCommand>>,
}

impl RecordingSink {
    pub fn commands(&self) -> Vec<FetchCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchSink for RecordingSink {
    async fn publish(&self, command: FetchCommand) -> Result<()> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}
