//! Wallet handle backed by the wallet service on the message bus

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use caryatid_sdk::Context;
use portfolio_common::{
    messages::{Message, WalletRequest, WalletResponse},
    wallet::{PublicKey, PublicKeyRequest, Wallet, WalletInfo},
    ChainType,
};
use std::sync::Arc;

pub struct BusWallet {
    context: Arc<Context<Message>>,

    /// Request topic of the wallet service
    topic: String,

    /// Wallet as announced on connect
    info: WalletInfo,
}

impl BusWallet {
    pub fn new(context: Arc<Context<Message>>, topic: String, info: WalletInfo) -> Self {
        Self {
            context,
            topic,
            info,
        }
    }

    async fn request(&self, request: WalletRequest) -> Result<WalletResponse> {
        let response = self
            .context
            .message_bus
            .request(&self.topic, Arc::new(Message::WalletRequest(request)))
            .await?;
        match response.as_ref() {
            Message::WalletResponse(WalletResponse::Error(e)) => {
                Err(anyhow!("Wallet {} error: {e}", self.info.device_id))
            }
            Message::WalletResponse(response) => Ok(response.clone()),
            _ => Err(anyhow!("Unexpected wallet response: {response:?}")),
        }
    }
}

#[async_trait]
impl Wallet for BusWallet {
    fn supports(&self, chain: ChainType) -> bool {
        self.info.supported_chains.contains(&chain)
    }

    async fn get_address(
        &self,
        chain: ChainType,
        address_n_list: &[u32],
    ) -> Result<Option<String>> {
        match self
            .request(WalletRequest::GetAddress {
                chain,
                address_n_list: address_n_list.to_vec(),
            })
            .await?
        {
            WalletResponse::Address(address) => Ok(address),
            other => Err(anyhow!("Unexpected response to address request: {other:?}")),
        }
    }

    async fn get_public_keys(
        &self,
        requests: &[PublicKeyRequest],
    ) -> Result<Option<Vec<Option<PublicKey>>>> {
        match self
            .request(WalletRequest::GetPublicKeys {
                requests: requests.to_vec(),
            })
            .await?
        {
            WalletResponse::PublicKeys(keys) => Ok(keys),
            other => Err(anyhow!("Unexpected response to public key request: {other:?}")),
        }
    }
}
