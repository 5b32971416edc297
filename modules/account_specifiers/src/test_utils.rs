use anyhow::Result;
use async_trait::async_trait;
use imbl::HashMap;
use portfolio_common::{
    commands::FetchCommand,
    publisher::FetchSink,
    wallet::{
        convert_xpub_version, PublicKey, PublicKeyRequest, UtxoAccountType, Wallet, HARDENED,
    },
    AccountSpecifier, Asset, AssetId, ChainId, ChainType,
};
use std::collections::HashMap as StdHashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const ETH_ADDRESS: &str = "0x8F7A9B2C3D4E5F60718293A4B5C6D7E8F9012345";
pub const COSMOS_ADDRESS: &str = "cosmos1wc4rv7dv8lafv38s50pfp5qsgv7eknetyml669";
pub const OSMOSIS_ADDRESS: &str = "osmo1wc4rv7dv8lafv38s50pfp5qsgv7eknetxz6mgq";

const XPUB_VERSION: [u8; 4] = [0x04, 0x88, 0xb2, 0x1e];

/// Extended public key as a device returns it, always with xpub version bytes
pub fn device_key(fill: u8) -> String {
    let mut payload = vec![fill; 78];
    payload[..4].copy_from_slice(&XPUB_VERSION);
    bs58::encode(payload).with_check().into_string()
}

pub fn zpub() -> String {
    convert_xpub_version(&device_key(1), UtxoAccountType::SegwitNative).unwrap()
}

pub fn ypub() -> String {
    convert_xpub_version(&device_key(2), UtxoAccountType::SegwitP2sh).unwrap()
}

pub fn xpub() -> String {
    device_key(3)
}

pub fn eth_chain_id() -> ChainId {
    ChainId::from_str("eip155:1").unwrap()
}

pub fn btc_chain_id() -> ChainId {
    ChainId::from_str("bip122:000000000019d6689c085ae165831e93").unwrap()
}

pub fn cosmos_chain_id() -> ChainId {
    ChainId::from_str("cosmos:cosmoshub-4").unwrap()
}

pub fn osmosis_chain_id() -> ChainId {
    ChainId::from_str("cosmos:osmosis-1").unwrap()
}

pub fn btc_specifier(account: &str) -> AccountSpecifier {
    AccountSpecifier::new(btc_chain_id(), account)
}

pub fn bitcoin_asset() -> Asset {
    Asset {
        asset_id: AssetId::from_str("bip122:000000000019d6689c085ae165831e93/slip44:0").unwrap(),
        chain_id: btc_chain_id(),
        symbol: "BTC".to_string(),
        name: "Bitcoin".to_string(),
        precision: 8,
        slip44: 0,
    }
}

pub fn ethereum_asset() -> Asset {
    Asset {
        asset_id: AssetId::from_str("eip155:1/slip44:60").unwrap(),
        chain_id: eth_chain_id(),
        symbol: "ETH".to_string(),
        name: "Ethereum".to_string(),
        precision: 18,
        slip44: 60,
    }
}

pub fn assets() -> HashMap<AssetId, Asset> {
    [bitcoin_asset(), ethereum_asset()]
        .into_iter()
        .map(|asset| (asset.asset_id.clone(), asset))
        .collect()
}

/// Wallet fake recording every request. Tracks how many public key
/// requests overlap.
pub struct MockWallet {
    supported: Vec<ChainType>,
    addresses: StdHashMap<ChainType, String>,
    public_keys: StdHashMap<Vec<u32>, String>,
    address_requests: Mutex<Vec<(ChainType, Vec<u32>)>>,
    public_key_requests: Mutex<Vec<PublicKeyRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            supported: vec![
                ChainType::Ethereum,
                ChainType::Bitcoin,
                ChainType::Cosmos,
                ChainType::Osmosis,
            ],
            addresses: StdHashMap::new(),
            public_keys: StdHashMap::new(),
            address_requests: Mutex::new(Vec::new()),
            public_key_requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn supporting(mut self, chains: &[ChainType]) -> Self {
        self.supported = chains.to_vec();
        self
    }

    pub fn with_address(mut self, chain: ChainType, address: &str) -> Self {
        self.addresses.insert(chain, address.to_string());
        self
    }

    pub fn with_public_key(mut self, address_n_list: Vec<u32>, xpub: &str) -> Self {
        self.public_keys.insert(address_n_list, xpub.to_string());
        self
    }

    pub fn without_public_key(mut self, address_n_list: Vec<u32>) -> Self {
        self.public_keys.remove(&address_n_list);
        self
    }

    pub fn address_requests(&self) -> Vec<(ChainType, Vec<u32>)> {
        self.address_requests.lock().unwrap().clone()
    }

    pub fn public_key_requests(&self) -> Vec<PublicKeyRequest> {
        self.public_key_requests.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Every chain answers, bitcoin keys for all three account types at account 0
pub fn full_wallet() -> MockWallet {
    MockWallet::new()
        .with_address(ChainType::Ethereum, ETH_ADDRESS)
        .with_address(ChainType::Cosmos, COSMOS_ADDRESS)
        .with_address(ChainType::Osmosis, OSMOSIS_ADDRESS)
        .with_public_key(vec![84 + HARDENED, HARDENED, HARDENED], &device_key(1))
        .with_public_key(vec![49 + HARDENED, HARDENED, HARDENED], &device_key(2))
        .with_public_key(vec![44 + HARDENED, HARDENED, HARDENED], &device_key(3))
}

#[async_trait]
impl Wallet for MockWallet {
    fn supports(&self, chain: ChainType) -> bool {
        self.supported.contains(&chain)
    }

    async fn get_address(
        &self,
        chain: ChainType,
        address_n_list: &[u32],
    ) -> Result<Option<String>> {
        self.address_requests.lock().unwrap().push((chain, address_n_list.to_vec()));
        tokio::task::yield_now().await;
        Ok(self.addresses.get(&chain).cloned())
    }

    async fn get_public_keys(
        &self,
        requests: &[PublicKeyRequest],
    ) -> Result<Option<Vec<Option<PublicKey>>>> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        self.public_key_requests.lock().unwrap().extend(requests.iter().cloned());

        tokio::task::yield_now().await;

        let keys = requests
            .iter()
            .map(|request| {
                self.public_keys.get(&request.address_n_list).map(|xpub| PublicKey {
                    xpub: xpub.clone(),
                })
            })
            .collect();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Some(keys))
    }
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
