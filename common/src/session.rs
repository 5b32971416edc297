//! Wallet session tracking shared by the session-scoped modules

use crate::messages::SessionMessage;
use crate::wallet::WalletInfo;

/// Tracks the connected wallet and reports when it changes identity
#[derive(Debug, Default, Clone)]
pub struct WalletSession {
    current: Option<WalletInfo>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&WalletInfo> {
        self.current.as_ref()
    }

    /// Apply a session event, returning true if the connected wallet changed.
    /// Reconnecting the same device is not a change.
    pub fn handle(&mut self, message: &SessionMessage) -> bool {
        match message {
            SessionMessage::WalletConnected(info) => {
                let changed =
                    self.current.as_ref().is_none_or(|current| current.device_id != info.device_id);
                self.current = Some(info.clone());
                changed
            }
            SessionMessage::WalletDisconnected => self.current.take().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainType;

    fn wallet(device_id: &str) -> WalletInfo {
        WalletInfo {
            device_id: device_id.to_string(),
            label: "test".to_string(),
            supported_chains: vec![ChainType::Bitcoin],
        }
    }

    #[test]
    fn connect_switch_and_disconnect() {
        let mut session = WalletSession::new();
        assert!(session.handle(&SessionMessage::WalletConnected(wallet("a"))));
        assert!(!session.handle(&SessionMessage::WalletConnected(wallet("a"))));
        assert!(session.handle(&SessionMessage::WalletConnected(wallet("b"))));
        assert_eq!(session.current().map(|w| w.device_id.as_str()), Some("b"));
        assert!(session.handle(&SessionMessage::WalletDisconnected));
        assert!(!session.handle(&SessionMessage::WalletDisconnected));
        assert!(session.current().is_none());
    }
}
