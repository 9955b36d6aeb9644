//! Account/session state with a single authoritative owner
//!
//! `SessionState` applies wallet notifications and publishes read-only
//! snapshots through a watch channel; consumers never mutate it.

use alloy_primitives::Address;
use tokio::sync::watch;

use super::error::ValidationError;

/// Read-only view of the wallet session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub connected: bool,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub accounts: Vec<Address>,
}

impl SessionSnapshot {
    /// Connected address, or `NotConnected`
    pub fn require_connected(&self) -> Result<Address, ValidationError> {
        match (self.connected, self.address) {
            (true, Some(address)) => Ok(address),
            _ => Err(ValidationError::NotConnected),
        }
    }
}

/// Notifications emitted by the wallet adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletNotification {
    Connected {
        accounts: Vec<Address>,
        chain_id: u64,
        selected: usize,
    },
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnected,
}

/// Owner of the session; hand out `subscribe()` receivers to readers
#[derive(Debug)]
pub struct SessionState {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn require_connected(&self) -> Result<Address, ValidationError> {
        self.tx.borrow().require_connected()
    }

    pub fn apply(&self, notification: WalletNotification) {
        self.tx.send_modify(|session| match notification {
            WalletNotification::Connected {
                accounts,
                chain_id,
                selected,
            } => {
                let address = accounts.get(selected).or_else(|| accounts.first()).copied();
                session.connected = address.is_some();
                session.address = address;
                session.chain_id = Some(chain_id);
                session.accounts = accounts;
            }
            WalletNotification::AccountsChanged(accounts) => {
                // Keep the current account if the wallet still exposes it.
                let address = session
                    .address
                    .filter(|current| accounts.contains(current))
                    .or_else(|| accounts.first().copied());
                session.connected = address.is_some();
                session.address = address;
                session.accounts = accounts;
            }
            WalletNotification::ChainChanged(chain_id) => {
                session.chain_id = Some(chain_id);
            }
            WalletNotification::Disconnected => {
                *session = SessionSnapshot::default();
            }
        });
    }

    /// Switch to another exposed account; returns the new address
    pub fn select_account(&self, index: usize) -> Option<Address> {
        let mut selected = None;
        self.tx.send_if_modified(|session| {
            let Some(address) = session.accounts.get(index).copied() else {
                return false;
            };
            selected = Some(address);
            if session.address == Some(address) {
                return false;
            }
            session.address = Some(address);
            session.connected = true;
            true
        });
        selected
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Vec<Address> {
        vec![Address::repeat_byte(0x11), Address::repeat_byte(0x22)]
    }

    #[test]
    fn test_starts_disconnected() {
        let session = SessionState::new();
        assert!(!session.snapshot().connected);
        assert_eq!(
            session.require_connected(),
            Err(ValidationError::NotConnected)
        );
    }

    #[test]
    fn test_connect_and_switch_account() {
        let session = SessionState::new();
        session.apply(WalletNotification::Connected {
            accounts: accounts(),
            chain_id: 31337,
            selected: 0,
        });
        assert_eq!(session.require_connected(), Ok(Address::repeat_byte(0x11)));

        assert_eq!(session.select_account(1), Some(Address::repeat_byte(0x22)));
        assert_eq!(session.snapshot().address, Some(Address::repeat_byte(0x22)));
        assert_eq!(session.select_account(7), None);
    }

    #[test]
    fn test_accounts_changed_keeps_current_when_present() {
        let session = SessionState::new();
        session.apply(WalletNotification::Connected {
            accounts: accounts(),
            chain_id: 1,
            selected: 1,
        });
        session.apply(WalletNotification::AccountsChanged(vec![
            Address::repeat_byte(0x33),
            Address::repeat_byte(0x22),
        ]));
        assert_eq!(session.snapshot().address, Some(Address::repeat_byte(0x22)));

        session.apply(WalletNotification::AccountsChanged(vec![]));
        assert!(!session.snapshot().connected);
    }

    #[test]
    fn test_subscribers_observe_disconnect() {
        let session = SessionState::new();
        let rx = session.subscribe();
        session.apply(WalletNotification::Connected {
            accounts: accounts(),
            chain_id: 8453,
            selected: 0,
        });
        assert!(rx.borrow().connected);

        session.apply(WalletNotification::Disconnected);
        assert_eq!(*rx.borrow(), SessionSnapshot::default());
    }
}
