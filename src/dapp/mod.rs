//! Application services over the chain client
//!
//! `Dapp` wires configuration, contract bindings, the session owner and the
//! lifecycle manager together. Both the TUI worker and the headless
//! commands drive it.

mod counter;
mod faucet;
mod lifecycle;

use std::sync::Arc;

use alloy_primitives::{Address, U256};

pub use counter::{Counter, CounterRefreshError};
pub use faucet::{Faucet, FaucetReadings, FaucetRefreshError, FaucetView};
pub use lifecycle::{
    CancelHandle, CancelToken, NoRefresh, Refresher, TxManager, TxReport, WriteCall,
};

use crate::config::{Config, ConfigError};
use crate::domain::abi::{ContractKind, InterfaceRegistry};
use crate::domain::eligibility::Clock;
use crate::domain::error::{RefreshError, TxError, ValidationError};
use crate::domain::lifecycle::ActionSlot;
use crate::domain::session::{SessionSnapshot, SessionState, WalletNotification};
use crate::infrastructure::abi::ContractBinding;
use crate::infrastructure::ethereum::{ChainClient, ChainError};

/// Which derived view a confirmed write invalidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTarget {
    Faucet,
    Counter,
}

impl RefreshTarget {
    pub fn for_slot(slot: ActionSlot) -> Self {
        match slot {
            ActionSlot::Claim | ActionSlot::Fund => RefreshTarget::Faucet,
            ActionSlot::Increment | ActionSlot::IncrementBy => RefreshTarget::Counter,
        }
    }
}

/// Receives fresh reads as they complete
pub trait ViewSink: Send + Sync {
    fn faucet(&self, result: &Result<FaucetView, FaucetRefreshError>);
    fn counter(&self, result: &Result<U256, CounterRefreshError>);
}

pub struct Dapp {
    client: Arc<dyn ChainClient>,
    session: Arc<SessionState>,
    manager: TxManager,
    clock: Arc<dyn Clock>,
    faucet: Result<Faucet, ValidationError>,
    counter: Result<Counter, ValidationError>,
    account_index: usize,
}

impl Dapp {
    pub fn new(
        client: Arc<dyn ChainClient>,
        config: &Config,
        interfaces: &InterfaceRegistry,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let binding = |kind: ContractKind| -> Result<Result<ContractBinding, ValidationError>, ConfigError> {
            let address = config.contract(kind)?;
            Ok(match (address, interfaces.get(kind)) {
                (Some(address), Some(interface)) => Ok(ContractBinding::new(kind, address, interface)),
                _ => Err(ValidationError::MissingContract(kind)),
            })
        };

        let token = binding(ContractKind::Token)?;
        let faucet = binding(ContractKind::Faucet)?;
        let counter = binding(ContractKind::Counter)?.map(Counter::new);
        let faucet = token.and_then(|token| faucet.map(|faucet| Faucet::new(token, faucet)));

        let session = Arc::new(SessionState::new());
        let manager = TxManager::new(
            client.clone(),
            session.subscribe(),
            config.chain_id,
            config.poll_interval(),
        );

        Ok(Self {
            client,
            session,
            manager,
            clock,
            faucet,
            counter,
            account_index: config.wallet.account_index,
        })
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn manager(&self) -> &TxManager {
        &self.manager
    }

    pub fn faucet(&self) -> Result<&Faucet, ValidationError> {
        self.faucet.as_ref().map_err(Clone::clone)
    }

    pub fn counter(&self) -> Result<&Counter, ValidationError> {
        self.counter.as_ref().map_err(Clone::clone)
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Connect the wallet and select the configured account
    pub async fn connect(&self) -> Result<SessionSnapshot, ChainError> {
        let wallet = self.client.connect().await?;
        tracing::info!(
            accounts = wallet.accounts.len(),
            chain_id = wallet.chain_id,
            endpoint = %self.client.endpoint_name(),
            "wallet connected"
        );
        self.session.apply(WalletNotification::Connected {
            accounts: wallet.accounts,
            chain_id: wallet.chain_id,
            selected: self.account_index,
        });
        Ok(self.session.snapshot())
    }

    pub fn disconnect(&self) {
        tracing::info!("wallet disconnected");
        self.session.apply(WalletNotification::Disconnected);
    }

    /// Re-read accounts and chain id, publishing any change
    pub async fn sync_session(&self) -> Result<bool, ChainError> {
        let before = self.session.snapshot();
        if !before.connected {
            return Ok(false);
        }
        let wallet = self.client.connect().await?;
        if wallet.accounts != before.accounts {
            tracing::info!(accounts = wallet.accounts.len(), "accounts changed");
            self.session
                .apply(WalletNotification::AccountsChanged(wallet.accounts));
        }
        if Some(wallet.chain_id) != before.chain_id {
            tracing::info!(chain_id = wallet.chain_id, "chain changed");
            self.session.apply(WalletNotification::ChainChanged(wallet.chain_id));
        }
        Ok(self.session.snapshot() != before)
    }

    pub async fn refresh_faucet(&self, account: Address) -> Result<FaucetView, FaucetRefreshError> {
        let faucet = self
            .faucet()
            .map_err(|err| RefreshError::new("faucet", err.to_string(), FaucetReadings::default()))?;
        let result = faucet.refresh(self.client.as_ref(), account).await;
        if let Err(err) = &result {
            tracing::warn!(%account, error = %err, "faucet refresh failed");
        }
        result
    }

    pub async fn refresh_counter(&self) -> Result<U256, CounterRefreshError> {
        let counter = self
            .counter()
            .map_err(|err| RefreshError::new("counter", err.to_string(), ()))?;
        let result = counter.refresh(self.client.as_ref()).await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "counter refresh failed");
        }
        result
    }

    /// Refresh both views concurrently
    pub async fn refresh_all(
        &self,
        account: Address,
    ) -> (
        Result<FaucetView, FaucetRefreshError>,
        Result<U256, CounterRefreshError>,
    ) {
        futures::future::join(self.refresh_faucet(account), self.refresh_counter()).await
    }

    /// Claim from the faucet; `next_claim_at` is the cached read, if any
    pub async fn claim(
        &self,
        cancel: CancelToken,
        next_claim_at: Option<u64>,
        refresher: &dyn Refresher,
    ) -> Result<TxReport, TxError> {
        let faucet = self.faucet.clone();
        let now = self.now();
        self.manager
            .execute(
                ActionSlot::Claim,
                cancel,
                move |session| faucet?.claim_call(session, next_claim_at, now),
                refresher,
            )
            .await
    }

    pub async fn increment(&self, cancel: CancelToken, refresher: &dyn Refresher) -> Result<TxReport, TxError> {
        let counter = self.counter.clone();
        self.manager
            .execute(
                ActionSlot::Increment,
                cancel,
                move |_| Ok(counter?.increment_call()),
                refresher,
            )
            .await
    }

    pub async fn increment_by(
        &self,
        cancel: CancelToken,
        amount: String,
        refresher: &dyn Refresher,
    ) -> Result<TxReport, TxError> {
        let counter = self.counter.clone();
        self.manager
            .execute(
                ActionSlot::IncrementBy,
                cancel,
                move |_| counter?.increment_by_call(&amount),
                refresher,
            )
            .await
    }

    /// Transfer `amount` smallest token units from the account to the faucet
    pub async fn fund(
        &self,
        cancel: CancelToken,
        amount: String,
        refresher: &dyn Refresher,
    ) -> Result<TxReport, TxError> {
        let faucet = self.faucet.clone();
        self.manager
            .execute(
                ActionSlot::Fund,
                cancel,
                move |_| faucet?.fund_call(&amount),
                refresher,
            )
            .await
    }

    /// Refresher that re-reads `target` and hands results to `sink`
    pub fn refresher<'a>(&'a self, target: RefreshTarget, sink: &'a dyn ViewSink) -> ViewRefresh<'a> {
        ViewRefresh {
            dapp: self,
            target,
            sink,
        }
    }
}

/// Post-confirmation refresh of one view
pub struct ViewRefresh<'a> {
    dapp: &'a Dapp,
    target: RefreshTarget,
    sink: &'a dyn ViewSink,
}

#[async_trait::async_trait]
impl<'a> Refresher for ViewRefresh<'a> {
    async fn refresh(&self, account: Address) -> Result<(), String> {
        match self.target {
            RefreshTarget::Faucet => {
                let result = self.dapp.refresh_faucet(account).await;
                self.sink.faucet(&result);
                result.map(|_| ()).map_err(|err| err.to_string())
            }
            RefreshTarget::Counter => {
                let result = self.dapp.refresh_counter().await;
                self.sink.counter(&result);
                result.map(|_| ()).map_err(|err| err.to_string())
            }
        }
    }
}
