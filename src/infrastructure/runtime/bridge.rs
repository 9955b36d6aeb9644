//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI thread sends `RuntimeCommand`s and drains `RuntimeEvent`s; a
//! background thread owns the Tokio runtime and the `Dapp` services.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use alloy_primitives::{Address, U256};
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::dapp::{CounterRefreshError, FaucetRefreshError, FaucetView, TxReport};
use crate::domain::abi::InterfaceRegistry;
use crate::domain::error::TxError;
use crate::domain::lifecycle::{ActionSlot, TxState};
use crate::domain::session::SessionSnapshot;
use crate::infrastructure::ethereum::{ProviderConfig, WalletSource};
use crate::infrastructure::runtime::worker::run_async_worker;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCommand {
    /// Reconnect the wallet on the current endpoint
    Connect,
    /// Drop the wallet session
    Disconnect,
    /// Use another exposed account
    SelectAccount { index: usize },
    /// Switch to a different endpoint
    SwitchEndpoint { index: usize },
    RefreshFaucet,
    RefreshCounter,
    /// Claim; `next_claim_at` is the page's cached read
    Claim { next_claim_at: Option<u64> },
    Increment,
    IncrementBy { amount: String },
    Fund { amount: String },
    /// Stop waiting for the slot's pending transaction
    CancelPending { slot: ActionSlot },
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Chain client ready on an endpoint
    Connected {
        endpoint: String,
        wallet: String,
        contracts: ContractAddresses,
    },
    /// Session snapshot changed
    Session(SessionSnapshot),
    FaucetRefreshed(FaucetView),
    FaucetRefreshFailed(FaucetRefreshError),
    /// Faucet cooldown in seconds
    ClaimInterval(u64),
    CounterRefreshed(U256),
    CounterRefreshFailed(CounterRefreshError),
    /// Lifecycle transition on a slot
    TxState { slot: ActionSlot, state: TxState },
    /// Final outcome of an action
    ActionFinished {
        slot: ActionSlot,
        result: Result<TxReport, TxError>,
    },
    /// Error occurred
    Error { message: String },
}

/// Configured contract addresses, for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAddresses {
    pub token: Option<Address>,
    pub faucet: Option<Address>,
    pub counter: Option<Address>,
}

/// Everything the worker needs to build its services
#[derive(Clone)]
pub struct WorkerSetup {
    pub endpoints: Vec<ProviderConfig>,
    pub wallet: WalletSource,
    pub config: Config,
    pub interfaces: InterfaceRegistry,
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime
    pub fn new(setup: WorkerSetup) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        thread::Builder::new()
            .name("drip-runtime".to_string())
            .spawn(move || {
                let rt = match Runtime::new() {
                    Ok(rt) => rt,
                    Err(err) => {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Failed to create Tokio runtime: {}", err),
                        });
                        return;
                    }
                };
                rt.block_on(async {
                    if let Err(err) = run_async_worker(setup, cmd_rx, evt_tx.clone()).await {
                        tracing::error!(error = %format!("{:#}", err), "worker exited");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        // Try to send shutdown command
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
