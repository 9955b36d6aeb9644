//! Async worker - runs in Tokio runtime and drives the dapp services

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::U256;
use anyhow::Result;

use crate::dapp::{
    CancelHandle, CancelToken, CounterRefreshError, Dapp, FaucetRefreshError, FaucetView,
    RefreshTarget, ViewSink,
};
use crate::domain::abi::ContractKind;
use crate::domain::eligibility::SystemClock;
use crate::domain::error::{TxError, ValidationError};
use crate::domain::lifecycle::{ActionSlot, TxState};
use crate::infrastructure::ethereum::{create_client, ChainClient, ProviderConfig};
use crate::infrastructure::runtime::bridge::{
    ContractAddresses, RuntimeCommand, RuntimeEvent, WorkerSetup,
};

/// How often accounts and chain id are re-read
const SESSION_SYNC_INTERVAL: Duration = Duration::from_secs(5);

/// Forwards fresh reads to the TUI
struct EventSink {
    evt_tx: Sender<RuntimeEvent>,
}

impl ViewSink for EventSink {
    fn faucet(&self, result: &Result<FaucetView, FaucetRefreshError>) {
        let event = match result {
            Ok(view) => RuntimeEvent::FaucetRefreshed(view.clone()),
            Err(err) => RuntimeEvent::FaucetRefreshFailed(err.clone()),
        };
        let _ = self.evt_tx.send(event);
    }

    fn counter(&self, result: &Result<U256, CounterRefreshError>) {
        let event = match result {
            Ok(value) => RuntimeEvent::CounterRefreshed(*value),
            Err(err) => RuntimeEvent::CounterRefreshFailed(err.clone()),
        };
        let _ = self.evt_tx.send(event);
    }
}

/// Run the async worker loop
pub async fn run_async_worker(
    setup: WorkerSetup,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    if setup.endpoints.is_empty() {
        anyhow::bail!("No endpoints configured");
    }

    let mut endpoint_index = 0usize;
    let mut dapp: Option<Arc<Dapp>> = None;
    // Handles of every action still holding its token, per slot
    let mut cancels: HashMap<ActionSlot, Vec<CancelHandle>> = HashMap::new();
    let mut last_sync = Instant::now();

    loop {
        // Try to connect if not connected
        if dapp.is_none() {
            let config = setup.endpoints[endpoint_index].clone();
            match connect_to_endpoint(&setup, &config, &evt_tx).await {
                Ok(connected) => {
                    spawn_forwarders(&connected, &evt_tx);
                    tokio::spawn(refresh_everything(connected.clone(), evt_tx.clone()));
                    dapp = Some(connected);
                    last_sync = Instant::now();
                }
                Err(err) => {
                    tracing::warn!(endpoint = %config.display(), error = %format!("{:#}", err), "connection failed");
                    let _ = evt_tx.send(RuntimeEvent::Error {
                        message: format!("Connection failed ({}): {:#}", config.display(), err),
                    });

                    // Try next endpoint if available
                    if setup.endpoints.len() > 1 {
                        endpoint_index = (endpoint_index + 1) % setup.endpoints.len();
                    }

                    // Keep answering commands while offline
                    while let Ok(cmd) = cmd_rx.try_recv() {
                        match cmd {
                            RuntimeCommand::Shutdown => return Ok(()),
                            RuntimeCommand::SwitchEndpoint { index } if index < setup.endpoints.len() => {
                                endpoint_index = index;
                            }
                            other => reject_offline(&other, &evt_tx),
                        }
                    }

                    tokio::time::sleep(Duration::from_millis(900)).await;
                    continue;
                }
            }
        }

        let Some(current) = dapp.clone() else {
            continue;
        };

        // Process commands (non-blocking)
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                RuntimeCommand::Shutdown => return Ok(()),

                RuntimeCommand::SwitchEndpoint { index } => {
                    if index >= setup.endpoints.len() {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!(
                                "Invalid endpoint index {} ({} total)",
                                index,
                                setup.endpoints.len()
                            ),
                        });
                        continue;
                    }
                    endpoint_index = index;
                    dapp = None;
                    cancels.clear();
                    break;
                }

                RuntimeCommand::Connect => {
                    let current = current.clone();
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        match current.connect().await {
                            Ok(_) => refresh_everything(current, evt_tx).await,
                            Err(err) => {
                                let _ = evt_tx.send(RuntimeEvent::Error {
                                    message: format!("Wallet connection failed: {}", err),
                                });
                            }
                        }
                    });
                }

                RuntimeCommand::Disconnect => current.disconnect(),

                RuntimeCommand::SelectAccount { index } => {
                    if current.session().select_account(index).is_some() {
                        tokio::spawn(refresh_everything(current.clone(), evt_tx.clone()));
                    } else {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("No account at index {}", index),
                        });
                    }
                }

                RuntimeCommand::RefreshFaucet => {
                    let current = current.clone();
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        match current.session().require_connected() {
                            Ok(account) => {
                                let result = current.refresh_faucet(account).await;
                                EventSink { evt_tx }.faucet(&result);
                            }
                            Err(err) => {
                                let _ = evt_tx.send(RuntimeEvent::Error {
                                    message: err.to_string(),
                                });
                            }
                        }
                    });
                }

                RuntimeCommand::RefreshCounter => {
                    let current = current.clone();
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let result = current.refresh_counter().await;
                        EventSink { evt_tx }.counter(&result);
                    });
                }

                RuntimeCommand::CancelPending { slot } => {
                    for handle in cancels.remove(&slot).unwrap_or_default() {
                        handle.cancel();
                    }
                }

                action => {
                    let Some(slot) = action_slot(&action) else {
                        continue;
                    };
                    let (handle, token) = CancelToken::pair();
                    let handles = cancels.entry(slot).or_default();
                    handles.retain(|handle| !handle.is_closed());
                    handles.push(handle);
                    spawn_action(current.clone(), slot, action, token, &evt_tx);
                }
            }
        }

        if dapp.is_some() && last_sync.elapsed() >= SESSION_SYNC_INTERVAL {
            last_sync = Instant::now();
            let current = current.clone();
            let evt_tx = evt_tx.clone();
            tokio::spawn(async move {
                match current.sync_session().await {
                    Ok(true) => refresh_everything(current, evt_tx).await,
                    Ok(false) => {}
                    Err(err) => tracing::debug!(error = %err, "session sync failed"),
                }
            });
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Build the client and services for one endpoint and connect the wallet
async fn connect_to_endpoint(
    setup: &WorkerSetup,
    config: &ProviderConfig,
    evt_tx: &Sender<RuntimeEvent>,
) -> Result<Arc<Dapp>> {
    let client: Arc<dyn ChainClient> = Arc::new(create_client(config, setup.wallet.clone()).await?);
    let dapp = Arc::new(Dapp::new(
        client,
        &setup.config,
        &setup.interfaces,
        Arc::new(SystemClock),
    )?);
    dapp.connect().await?;

    let contracts = ContractAddresses {
        token: setup.config.contract(ContractKind::Token)?,
        faucet: setup.config.contract(ContractKind::Faucet)?,
        counter: setup.config.contract(ContractKind::Counter)?,
    };
    let _ = evt_tx.send(RuntimeEvent::Connected {
        endpoint: config.display(),
        wallet: setup.wallet.describe(),
        contracts,
    });
    Ok(dapp)
}

/// Mirror session and slot watch channels into events
fn spawn_forwarders(dapp: &Arc<Dapp>, evt_tx: &Sender<RuntimeEvent>) {
    let mut session = dapp.session().subscribe();
    let _ = evt_tx.send(RuntimeEvent::Session(session.borrow_and_update().clone()));
    let session_tx = evt_tx.clone();
    tokio::spawn(async move {
        while session.changed().await.is_ok() {
            let snapshot = session.borrow_and_update().clone();
            if session_tx.send(RuntimeEvent::Session(snapshot)).is_err() {
                break;
            }
        }
    });

    for slot in ActionSlot::ALL {
        let mut rx = dapp.manager().subscribe(slot);
        let evt_tx = evt_tx.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                if evt_tx.send(RuntimeEvent::TxState { slot, state }).is_err() {
                    break;
                }
            }
        });
    }
}

fn action_slot(cmd: &RuntimeCommand) -> Option<ActionSlot> {
    match cmd {
        RuntimeCommand::Claim { .. } => Some(ActionSlot::Claim),
        RuntimeCommand::Increment => Some(ActionSlot::Increment),
        RuntimeCommand::IncrementBy { .. } => Some(ActionSlot::IncrementBy),
        RuntimeCommand::Fund { .. } => Some(ActionSlot::Fund),
        _ => None,
    }
}

/// Run an action on its own task
fn spawn_action(
    dapp: Arc<Dapp>,
    slot: ActionSlot,
    action: RuntimeCommand,
    cancel: CancelToken,
    evt_tx: &Sender<RuntimeEvent>,
) {
    let evt_tx = evt_tx.clone();

    tokio::spawn(async move {
        let sink = EventSink {
            evt_tx: evt_tx.clone(),
        };
        let refresher = dapp.refresher(RefreshTarget::for_slot(slot), &sink);
        let result = match action {
            RuntimeCommand::Claim { next_claim_at } => dapp.claim(cancel, next_claim_at, &refresher).await,
            RuntimeCommand::Increment => dapp.increment(cancel, &refresher).await,
            RuntimeCommand::IncrementBy { amount } => dapp.increment_by(cancel, amount, &refresher).await,
            RuntimeCommand::Fund { amount } => dapp.fund(cancel, amount, &refresher).await,
            _ => return,
        };
        let _ = evt_tx.send(RuntimeEvent::ActionFinished { slot, result });
    });
}

/// Re-read every view for the current account
async fn refresh_everything(dapp: Arc<Dapp>, evt_tx: Sender<RuntimeEvent>) {
    let Ok(account) = dapp.session().require_connected() else {
        return;
    };
    let sink = EventSink {
        evt_tx: evt_tx.clone(),
    };
    let (faucet, counter) = dapp.refresh_all(account).await;
    sink.faucet(&faucet);
    sink.counter(&counter);

    if let Ok(faucet) = dapp.faucet() {
        if let Ok(interval) = faucet.claim_interval(dapp.client().as_ref()).await {
            let _ = evt_tx.send(RuntimeEvent::ClaimInterval(interval));
        }
    }
}

/// Writes issued before a chain client exists fail as not connected
fn reject_offline(cmd: &RuntimeCommand, evt_tx: &Sender<RuntimeEvent>) {
    let Some(slot) = action_slot(cmd) else {
        return;
    };
    let error = TxError::Validation(ValidationError::NotConnected);
    let _ = evt_tx.send(RuntimeEvent::TxState {
        slot,
        state: TxState::Failed {
            error: error.clone(),
            hash: None,
        },
    });
    let _ = evt_tx.send(RuntimeEvent::ActionFinished {
        slot,
        result: Err(error),
    });
}
