//! Transaction lifecycle manager
//!
//! Drives one write per action slot through
//! `Validating -> Submitting -> Pending -> Confirmed | Failed` and re-reads
//! chain state once the receipt is observed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, B256};
use tokio::sync::watch;

use crate::domain::error::{RevertKind, TxError, ValidationError};
use crate::domain::lifecycle::{ActionSlot, TxState};
use crate::domain::session::SessionSnapshot;
use crate::infrastructure::abi::{ContractBinding, PreparedCall};
use crate::infrastructure::ethereum::{ChainClient, ChainError};

/// A contract write described by method name and arguments
#[derive(Clone)]
pub struct WriteCall {
    pub binding: ContractBinding,
    pub method: &'static str,
    pub args: Vec<DynSolValue>,
}

impl WriteCall {
    pub fn new(binding: ContractBinding, method: &'static str, args: Vec<DynSolValue>) -> Self {
        Self {
            binding,
            method,
            args,
        }
    }
}

/// Re-reads the state a confirmed write may have changed
#[async_trait::async_trait]
pub trait Refresher: Send + Sync {
    async fn refresh(&self, account: Address) -> Result<(), String>;
}

/// Refresher that reads nothing
pub struct NoRefresh;

#[async_trait::async_trait]
impl Refresher for NoRefresh {
    async fn refresh(&self, _account: Address) -> Result<(), String> {
        Ok(())
    }
}

/// Outcome of a write that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxReport {
    Confirmed {
        hash: B256,
        block_number: Option<u64>,
        /// Post-confirmation refresh failure, non-fatal
        refresh_error: Option<String>,
    },
    /// The caller stopped waiting; the transaction may still be mined
    Abandoned { hash: B256 },
}

impl TxReport {
    pub fn hash(&self) -> B256 {
        match self {
            TxReport::Confirmed { hash, .. } | TxReport::Abandoned { hash } => *hash,
        }
    }
}

/// Caller side of a cancellation pair
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// True once the paired token is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Stops waiting for confirmation when its handle fires
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn pair() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx: Arc::new(tx) }, CancelToken { rx })
    }

    /// A token that never fires
    pub fn never() -> CancelToken {
        let (_handle, token) = Self::pair();
        token
    }

    /// Resolves once cancelled; pends forever if the handle is gone
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// One lifecycle state cell per action slot
struct SlotState {
    tx: watch::Sender<TxState>,
}

impl SlotState {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(TxState::Idle);
        Self { tx }
    }

    /// Atomically claim the slot; false if a lifecycle is already active
    fn try_begin(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_active() {
                return false;
            }
            *state = TxState::Validating;
            true
        })
    }

    fn set(&self, state: TxState) {
        self.tx.send_replace(state);
    }
}

/// Parameterized lifecycle manager shared by every write action
pub struct TxManager {
    client: Arc<dyn ChainClient>,
    session: watch::Receiver<SessionSnapshot>,
    expected_chain_id: Option<u64>,
    poll_interval: Duration,
    slots: HashMap<ActionSlot, SlotState>,
}

impl TxManager {
    pub fn new(
        client: Arc<dyn ChainClient>,
        session: watch::Receiver<SessionSnapshot>,
        expected_chain_id: Option<u64>,
        poll_interval: Duration,
    ) -> Self {
        let slots = ActionSlot::ALL
            .into_iter()
            .map(|slot| (slot, SlotState::new()))
            .collect();
        Self {
            client,
            session,
            expected_chain_id,
            poll_interval,
            slots,
        }
    }

    pub fn subscribe(&self, slot: ActionSlot) -> watch::Receiver<TxState> {
        self.slot(slot).tx.subscribe()
    }

    pub fn state(&self, slot: ActionSlot) -> TxState {
        self.slot(slot).tx.borrow().clone()
    }

    /// Run one write to completion on `slot`
    ///
    /// `build` runs during validation against the current session snapshot
    /// and must not touch the network. A second call while the slot is
    /// active returns `AlreadyInProgress` and leaves the first untouched.
    pub async fn execute<F>(
        &self,
        slot: ActionSlot,
        mut cancel: CancelToken,
        build: F,
        refresher: &dyn Refresher,
    ) -> Result<TxReport, TxError>
    where
        F: FnOnce(&SessionSnapshot) -> Result<WriteCall, TxError> + Send,
    {
        let state = self.slot(slot);
        if !state.try_begin() {
            tracing::debug!(%slot, "action rejected, slot busy");
            return Err(TxError::AlreadyInProgress(slot.label().to_string()));
        }
        tracing::debug!(%slot, "validating");

        let session = self.session.borrow().clone();
        let (from, write, call) = match self.validate(&session, build) {
            Ok(validated) => validated,
            Err(err) => return Err(self.fail(slot, err, None)),
        };

        state.set(TxState::Submitting);
        tracing::info!(%slot, method = write.method, %from, to = %call.to, "submitting transaction");

        let hash = match self.client.send(from, call.to, call.data).await {
            Ok(hash) => hash,
            Err(err) => return Err(self.fail(slot, map_send_error(err, &write.binding), None)),
        };

        state.set(TxState::Pending { hash });
        tracing::info!(%slot, %hash, "transaction pending");

        let receipt = tokio::select! {
            receipt = self.client.wait_for_confirmation(hash, self.poll_interval) => receipt,
            _ = cancel.cancelled() => {
                state.set(TxState::Idle);
                tracing::warn!(%slot, %hash, "stopped waiting for confirmation");
                return Ok(TxReport::Abandoned { hash });
            }
        };

        if !receipt.success {
            let err = TxError::ContractRevert(RevertKind::Unknown(format!(
                "transaction reverted in block {}",
                receipt
                    .block_number
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string())
            )));
            return Err(self.fail(slot, err, Some(hash)));
        }

        let block_number = receipt.block_number;
        state.set(TxState::Confirmed {
            hash,
            block_number,
            refresh_error: None,
        });
        tracing::info!(%slot, %hash, block = ?block_number, gas_used = receipt.gas_used, "transaction confirmed");

        let refresh_error = refresher.refresh(from).await.err();
        if let Some(message) = &refresh_error {
            tracing::warn!(%slot, %hash, error = %message, "refresh after confirmation failed");
            state.set(TxState::Confirmed {
                hash,
                block_number,
                refresh_error: Some(message.clone()),
            });
        }

        Ok(TxReport::Confirmed {
            hash,
            block_number,
            refresh_error,
        })
    }

    fn validate<F>(
        &self,
        session: &SessionSnapshot,
        build: F,
    ) -> Result<(Address, WriteCall, PreparedCall), TxError>
    where
        F: FnOnce(&SessionSnapshot) -> Result<WriteCall, TxError>,
    {
        let from = session.require_connected()?;
        if let (Some(expected), Some(actual)) = (self.expected_chain_id, session.chain_id) {
            if expected != actual {
                return Err(ValidationError::WrongNetwork { expected, actual }.into());
            }
        }
        let write = build(session)?;
        let call = write
            .binding
            .prepare_write(write.method, &write.args)
            .map_err(|err| TxError::Encoding(err.to_string()))?;
        Ok((from, write, call))
    }

    fn fail(&self, slot: ActionSlot, error: TxError, hash: Option<B256>) -> TxError {
        tracing::warn!(%slot, category = ?error.category(), error = %error, "transaction failed");
        self.slot(slot).set(TxState::Failed {
            error: error.clone(),
            hash,
        });
        error
    }

    fn slot(&self, slot: ActionSlot) -> &SlotState {
        // Every slot is inserted in `new`
        &self.slots[&slot]
    }
}

fn map_send_error(err: ChainError, binding: &ContractBinding) -> TxError {
    match err {
        ChainError::UserRejected => TxError::UserRejected,
        ChainError::Revert {
            data: Some(data), ..
        } => TxError::ContractRevert(binding.decode_revert(&data)),
        ChainError::Revert {
            data: None,
            message,
        } => TxError::ContractRevert(RevertKind::Unknown(message)),
        other => TxError::Submission(other.to_string()),
    }
}
