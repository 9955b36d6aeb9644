//! Headless commands: the same services as the TUI, printed to stdout

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};

use crate::dapp::{
    CancelToken, CounterRefreshError, Dapp, FaucetRefreshError, FaucetView, RefreshTarget,
    TxReport, ViewSink,
};
use crate::domain::error::TxError;
use crate::domain::eligibility::{format_countdown, Countdown, SystemClock};
use crate::domain::explorer::Explorer;
use crate::domain::lifecycle::{ActionSlot, TxState};
use crate::infrastructure::ethereum::{create_client, ChainClient};
use crate::infrastructure::runtime::WorkerSetup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessCommand {
    Status { watch: bool },
    Claim,
    Increment { by: Option<String> },
    Fund { amount: String },
}

/// Run one headless command on its own runtime
pub fn run(command: HeadlessCommand, setup: WorkerSetup) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    rt.block_on(run_async(command, setup))
}

async fn run_async(command: HeadlessCommand, setup: WorkerSetup) -> Result<()> {
    let endpoint = setup
        .endpoints
        .first()
        .context("No endpoints configured")?;
    let client: Arc<dyn ChainClient> = Arc::new(create_client(endpoint, setup.wallet.clone()).await?);
    let dapp = Dapp::new(client, &setup.config, &setup.interfaces, Arc::new(SystemClock))?;
    let snapshot = dapp.connect().await.context("Wallet connection failed")?;
    let account = snapshot.require_connected()?;
    let explorer = Explorer::new(setup.config.explorer_url());

    println!("endpoint  {}", endpoint.display());
    println!("account   {}", account.to_checksum(None));
    if let Some(chain_id) = snapshot.chain_id {
        println!("chain     {}", chain_id);
    }

    let slot = match &command {
        HeadlessCommand::Status { watch } => return status(&dapp, account, *watch).await,
        HeadlessCommand::Claim => ActionSlot::Claim,
        HeadlessCommand::Increment { by: None } => ActionSlot::Increment,
        HeadlessCommand::Increment { by: Some(_) } => ActionSlot::IncrementBy,
        HeadlessCommand::Fund { .. } => ActionSlot::Fund,
    };

    let printer = spawn_printer(&dapp, explorer.clone(), slot);
    let refresher = dapp.refresher(RefreshTarget::for_slot(slot), &PrintSink);
    let cancel = CancelToken::never();
    let result = match command {
        HeadlessCommand::Claim => {
            // A fresh read lets the cooldown be checked before anything is signed
            let next_claim_at = dapp
                .refresh_faucet(account)
                .await
                .ok()
                .map(|view| view.next_claim_at);
            dapp.claim(cancel, next_claim_at, &refresher).await
        }
        HeadlessCommand::Increment { by: None } => dapp.increment(cancel, &refresher).await,
        HeadlessCommand::Increment { by: Some(by) } => dapp.increment_by(cancel, by, &refresher).await,
        HeadlessCommand::Fund { amount } => dapp.fund(cancel, amount, &refresher).await,
        HeadlessCommand::Status { .. } => return Ok(()),
    };
    printer.abort();
    report(&explorer, result)
}

/// Print each lifecycle transition of `slot`
fn spawn_printer(dapp: &Dapp, explorer: Explorer, slot: ActionSlot) -> tokio::task::JoinHandle<()> {
    let mut states = dapp.manager().subscribe(slot);
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            print_state(&explorer, slot, &state);
            if state.is_terminal() {
                break;
            }
        }
    })
}

fn print_state(explorer: &Explorer, slot: ActionSlot, state: &TxState) {
    match state {
        TxState::Pending { hash } => println!("{:<10}pending {}", slot.label(), explorer.tx_url(hash)),
        TxState::Confirmed { .. } | TxState::Failed { .. } | TxState::Idle => {}
        other => println!("{:<10}{}", slot.label(), other.label()),
    }
}

fn report(explorer: &Explorer, result: Result<TxReport, TxError>) -> Result<()> {
    match result {
        Ok(TxReport::Confirmed {
            hash,
            block_number,
            refresh_error,
        }) => {
            match block_number {
                Some(block) => println!("confirmed in block {}: {}", block, explorer.tx_url(&hash)),
                None => println!("confirmed: {}", explorer.tx_url(&hash)),
            }
            if let Some(err) = refresh_error {
                println!("warning: {}", err);
            }
            Ok(())
        }
        Ok(TxReport::Abandoned { hash }) => {
            println!("stopped waiting: {}", explorer.tx_url(&hash));
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!(err.user_message())),
    }
}

async fn status(dapp: &Dapp, account: Address, watch: bool) -> Result<()> {
    let (faucet, counter) = dapp.refresh_all(account).await;
    PrintSink.faucet(&faucet);
    PrintSink.counter(&counter);
    if let Ok(faucet) = dapp.faucet() {
        if let Ok(interval) = faucet.claim_interval(dapp.client().as_ref()).await {
            println!("cooldown  {}", format_countdown(interval));
        }
    }

    let Some(view) = faucet.ok().filter(|_| watch) else {
        return Ok(());
    };

    let mut countdown = Countdown::new(view.eligibility());
    let mut ticker = tokio::time::interval(Countdown::INTERVAL);
    loop {
        ticker.tick().await;
        let changed = countdown.tick(dapp.now());
        match countdown.display() {
            Some(remaining) if changed => println!("next claim in {}", remaining),
            Some(_) => {}
            None => {
                println!("claim available");
                return Ok(());
            }
        }
    }
}

/// Prints refreshed views
struct PrintSink;

impl ViewSink for PrintSink {
    fn faucet(&self, result: &Result<FaucetView, FaucetRefreshError>) {
        match result {
            Ok(view) => {
                println!("balance   {}", view.balance.format_fixed(2));
                println!("claim     {}", view.claim_amount.format_fixed(2));
                println!("next      {}", view.next_claim_at);
            }
            Err(err) => println!("faucet    {}", err),
        }
    }

    fn counter(&self, result: &Result<U256, CounterRefreshError>) {
        match result {
            Ok(value) => println!("counter   {}", value),
            Err(err) => println!("counter   {}", err),
        }
    }
}
