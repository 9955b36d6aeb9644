use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{Action, Command, Context, Module, NavigateTarget, NotifyLevel};
use crate::dapp::TxReport;
use crate::domain::eligibility::{Clock, SystemClock};
use crate::domain::error::TxError;
use crate::domain::explorer::Explorer;
use crate::domain::lifecycle::ActionSlot;
use crate::infrastructure::runtime::{ContractAddresses, RuntimeCommand, RuntimeEvent};
use crate::modules::{CounterPage, FaucetPage};

const STATUS_TTL: Duration = Duration::from_secs(3);

/// Pages of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Faucet,
    Counter,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::Faucet, Page::Counter];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Faucet => "Faucet",
            Page::Counter => "Counter",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Page::Faucet => '1',
            Page::Counter => '2',
        }
    }

    pub fn owns(&self, slot: ActionSlot) -> bool {
        match self {
            Page::Faucet => matches!(slot, ActionSlot::Claim | ActionSlot::Fund),
            Page::Counter => matches!(slot, ActionSlot::Increment | ActionSlot::IncrementBy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Warn => StatusLevel::Warn,
            NotifyLevel::Error => StatusLevel::Error,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

#[derive(Debug, Clone)]
pub struct EndpointOption {
    pub label: String,
    pub display: String,
}

pub struct App {
    /// Shared context for modules
    pub ctx: Context,
    pub page: Page,
    pub faucet: FaucetPage,
    pub counter: CounterPage,
    pub input_mode: InputMode,
    pub command: CommandBar,
    pub endpoints: Vec<EndpointOption>,
    pub endpoint_index: usize,
    /// Worker has a chain client for the current endpoint
    pub online: bool,
    pub wallet: String,
    pub contracts: ContractAddresses,
    pub chain_id: Option<u64>,
    pub status: Option<StatusMessage>,
    pub help_open: bool,
    pub should_quit: bool,
    pending_commands: Vec<RuntimeCommand>,
    pending_copy: Option<String>,
    clock: Arc<dyn Clock>,
}

impl App {
    pub fn new(explorer: Explorer, endpoints: Vec<EndpointOption>) -> Self {
        Self::with_clock(explorer, endpoints, Arc::new(SystemClock))
    }

    pub fn with_clock(explorer: Explorer, endpoints: Vec<EndpointOption>, clock: Arc<dyn Clock>) -> Self {
        let mut ctx = Context::new(explorer);
        ctx.now = clock.now();
        ctx.endpoint = endpoints
            .first()
            .map(|endpoint| endpoint.display.clone())
            .unwrap_or_default();

        let mut app = Self {
            ctx,
            page: Page::Faucet,
            faucet: FaucetPage::new(None),
            counter: CounterPage::new(None),
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            endpoints,
            endpoint_index: 0,
            online: false,
            wallet: String::new(),
            contracts: ContractAddresses::default(),
            chain_id: None,
            status: None,
            help_open: false,
            should_quit: false,
            pending_commands: Vec::new(),
            pending_copy: None,
            clock,
        };
        app.faucet.on_mount(&app.ctx);
        app
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
        self.ctx.now = self.clock.now();
        match self.page {
            Page::Faucet => self.faucet.on_tick(&self.ctx),
            Page::Counter => self.counter.on_tick(&self.ctx),
        }
    }

    pub fn switch_page(&mut self, page: Page) {
        if page == self.page {
            return;
        }
        self.ctx.now = self.clock.now();
        match self.page {
            Page::Faucet => self.faucet.on_unmount(),
            Page::Counter => self.counter.on_unmount(),
        }
        self.page = page;
        match self.page {
            Page::Faucet => self.faucet.on_mount(&self.ctx),
            Page::Counter => self.counter.on_mount(&self.ctx),
        }
    }

    /// Forward a key to the visible page
    pub fn handle_page_key(&mut self, key: crossterm::event::KeyEvent) {
        let action = match self.page {
            Page::Faucet => self.faucet.handle_key(key, &mut self.ctx),
            Page::Counter => self.counter.handle_key(key, &mut self.ctx),
        };
        self.apply_action(action);
    }

    pub fn enter_command(&mut self) {
        self.open_command(None);
    }

    fn open_command(&mut self, prefix: Option<String>) {
        self.input_mode = InputMode::Command;
        self.command.input = prefix.unwrap_or_default();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    /// Parse and run the command bar input
    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        self.exit_command();
        if input.is_empty() {
            return;
        }
        self.command.last = Some(input.clone());
        let cmd = crate::core::parse_command(&input);
        let action = self.execute_command(&cmd);
        self.apply_action(action);
    }

    pub fn cycle_endpoint(&mut self, forward: bool) {
        if self.endpoints.len() < 2 {
            self.set_status("Only one endpoint configured", StatusLevel::Warn);
            return;
        }
        let len = self.endpoints.len();
        let next = if forward {
            (self.endpoint_index + 1) % len
        } else {
            (self.endpoint_index + len - 1) % len
        };
        self.request_endpoint(next);
    }

    fn request_endpoint(&mut self, index: usize) {
        let Some(endpoint) = self.endpoints.get(index) else {
            self.set_status(
                format!("No endpoint {} ({} configured)", index + 1, self.endpoints.len()),
                StatusLevel::Warn,
            );
            return;
        };
        let label = endpoint.label.clone();
        self.ctx.endpoint = endpoint.display.clone();
        self.endpoint_index = index;
        self.online = false;
        self.pending_commands.push(RuntimeCommand::SwitchEndpoint { index });
        self.set_status(format!("Switching to {}…", label), StatusLevel::Info);
    }

    /// Ask the worker to re-read the visible page
    pub fn refresh(&mut self) {
        let command = match self.page {
            Page::Faucet => {
                self.faucet.mark_refreshing();
                RuntimeCommand::RefreshFaucet
            }
            Page::Counter => {
                self.counter.mark_refreshing();
                RuntimeCommand::RefreshCounter
            }
        };
        self.pending_commands.push(command);
    }

    fn page_link(&self) -> Option<String> {
        match self.page {
            Page::Faucet => self.faucet.link(&self.ctx),
            Page::Counter => self.counter.link(&self.ctx),
        }
    }

    fn pending_slot(&self) -> Option<ActionSlot> {
        match self.page {
            Page::Faucet => self.faucet.pending_slot(),
            Page::Counter => self.counter.pending_slot(),
        }
    }

    pub fn take_runtime_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    pub fn take_copy_request(&mut self) -> Option<String> {
        self.pending_copy.take()
    }

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Connected {
                endpoint,
                wallet,
                contracts,
            } => {
                self.online = true;
                self.ctx.endpoint = endpoint.clone();
                self.wallet = wallet;
                self.faucet.set_address(contracts.faucet);
                self.counter.set_address(contracts.counter);
                self.contracts = contracts;
                self.set_status(format!("Connected to {}", endpoint), StatusLevel::Info);
            }
            RuntimeEvent::Session(snapshot) => {
                if snapshot.address != self.ctx.session.address {
                    self.faucet.on_account_changed(snapshot.address);
                }
                if self.ctx.session.connected && !snapshot.connected {
                    self.set_status("Wallet disconnected", StatusLevel::Warn);
                }
                self.chain_id = snapshot.chain_id;
                self.ctx.session = snapshot;
            }
            RuntimeEvent::FaucetRefreshed(view) => {
                let now = self.ctx.now;
                self.faucet.apply_refresh(Ok(view), now);
            }
            RuntimeEvent::FaucetRefreshFailed(err) => {
                let now = self.ctx.now;
                self.set_status(err.to_string(), StatusLevel::Warn);
                self.faucet.apply_refresh(Err(err), now);
            }
            RuntimeEvent::ClaimInterval(secs) => self.faucet.set_claim_interval(secs),
            RuntimeEvent::CounterRefreshed(value) => self.counter.apply_refresh(Ok(value)),
            RuntimeEvent::CounterRefreshFailed(err) => {
                self.set_status(err.to_string(), StatusLevel::Warn);
                self.counter.apply_refresh(Err(err));
            }
            RuntimeEvent::TxState { slot, state } => {
                if Page::Faucet.owns(slot) {
                    self.faucet.set_tx_state(slot, state);
                } else {
                    self.counter.set_tx_state(slot, state);
                }
            }
            RuntimeEvent::ActionFinished { slot, result } => self.apply_action_result(slot, result),
            RuntimeEvent::Error { message } => {
                if message.starts_with("Connection failed") {
                    self.online = false;
                }
                self.set_status(message, StatusLevel::Error);
            }
        }
    }

    fn apply_action_result(&mut self, slot: ActionSlot, result: Result<TxReport, TxError>) {
        match result {
            Ok(TxReport::Confirmed {
                refresh_error: Some(err),
                ..
            }) => self.set_status(
                format!("{} confirmed; refresh failed: {}", slot, err),
                StatusLevel::Warn,
            ),
            Ok(TxReport::Confirmed { block_number, .. }) => {
                let block = block_number
                    .map(|block| format!(" in block {}", block))
                    .unwrap_or_default();
                self.set_status(format!("{} confirmed{}", slot, block), StatusLevel::Info);
            }
            Ok(TxReport::Abandoned { hash }) => self.set_status(
                format!("Stopped waiting for {} ({:?}); it may still land", slot, hash),
                StatusLevel::Warn,
            ),
            Err(err) => self.set_status(err.user_message(), StatusLevel::Error),
        }
    }
}

impl App {
    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Faucet => Action::Navigate(NavigateTarget::Faucet),
            Command::Counter => Action::Navigate(NavigateTarget::Counter),

            Command::Claim => Action::Run(self.faucet.claim_command(&self.ctx)),
            Command::Increment => Action::Run(RuntimeCommand::Increment),
            Command::IncrementBy(amount) => Action::Run(RuntimeCommand::IncrementBy {
                amount: amount.clone(),
            }),
            Command::Fund(amount) => Action::Run(RuntimeCommand::Fund {
                amount: amount.clone(),
            }),
            Command::Cancel(name) => {
                let slot = match name.as_deref() {
                    None => self.pending_slot(),
                    Some(name) => slot_by_name(name),
                };
                match slot {
                    Some(slot) => Action::Run(RuntimeCommand::CancelPending { slot }),
                    None => Action::Notify("Nothing to cancel".into(), NotifyLevel::Warn),
                }
            }

            Command::Refresh => {
                self.refresh();
                Action::None
            }

            Command::Connect => Action::Run(RuntimeCommand::Connect),
            Command::Disconnect => Action::Run(RuntimeCommand::Disconnect),
            Command::Account(index) => Action::Run(RuntimeCommand::SelectAccount { index: *index }),
            Command::Rpc(index) => {
                self.request_endpoint(*index);
                Action::None
            }

            Command::Copy => match self.page_link() {
                Some(link) => Action::Copy(link),
                None => Action::Notify("Nothing to copy".into(), NotifyLevel::Warn),
            },
            Command::Help => {
                self.help_open = true;
                Action::None
            }
            Command::Quit => Action::Quit,

            Command::Unknown(s) => Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn),
        }
    }

    /// Apply an action returned by a command or module
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Navigate(NavigateTarget::Faucet) => self.switch_page(Page::Faucet),
            Action::Navigate(NavigateTarget::Counter) => self.switch_page(Page::Counter),
            Action::Run(command) => {
                if let Some(slot) = action_slot(&command) {
                    self.set_status(format!("{} submitted…", slot), StatusLevel::Info);
                }
                self.pending_commands.push(command);
            }
            Action::Copy(text) => self.pending_copy = Some(text),
            Action::Notify(msg, level) => self.set_status(msg, level.into()),
            Action::OpenCommand(prefix) => self.open_command(prefix),
            Action::CloseOverlay => {
                self.help_open = false;
                self.exit_command();
            }
            Action::Quit => self.should_quit = true,
        }
    }
}

fn slot_by_name(name: &str) -> Option<ActionSlot> {
    match name.to_lowercase().as_str() {
        "claim" | "drip" => Some(ActionSlot::Claim),
        "inc" | "increment" => Some(ActionSlot::Increment),
        "incby" | "inc-by" => Some(ActionSlot::IncrementBy),
        "fund" => Some(ActionSlot::Fund),
        _ => None,
    }
}

fn action_slot(command: &RuntimeCommand) -> Option<ActionSlot> {
    match command {
        RuntimeCommand::Claim { .. } => Some(ActionSlot::Claim),
        RuntimeCommand::Increment => Some(ActionSlot::Increment),
        RuntimeCommand::IncrementBy { .. } => Some(ActionSlot::IncrementBy),
        RuntimeCommand::Fund { .. } => Some(ActionSlot::Fund),
        _ => None,
    }
}
