//! Faucet page - balance, claim cooldown, claim and fund actions

use alloy_primitives::{Address, B256};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::tx_state_lines;
use crate::core::{Action, Context, Module};
use crate::dapp::{FaucetRefreshError, FaucetView};
use crate::domain::eligibility::{format_countdown, Countdown};
use crate::domain::lifecycle::{ActionSlot, TxState};
use crate::infrastructure::runtime::RuntimeCommand;

#[derive(Debug, Default)]
pub struct FaucetPage {
    view: Option<FaucetView>,
    refresh_error: Option<String>,
    refreshing: bool,
    claim_interval: Option<u64>,
    /// Only exists while the page is mounted
    countdown: Option<Countdown>,
    mounted: bool,
    claim: TxState,
    fund: TxState,
    last_hash: Option<B256>,
    address: Option<Address>,
}

impl FaucetPage {
    pub fn new(address: Option<Address>) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn view(&self) -> Option<&FaucetView> {
        self.view.as_ref()
    }

    pub fn refresh_error(&self) -> Option<&str> {
        self.refresh_error.as_deref()
    }

    pub fn countdown(&self) -> Option<&str> {
        self.countdown.as_ref().and_then(Countdown::display)
    }

    pub fn has_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn state(&self, slot: ActionSlot) -> Option<&TxState> {
        match slot {
            ActionSlot::Claim => Some(&self.claim),
            ActionSlot::Fund => Some(&self.fund),
            _ => None,
        }
    }

    pub fn last_hash(&self) -> Option<B256> {
        self.last_hash
    }

    pub fn set_address(&mut self, address: Option<Address>) {
        self.address = address;
    }

    pub fn mark_refreshing(&mut self) {
        self.refreshing = true;
    }

    /// A failed refresh keeps the previous values on screen
    pub fn apply_refresh(&mut self, result: Result<FaucetView, FaucetRefreshError>, now: u64) {
        self.refreshing = false;
        match result {
            Ok(view) => {
                self.refresh_error = None;
                self.view = Some(view);
                if self.mounted {
                    self.restart_countdown(now);
                }
            }
            Err(err) => self.refresh_error = Some(err.to_string()),
        }
    }

    pub fn set_claim_interval(&mut self, secs: u64) {
        self.claim_interval = Some(secs);
    }

    pub fn set_tx_state(&mut self, slot: ActionSlot, state: TxState) {
        if let Some(hash) = state.hash() {
            self.last_hash = Some(hash);
        }
        match slot {
            ActionSlot::Claim => self.claim = state,
            ActionSlot::Fund => self.fund = state,
            _ => {}
        }
    }

    /// Drop values that belong to another account
    pub fn on_account_changed(&mut self, account: Option<Address>) {
        if self.view.as_ref().map(|view| Some(view.account)) != Some(account) {
            self.view = None;
            self.refresh_error = None;
            self.countdown = None;
        }
    }

    /// Cached next-claim time for `account`, if the page has one
    pub fn next_claim_at(&self, account: Option<Address>) -> Option<u64> {
        self.view
            .as_ref()
            .filter(|view| Some(view.account) == account)
            .map(|view| view.next_claim_at)
    }

    pub fn claim_command(&self, ctx: &Context) -> RuntimeCommand {
        RuntimeCommand::Claim {
            next_claim_at: self.next_claim_at(ctx.session.address),
        }
    }

    /// Slot to cancel: the one still waiting, claim first
    pub fn pending_slot(&self) -> Option<ActionSlot> {
        [ActionSlot::Claim, ActionSlot::Fund]
            .into_iter()
            .find(|slot| matches!(self.state(*slot), Some(TxState::Pending { .. })))
    }

    /// Explorer link for the last transaction, else the faucet contract
    pub fn link(&self, ctx: &Context) -> Option<String> {
        self.last_hash
            .map(|hash| ctx.explorer.tx_url(&hash))
            .or_else(|| self.address.map(|addr| ctx.explorer.address_url(&addr)))
    }

    fn restart_countdown(&mut self, now: u64) {
        self.countdown = self.view.as_ref().map(|view| {
            let mut countdown = Countdown::new(view.eligibility());
            countdown.tick(now);
            countdown
        });
    }

    fn summary_lines(&self, ctx: &Context) -> Vec<Line<'static>> {
        let label = |text: &str| Span::styled(format!("{:<14}", text), Style::default().fg(Color::DarkGray));

        let Some(view) = self.view.as_ref() else {
            let text = if !ctx.is_connected() {
                "Wallet not connected (:connect)"
            } else if self.refreshing {
                "Loading…"
            } else {
                "No data yet (r to refresh)"
            };
            return vec![Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))];
        };

        let next_claim = match self.countdown() {
            Some(remaining) => Span::styled(
                format!("in {}", remaining),
                Style::default().fg(Color::LightYellow),
            ),
            None if self.countdown.is_some() || view.eligibility().is_eligible(ctx.now) => Span::styled(
                "available now",
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            ),
            None => Span::raw(format_timestamp(view.next_claim_at)),
        };

        let mut lines = vec![
            Line::from(vec![label("Account"), Span::raw(view.account.to_checksum(None))]),
            Line::from(vec![label("Balance"), Span::raw(view.balance.format_fixed(2))]),
            Line::from(vec![label("Claim amount"), Span::raw(view.claim_amount.format_fixed(2))]),
            Line::from(vec![label("Next claim"), next_claim]),
        ];
        if view.next_claim_at > 0 {
            lines.push(Line::from(vec![
                label("Claimable at"),
                Span::raw(format_timestamp(view.next_claim_at)),
            ]));
        }
        if let Some(interval) = self.claim_interval {
            lines.push(Line::from(vec![label("Cooldown"), Span::raw(format_countdown(interval))]));
        }
        if let Some(err) = self.refresh_error.as_deref() {
            lines.push(Line::from(Span::styled(
                format!("stale: {}", err),
                Style::default().fg(Color::LightYellow),
            )));
        }
        lines
    }
}

impl Module for FaucetPage {
    fn id(&self) -> &'static str {
        "faucet"
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('c') => Action::Run(self.claim_command(ctx)),
            KeyCode::Char('f') => Action::OpenCommand(Some("fund ".to_string())),
            KeyCode::Char('r') => {
                self.mark_refreshing();
                Action::Run(RuntimeCommand::RefreshFaucet)
            }
            KeyCode::Char('x') => match self.pending_slot() {
                Some(slot) => Action::Run(RuntimeCommand::CancelPending { slot }),
                None => Action::None,
            },
            KeyCode::Char('y') => match self.link(ctx) {
                Some(link) => Action::Copy(link),
                None => Action::None,
            },
            _ => Action::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(9)])
            .split(area);

        let summary = Paragraph::new(self.summary_lines(ctx))
            .block(Block::default().borders(Borders::ALL).title("FAUCET"))
            .wrap(Wrap { trim: true });
        frame.render_widget(summary, chunks[0]);

        let mut lines = tx_state_lines("Claim", &self.claim, &ctx.explorer);
        lines.extend(tx_state_lines("Fund", &self.fund, &ctx.explorer));
        let actions = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("ACTIONS"))
            .wrap(Wrap { trim: true });
        frame.render_widget(actions, chunks[1]);
    }

    fn on_mount(&mut self, ctx: &Context) {
        self.mounted = true;
        self.restart_countdown(ctx.now);
    }

    fn on_unmount(&mut self) {
        self.mounted = false;
        self.countdown = None;
    }

    fn on_tick(&mut self, ctx: &Context) {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.tick(ctx.now);
        }
    }
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}
