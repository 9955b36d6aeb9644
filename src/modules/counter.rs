//! Counter page - demo contract value and increment actions

use alloy_primitives::{Address, B256, U256};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::tx_state_lines;
use crate::core::{Action, Context, Module};
use crate::dapp::CounterRefreshError;
use crate::domain::lifecycle::{ActionSlot, TxState};
use crate::infrastructure::runtime::RuntimeCommand;

#[derive(Debug, Default)]
pub struct CounterPage {
    value: Option<U256>,
    refresh_error: Option<String>,
    refreshing: bool,
    increment: TxState,
    increment_by: TxState,
    last_hash: Option<B256>,
    address: Option<Address>,
}

impl CounterPage {
    pub fn new(address: Option<Address>) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn value(&self) -> Option<U256> {
        self.value
    }

    pub fn refresh_error(&self) -> Option<&str> {
        self.refresh_error.as_deref()
    }

    pub fn state(&self, slot: ActionSlot) -> Option<&TxState> {
        match slot {
            ActionSlot::Increment => Some(&self.increment),
            ActionSlot::IncrementBy => Some(&self.increment_by),
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

    pub fn apply_refresh(&mut self, result: Result<U256, CounterRefreshError>) {
        self.refreshing = false;
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.refresh_error = None;
            }
            Err(err) => self.refresh_error = Some(err.to_string()),
        }
    }

    pub fn set_tx_state(&mut self, slot: ActionSlot, state: TxState) {
        if let Some(hash) = state.hash() {
            self.last_hash = Some(hash);
        }
        match slot {
            ActionSlot::Increment => self.increment = state,
            ActionSlot::IncrementBy => self.increment_by = state,
            _ => {}
        }
    }

    pub fn pending_slot(&self) -> Option<ActionSlot> {
        [ActionSlot::Increment, ActionSlot::IncrementBy]
            .into_iter()
            .find(|slot| matches!(self.state(*slot), Some(TxState::Pending { .. })))
    }

    pub fn link(&self, ctx: &Context) -> Option<String> {
        self.last_hash
            .map(|hash| ctx.explorer.tx_url(&hash))
            .or_else(|| self.address.map(|addr| ctx.explorer.address_url(&addr)))
    }

    fn value_lines(&self) -> Vec<Line<'static>> {
        let value = match (self.value, self.refreshing) {
            (Some(value), _) => Span::styled(
                value.to_string(),
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            ),
            (None, true) => Span::styled("Loading…", Style::default().fg(Color::DarkGray)),
            (None, false) => Span::styled("--", Style::default().fg(Color::DarkGray)),
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{:<14}", "x"), Style::default().fg(Color::DarkGray)),
            value,
        ])];
        if let Some(addr) = self.address {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<14}", "Contract"), Style::default().fg(Color::DarkGray)),
                Span::raw(addr.to_checksum(None)),
            ]));
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

impl Module for CounterPage {
    fn id(&self) -> &'static str {
        "counter"
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('i') | KeyCode::Char('+') => Action::Run(RuntimeCommand::Increment),
            KeyCode::Char('b') => Action::OpenCommand(Some("incby ".to_string())),
            KeyCode::Char('r') => {
                self.mark_refreshing();
                Action::Run(RuntimeCommand::RefreshCounter)
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
            .constraints([Constraint::Min(5), Constraint::Length(9)])
            .split(area);

        let value = Paragraph::new(self.value_lines())
            .block(Block::default().borders(Borders::ALL).title("COUNTER"))
            .wrap(Wrap { trim: true });
        frame.render_widget(value, chunks[0]);

        let mut lines = tx_state_lines("Increment", &self.increment, &ctx.explorer);
        lines.extend(tx_state_lines("Increment by", &self.increment_by, &ctx.explorer));
        let actions = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("ACTIONS"))
            .wrap(Wrap { trim: true });
        frame.render_widget(actions, chunks[1]);
    }
}
