//! UI Modules
//!
//! Each page implements the Module trait and handles its own key input and
//! rendering. The app feeds worker events into the page that owns them.
//!
//! Modules:
//! - faucet: token balance, claim cooldown and the claim/fund actions
//! - counter: demo counter value and its increment actions

pub mod counter;
pub mod faucet;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::domain::explorer::Explorer;
use crate::domain::lifecycle::TxState;

pub use counter::CounterPage;
pub use faucet::FaucetPage;

/// Inline status of one action: state label, hash link and failure
pub(crate) fn tx_state_lines(label: &str, state: &TxState, explorer: &Explorer) -> Vec<Line<'static>> {
    let color = match state {
        TxState::Idle => Color::DarkGray,
        TxState::Validating | TxState::Submitting | TxState::Pending { .. } => Color::LightYellow,
        TxState::Confirmed { .. } => Color::LightGreen,
        TxState::Failed { .. } => Color::LightRed,
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:<14}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(state.label().to_string(), Style::default().fg(color)),
    ])];

    if let Some(hash) = state.hash() {
        lines.push(detail_line(explorer.tx_url(&hash), Color::Cyan));
    }
    match state {
        TxState::Confirmed {
            block_number,
            refresh_error,
            ..
        } => {
            if let Some(block) = block_number {
                lines.push(detail_line(format!("included in block {}", block), Color::DarkGray));
            }
            if let Some(err) = refresh_error {
                lines.push(detail_line(format!("warning: {}", err), Color::LightYellow));
            }
        }
        TxState::Failed { error, .. } => {
            lines.push(detail_line(error.user_message(), Color::LightRed));
        }
        _ => {}
    }
    lines
}

fn detail_line(text: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::raw(" ".repeat(14)),
        Span::styled(text, Style::default().fg(color)),
    ])
}
