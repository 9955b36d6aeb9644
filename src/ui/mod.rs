use alloy_primitives::Address;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, InputMode, Page, StatusLevel};
use crate::config;
use crate::core::Module;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    match app.page {
        Page::Faucet => app.faucet.render(f, areas.body, &app.ctx),
        Page::Counter => app.counter.render(f, areas.body, &app.ctx),
    }
    draw_contracts(f, areas.contracts, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let mut spans = vec![
        Span::styled(
            "Drip",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];
    for page in Page::ALL {
        let style = if page == app.page {
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightCyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(
            format!(" {} {} ", page.shortcut(), page.title()),
            style,
        ));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled("RPC", Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw(format!(" {}", app.ctx.endpoint)));

    let left = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(left, chunks[0]);

    let session = &app.ctx.session;
    let (state, color) = match (app.online, session.connected) {
        (false, _) => ("offline", Color::LightRed),
        (true, false) => ("disconnected", Color::LightYellow),
        (true, true) => ("connected", Color::LightGreen),
    };
    let account = session
        .address
        .map(|addr| short_addr(&addr))
        .unwrap_or_else(|| "--".to_string());
    let chain = session
        .chain_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "--".to_string());
    let right = Paragraph::new(Line::from(vec![
        Span::styled(state, Style::default().fg(color)),
        Span::raw("  "),
        Span::styled("Acct ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", account)),
        Span::styled("Chain ", Style::default().fg(Color::DarkGray)),
        Span::raw(chain),
    ]))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Right);
    f.render_widget(right, chunks[1]);
}

fn draw_contracts(f: &mut Frame, area: Rect, app: &App) {
    let entry = |name: &'static str, address: Option<Address>| {
        let value = address
            .map(|addr| short_addr(&addr))
            .unwrap_or_else(|| "(not configured)".to_string());
        Line::from(vec![
            Span::styled(format!("{:<8}", name), Style::default().fg(Color::DarkGray)),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        entry("Token", app.contracts.token),
        entry("Faucet", app.contracts.faucet),
        entry("Counter", app.contracts.counter),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<8}", "Wallet"), Style::default().fg(Color::DarkGray)),
            Span::raw(if app.wallet.is_empty() { "--".to_string() } else { app.wallet.clone() }),
        ]),
    ];
    if app.ctx.session.accounts.len() > 1 {
        lines.push(Line::from(Span::styled(
            format!("{} accounts (:account N)", app.ctx.session.accounts.len()),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        app.ctx.explorer.base_url().to_string(),
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("CONTRACTS"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let endpoint_position = if app.endpoints.is_empty() {
        "--".to_string()
    } else {
        format!("{}/{}", app.endpoint_index + 1, app.endpoints.len())
    };
    let mut spans = vec![
        Span::styled("Page ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.page.title())),
        Span::styled("Endpoint ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", endpoint_position)),
    ];
    if let Some(last) = app.command.last.as_deref() {
        spans.push(Span::styled("Last ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!(":{}", last)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("claim", "Claim from the faucet"),
        ("fund", "fund <amount> - transfer smallest units to the faucet"),
        ("faucet", "Show faucet page"),
        ("counter", "Show counter page"),
        ("inc", "Increment the counter"),
        ("incby", "incby <n> - increment by n"),
        ("cancel", "Stop waiting on a pending transaction"),
        ("refresh", "Re-read the current page"),
        ("connect", "Connect the wallet"),
        ("disconnect", "Disconnect the wallet"),
        ("account", "account <index> - select account"),
        ("rpc", "rpc <n> - switch endpoint"),
        ("copy", "Copy explorer link"),
        ("help", "Show help"),
        ("quit", "Quit"),
    ];

    for (cmd, desc) in commands {
        if cmd.starts_with(&input) || input.starts_with(&format!("{} ", cmd)) {
            return Some(desc);
        }
    }
    None
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint = command_hint(&app.command.input);
            let hint_text = hint.unwrap_or("claim | fund <n> | inc | incby <n> | refresh | help");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.as_str()),
                Span::styled(
                    format!("  {}", hint_text),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text, Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let hints: &[(&str, &str)] = match app.page {
        Page::Faucet => &[("c", "claim"), ("f", "fund"), ("r", "refresh"), ("x", "cancel"), ("y", "copy link")],
        Page::Counter => &[("i", "inc"), ("b", "inc by"), ("r", "refresh"), ("x", "cancel"), ("y", "copy link")],
    };
    let mut spans = Vec::new();
    for (key, label) in hints.iter().chain([(":", "command"), ("?", "help"), ("q", "quit")].iter()) {
        spans.push(Span::styled(key.to_string(), Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(format!(" {}  ", label), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = layout::centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let config_path = config::config_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  1 / 2      Faucet / Counter page"),
        Line::from("  Tab        Next page"),
        Line::from("  [ / ]      Previous / next endpoint"),
        Line::from("  :          Command line"),
        Line::from("  Esc        Close"),
        Line::from(""),
        Line::from("Faucet"),
        Line::from("  c          Claim"),
        Line::from("  f          Fund the faucet (:fund <amount>)"),
        Line::from(""),
        Line::from("Counter"),
        Line::from("  i / +      Increment"),
        Line::from("  b          Increment by (:incby <n>)"),
        Line::from(""),
        Line::from("Any page"),
        Line::from("  r          Refresh"),
        Line::from("  x          Stop waiting on a pending transaction"),
        Line::from("  y          Copy explorer link"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from(format!("Config: {}", config_path)),
        Line::from(format!("Explorer: {}", app.ctx.explorer.base_url())),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn short_addr(address: &Address) -> String {
    let value = address.to_checksum(None);
    format!("{}..{}", &value[..6], &value[value.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_addr() {
        let addr: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(short_addr(&addr), "0xf39F..2266");
    }

    #[test]
    fn test_command_hint() {
        assert_eq!(command_hint("cl"), Some("Claim from the faucet"));
        assert_eq!(command_hint("incby 5"), Some("incby <n> - increment by n"));
        assert_eq!(command_hint(""), None);
        assert_eq!(command_hint("zzz"), None);
    }
}
