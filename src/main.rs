use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use drip::app::{App, EndpointOption, InputMode, Page, StatusLevel};
use drip::cli::{self, HeadlessCommand};
use drip::config::{self, Config};
use drip::domain::abi::InterfaceRegistry;
use drip::domain::explorer::Explorer;
use drip::infrastructure::ethereum::{ProviderConfig, WalletSource};
use drip::infrastructure::runtime::{RuntimeBridge, WorkerSetup};
use drip::infrastructure::ArtifactScanner;
use drip::{logging, ui};

#[derive(Debug, Parser)]
#[command(
    name = "drip",
    version,
    about = "Drip: claim test tokens from a faucet and poke a demo counter"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long, global = true)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.foundry/anvil.ipc). Unix only.
    #[arg(long, global = true)]
    ipc: Option<PathBuf>,

    /// Index of the wallet account to use
    #[arg(long, global = true)]
    account: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print faucet and counter state
    Status {
        /// Keep printing the claim countdown until a claim is available
        #[arg(long)]
        watch: bool,
    },
    /// Claim from the faucet
    Claim,
    /// Increment the counter
    Increment {
        /// Increment by this amount instead of one
        #[arg(long)]
        by: Option<String>,
    },
    /// Transfer tokens to the faucet, in smallest units
    Fund { amount: String },
}

impl From<Commands> for HeadlessCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Status { watch } => HeadlessCommand::Status { watch },
            Commands::Claim => HeadlessCommand::Claim,
            Commands::Increment { by } => HeadlessCommand::Increment { by },
            Commands::Fund { amount } => HeadlessCommand::Fund { amount },
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = config::load()?;
    config.apply_overrides(|key| std::env::var(key).ok())?;
    if let Some(account) = args.account {
        config.wallet.account_index = account;
    }

    let (endpoints, endpoint_options) = endpoints_from_args_and_config(&args, &config)?;
    let wallet = match config.private_key(|key| std::env::var(key).ok())? {
        Some(key) => WalletSource::from_private_key(&key)?,
        None => WalletSource::Node,
    };
    let interfaces = load_interfaces(&config);
    let explorer = Explorer::new(config.explorer_url());
    let setup = WorkerSetup {
        endpoints,
        wallet,
        config,
        interfaces,
    };

    if let Some(command) = args.command {
        logging::init_stderr();
        return cli::run(command.into(), setup);
    }

    if let Some(path) = config::log_path() {
        // The TUI still works without a log file
        if let Err(err) = logging::init_file(&path) {
            eprintln!("{err:#}");
        }
    }
    tracing::info!(endpoints = setup.endpoints.len(), wallet = %setup.wallet.describe(), "starting tui");

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let interface_errors = setup.interfaces.errors.len();
    let runtime = RuntimeBridge::new(setup)?;

    let mut app = App::new(explorer, endpoint_options);
    if interface_errors > 0 {
        app.set_status(
            format!("{} ABI files could not be read", interface_errors),
            StatusLevel::Warn,
        );
    } else {
        app.set_status("Connecting…", StatusLevel::Info);
    }

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        app.apply_runtime_event(event);
    }

    for command in app.take_runtime_commands() {
        if let Err(err) = runtime.send(command) {
            app.set_status(err.to_string(), StatusLevel::Error);
        }
    }

    if let Some(text) = app.take_copy_request() {
        copy_to_clipboard(app, text);
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => app.should_quit = true,
        (KeyCode::Char('?'), _) => app.help_open = true,
        (KeyCode::Char(':'), _) | (KeyCode::Char('/'), _) => app.enter_command(),
        (KeyCode::Char('1'), _) => app.switch_page(Page::Faucet),
        (KeyCode::Char('2'), _) => app.switch_page(Page::Counter),
        (KeyCode::Tab, _) => {
            let next = match app.page {
                Page::Faucet => Page::Counter,
                Page::Counter => Page::Faucet,
            };
            app.switch_page(next);
        }
        (KeyCode::Char('['), _) => app.cycle_endpoint(false),
        (KeyCode::Char(']'), _) => app.cycle_endpoint(true),
        (KeyCode::Esc, _) => app.status = None,
        _ => app.handle_page_key(key),
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn copy_to_clipboard(app: &mut App, text: String) {
    use arboard::Clipboard;

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(&text).is_ok() {
                app.ctx.set_clipboard(text.clone());
                app.set_status(format!("Copied: {}", text), StatusLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", StatusLevel::Error);
            }
        }
        Err(_) => {
            app.set_status("Clipboard not available", StatusLevel::Error);
        }
    }
}

/// Builtin interfaces, overridden by compiled artifacts under `abi_paths`
fn load_interfaces(config: &Config) -> InterfaceRegistry {
    let mut registry = InterfaceRegistry::builtin();
    let roots: Vec<PathBuf> = config
        .abi_paths
        .iter()
        .filter_map(|raw| expand_path(raw))
        .collect();
    if !roots.is_empty() {
        let scanned = ArtifactScanner::scan_roots(&roots);
        tracing::debug!(files = scanned.scanned_files, found = scanned.len(), "scanned artifacts");
        registry.merge(scanned);
    }
    registry
}

fn endpoints_from_args_and_config(
    args: &Args,
    config: &Config,
) -> Result<(Vec<ProviderConfig>, Vec<EndpointOption>)> {
    fn push_endpoint(
        endpoints: &mut Vec<ProviderConfig>,
        options: &mut Vec<EndpointOption>,
        seen: &mut BTreeSet<String>,
        endpoint: ProviderConfig,
        name: Option<String>,
    ) {
        let display = endpoint.display();
        let key = display.to_lowercase();
        if !seen.insert(key) {
            return;
        }
        let label = name
            .filter(|value| !value.trim().is_empty())
            .map(|name| format!("{name} ({display})"))
            .unwrap_or_else(|| display.clone());
        options.push(EndpointOption { label, display });
        endpoints.push(endpoint);
    }

    let mut endpoints = Vec::new();
    let mut options = Vec::new();
    let mut seen = BTreeSet::<String>::new();
    let cli_name = Some("cli".to_string());

    // CLI arguments take precedence
    if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        {
            push_endpoint(&mut endpoints, &mut options, &mut seen, ProviderConfig::Ipc(ipc), cli_name);
        }
        #[cfg(not(unix))]
        {
            let _ = (ipc, cli_name);
            return Err(anyhow::anyhow!("IPC is not supported on this platform"));
        }
    } else if let Some(ws) = non_empty(args.ws.as_deref()) {
        push_endpoint(
            &mut endpoints,
            &mut options,
            &mut seen,
            ProviderConfig::WebSocket(ws.to_string()),
            cli_name,
        );
    } else if let Some(rpc) = non_empty(args.rpc.as_deref()) {
        push_endpoint(
            &mut endpoints,
            &mut options,
            &mut seen,
            ProviderConfig::Http(normalize_http_endpoint(rpc)),
            cli_name,
        );
    }

    // Config file endpoints
    for (idx, entry) in config.endpoints.iter().enumerate() {
        let name = entry.name.clone();
        if let Some(rpc) = non_empty(entry.rpc.as_deref()) {
            push_endpoint(
                &mut endpoints,
                &mut options,
                &mut seen,
                ProviderConfig::Http(normalize_http_endpoint(rpc)),
                name,
            );
        } else if let Some(ws) = non_empty(entry.ws.as_deref()) {
            push_endpoint(
                &mut endpoints,
                &mut options,
                &mut seen,
                ProviderConfig::WebSocket(ws.to_string()),
                name,
            );
        } else if let Some(ipc) = non_empty(entry.ipc.as_deref()) {
            #[cfg(unix)]
            {
                let Some(ipc_path) = expand_path(ipc) else {
                    continue;
                };
                push_endpoint(
                    &mut endpoints,
                    &mut options,
                    &mut seen,
                    ProviderConfig::Ipc(ipc_path),
                    name.or_else(|| Some(format!("ipc-{idx}"))),
                );
            }
            #[cfg(not(unix))]
            {
                tracing::warn!(endpoint = idx, path = ipc, "ipc endpoints need a unix platform");
            }
        }
    }

    // Default fallback
    if endpoints.is_empty() {
        push_endpoint(
            &mut endpoints,
            &mut options,
            &mut seen,
            ProviderConfig::Http(normalize_http_endpoint("localhost:8545")),
            Some("local".to_string()),
        );
    }

    Ok((endpoints, options))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn expand_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return Some(home.join(rest));
        }
    }

    let mut buf = PathBuf::from(trimmed);
    if buf.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            buf = cwd.join(buf);
        }
    }
    Some(buf)
}
