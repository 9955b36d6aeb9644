//! Command parser for the : command system

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Pages
    Faucet,
    Counter,

    // Writes
    Claim,
    Increment,
    /// Amount is validated by the lifecycle, so an empty one is kept
    IncrementBy(String),
    Fund(String),
    /// Stop waiting on a pending transaction; `None` means the current page
    Cancel(Option<String>),

    // Reads
    Refresh,

    // Session
    Connect,
    Disconnect,
    Account(usize),
    Rpc(usize),

    // Misc
    Copy,
    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim().to_string());

    match cmd.to_lowercase().as_str() {
        "faucet" | "f" => Command::Faucet,
        "counter" | "ctr" => Command::Counter,

        "claim" | "drip" => Command::Claim,
        "inc" | "increment" => Command::Increment,
        "incby" | "inc-by" => Command::IncrementBy(args.unwrap_or_default()),
        "fund" => Command::Fund(args.unwrap_or_default()),
        "cancel" => Command::Cancel(args.filter(|s| !s.is_empty())),

        "refresh" | "r" => Command::Refresh,

        "connect" | "conn" => Command::Connect,
        "disconnect" => Command::Disconnect,
        "account" | "acct" => match args.and_then(|s| s.parse().ok()) {
            Some(index) => Command::Account(index),
            None => Command::Unknown(input.to_string()),
        },
        "rpc" | "endpoint" => match args.and_then(|s| s.parse::<usize>().ok()) {
            // 1-based in the UI
            Some(n) if n > 0 => Command::Rpc(n - 1),
            _ => Command::Unknown(input.to_string()),
        },

        "copy" | "yank" => Command::Copy,
        "help" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}
