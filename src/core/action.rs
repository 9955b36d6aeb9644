//! Actions that modules can return to communicate with the app

use crate::infrastructure::runtime::RuntimeCommand;

/// Actions returned by modules to communicate state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action needed
    None,

    /// Switch to another page
    Navigate(NavigateTarget),

    /// Hand a command to the runtime worker
    Run(RuntimeCommand),

    /// Copy text to the system clipboard
    Copy(String),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Open command palette with optional prefix
    OpenCommand(Option<String>),

    /// Close current overlay/popup
    CloseOverlay,

    /// Request quit
    Quit,
}

/// Navigation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateTarget {
    Faucet,
    Counter,
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}
