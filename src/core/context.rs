//! Shared context passed to modules

use crate::domain::explorer::Explorer;
use crate::domain::session::SessionSnapshot;

/// Shared context available to all modules
#[derive(Debug, Default)]
pub struct Context {
    /// Latest session snapshot from the worker
    pub session: SessionSnapshot,

    /// Block explorer for links
    pub explorer: Explorer,

    /// Current endpoint display string
    pub endpoint: String,

    /// Last text copied to the clipboard
    pub clipboard: Option<String>,

    /// Wall-clock unix seconds at the last tick
    pub now: u64,
}

impl Context {
    pub fn new(explorer: Explorer) -> Self {
        Self {
            explorer,
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.require_connected().is_ok()
    }

    /// Set clipboard content
    pub fn set_clipboard(&mut self, content: String) {
        self.clipboard = Some(content);
    }

    /// Get clipboard content
    pub fn get_clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }
}
