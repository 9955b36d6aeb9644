//! Module trait for the pages of the app

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{Action, Context};

/// Trait for UI modules that can handle input
pub trait Module {
    fn id(&self) -> &'static str;

    /// Handle keyboard input
    /// Returns an Action describing what should happen
    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action;

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context);

    /// Page became visible
    fn on_mount(&mut self, _ctx: &Context) {}

    /// Page was navigated away from
    fn on_unmount(&mut self) {}

    /// Periodic tick while visible
    fn on_tick(&mut self, _ctx: &Context) {}
}
