use crate::session::Session;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// When a shortcut should be shown in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortcutVisibility {
  #[default]
  Always,
  /// Only while the view has an open overlay or a field being edited
  WhenActive,
}

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub visibility: ShortcutVisibility,
  /// Lower is shown first
  pub priority: u8,
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      visibility: ShortcutVisibility::Always,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }

  pub const fn when_active(mut self) -> Self {
    self.visibility = ShortcutVisibility::WhenActive;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Pop current view from stack (go back)
  Pop,
  /// Authentication succeeded; the app records the session and opens the
  /// user's home page
  LoggedIn(Session),
}

/// Trait for view behavior
///
/// Views handle their own input modes (form editing, pickers) and return
/// actions for the App to execute: App → View → Components.
///
/// Views that call services use `Query<T>` internally and poll it in `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Label for this view in the footer breadcrumb
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to poll async queries. A finished query may ask
  /// the app to act, e.g. after a login completes.
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// True while the view owns every key (a field is being edited), so the
  /// app must not intercept `:` or `q`
  fn is_capturing(&self) -> bool {
    false
  }

  /// Shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "go to").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
