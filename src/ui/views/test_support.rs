use crate::api::test_support::unreachable_url;
use crate::api::{AdvisoryService, Gateway};
use crate::cache::{CacheLayer, Storage};
use crate::estimator::Estimator;
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::sync::Arc;
use std::time::Duration;

/// Advisory service whose backend refuses connections
pub async fn offline_advisory() -> AdvisoryService {
  advisory_at(&unreachable_url().await)
}

pub fn advisory_at(url: &str) -> AdvisoryService {
  let gateway = Gateway::new(url, Duration::from_secs(2)).unwrap();
  AdvisoryService::new(
    gateway,
    CacheLayer::new(Storage::from_enabled(true)),
    Arc::new(Estimator::seeded(7)),
  )
}

pub fn press(view: &mut dyn View, code: KeyCode) -> ViewAction {
  view.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
}

pub fn type_str(view: &mut dyn View, s: &str) {
  for c in s.chars() {
    press(view, KeyCode::Char(c));
  }
}

/// Draw the view into an off-screen buffer and return its text
pub fn render_text(view: &mut dyn View, width: u16, height: u16) -> String {
  let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
  terminal
    .draw(|frame| {
      let area = frame.area();
      view.render(frame, area);
    })
    .unwrap();

  let buffer = terminal.backend().buffer();
  let mut text = String::new();
  for y in 0..buffer.area.height {
    for x in 0..buffer.area.width {
      text.push_str(buffer[(x, y)].symbol());
    }
    text.push('\n');
  }
  text
}
