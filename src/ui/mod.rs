pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::cache::Sourced;
use crate::query::{Query, QueryState};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, ListState, Paragraph, Wrap};
use renderfns::source_badge;

/// Clamp a list selection to the current number of rows
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match (state.selected(), len) {
    (_, 0) => state.select(None),
    (None, _) => state.select(Some(0)),
    (Some(i), len) if i >= len => state.select(Some(len - 1)),
    _ => {}
  }
}

/// Form column on the left, result panel on the right
pub fn form_layout(area: Rect) -> (Rect, Rect) {
  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
    .split(area);
  (chunks[0], chunks[1])
}

/// Bordered panel whose title carries the result's source badge
pub fn result_block<T>(title: &str, result: &Sourced<T>) -> Block<'static> {
  Block::default()
    .title(Line::from(vec![
      Span::styled(format!(" {} ", title), Style::default().bold()),
      source_badge(result),
      Span::raw(" "),
    ]))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Green))
}

/// Draw the idle/loading/error placeholder for a result panel. Returns the
/// data when the query has succeeded so the caller can draw it.
pub fn render_query_placeholder<'q, T: Send + 'static>(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  idle_hint: &str,
  query: Option<&'q Query<T>>,
) -> Option<&'q T> {
  let (text, color) = match query.map(|q| q.state()) {
    Some(QueryState::Success(data)) => return Some(data),
    Some(QueryState::Loading) => ("Contacting CropDoctor...".to_string(), Color::Yellow),
    Some(QueryState::Error(e)) => (e.clone(), Color::Red),
    Some(QueryState::Idle) | None => (idle_hint.to_string(), Color::DarkGray),
  };

  let block = Block::default()
    .title(format!(" {} ", title))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));
  let paragraph = Paragraph::new(text)
    .block(block)
    .style(Style::default().fg(color))
    .wrap(Wrap { trim: true });
  frame.render_widget(paragraph, area);
  None
}
