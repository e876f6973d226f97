use crate::cache::{DataSource, Sourced};
use ratatui::prelude::*;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for where a result came from
pub fn source_color(source: DataSource) -> Color {
  match source {
    DataSource::Network => Color::Green,
    DataSource::Cache => Color::Cyan,
    DataSource::Estimated => Color::Yellow,
  }
}

/// Badge naming the result's source, with the store time for cache hits
pub fn source_badge<T>(result: &Sourced<T>) -> Span<'static> {
  let text = match (result.source, result.cached_at) {
    (DataSource::Cache, Some(at)) => format!(" cached {} ", at.with_timezone(&chrono::Local).format("%H:%M")),
    (DataSource::Estimated, _) => " estimated (offline) ".to_string(),
    (source, _) => format!(" {} ", source.label()),
  };
  Span::styled(
    text,
    Style::default()
      .fg(Color::Black)
      .bg(source_color(result.source))
      .bold(),
  )
}

/// One "label: value" line with a dimmed label
pub fn field_line(label: &str, value: impl Into<String>) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("{:<16}", label), Style::default().fg(Color::DarkGray)),
    Span::raw(value.into()),
  ])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("rice", 10), "rice");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("wheat", 5), "wheat");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("sugarcane field", 8), "sugar...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("हैदराबाद शहर", 6), "हैद...");
  }

  #[test]
  fn test_source_badges() {
    assert_eq!(source_badge(&Sourced::from_network(1)).content, " live ");
    assert_eq!(
      source_badge(&Sourced::estimated(1)).content,
      " estimated (offline) "
    );
    assert_eq!(source_color(DataSource::Estimated), Color::Yellow);
  }
}
