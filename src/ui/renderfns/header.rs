use crate::session::Session;
use crate::ui::view::{ShortcutInfo, ShortcutVisibility};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// What the header shows besides the view's shortcuts
pub struct HeaderContext<'a> {
  pub title: &'a str,
  pub api_url: &'a str,
  pub user: Option<&'a Session>,
  /// Result of the last health check, `None` until it answers
  pub online: Option<bool>,
  /// Whether the current view has a field or overlay open
  pub active: bool,
}

/// Draw the header bar with title, backend, user and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, ctx: &HeaderContext, shortcuts: &[ShortcutInfo]) {
  let sep = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let (dot, dot_color) = match ctx.online {
    Some(true) => ("● online", Color::Green),
    Some(false) => ("● offline", Color::Red),
    None => ("○ checking", Color::DarkGray),
  };

  let mut spans = vec![
    Span::styled(format!(" {} ", ctx.title), Style::default().fg(Color::Green).bold()),
    sep(),
    Span::styled(format!(" {} ", extract_host(ctx.api_url)), Style::default().fg(Color::White)),
    Span::styled(format!("{} ", dot), Style::default().fg(dot_color)),
    sep(),
  ];

  if let Some(user) = ctx.user {
    let role_color = if user.is_admin() { Color::Magenta } else { Color::Yellow };
    spans.push(Span::styled(
      format!(" {} ", user.initials),
      Style::default().fg(Color::Black).bg(role_color).bold(),
    ));
    spans.push(Span::styled(
      format!(" {} ({}) ", user.name, user.role),
      Style::default().fg(role_color),
    ));
    if user.is_offline() {
      spans.push(Span::styled("offline session ", Style::default().fg(Color::DarkGray)));
    }
    spans.push(sep());
  }

  spans.push(Span::raw(" "));
  let mut visible: Vec<&ShortcutInfo> = shortcuts
    .iter()
    .filter(|s| s.visibility == ShortcutVisibility::Always || ctx.active)
    .collect();
  visible.sort_by_key(|s| s.priority);

  for (i, shortcut) in visible.iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Host and port of the backend URL
fn extract_host(url: &str) -> &str {
  let rest = url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url);
  rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_host() {
    assert_eq!(extract_host("https://api.cropdoctor.in"), "api.cropdoctor.in");
    assert_eq!(extract_host("https://api.cropdoctor.in/v1/"), "api.cropdoctor.in");
    assert_eq!(extract_host("http://localhost:8000"), "localhost:8000");
  }
}
