use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::view::ShortcutInfo;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Events a form hands back to its view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  Submit,
}

#[derive(Debug, Clone)]
pub struct FormField {
  label: &'static str,
  hint: &'static str,
  secret: bool,
  input: TextInput,
}

impl FormField {
  pub fn new(label: &'static str) -> Self {
    Self {
      label,
      hint: "",
      secret: false,
      input: TextInput::new(),
    }
  }

  /// Placeholder shown while the field is empty
  pub fn hint(mut self, hint: &'static str) -> Self {
    self.hint = hint;
    self
  }

  /// Render the value as bullets
  pub fn secret(mut self) -> Self {
    self.secret = true;
    self
  }

  pub fn value(mut self, value: &str) -> Self {
    self.input.set_value(value);
    self
  }

  fn display_value(&self) -> String {
    if self.secret {
      "•".repeat(self.input.value().chars().count())
    } else {
      self.input.value().to_string()
    }
  }
}

/// Vertical list of labelled text fields.
///
/// Navigation mode: `j`/`k` move, `Enter` edits, `s` submits.
/// Editing mode: keys go to the field; `Enter` moves on (and submits from
/// the last field), `Esc` stops editing.
#[derive(Debug, Clone)]
pub struct Form {
  title: String,
  fields: Vec<FormField>,
  selected: usize,
  editing: bool,
  error: Option<String>,
}

impl Form {
  pub fn new(title: impl Into<String>, fields: Vec<FormField>) -> Self {
    Self {
      title: title.into(),
      fields,
      selected: 0,
      editing: false,
      error: None,
    }
  }

  /// Value of the field at `idx`, empty when out of range
  pub fn value(&self, idx: usize) -> &str {
    self.fields.get(idx).map(|f| f.input.value()).unwrap_or("")
  }

  pub fn set_value(&mut self, idx: usize, value: &str) {
    if let Some(field) = self.fields.get_mut(idx) {
      field.input.set_value(value);
    }
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  /// True while a field owns the keyboard
  pub fn is_capturing(&self) -> bool {
    self.editing
  }

  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
  }

  pub fn clear_error(&mut self) {
    self.error = None;
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  fn select_next(&mut self) {
    if !self.fields.is_empty() {
      self.selected = (self.selected + 1) % self.fields.len();
    }
  }

  fn select_previous(&mut self) {
    if !self.fields.is_empty() {
      self.selected = (self.selected + self.fields.len() - 1) % self.fields.len();
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if self.editing {
      return self.handle_editing_key(key);
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => {
        self.select_next();
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => {
        self.select_previous();
        KeyResult::Handled
      }
      KeyCode::Enter | KeyCode::Char('i') => {
        self.editing = true;
        KeyResult::Handled
      }
      KeyCode::Char('s') => KeyResult::Event(FormEvent::Submit),
      _ => KeyResult::NotHandled,
    }
  }

  fn handle_editing_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.select_next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.select_previous();
        return KeyResult::Handled;
      }
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.editing = false;
        return KeyResult::Event(FormEvent::Submit);
      }
      _ => {}
    }

    let Some(field) = self.fields.get_mut(self.selected) else {
      self.editing = false;
      return KeyResult::Handled;
    };

    match field.input.handle_key(key) {
      InputResult::Submitted(_) => {
        if self.selected + 1 == self.fields.len() {
          self.editing = false;
          KeyResult::Event(FormEvent::Submit)
        } else {
          self.selected += 1;
          KeyResult::Handled
        }
      }
      InputResult::Cancelled => {
        self.editing = false;
        KeyResult::Handled
      }
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    if self.editing {
      vec![
        ShortcutInfo::new("enter", "next").with_priority(1).when_active(),
        ShortcutInfo::new("esc", "done").with_priority(2).when_active(),
        ShortcutInfo::new("ctrl-s", "submit").with_priority(3).when_active(),
      ]
    } else {
      vec![
        ShortcutInfo::new("enter", "edit").with_priority(1),
        ShortcutInfo::new("s", "submit").with_priority(2),
      ]
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let border = if self.editing { Color::Yellow } else { Color::Blue };
    let block = Block::default()
      .title(format!(" {} ", self.title))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));

    let label_width = self
      .fields
      .iter()
      .map(|f| f.label.chars().count())
      .max()
      .unwrap_or(0);

    let mut lines: Vec<Line> = Vec::with_capacity(self.fields.len() * 2 + 2);
    for (i, field) in self.fields.iter().enumerate() {
      let is_selected = i == self.selected;
      let marker = if is_selected { "> " } else { "  " };
      let label_style = if is_selected {
        Style::default().fg(Color::Cyan).bold()
      } else {
        Style::default().fg(Color::White)
      };

      let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(format!("{:<width$} ", field.label, width = label_width), label_style),
      ];

      if is_selected && self.editing {
        spans.extend(field.input.cursor_spans(&field.display_value()));
      } else if field.input.is_empty() {
        spans.push(Span::styled(field.hint, Style::default().fg(Color::DarkGray)));
      } else {
        spans.push(Span::raw(field.display_value()));
      }

      lines.push(Line::from(spans));
    }

    if let Some(error) = &self.error {
      lines.push(Line::raw(""));
      lines.push(Line::from(Span::styled(
        format!("  ✗ {}", error),
        Style::default().fg(Color::Red),
      )));
    }

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}
