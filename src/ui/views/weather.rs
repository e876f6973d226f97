use crate::api::types::WeatherReport;
use crate::api::AdvisoryService;
use crate::cache::Sourced;
use crate::forms;
use crate::query::Query;
use crate::ui::components::{Form, FormEvent, FormField, KeyResult};
use crate::ui::renderfns::field_line;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{form_layout, render_query_placeholder, result_block};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

/// Current conditions, five-day outlook and field advisory.
///
/// Loads the default location as soon as it opens; `r` reloads.
pub struct WeatherView {
  advisory: AdvisoryService,
  default_location: String,
  form: Form,
  query: Option<Query<Sourced<WeatherReport>>>,
}

impl WeatherView {
  pub fn new(advisory: AdvisoryService, default_location: &str) -> Self {
    let form = Form::new(
      "Location",
      vec![FormField::new("City")
        .hint("blank for the configured default")
        .value(default_location)],
    );
    let mut view = Self {
      advisory,
      default_location: default_location.to_string(),
      form,
      query: None,
    };
    view.load();
    view
  }

  fn load(&mut self) {
    let location = forms::weather_location(self.form.value(0), &self.default_location);
    let advisory = self.advisory.clone();
    let mut query = Query::new(move || {
      let advisory = advisory.clone();
      let location = location.clone();
      async move { advisory.weather(&location).await.map_err(|e| e.to_string()) }
    });
    query.fetch();
    self.query = Some(query);
  }

  fn render_result(&self, frame: &mut Frame, area: Rect) {
    let Some(result) = render_query_placeholder(
      frame,
      area,
      "Weather",
      "Press s to load the forecast.",
      self.query.as_ref(),
    ) else {
      return;
    };

    let w = &result.data;
    let mut lines = vec![
      Line::from(vec![
        Span::raw(format!("{} ", w.icon)),
        Span::styled(format!("{}°C", w.temp), Style::default().fg(Color::Yellow).bold()),
        Span::raw(format!("  {}", w.description)),
      ]),
      Line::styled(w.location.clone(), Style::default().fg(Color::Cyan)),
      Line::raw(""),
      field_line("Humidity", format!("{}%", w.humidity)),
      field_line("Wind", format!("{} km/h", w.wind)),
      field_line("Pressure", format!("{} hPa", w.pressure)),
    ];

    if !w.forecast.is_empty() {
      lines.push(Line::raw(""));
      for day in &w.forecast {
        lines.push(Line::from(vec![
          Span::styled(format!("{:<5}", day.day), Style::default().fg(Color::White).bold()),
          Span::raw(format!("{} ", day.icon)),
          Span::styled(format!("{:>3}°", day.high), Style::default().fg(Color::Yellow)),
          Span::styled(format!(" {:>3}°  ", day.low), Style::default().fg(Color::Blue)),
          Span::styled(day.description.clone(), Style::default().fg(Color::DarkGray)),
        ]));
      }
    }

    if !w.advisory.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::styled("Field advisory", Style::default().fg(Color::Green).bold()));
      lines.push(Line::raw(w.advisory.clone()));
    }

    let paragraph = Paragraph::new(lines)
      .block(result_block("Weather", result))
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}

impl View for WeatherView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submit) => {
        self.load();
        ViewAction::None
      }
      KeyResult::Handled => ViewAction::None,
      KeyResult::NotHandled => match key.code {
        KeyCode::Char('r') => {
          if let Some(query) = &mut self.query {
            query.refetch();
          }
          ViewAction::None
        }
        KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
        _ => ViewAction::None,
      },
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let (form_area, result_area) = form_layout(area);
    self.form.render(frame, form_area);
    self.render_result(frame, result_area);
  }

  fn breadcrumb_label(&self) -> String {
    "Weather".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if let Some(query) = &mut self.query {
      query.poll();
    }
    ViewAction::None
  }

  fn is_capturing(&self) -> bool {
    self.form.is_capturing()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = self.form.shortcuts();
    shortcuts.push(ShortcutInfo::new(":", "go to").with_priority(10));
    shortcuts.push(ShortcutInfo::new("r", "refresh").with_priority(20));
    shortcuts
  }
}
