use crate::api::types::{DiseaseReport, HealthStatus};
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
use tracing::debug;

/// Upload a crop photo and show the diagnosis
pub struct DiseaseView {
  advisory: AdvisoryService,
  form: Form,
  query: Option<Query<Sourced<DiseaseReport>>>,
}

impl DiseaseView {
  pub fn new(advisory: AdvisoryService) -> Self {
    let form = Form::new(
      "Crop photo",
      vec![FormField::new("Image path").hint("~/photos/leaf.jpg (jpg/png, max 10 MB)")],
    );
    Self {
      advisory,
      form,
      query: None,
    }
  }

  fn submit(&mut self) {
    if self.query.as_ref().is_some_and(|q| q.is_loading()) {
      return;
    }
    let path = expand_home(self.form.value(0));
    let image = match forms::load_image(&path) {
      Ok(image) => image,
      Err(e) => {
        self.form.set_error(e.to_string());
        return;
      }
    };
    self.form.clear_error();
    debug!(file = %image.file_name, bytes = image.bytes.len(), "submitting crop photo");

    let advisory = self.advisory.clone();
    let mut query = Query::new(move || {
      let advisory = advisory.clone();
      let image = image.clone();
      async move {
        advisory
          .detect_disease(&image)
          .await
          .map_err(|e| e.to_string())
      }
    });
    query.fetch();
    self.query = Some(query);
  }

  fn render_result(&self, frame: &mut Frame, area: Rect) {
    let Some(result) = render_query_placeholder(
      frame,
      area,
      "Diagnosis",
      "Enter the path of a leaf photo and press s to analyse it.",
      self.query.as_ref(),
    ) else {
      return;
    };

    let report = &result.data;
    let (status, color) = match report.status {
      HealthStatus::Healthy => ("Healthy", Color::Green),
      HealthStatus::Diseased => ("Diseased", Color::Red),
    };

    let mut lines = vec![
      Line::from(Span::styled(
        report.disease.clone(),
        Style::default().fg(color).bold(),
      )),
      Line::raw(""),
      Line::from(vec![
        Span::styled(format!("{:<16}", "Status"), Style::default().fg(Color::DarkGray)),
        Span::styled(status, Style::default().fg(color)),
      ]),
      field_line("Confidence", format!("{:.1}%", report.confidence)),
    ];
    if let Some(severity) = &report.severity {
      lines.push(field_line("Severity", severity.clone()));
    }
    if let Some(score) = report.health_score {
      lines.push(field_line("Health score", format!("{:.0}/100", score)));
    }
    lines.push(Line::raw(""));
    lines.extend(report.details.lines().map(|l| Line::raw(l.to_string())));

    let paragraph = Paragraph::new(lines)
      .block(result_block("Diagnosis", result))
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> String {
  let path = path.trim();
  match (path.strip_prefix("~/"), dirs::home_dir()) {
    (Some(rest), Some(home)) => home.join(rest).to_string_lossy().into_owned(),
    _ => path.to_string(),
  }
}

impl View for DiseaseView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submit) => {
        self.submit();
        ViewAction::None
      }
      KeyResult::Handled => ViewAction::None,
      KeyResult::NotHandled => match key.code {
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
    "Disease".to_string()
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
    shortcuts
  }
}
