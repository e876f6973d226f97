use crate::api::types::IrrigationPlan;
use crate::api::AdvisoryService;
use crate::cache::Sourced;
use crate::forms::IrrigationInput;
use crate::query::Query;
use crate::ui::components::{Form, FormEvent, FormField, KeyResult};
use crate::ui::renderfns::field_line;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{form_layout, render_query_placeholder, result_block};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

const CROP: usize = 0;
const SOIL: usize = 1;
const MOISTURE: usize = 2;
const STAGE: usize = 3;

pub struct IrrigationView {
  advisory: AdvisoryService,
  form: Form,
  query: Option<Query<Sourced<IrrigationPlan>>>,
}

impl IrrigationView {
  pub fn new(advisory: AdvisoryService) -> Self {
    let form = Form::new(
      "Irrigation schedule",
      vec![
        FormField::new("Crop").hint("rice, wheat, corn, cotton..."),
        FormField::new("Soil type").hint("clay, sandy, loamy, silt"),
        FormField::new("Soil moisture %").hint("optional, default 50"),
        FormField::new("Growth stage").hint("seedling, vegetative, flowering..."),
      ],
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
    let validated = IrrigationInput {
      crop: self.form.value(CROP),
      soil: self.form.value(SOIL),
      moisture: self.form.value(MOISTURE),
      stage: self.form.value(STAGE),
    }
    .validate();

    let req = match validated {
      Ok(req) => req,
      Err(e) => {
        self.form.set_error(e.to_string());
        return;
      }
    };
    self.form.clear_error();

    let advisory = self.advisory.clone();
    let mut query = Query::new(move || {
      let advisory = advisory.clone();
      let req = req.clone();
      async move {
        advisory
          .recommend_irrigation(&req)
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
      "Schedule",
      "Enter crop and soil type, then press s.",
      self.query.as_ref(),
    ) else {
      return;
    };

    let plan = &result.data;
    let status_color = if plan.moisture_status.starts_with("Critical") {
      Color::Red
    } else if plan.moisture_status.starts_with("Low") {
      Color::Yellow
    } else {
      Color::Green
    };

    let mut lines = vec![
      Line::from(Span::styled(
        format!("Irrigate every {}", plan.schedule),
        Style::default().fg(Color::Cyan).bold(),
      )),
      Line::raw(""),
      field_line("Water per day", format!("{} L/ha", plan.water_per_day)),
      field_line("Soil moisture", plan.moisture_level.clone()),
      Line::from(vec![
        Span::styled(format!("{:<16}", "Status"), Style::default().fg(Color::DarkGray)),
        Span::styled(plan.moisture_status.clone(), Style::default().fg(status_color)),
      ]),
    ];
    if !plan.recommendation.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::raw(plan.recommendation.clone()));
    }

    let paragraph = Paragraph::new(lines)
      .block(result_block("Schedule", result))
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}

impl View for IrrigationView {
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
    "Irrigation".to_string()
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

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::views::test_support::{offline_advisory, press, render_text};
  use std::time::Duration;

  #[tokio::test]
  async fn test_moisture_out_of_range_is_inline_error() {
    let mut view = IrrigationView::new(offline_advisory().await);
    view.form.set_value(CROP, "rice");
    view.form.set_value(SOIL, "clay");
    view.form.set_value(MOISTURE, "140");

    press(&mut view, KeyCode::Char('s'));
    assert_eq!(
      view.form.error(),
      Some("Soil moisture must be between 0 and 100")
    );
    assert!(view.query.is_none());

    let screen = render_text(&mut view, 140, 16);
    assert!(screen.contains("Soil moisture must be between 0 and 100"));
  }

  #[tokio::test]
  async fn test_critical_estimate_when_offline() {
    let mut view = IrrigationView::new(offline_advisory().await);
    view.form.set_value(CROP, "Rice");
    view.form.set_value(SOIL, "Clay");
    view.form.set_value(MOISTURE, "25");
    view.form.set_value(STAGE, "vegetative");
    press(&mut view, KeyCode::Char('s'));

    for _ in 0..100 {
      view.tick();
      if view.query.as_ref().is_some_and(|q| !q.is_loading()) {
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let result = view.query.as_ref().and_then(|q| q.data()).unwrap();
    assert!(result.is_estimated());
    assert_eq!(result.data.water_per_day, 4200);
    assert_eq!(result.data.schedule, "24h");
  }
}
