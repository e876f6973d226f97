use crate::api::types::YieldPrediction;
use crate::api::AdvisoryService;
use crate::cache::Sourced;
use crate::forms::YieldInput;
use crate::query::Query;
use crate::ui::components::{Form, FormEvent, FormField, KeyResult};
use crate::ui::renderfns::field_line;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{form_layout, render_query_placeholder, result_block};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

const CROP: usize = 0;
const SOIL: usize = 1;
const AREA: usize = 2;
const SEASON: usize = 3;
const SOWING_DATE: usize = 4;
const RAINFALL: usize = 5;
const TEMPERATURE: usize = 6;

pub struct YieldView {
  advisory: AdvisoryService,
  form: Form,
  query: Option<Query<Sourced<YieldPrediction>>>,
}

impl YieldView {
  pub fn new(advisory: AdvisoryService) -> Self {
    let form = Form::new(
      "Yield prediction",
      vec![
        FormField::new("Crop").hint("rice, wheat, corn, cotton, sugarcane..."),
        FormField::new("Soil type").hint("loamy, clay, sandy, silt..."),
        FormField::new("Area (ha)").hint("e.g. 2"),
        FormField::new("Season").hint("kharif, rabi, zaid"),
        FormField::new("Sowing date").hint("YYYY-MM-DD, default today"),
        FormField::new("Rainfall (mm)").hint("optional"),
        FormField::new("Temperature °C").hint("optional"),
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
    let validated = YieldInput {
      crop: self.form.value(CROP),
      soil: self.form.value(SOIL),
      area: self.form.value(AREA),
      season: self.form.value(SEASON),
      sowing_date: self.form.value(SOWING_DATE),
      rainfall: self.form.value(RAINFALL),
      temperature: self.form.value(TEMPERATURE),
    }
    .validate(Local::now().date_naive());

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
      async move { advisory.predict_yield(&req).await.map_err(|e| e.to_string()) }
    });
    query.fetch();
    self.query = Some(query);
  }

  fn render_result(&self, frame: &mut Frame, area: Rect) {
    let Some(result) = render_query_placeholder(
      frame,
      area,
      "Prediction",
      "Fill in crop, soil, area and season, then press s.",
      self.query.as_ref(),
    ) else {
      return;
    };

    let p = &result.data;
    let lines = vec![
      Line::from(Span::styled(
        format!("{:.2} t/ha", p.yield_per_hectare),
        Style::default().fg(Color::Green).bold(),
      )),
      Line::raw(""),
      field_line("Crop", p.crop.clone()),
      field_line("Area", format!("{} ha", p.area)),
      field_line("Total yield", format!("{:.2} t", p.total_yield)),
      field_line("Confidence", format!("{:.0}%", p.confidence)),
      field_line("Model", p.model.clone()),
    ];

    let paragraph = Paragraph::new(lines)
      .block(result_block("Prediction", result))
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}

impl View for YieldView {
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
    "Yield".to_string()
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
