use crate::api::types::FertilizerPlan;
use crate::api::AdvisoryService;
use crate::cache::Sourced;
use crate::forms::FertilizerInput;
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
const AREA: usize = 2;
const STAGE: usize = 3;

pub struct FertilizerView {
  advisory: AdvisoryService,
  form: Form,
  query: Option<Query<Sourced<FertilizerPlan>>>,
}

impl FertilizerView {
  pub fn new(advisory: AdvisoryService) -> Self {
    let form = Form::new(
      "Fertilizer plan",
      vec![
        FormField::new("Crop").hint("rice, wheat, corn, soybean..."),
        FormField::new("Soil type").hint("clay, sandy, loamy..."),
        FormField::new("Area (ha)").hint("optional, default 1"),
        FormField::new("Growth stage").hint("basal, tillering, flowering..."),
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
    let validated = FertilizerInput {
      crop: self.form.value(CROP),
      soil: self.form.value(SOIL),
      area: self.form.value(AREA),
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
          .recommend_fertilizer(&req)
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
      "Recommendation",
      "Enter crop and soil type, then press s.",
      self.query.as_ref(),
    ) else {
      return;
    };

    let plan = &result.data;
    let mut lines = vec![field_line("Crop", plan.crop.clone())];
    if let Some(area_ha) = plan.area {
      lines.push(field_line("Area", format!("{} ha", area_ha)));
    }
    if let Some(stage) = &plan.stage {
      lines.push(field_line("Stage", stage.clone()));
    }
    lines.push(Line::raw(""));

    for fertilizer in &plan.fertilizers {
      lines.push(Line::from(vec![
        Span::raw(format!("{} ", fertilizer.icon)),
        Span::styled(
          format!("{:<22}", fertilizer.name),
          Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(fertilizer.dosage.clone(), Style::default().fg(Color::Yellow)),
      ]));
      if !fertilizer.desc.is_empty() {
        lines.push(Line::styled(
          format!("   {}", fertilizer.desc),
          Style::default().fg(Color::DarkGray),
        ));
      }
    }

    if !plan.tips.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::raw(plan.tips.clone()));
    }

    let paragraph = Paragraph::new(lines)
      .block(result_block("Recommendation", result))
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}

impl View for FertilizerView {
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
    "Fertilizer".to_string()
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
