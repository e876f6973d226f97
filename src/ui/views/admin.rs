use crate::api::types::{AccessChange, Farmer, FarmerHistory};
use crate::api::AdminService;
use crate::cache::Sourced;
use crate::query::{Query, QueryState};
use crate::ui::renderfns::{field_line, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{ensure_valid_selection, render_query_placeholder, result_block};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use tracing::debug;

/// Registered farmers with analysis counts, per-farmer history and the
/// revoke/restore toggle.
pub struct AdminView {
  admin: AdminService,
  farmers: Query<Sourced<Vec<Farmer>>>,
  counts: Option<Query<Vec<FarmerHistory>>>,
  /// History query and the farmer it belongs to
  history: Option<(i64, Query<FarmerHistory>)>,
  toggle: Option<Query<AccessChange>>,
  notice: Option<String>,
  list_state: ListState,
}

impl AdminView {
  pub fn new(admin: AdminService) -> Self {
    let admin_for_query = admin.clone();
    let mut farmers = Query::new(move || {
      let admin = admin_for_query.clone();
      async move { admin.list_farmers().await.map_err(|e| e.to_string()) }
    });
    farmers.fetch();

    Self {
      admin,
      farmers,
      counts: None,
      history: None,
      toggle: None,
      notice: None,
      list_state: ListState::default(),
    }
  }

  fn farmer_list(&self) -> &[Farmer] {
    self
      .farmers
      .data()
      .map(|s| s.data.as_slice())
      .unwrap_or(&[])
  }

  fn selected_farmer(&self) -> Option<&Farmer> {
    self
      .list_state
      .selected()
      .and_then(|i| self.farmer_list().get(i))
  }

  /// Analysis count for a farmer: `None` while unknown, `Some(None)` when the
  /// lookup failed
  fn count_for(&self, farmer_id: i64) -> Option<Option<usize>> {
    let histories = self.counts.as_ref()?.data()?;
    let history = histories.iter().find(|h| h.farmer_id == farmer_id)?;
    Some(history.available.then(|| history.count()))
  }

  fn load_counts(&mut self) {
    let ids: Vec<i64> = self
      .farmer_list()
      .iter()
      .map(|f| f.id)
      .filter(|id| *id > 0)
      .collect();
    if ids.is_empty() {
      self.counts = None;
      return;
    }

    debug!(farmers = ids.len(), "loading analysis counts");
    let admin = self.admin.clone();
    let mut counts = Query::new(move || {
      let admin = admin.clone();
      let ids = ids.clone();
      async move { Ok::<_, String>(admin.history_batch(&ids).await) }
    });
    counts.fetch();
    self.counts = Some(counts);
  }

  fn open_history(&mut self) {
    let Some(farmer) = self.selected_farmer() else {
      return;
    };
    if farmer.id < 0 {
      self.notice = Some("History is not available offline".to_string());
      return;
    }

    let farmer_id = farmer.id;
    let admin = self.admin.clone();
    let mut history = Query::new(move || {
      let admin = admin.clone();
      async move {
        admin
          .farmer_history(farmer_id)
          .await
          .map_err(|e| e.to_string())
      }
    });
    history.fetch();
    self.history = Some((farmer_id, history));
  }

  fn toggle_selected(&mut self) {
    if self.toggle.as_ref().is_some_and(|q| q.is_loading()) {
      return;
    }
    let Some(farmer) = self.selected_farmer() else {
      return;
    };
    if farmer.id < 0 {
      self.notice = Some("Access can only be changed while online".to_string());
      return;
    }

    let farmer_id = farmer.id;
    let admin = self.admin.clone();
    let mut toggle = Query::new(move || {
      let admin = admin.clone();
      async move {
        admin
          .toggle_access(farmer_id)
          .await
          .map_err(|e| e.to_string())
      }
    });
    toggle.fetch();
    self.toggle = Some(toggle);
    self.notice = Some("Updating access...".to_string());
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.farmer_list().len();
    ensure_valid_selection(&mut self.list_state, len);

    let Some(result) = render_query_placeholder(
      frame,
      area,
      "Farmers",
      "Loading farmers...",
      Some(&self.farmers),
    ) else {
      return;
    };

    let mut block = result_block(&format!("Farmers ({})", len), result);
    if let Some(notice) = &self.notice {
      block = block.title_bottom(Line::styled(
        format!(" {} ", notice),
        Style::default().fg(Color::Yellow),
      ));
    }

    if len == 0 {
      let paragraph = Paragraph::new("No farmers registered yet.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .farmer_list()
      .iter()
      .map(|farmer| {
        let (status, status_color) = if farmer.is_active {
          ("active ", Color::Green)
        } else {
          ("revoked", Color::Red)
        };
        let count = match self.count_for(farmer.id) {
          Some(Some(n)) => format!("{:>3} analyses", n),
          Some(None) => "  ? analyses".to_string(),
          None => String::new(),
        };
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<20}", truncate(&farmer.name, 20)),
            Style::default().fg(Color::White),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<22}", truncate(&farmer.contact, 22)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(status, Style::default().fg(status_color)),
          Span::raw(" "),
          Span::styled(count, Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" History ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(farmer) = self.selected_farmer() else {
      frame.render_widget(Paragraph::new("").block(block), area);
      return;
    };

    let mut lines = vec![
      Line::styled(farmer.name.clone(), Style::default().fg(Color::White).bold()),
      field_line("Contact", farmer.contact.clone()),
    ];
    if let Some(address) = &farmer.address {
      lines.push(field_line("Address", address.clone()));
    }
    if let Some(created) = &farmer.created_at {
      lines.push(field_line("Registered", created.clone()));
    }
    lines.push(Line::raw(""));

    let history = self
      .history
      .as_ref()
      .filter(|(id, _)| *id == farmer.id)
      .map(|(_, q)| q.state());

    match history {
      Some(QueryState::Loading) => {
        lines.push(Line::styled("Loading...", Style::default().fg(Color::Yellow)))
      }
      Some(QueryState::Error(e)) => {
        lines.push(Line::styled(e.clone(), Style::default().fg(Color::Red)))
      }
      Some(QueryState::Success(h)) if h.records.is_empty() => {
        lines.push(Line::styled("No analyses yet.", Style::default().fg(Color::DarkGray)))
      }
      Some(QueryState::Success(h)) => {
        for record in &h.records {
          let when = record.created_at.as_deref().unwrap_or("").get(..10).unwrap_or("");
          let what = record.disease_prediction.as_deref().unwrap_or("-");
          let health = match record.is_healthy {
            Some(true) => Span::styled(" healthy", Style::default().fg(Color::Green)),
            Some(false) => Span::styled(" diseased", Style::default().fg(Color::Red)),
            None => Span::raw(""),
          };
          lines.push(Line::from(vec![
            Span::styled(format!("{:<11}", when), Style::default().fg(Color::DarkGray)),
            Span::styled(
              format!("{:<10}", record.crop_type.as_deref().unwrap_or("-")),
              Style::default().fg(Color::Cyan),
            ),
            Span::raw(what.to_string()),
            health,
          ]));
          if let (Some(per_ha), Some(total)) = (record.yield_per_ha, record.total_yield) {
            lines.push(Line::styled(
              format!("           {:.2} t/ha, {:.2} t total", per_ha, total),
              Style::default().fg(Color::DarkGray),
            ));
          }
        }
      }
      Some(QueryState::Idle) | None => lines.push(Line::styled(
        "Press enter to load this farmer's analyses.",
        Style::default().fg(Color::DarkGray),
      )),
    }

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}

impl View for AdminView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Enter => self.open_history(),
      KeyCode::Char('t') => self.toggle_selected(),
      KeyCode::Char('r') => {
        self.notice = None;
        self.farmers.refetch();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
      .split(area);
    self.render_list(frame, chunks[0]);
    self.render_detail(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Farmers".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if self.farmers.poll() && self.farmers.data().is_some() {
      let len = self.farmer_list().len();
      ensure_valid_selection(&mut self.list_state, len);
      self.load_counts();
    }
    if let Some(counts) = &mut self.counts {
      counts.poll();
    }
    if let Some((_, history)) = &mut self.history {
      history.poll();
    }

    let changed = self.toggle.as_mut().is_some_and(|t| t.poll());
    let toggled = match &self.toggle {
      Some(toggle) if changed => Some(match toggle.state() {
        QueryState::Success(change) => Ok(change.message.clone()),
        QueryState::Error(e) => Err(e.clone()),
        _ => Err("Access change was interrupted".to_string()),
      }),
      _ => None,
    };
    match toggled {
      Some(Ok(message)) => {
        self.notice = Some(message);
        self.farmers.refetch();
      }
      Some(Err(e)) => self.notice = Some(e),
      None => {}
    }

    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "go to").with_priority(10),
      ShortcutInfo::new("enter", "history").with_priority(20),
      ShortcutInfo::new("t", "revoke/restore").with_priority(21),
      ShortcutInfo::new("r", "refresh").with_priority(22),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::test_support::{unreachable_url, MockServer, Route};
  use crate::api::Gateway;
  use crate::db::Database;
  use crate::session::{OfflineAccount, Role, SessionStore};
  use crate::ui::views::test_support::{press, render_text};
  use std::sync::Arc;
  use std::time::Duration;

  const FARMERS: &str = r#"[
    {"id": 2, "name": "Ravi Kumar", "email_phone": "9876543210", "is_active": true},
    {"id": 5, "name": "Lakshmi Devi", "email_phone": "lakshmi@example.com", "is_active": false}
  ]"#;

  const HISTORY: &str = r#"[
    {"id": 11, "crop_type": "rice", "disease_prediction": "Rice Blast", "confidence": 91.0,
     "is_healthy": false, "created_at": "2026-06-01T08:00:00"},
    {"id": 12, "crop_type": "wheat", "disease_prediction": "Yield Prediction",
     "yield_per_ha": 3.9, "total_yield": 7.8, "created_at": "2026-06-02T08:00:00"}
  ]"#;

  fn admin_view(url: &str) -> (AdminView, SessionStore) {
    let gateway = Gateway::new(url, Duration::from_secs(2)).unwrap();
    let sessions = SessionStore::new(Arc::new(Database::open_in_memory().unwrap()));
    (AdminView::new(AdminService::new(gateway, sessions.clone())), sessions)
  }

  async fn settle(view: &mut AdminView) {
    for _ in 0..100 {
      view.tick();
      let busy = view.farmers.is_loading()
        || view.counts.as_ref().is_some_and(|q| q.is_loading())
        || view.history.as_ref().is_some_and(|(_, q)| q.is_loading())
        || view.toggle.as_ref().is_some_and(|q| q.is_loading());
      if !busy {
        return;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
  }

  #[tokio::test]
  async fn test_counts_survive_a_failed_lookup() {
    let server = MockServer::start(vec![
      Route::json("GET", "/api/admin/farmers", 200, FARMERS),
      Route::json("GET", "/api/admin/farmers/2/analysis", 200, HISTORY),
      Route::json("GET", "/api/admin/farmers/5/analysis", 500, r#"{"detail":"db down"}"#),
    ])
    .await;
    let (mut view, _) = admin_view(&server.url);
    settle(&mut view).await;

    assert_eq!(view.farmer_list().len(), 2);
    assert_eq!(view.count_for(2), Some(Some(2)));
    assert_eq!(view.count_for(5), Some(None));

    let screen = render_text(&mut view, 140, 12);
    assert!(screen.contains("2 analyses"));
    assert!(screen.contains("? analyses"));
  }

  #[tokio::test]
  async fn test_history_for_selected_farmer() {
    let server = MockServer::start(vec![
      Route::json("GET", "/api/admin/farmers", 200, FARMERS),
      Route::json("GET", "/api/admin/farmers/2/analysis", 200, HISTORY),
      Route::json("GET", "/api/admin/farmers/5/analysis", 200, "[]"),
    ])
    .await;
    let (mut view, _) = admin_view(&server.url);
    settle(&mut view).await;
    render_text(&mut view, 140, 16);

    press(&mut view, KeyCode::Enter);
    settle(&mut view).await;
    let screen = render_text(&mut view, 140, 16);
    assert!(screen.contains("Rice Blast"));
    assert!(screen.contains("3.90 t/ha"));
  }

  #[tokio::test]
  async fn test_toggle_posts_and_reloads() {
    let server = MockServer::start(vec![
      Route::json("GET", "/api/admin/farmers", 200, FARMERS),
      Route::json("GET", "/api/admin/farmers/2/analysis", 200, "[]"),
      Route::json("GET", "/api/admin/farmers/5/analysis", 200, "[]"),
      Route::json(
        "POST",
        "/api/admin/farmers/2/revoke",
        200,
        r#"{"message": "Access revoked for Ravi Kumar", "is_active": false}"#,
      ),
    ])
    .await;
    let (mut view, _) = admin_view(&server.url);
    settle(&mut view).await;
    render_text(&mut view, 140, 12);

    press(&mut view, KeyCode::Char('t'));
    settle(&mut view).await;

    assert_eq!(server.hits_for("/api/admin/farmers/2/revoke"), 1);
    assert_eq!(server.hits_for("/api/admin/farmers"), 2);
    assert_eq!(view.notice.as_deref(), Some("Access revoked for Ravi Kumar"));
  }

  #[tokio::test]
  async fn test_offline_list_blocks_toggle() {
    let (mut view, sessions) = admin_view(&unreachable_url().await);
    sessions
      .cache_offline_account(&OfflineAccount::new(
        "Ravi Kumar",
        "9876543210",
        "pw1234",
        Role::Farmer,
      ))
      .unwrap();
    // The list was requested before the account existed
    view.farmers.refetch();
    settle(&mut view).await;

    let farmers = view.farmers.data().unwrap();
    assert!(farmers.is_estimated());
    assert_eq!(farmers.data[0].id, -1);
    assert!(view.counts.is_none());

    render_text(&mut view, 140, 12);
    press(&mut view, KeyCode::Char('t'));
    assert!(view.toggle.is_none());
    assert_eq!(
      view.notice.as_deref(),
      Some("Access can only be changed while online")
    );
  }
}
