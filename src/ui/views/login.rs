use crate::api::AuthService;
use crate::forms::{self, SignupInput};
use crate::query::{Query, QueryState};
use crate::session::Session;
use crate::ui::components::{Form, FormEvent, FormField, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
  Login,
  Signup,
  Admin,
}

impl Mode {
  const ALL: [Mode; 3] = [Mode::Login, Mode::Signup, Mode::Admin];

  fn title(self) -> &'static str {
    match self {
      Mode::Login => "F1 Farmer login",
      Mode::Signup => "F2 Sign up",
      Mode::Admin => "F3 Admin",
    }
  }
}

/// Sign in, register, or sign in as admin.
///
/// All three forms keep their contents when switching modes. When the
/// backend can't be reached the auth service checks the offline directory.
pub struct LoginView {
  auth: AuthService,
  mode: Mode,
  login: Form,
  signup: Form,
  admin: Form,
  query: Option<Query<Session>>,
}

impl LoginView {
  pub fn new(auth: AuthService) -> Self {
    Self {
      auth,
      mode: Mode::Login,
      login: Form::new(
        "Farmer login",
        vec![
          FormField::new("Email or phone"),
          FormField::new("Password").secret(),
        ],
      ),
      signup: Form::new(
        "Create account",
        vec![
          FormField::new("Full name"),
          FormField::new("Address").hint("village, district"),
          FormField::new("Age").hint("18-100"),
          FormField::new("Email or phone"),
          FormField::new("Password").secret().hint("at least 6 characters"),
        ],
      ),
      admin: Form::new(
        "Admin login",
        vec![FormField::new("Email"), FormField::new("Password").secret()],
      ),
      query: None,
    }
  }

  fn form(&self) -> &Form {
    match self.mode {
      Mode::Login => &self.login,
      Mode::Signup => &self.signup,
      Mode::Admin => &self.admin,
    }
  }

  fn form_mut(&mut self) -> &mut Form {
    match self.mode {
      Mode::Login => &mut self.login,
      Mode::Signup => &mut self.signup,
      Mode::Admin => &mut self.admin,
    }
  }

  fn is_busy(&self) -> bool {
    self.query.as_ref().is_some_and(|q| q.is_loading())
  }

  fn submit(&mut self) {
    if self.is_busy() {
      return;
    }
    let auth = self.auth.clone();

    let mut query = match self.mode {
      Mode::Login => match forms::credentials(self.login.value(0), self.login.value(1)) {
        Ok((contact, password)) => Query::new(move || {
          let auth = auth.clone();
          let (contact, password) = (contact.clone(), password.clone());
          async move { auth.login(&contact, &password).await.map_err(|e| e.to_string()) }
        }),
        Err(e) => {
          self.login.set_error(e.to_string());
          return;
        }
      },
      Mode::Admin => match forms::credentials(self.admin.value(0), self.admin.value(1)) {
        Ok((email, password)) => Query::new(move || {
          let auth = auth.clone();
          let (email, password) = (email.clone(), password.clone());
          async move {
            auth
              .admin_login(&email, &password)
              .await
              .map_err(|e| e.to_string())
          }
        }),
        Err(e) => {
          self.admin.set_error(e.to_string());
          return;
        }
      },
      Mode::Signup => {
        let validated = SignupInput {
          name: self.signup.value(0),
          address: self.signup.value(1),
          age: self.signup.value(2),
          contact: self.signup.value(3),
          password: self.signup.value(4),
        }
        .validate();
        match validated {
          Ok(req) => Query::new(move || {
            let auth = auth.clone();
            let req = req.clone();
            async move { auth.signup(&req).await.map_err(|e| e.to_string()) }
          }),
          Err(e) => {
            self.signup.set_error(e.to_string());
            return;
          }
        }
      }
    };

    self.form_mut().clear_error();
    query.fetch();
    self.query = Some(query);
  }

  fn switch_mode(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let mode = match key.code {
      KeyCode::F(1) => Mode::Login,
      KeyCode::F(2) => Mode::Signup,
      KeyCode::F(3) => Mode::Admin,
      _ => return None,
    };
    if !self.is_busy() {
      self.mode = mode;
    }
    Some(ViewAction::None)
  }

  fn render_status(&self, frame: &mut Frame, area: Rect) {
    let (text, color) = match self.query.as_ref().map(|q| q.state()) {
      Some(QueryState::Loading) => ("Signing in...".to_string(), Color::Yellow),
      Some(QueryState::Error(e)) => (e.clone(), Color::Red),
      _ => (
        "Offline? Accounts that signed in on this device before still work.".to_string(),
        Color::DarkGray,
      ),
    };
    let paragraph = Paragraph::new(text)
      .style(Style::default().fg(color))
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(action) = self.switch_mode(key) {
      return action;
    }

    match self.form_mut().handle_key(key) {
      KeyResult::Event(FormEvent::Submit) => {
        self.submit();
        ViewAction::None
      }
      KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let width = area.width.min(64);
    let height = area.height.min(16);
    let card = Rect::new(
      area.x + (area.width - width) / 2,
      area.y + (area.height - height) / 2,
      width,
      height,
    );

    let block = Block::default()
      .title(" Welcome to CropDoctor ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1),
        Constraint::Min(4),
        Constraint::Length(2),
      ])
      .split(inner);

    let selected = Mode::ALL.iter().position(|m| *m == self.mode).unwrap_or(0);
    let tabs = Tabs::new(Mode::ALL.iter().map(|m| m.title()))
      .select(selected)
      .style(Style::default().fg(Color::DarkGray))
      .highlight_style(Style::default().fg(Color::Cyan).bold());
    frame.render_widget(tabs, chunks[0]);

    self.form().render(frame, chunks[1]);
    self.render_status(frame, chunks[2]);
  }

  fn breadcrumb_label(&self) -> String {
    "Login".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    let Some(query) = &mut self.query else {
      return ViewAction::None;
    };
    if !query.poll() {
      return ViewAction::None;
    }
    match query.state() {
      QueryState::Success(session) => {
        info!(
          contact = %session.contact,
          role = %session.role,
          offline = session.is_offline(),
          "signed in"
        );
        ViewAction::LoggedIn(session.clone())
      }
      _ => ViewAction::None,
    }
  }

  fn is_capturing(&self) -> bool {
    self.form().is_capturing()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = self.form().shortcuts();
    shortcuts.push(ShortcutInfo::new("F1-F3", "mode").with_priority(5));
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::test_support::{unreachable_url, MockServer, Route};
  use crate::api::Gateway;
  use crate::db::Database;
  use crate::session::{OfflineAccount, Role, SessionStore};
  use crate::ui::views::test_support::{press, render_text, type_str};
  use std::sync::Arc;
  use std::time::Duration;

  fn login_view(url: &str) -> (LoginView, SessionStore) {
    let gateway = Gateway::new(url, Duration::from_secs(2)).unwrap();
    let sessions = SessionStore::new(Arc::new(Database::open_in_memory().unwrap()));
    (LoginView::new(AuthService::new(gateway, sessions.clone())), sessions)
  }

  async fn wait_for_action(view: &mut LoginView) -> ViewAction {
    for _ in 0..100 {
      let action = view.tick();
      if !matches!(action, ViewAction::None) || !view.is_busy() {
        return action;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    ViewAction::None
  }

  #[tokio::test]
  async fn test_login_produces_session() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/auth/login",
      200,
      r#"{"token": "jwt.farmer", "user": {"id": 3, "name": "Ravi Kumar",
        "initials": "RK", "email_phone": "9876543210", "role": "farmer"}}"#,
    )])
    .await;
    let (mut view, sessions) = login_view(&server.url);

    press(&mut view, KeyCode::Enter);
    type_str(&mut view, "9876543210");
    press(&mut view, KeyCode::Enter);
    type_str(&mut view, "secret1");
    press(&mut view, KeyCode::Enter);

    match wait_for_action(&mut view).await {
      ViewAction::LoggedIn(session) => {
        assert_eq!(session.name, "Ravi Kumar");
        assert_eq!(session.role, Role::Farmer);
      }
      _ => panic!("expected LoggedIn"),
    }
    assert!(sessions.load().is_some());
  }

  #[tokio::test]
  async fn test_rejection_shown_verbatim() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/auth/login",
      401,
      r#"{"detail":"Invalid credentials"}"#,
    )])
    .await;
    let (mut view, _) = login_view(&server.url);
    view.login.set_value(0, "9876543210");
    view.login.set_value(1, "wrong-pass");
    press(&mut view, KeyCode::Char('s'));

    assert!(matches!(wait_for_action(&mut view).await, ViewAction::None));
    assert_eq!(
      view.query.as_ref().and_then(|q| q.error()),
      Some("Invalid credentials")
    );
    assert!(render_text(&mut view, 80, 24).contains("Invalid credentials"));
  }

  #[tokio::test]
  async fn test_offline_admin_login_from_directory() {
    let (mut view, sessions) = login_view(&unreachable_url().await);
    sessions
      .cache_offline_account(&OfflineAccount::new(
        "Admin",
        "admin@cropdoctor.in",
        "root-pass",
        Role::Admin,
      ))
      .unwrap();

    press(&mut view, KeyCode::F(3));
    view.admin.set_value(0, "admin@cropdoctor.in");
    view.admin.set_value(1, "root-pass");
    press(&mut view, KeyCode::Char('s'));

    match wait_for_action(&mut view).await {
      ViewAction::LoggedIn(session) => {
        assert!(session.is_admin());
        assert!(session.is_offline());
      }
      _ => panic!("expected LoggedIn"),
    }
  }

  #[tokio::test]
  async fn test_signup_validation_is_local() {
    let server = MockServer::start(vec![]).await;
    let (mut view, _) = login_view(&server.url);

    press(&mut view, KeyCode::F(2));
    view.signup.set_value(0, "Lakshmi Devi");
    view.signup.set_value(1, "Guntur, AP");
    view.signup.set_value(2, "16");
    view.signup.set_value(3, "lakshmi@example.com");
    view.signup.set_value(4, "paddy2026");
    press(&mut view, KeyCode::Char('s'));

    assert_eq!(view.signup.error(), Some("Age must be between 18 and 100"));
    assert!(view.query.is_none());
    assert_eq!(server.hits(), 0);
  }

  #[tokio::test]
  async fn test_mode_switch_keeps_entries() {
    let (mut view, _) = login_view("http://localhost:8000");
    view.login.set_value(0, "9876543210");
    press(&mut view, KeyCode::F(2));
    assert_eq!(view.mode, Mode::Signup);
    press(&mut view, KeyCode::F(1));
    assert_eq!(view.form().value(0), "9876543210");
  }
}
