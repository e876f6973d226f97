use crate::commands::Command;
use crate::context::AppContext;
use crate::event::{Event, EventHandler};
use crate::query::Query;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header, HeaderContext};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{
  AdminView, DiseaseView, FertilizerView, IrrigationView, LoginView, WeatherView, YieldView,
};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Ticks between backend health checks (about 30 seconds)
const HEALTH_INTERVAL: u64 = 120;

/// Ticks a footer notice stays visible
const NOTICE_TICKS: u64 = 16;

/// Main application state
pub struct App {
  ctx: AppContext,

  /// Navigation stack, the user's home page is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` palette, drawn over the current view while active
  command_input: CommandInput,

  health: Query<bool>,

  ticks: u64,

  /// Footer message and the tick at which it expires
  notice: Option<(String, u64)>,

  should_quit: bool,
}

impl App {
  /// Build the app on a tokio runtime. Starts on the login view unless a
  /// saved session was restored.
  pub fn new(ctx: AppContext) -> Self {
    let gateway = ctx.gateway().clone();
    let mut health = Query::new(move || {
      let gateway = gateway.clone();
      async move { Ok(gateway.health().await) }
    });
    health.fetch();

    let mut app = Self {
      ctx,
      view_stack: Vec::new(),
      command_input: CommandInput::new(),
      health,
      ticks: 0,
      notice: None,
      should_quit: false,
    };
    app.view_stack = vec![app.home_view()];
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);
    let result = self.event_loop(&mut terminal, &mut events).await;
    events.stop().await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key)?,
        Some(Event::Tick) => self.tick()?,
        Some(Event::Resize) => {}
        None => break,
      }
    }
    Ok(())
  }

  /// The page a user lands on: login when signed out, the admin console
  /// for admins, disease detection for farmers.
  fn home_view(&self) -> Box<dyn View> {
    match self.ctx.session() {
      None => Box::new(LoginView::new(self.ctx.auth())),
      Some(session) if session.is_admin() => Box::new(AdminView::new(self.ctx.admin())),
      Some(_) => Box::new(DiseaseView::new(self.ctx.advisory())),
    }
  }

  fn page_view(&self, command: &Command) -> Option<Box<dyn View>> {
    let view: Box<dyn View> = match command.name {
      "disease" => Box::new(DiseaseView::new(self.ctx.advisory())),
      "yield" => Box::new(YieldView::new(self.ctx.advisory())),
      "irrigation" => Box::new(IrrigationView::new(self.ctx.advisory())),
      "fertilizer" => Box::new(FertilizerView::new(self.ctx.advisory())),
      "weather" => Box::new(WeatherView::new(
        self.ctx.advisory(),
        &self.ctx.config().weather.default_location,
      )),
      "admin" => Box::new(AdminView::new(self.ctx.admin())),
      _ => return None,
    };
    Some(view)
  }

  fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  fn is_admin(&self) -> bool {
    self.ctx.session().is_some_and(|s| s.is_admin())
  }

  fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return Ok(());
    }

    match self.command_input.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(command)) => return self.run_command(command),
      KeyResult::Event(CommandEvent::Unknown(input)) => {
        self.show_notice(format!("Unknown command: {}", input));
        return Ok(());
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return Ok(()),
      KeyResult::NotHandled => {}
    }

    let capturing = self.current_view().is_some_and(|v| v.is_capturing());
    if key.code == KeyCode::Char(':') && !capturing && self.ctx.session().is_some() {
      self.command_input.activate(self.is_admin());
      return Ok(());
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action)
  }

  fn tick(&mut self) -> Result<()> {
    self.ticks += 1;

    if self.health.poll() {
      if let Some(online) = self.health.data() {
        info!(online = *online, "backend health");
      }
    }
    if self.ticks % HEALTH_INTERVAL == 0 && !self.health.is_loading() {
      self.health.refetch();
    }

    if self.notice.as_ref().is_some_and(|(_, until)| self.ticks >= *until) {
      self.notice = None;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.tick(),
      None => ViewAction::None,
    };
    self.apply(action)
  }

  fn apply(&mut self, action: ViewAction) -> Result<()> {
    match action {
      ViewAction::None => {}
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::LoggedIn(session) => {
        self.ctx.set_session(session);
        self.view_stack = vec![self.home_view()];
      }
    }
    Ok(())
  }

  /// Page commands open on top of the home page; choosing the home page
  /// itself unwinds the stack to it.
  fn run_command(&mut self, command: &'static Command) -> Result<()> {
    match command.name {
      "logout" => return self.logout(),
      "quit" => {
        self.should_quit = true;
        return Ok(());
      }
      _ => {}
    }

    let Some(view) = self.page_view(command) else {
      warn!(command = command.name, "command has no page");
      return Ok(());
    };

    self.view_stack.truncate(1);
    let is_home = self
      .current_view()
      .is_some_and(|home| home.breadcrumb_label() == view.breadcrumb_label());
    if !is_home {
      self.view_stack.push(view);
    }
    Ok(())
  }

  fn logout(&mut self) -> Result<()> {
    self.ctx.teardown()?;
    self.view_stack = vec![self.home_view()];
    self.show_notice("Signed out".to_string());
    Ok(())
  }

  fn show_notice(&mut self, message: String) {
    self.notice = Some((message, self.ticks + NOTICE_TICKS));
  }

  fn breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
      ])
      .split(frame.area());

    let (shortcuts, active) = match self.current_view() {
      Some(view) => (view.shortcuts(), view.is_capturing()),
      None => (Vec::new(), false),
    };
    let header = HeaderContext {
      title: self.ctx.config().title(),
      api_url: &self.ctx.config().api.url,
      user: self.ctx.session(),
      online: self.health.data().copied(),
      active,
    };
    draw_header(frame, chunks[0], &header, &shortcuts);

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }
    self.command_input.render_overlay(frame, chunks[1]);

    let breadcrumb = self.breadcrumb();
    let notice = self.notice.as_ref().map(|(message, _)| message.as_str());
    draw_footer(frame, chunks[2], &breadcrumb, notice);
  }
}
