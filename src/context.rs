//! Application context: the session store, gateway, cache and services,
//! constructed once at startup and reset on logout.

use color_eyre::Result;
use std::sync::Arc;
use tracing::info;

use crate::api::{AdminService, AdvisoryService, AuthService, Gateway};
use crate::cache::{CacheLayer, Storage};
use crate::config::Config;
use crate::db::Database;
use crate::estimator::Estimator;
use crate::session::{Session, SessionStore};

pub struct AppContext {
  config: Config,
  sessions: SessionStore,
  gateway: Gateway,
  cache: CacheLayer<Storage>,
  estimator: Arc<Estimator>,
  session: Option<Session>,
}

impl AppContext {
  /// Open the on-disk state and restore any saved session.
  pub fn init(config: Config) -> Result<Self> {
    let db = Arc::new(Database::open()?);
    Self::with_database(config, db)
  }

  pub fn with_database(config: Config, db: Arc<Database>) -> Result<Self> {
    let sessions = SessionStore::new(db);
    let gateway = Gateway::new(&config.api.url, config.request_timeout())?;
    let cache =
      CacheLayer::new(Storage::from_enabled(config.cache.enabled)).with_ttl(config.cache_ttl());

    let session = sessions.load();
    if let Some(session) = &session {
      gateway.set_token(session.token.clone());
      info!(contact = %session.contact, role = %session.role, "restored session");
    }

    Ok(Self {
      config,
      sessions,
      gateway,
      cache,
      estimator: Arc::new(Estimator::new()),
      session,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn gateway(&self) -> &Gateway {
    &self.gateway
  }

  pub fn session(&self) -> Option<&Session> {
    self.session.as_ref()
  }

  /// Record a session the auth service has already persisted.
  pub fn set_session(&mut self, session: Session) {
    self.session = Some(session);
  }

  pub fn advisory(&self) -> AdvisoryService {
    AdvisoryService::new(
      self.gateway.clone(),
      self.cache.clone(),
      Arc::clone(&self.estimator),
    )
  }

  pub fn auth(&self) -> AuthService {
    AuthService::new(self.gateway.clone(), self.sessions.clone())
  }

  pub fn admin(&self) -> AdminService {
    AdminService::new(self.gateway.clone(), self.sessions.clone())
  }

  /// Forget the current user: stored session, bearer token and cached answers.
  /// The offline directory is kept.
  pub fn teardown(&mut self) -> Result<()> {
    self.sessions.clear()?;
    self.gateway.set_token(None);
    self.cache.clear()?;
    if let Some(session) = self.session.take() {
      info!(contact = %session.contact, "logged out");
    }
    Ok(())
  }
}
