//! Farmer and admin authentication with an offline account directory.
//!
//! A successful backend login persists the session, arms the gateway with the
//! bearer token and remembers the credentials locally. When the backend cannot
//! be reached, login is checked against that local directory instead.
//! Rejections from the backend are never second-guessed locally.

use thiserror::Error;
use tracing::{info, warn};

use super::api_types::{ApiAdminLogin, ApiFarmerLogin, ApiLoginResponse, ApiSignupResponse};
use super::client::{Gateway, GatewayError};
use super::types::SignupRequest;
use crate::session::{OfflineAccount, Role, Session, SessionStore};

#[derive(Debug, Error)]
pub enum AuthError {
  /// The backend's own reason, shown verbatim
  #[error("{0}")]
  Rejected(String),

  #[error("Server unreachable and no offline account matches these credentials.")]
  OfflineNoMatch,

  #[error("An account with this email/phone already exists on this device.")]
  DuplicateAccount,

  #[error(transparent)]
  Gateway(GatewayError),

  #[error("Could not store session: {0}")]
  Storage(String),
}

impl From<GatewayError> for AuthError {
  fn from(e: GatewayError) -> Self {
    match e.rejection() {
      Some(reason) => AuthError::Rejected(reason.to_string()),
      None => AuthError::Gateway(e),
    }
  }
}

type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Clone)]
pub struct AuthService {
  gateway: Gateway,
  sessions: SessionStore,
}

impl AuthService {
  pub fn new(gateway: Gateway, sessions: SessionStore) -> Self {
    Self { gateway, sessions }
  }

  pub async fn login(&self, contact: &str, password: &str) -> AuthResult<Session> {
    let body = ApiFarmerLogin {
      email_phone: contact.trim(),
      password,
    };
    let result = self
      .gateway
      .post_json::<_, ApiLoginResponse>("/api/auth/login", &body)
      .await;

    match result {
      Ok(resp) => {
        let session = resp.user.into_session(Some(resp.token), Role::Farmer);
        self.establish(&session, password)?;
        Ok(session)
      }
      Err(e) if e.is_unreachable() => {
        info!(error = %e, "login: backend unreachable, checking offline directory");
        self.offline_login(contact, password, Role::Farmer)
      }
      Err(e) => Err(e.into()),
    }
  }

  pub async fn admin_login(&self, email: &str, password: &str) -> AuthResult<Session> {
    let body = ApiAdminLogin {
      email: email.trim(),
      password,
    };
    let result = self
      .gateway
      .post_json::<_, ApiLoginResponse>("/api/auth/admin/login", &body)
      .await;

    match result {
      Ok(resp) => {
        let session = resp.user.into_session(Some(resp.token), Role::Admin);
        self.establish(&session, password)?;
        Ok(session)
      }
      Err(e) if e.is_unreachable() => {
        info!(error = %e, "admin login: backend unreachable, checking offline directory");
        self.offline_login(email, password, Role::Admin)
      }
      Err(e) => Err(e.into()),
    }
  }

  /// Register a farmer, then sign in with the new credentials.
  pub async fn signup(&self, req: &SignupRequest) -> AuthResult<Session> {
    let result = self
      .gateway
      .post_json::<_, ApiSignupResponse>("/api/auth/signup", req)
      .await;

    match result {
      Ok(resp) => {
        info!(contact = %resp.user.email_phone, message = %resp.message, "account created");
        let account = OfflineAccount::new(&req.name, &req.email_phone, &req.password, Role::Farmer);
        if let Err(e) = self.sessions.cache_offline_account(&account) {
          warn!(error = %e, "failed to remember new account for offline login");
        }
        self.login(&req.email_phone, &req.password).await
      }
      Err(e) if e.is_unreachable() => {
        info!(error = %e, "signup: backend unreachable, creating local account");
        self.offline_signup(req)
      }
      Err(e) => Err(e.into()),
    }
  }

  fn establish(&self, session: &Session, password: &str) -> AuthResult<()> {
    self
      .sessions
      .save(session)
      .map_err(|e| AuthError::Storage(e.to_string()))?;
    self.gateway.set_token(session.token.clone());

    let account = OfflineAccount::new(&session.name, &session.contact, password, session.role);
    if let Err(e) = self.sessions.cache_offline_account(&account) {
      // The login itself succeeded; only offline sign-in is affected
      warn!(error = %e, "failed to remember account for offline login");
    }
    Ok(())
  }

  fn offline_login(&self, contact: &str, password: &str, role: Role) -> AuthResult<Session> {
    let account = self
      .sessions
      .find_offline_account(contact, password)
      .filter(|a| a.role == role)
      .ok_or(AuthError::OfflineNoMatch)?;

    let session = account.offline_session();
    self
      .sessions
      .save(&session)
      .map_err(|e| AuthError::Storage(e.to_string()))?;
    self.gateway.set_token(None);
    Ok(session)
  }

  fn offline_signup(&self, req: &SignupRequest) -> AuthResult<Session> {
    let existing = self
      .sessions
      .offline_account(&req.email_phone)
      .map_err(|e| AuthError::Storage(e.to_string()))?;
    if existing.is_some() {
      return Err(AuthError::DuplicateAccount);
    }

    let account = OfflineAccount::new(&req.name, &req.email_phone, &req.password, Role::Farmer);
    self
      .sessions
      .cache_offline_account(&account)
      .map_err(|e| AuthError::Storage(e.to_string()))?;

    let session = Session {
      address: Some(req.address.clone()),
      age: Some(req.age),
      ..account.offline_session()
    };
    self
      .sessions
      .save(&session)
      .map_err(|e| AuthError::Storage(e.to_string()))?;
    self.gateway.set_token(None);
    Ok(session)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::test_support::{unreachable_url, MockServer, Route};
  use crate::db::Database;
  use std::sync::Arc;
  use std::time::Duration;

  const LOGIN_OK: &str = r#"{"token": "jwt.farmer", "user": {"id": 3, "name": "Ravi Kumar",
    "initials": "RK", "email_phone": "9876543210", "address": "Warangal", "age": 41, "role": "farmer"}}"#;

  const ADMIN_OK: &str = r#"{"token": "jwt.admin", "user": {"id": 1, "name": "Admin",
    "initials": "AD", "email_phone": "admin@cropdoctor.in", "role": "admin"}}"#;

  fn service(url: &str) -> (AuthService, SessionStore, Gateway) {
    service_with_timeout(url, Duration::from_secs(2))
  }

  fn service_with_timeout(url: &str, timeout: Duration) -> (AuthService, SessionStore, Gateway) {
    let gateway = Gateway::new(url, timeout).unwrap();
    let sessions = SessionStore::new(Arc::new(Database::open_in_memory().unwrap()));
    (
      AuthService::new(gateway.clone(), sessions.clone()),
      sessions,
      gateway,
    )
  }

  fn signup_request() -> SignupRequest {
    SignupRequest {
      name: "Lakshmi Devi".into(),
      address: "Guntur, AP".into(),
      age: 35,
      email_phone: "lakshmi@example.com".into(),
      password: "paddy2026".into(),
    }
  }

  #[tokio::test]
  async fn test_login_success_establishes_session() {
    let server = MockServer::start(vec![Route::json("POST", "/api/auth/login", 200, LOGIN_OK)]).await;
    let (auth, sessions, gateway) = service(&server.url);

    let session = auth.login("9876543210", "secret1").await.unwrap();
    assert_eq!(session.initials, "RK");
    assert_eq!(session.role, Role::Farmer);
    assert_eq!(sessions.load(), Some(session));
    assert_eq!(gateway.token().as_deref(), Some("jwt.farmer"));
    assert!(sessions.find_offline_account("9876543210", "secret1").is_some());
  }

  #[tokio::test]
  async fn test_rejection_surfaced_even_with_offline_account() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/auth/login",
      403,
      r#"{"detail":"Your access has been revoked by the admin. Please contact support."}"#,
    )])
    .await;
    let (auth, sessions, _) = service(&server.url);
    sessions
      .cache_offline_account(&OfflineAccount::new("Ravi", "9876543210", "secret1", Role::Farmer))
      .unwrap();

    let err = auth.login("9876543210", "secret1").await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(_)));
    assert_eq!(
      err.to_string(),
      "Your access has been revoked by the admin. Please contact support."
    );
    assert_eq!(sessions.load(), None);
  }

  #[tokio::test]
  async fn test_unreachable_uses_offline_directory() {
    let (auth, sessions, gateway) = service(&unreachable_url().await);
    sessions
      .cache_offline_account(&OfflineAccount::new("Ravi Kumar", "9876543210", "secret1", Role::Farmer))
      .unwrap();

    let session = auth.login("9876543210", "secret1").await.unwrap();
    assert!(session.is_offline());
    assert_eq!(session.initials, "RK");
    assert_eq!(gateway.token(), None);

    let err = auth.login("9876543210", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::OfflineNoMatch));
  }

  #[tokio::test]
  async fn test_offline_admin_login_requires_admin_role() {
    let (auth, sessions, _) = service(&unreachable_url().await);
    sessions
      .cache_offline_account(&OfflineAccount::new("Ravi", "ravi@x", "secret1", Role::Farmer))
      .unwrap();
    sessions
      .cache_offline_account(&OfflineAccount::new("Admin", "admin@x", "secret1", Role::Admin))
      .unwrap();

    assert!(matches!(
      auth.admin_login("ravi@x", "secret1").await,
      Err(AuthError::OfflineNoMatch)
    ));
    assert!(auth.admin_login("admin@x", "secret1").await.unwrap().is_admin());
  }

  #[tokio::test]
  async fn test_admin_login_success() {
    let server =
      MockServer::start(vec![Route::json("POST", "/api/auth/admin/login", 200, ADMIN_OK)]).await;
    let (auth, _, gateway) = service(&server.url);

    let session = auth.admin_login("admin@cropdoctor.in", "admin123").await.unwrap();
    assert!(session.is_admin());
    assert_eq!(gateway.token().as_deref(), Some("jwt.admin"));
    assert_eq!(server.requests()[0].json()["email"], "admin@cropdoctor.in");
  }

  #[tokio::test]
  async fn test_server_error_is_not_offline_login() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/auth/login",
      502,
      "bad gateway",
    )])
    .await;
    let (auth, sessions, _) = service(&server.url);
    sessions
      .cache_offline_account(&OfflineAccount::new("Ravi", "9876543210", "secret1", Role::Farmer))
      .unwrap();

    let err = auth.login("9876543210", "secret1").await.unwrap_err();
    assert!(matches!(err, AuthError::Gateway(GatewayError::Status { status: 502, .. })));
  }

  #[tokio::test]
  async fn test_signup_then_login() {
    let server = MockServer::start(vec![
      Route::json(
        "POST",
        "/api/auth/signup",
        200,
        r#"{"message": "Account created successfully", "user": {"id": 3, "name": "Ravi Kumar",
          "initials": "RK", "email_phone": "9876543210", "role": "farmer"}}"#,
      ),
      Route::json("POST", "/api/auth/login", 200, LOGIN_OK),
    ])
    .await;
    let (auth, _, gateway) = service(&server.url);

    let session = auth
      .signup(&SignupRequest {
        email_phone: "9876543210".into(),
        ..signup_request()
      })
      .await
      .unwrap();
    assert_eq!(session.token.as_deref(), Some("jwt.farmer"));
    assert_eq!(gateway.token().as_deref(), Some("jwt.farmer"));
    assert_eq!(server.hits_for("/api/auth/signup"), 1);
    assert_eq!(server.hits_for("/api/auth/login"), 1);
  }

  #[tokio::test]
  async fn test_signup_survives_login_timing_out() {
    let server = MockServer::start(vec![
      Route::json(
        "POST",
        "/api/auth/signup",
        200,
        r#"{"message": "Account created successfully", "user": {"id": 4, "name": "Lakshmi Devi",
          "initials": "LD", "email_phone": "lakshmi@example.com", "role": "farmer"}}"#,
      ),
      Route::json("POST", "/api/auth/login", 200, LOGIN_OK).delayed(Duration::from_secs(2)),
    ])
    .await;
    let (auth, sessions, gateway) = service_with_timeout(&server.url, Duration::from_millis(300));

    let session = auth.signup(&signup_request()).await.unwrap();
    assert!(session.is_offline());
    assert_eq!(session.initials, "LD");
    assert_eq!(gateway.token(), None);
    assert!(sessions
      .find_offline_account("lakshmi@example.com", "paddy2026")
      .is_some());
  }

  #[tokio::test]
  async fn test_offline_signup_rejects_duplicates() {
    let (auth, sessions, _) = service(&unreachable_url().await);

    let session = auth.signup(&signup_request()).await.unwrap();
    assert!(session.is_offline());
    assert_eq!(session.age, Some(35));
    assert_eq!(sessions.load(), Some(session));

    let err = auth.signup(&signup_request()).await.unwrap_err();
    assert!(matches!(err, AuthError::DuplicateAccount));

    // The local account can sign in while offline
    assert!(auth.login("lakshmi@example.com", "paddy2026").await.is_ok());
  }

  #[tokio::test]
  async fn test_signup_rejection_surfaced() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/auth/signup",
      400,
      r#"{"detail":"An account with this email/phone already exists."}"#,
    )])
    .await;
    let (auth, _, _) = service(&server.url);

    let err = auth.signup(&signup_request()).await.unwrap_err();
    assert_eq!(err.to_string(), "An account with this email/phone already exists.");
  }
}
