//! Persisted session state and the offline account directory.
//!
//! The current session is stored as a JSON record in the key/value table.
//! Reads fail closed: anything that cannot be read back into a complete
//! [`Session`] is reported as "no session", which sends the user to login.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::Database;

const SESSION_KEY: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Farmer,
  Admin,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Farmer => "farmer",
      Role::Admin => "admin",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "farmer" => Some(Role::Farmer),
      "admin" => Some(Role::Admin),
      _ => None,
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  #[serde(default)]
  pub user_id: Option<i64>,
  pub name: String,
  pub initials: String,
  pub role: Role,
  /// Email address or phone number used to sign in
  pub contact: String,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub age: Option<u32>,
  /// Bearer token; absent for sessions opened from the offline directory
  #[serde(default)]
  pub token: Option<String>,
}

impl Session {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  pub fn is_offline(&self) -> bool {
    self.token.is_none()
  }

  fn is_complete(&self) -> bool {
    !self.name.trim().is_empty() && !self.contact.trim().is_empty()
  }
}

/// A locally remembered account, keyed by contact.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineAccount {
  pub name: String,
  pub contact: String,
  pub password_digest: String,
  pub role: Role,
}

impl OfflineAccount {
  pub fn new(name: &str, contact: &str, password: &str, role: Role) -> Self {
    Self {
      name: name.to_string(),
      contact: contact.trim().to_string(),
      password_digest: password_digest(password),
      role,
    }
  }

  pub fn matches_password(&self, password: &str) -> bool {
    self.password_digest == password_digest(password)
  }

  /// Session for this account when the backend cannot be reached.
  pub fn offline_session(&self) -> Session {
    Session {
      user_id: None,
      name: self.name.clone(),
      initials: initials(&self.name),
      role: self.role,
      contact: self.contact.clone(),
      address: None,
      age: None,
      token: None,
    }
  }
}

fn password_digest(password: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(password.as_bytes());
  hex::encode(hasher.finalize())
}

/// Two-letter initials: first letters of the first two words, otherwise the
/// first two characters of the name.
pub fn initials(name: &str) -> String {
  let parts: Vec<&str> = name.split_whitespace().collect();
  let letters: String = if parts.len() >= 2 {
    parts[..2].iter().filter_map(|p| p.chars().next()).collect()
  } else {
    name.trim().chars().take(2).collect()
  };
  letters.to_uppercase()
}

/// Session store backed by the local database.
#[derive(Clone)]
pub struct SessionStore {
  db: Arc<Database>,
}

impl SessionStore {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }

  /// Load the current session, treating any corruption as "logged out".
  pub fn load(&self) -> Option<Session> {
    let raw = match self.read_raw() {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(error = %e, "failed to read stored session");
        return None;
      }
    };

    match serde_json::from_str::<Session>(&raw) {
      Ok(session) if session.is_complete() => Some(session),
      Ok(_) => {
        warn!("stored session is missing required fields");
        None
      }
      Err(e) => {
        warn!(error = %e, "stored session is malformed");
        None
      }
    }
  }

  fn read_raw(&self) -> Result<Option<String>> {
    let conn = self.db.conn()?;
    conn
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?",
        params![SESSION_KEY],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to query session: {}", e))
  }

  pub fn save(&self, session: &Session) -> Result<()> {
    let value =
      serde_json::to_string(session).map_err(|e| eyre!("Failed to serialize session: {}", e))?;
    self.write_raw(&value)?;
    debug!(contact = %session.contact, role = %session.role, "session saved");
    Ok(())
  }

  pub(crate) fn write_raw(&self, value: &str) -> Result<()> {
    let conn = self.db.conn()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, datetime('now'))",
        params![SESSION_KEY, value],
      )
      .map_err(|e| eyre!("Failed to store session: {}", e))?;
    Ok(())
  }

  pub fn clear(&self) -> Result<()> {
    let conn = self.db.conn()?;
    conn
      .execute("DELETE FROM kv_store WHERE key = ?", params![SESSION_KEY])
      .map_err(|e| eyre!("Failed to clear session: {}", e))?;
    Ok(())
  }

  /// Remember an account for offline login. Last write for a contact wins.
  pub fn cache_offline_account(&self, account: &OfflineAccount) -> Result<()> {
    let conn = self.db.conn()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO offline_accounts (contact, name, password_digest, role, updated_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![
          account.contact,
          account.name,
          account.password_digest,
          account.role.as_str()
        ],
      )
      .map_err(|e| eyre!("Failed to store offline account: {}", e))?;
    Ok(())
  }

  pub fn offline_account(&self, contact: &str) -> Result<Option<OfflineAccount>> {
    let conn = self.db.conn()?;
    let row: Option<(String, String, String, String)> = conn
      .query_row(
        "SELECT contact, name, password_digest, role FROM offline_accounts WHERE contact = ?",
        params![contact.trim()],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to query offline account: {}", e))?;

    Ok(row.and_then(into_account))
  }

  /// Find an offline account whose password matches.
  pub fn find_offline_account(&self, contact: &str, password: &str) -> Option<OfflineAccount> {
    match self.offline_account(contact) {
      Ok(Some(account)) if account.matches_password(password) => Some(account),
      Ok(_) => None,
      Err(e) => {
        warn!(error = %e, "offline directory lookup failed");
        None
      }
    }
  }

  /// All offline accounts with the given role, ordered by name.
  pub fn offline_accounts(&self, role: Role) -> Result<Vec<OfflineAccount>> {
    let conn = self.db.conn()?;
    let mut stmt = conn
      .prepare(
        "SELECT contact, name, password_digest, role FROM offline_accounts
         WHERE role = ? ORDER BY name",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let accounts = stmt
      .query_map(params![role.as_str()], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
      })
      .map_err(|e| eyre!("Failed to query offline accounts: {}", e))?
      .filter_map(|r| r.ok())
      .filter_map(into_account)
      .collect();

    Ok(accounts)
  }
}

fn into_account(
  (contact, name, password_digest, role): (String, String, String, String),
) -> Option<OfflineAccount> {
  Some(OfflineAccount {
    contact,
    name,
    password_digest,
    role: Role::parse(&role)?,
  })
}
