//! Serde-deserializable types matching CropDoctor API responses.
//!
//! These types are separate from domain types where the wire shape differs
//! (renamed fields, HTML-formatted text, loosely typed status strings).

use serde::{Deserialize, Serialize};

use super::types::{DiseaseReport, Farmer, HealthStatus};
use crate::session::{initials, Role, Session};

// ============================================================================
// Errors
// ============================================================================

/// `{"detail": "..."}` body the backend returns with 4xx/5xx responses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  pub detail: serde_json::Value,
}

impl ApiErrorBody {
  /// The reason as text; validation errors arrive as a list of objects
  pub fn message(&self) -> Option<String> {
    match &self.detail {
      serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
      serde_json::Value::Array(items) => {
        let parts: Vec<&str> = items
          .iter()
          .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
          .collect();
        if parts.is_empty() {
          None
        } else {
          Some(parts.join("; "))
        }
      }
      _ => None,
    }
  }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiFarmerLogin<'a> {
  pub email_phone: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ApiAdminLogin<'a> {
  pub email: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(default)]
  pub id: Option<i64>,
  pub name: String,
  #[serde(default)]
  pub initials: Option<String>,
  pub email_phone: String,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub age: Option<u32>,
  #[serde(default)]
  pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginResponse {
  pub token: String,
  pub user: ApiUser,
}

#[derive(Debug, Deserialize)]
pub struct ApiSignupResponse {
  #[serde(default)]
  pub message: String,
  pub user: ApiUser,
}

impl ApiUser {
  /// Build a session, using `default_role` when the backend omits or garbles it.
  pub fn into_session(self, token: Option<String>, default_role: Role) -> Session {
    let role = self
      .role
      .as_deref()
      .and_then(Role::parse)
      .unwrap_or(default_role);
    let initials = self
      .initials
      .filter(|i| !i.trim().is_empty())
      .unwrap_or_else(|| initials(&self.name));
    Session {
      user_id: self.id,
      name: self.name,
      initials,
      role,
      contact: self.email_phone,
      address: self.address,
      age: self.age,
      token,
    }
  }
}

// ============================================================================
// Disease detection
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiDiseaseResponse {
  pub disease: String,
  pub status: String,
  #[serde(default)]
  pub confidence: f64,
  #[serde(default)]
  pub severity: Option<String>,
  #[serde(default)]
  pub health_score: Option<f64>,
  #[serde(default)]
  pub details: String,
}

impl From<ApiDiseaseResponse> for DiseaseReport {
  fn from(resp: ApiDiseaseResponse) -> Self {
    let status = if resp.status.eq_ignore_ascii_case("healthy") {
      HealthStatus::Healthy
    } else {
      HealthStatus::Diseased
    };
    DiseaseReport {
      disease: resp.disease,
      status,
      confidence: resp.confidence,
      severity: resp.severity,
      health_score: resp.health_score,
      details: strip_markup(&resp.details),
    }
  }
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiFarmer {
  pub id: i64,
  pub name: String,
  pub email_phone: String,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default = "default_active")]
  pub is_active: bool,
  #[serde(default)]
  pub created_at: Option<String>,
}

fn default_active() -> bool {
  true
}

impl From<ApiFarmer> for Farmer {
  fn from(f: ApiFarmer) -> Self {
    Farmer {
      id: f.id,
      name: f.name,
      contact: f.email_phone,
      address: f.address,
      is_active: f.is_active,
      created_at: f.created_at,
    }
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Turn the backend's HTML snippets into plain text.
///
/// `<br>` becomes a newline, other tags are dropped and the few entities the
/// backend emits are decoded.
pub fn strip_markup(html: &str) -> String {
  let mut out = String::with_capacity(html.len());
  let mut rest = html;

  while let Some(start) = rest.find('<') {
    out.push_str(&rest[..start]);
    let after = &rest[start..];
    match after.find('>') {
      Some(end) => {
        let tag = after[1..end].trim().trim_end_matches('/').trim().to_lowercase();
        if tag == "br" {
          out.push('\n');
        }
        rest = &after[end + 1..];
      }
      None => {
        // Unterminated tag, keep it as text
        out.push_str(after);
        rest = "";
      }
    }
  }
  out.push_str(rest);

  out
    .replace("&amp;", "&")
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&nbsp;", " ")
}
