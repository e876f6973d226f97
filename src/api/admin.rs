use futures::future::join_all;
use tracing::{info, warn};

use super::api_types::ApiFarmer;
use super::client::{Gateway, GatewayResult};
use super::types::{AccessChange, AnalysisRecord, Farmer, FarmerHistory};
use crate::cache::{FetchError, Sourced};
use crate::session::{Role, SessionStore};

/// Farmer management for admins.
#[derive(Clone)]
pub struct AdminService {
  gateway: Gateway,
  sessions: SessionStore,
}

impl AdminService {
  pub fn new(gateway: Gateway, sessions: SessionStore) -> Self {
    Self { gateway, sessions }
  }

  /// Registered farmers. When the backend is unavailable the farmers known to
  /// this device are listed instead, with negative placeholder ids.
  pub async fn list_farmers(&self) -> GatewayResult<Sourced<Vec<Farmer>>> {
    match self
      .gateway
      .get_json::<Vec<ApiFarmer>>("/api/admin/farmers", &[])
      .await
    {
      Ok(farmers) => Ok(Sourced::from_network(
        farmers.into_iter().map(Farmer::from).collect(),
      )),
      Err(e) if e.allows_fallback() => {
        info!(error = %e, "farmer list unavailable, using offline directory");
        Ok(Sourced::estimated(self.offline_farmers()))
      }
      Err(e) => Err(e),
    }
  }

  fn offline_farmers(&self) -> Vec<Farmer> {
    let accounts = match self.sessions.offline_accounts(Role::Farmer) {
      Ok(accounts) => accounts,
      Err(e) => {
        warn!(error = %e, "failed to read offline directory");
        return Vec::new();
      }
    };

    accounts
      .into_iter()
      .zip(1i64..)
      .map(|(account, n)| Farmer {
        id: -n,
        name: account.name,
        contact: account.contact,
        address: None,
        is_active: true,
        created_at: None,
      })
      .collect()
  }

  pub async fn farmer_history(&self, farmer_id: i64) -> GatewayResult<FarmerHistory> {
    let endpoint = format!("/api/admin/farmers/{}/analysis", farmer_id);
    let records: Vec<AnalysisRecord> = self.gateway.get_json(&endpoint, &[]).await?;
    Ok(FarmerHistory {
      farmer_id,
      records,
      available: true,
    })
  }

  /// Histories for several farmers, fetched concurrently.
  ///
  /// A failed lookup becomes an empty placeholder; results keep the order of
  /// `farmer_ids`.
  pub async fn history_batch(&self, farmer_ids: &[i64]) -> Vec<FarmerHistory> {
    let lookups = farmer_ids.iter().map(|&id| async move {
      match self.farmer_history(id).await {
        Ok(history) => history,
        Err(e) => {
          warn!(farmer_id = id, error = %e, "history lookup failed");
          FarmerHistory::placeholder(id)
        }
      }
    });
    join_all(lookups).await
  }

  /// Revoke an active farmer or restore a revoked one.
  pub async fn toggle_access(&self, farmer_id: i64) -> GatewayResult<AccessChange> {
    let endpoint = format!("/api/admin/farmers/{}/revoke", farmer_id);
    let change: AccessChange = self.gateway.post_empty(&endpoint).await?;
    info!(farmer_id, is_active = change.is_active, "farmer access changed");
    Ok(change)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::test_support::{unreachable_url, MockServer, Route};
  use crate::cache::DataSource;
  use crate::db::Database;
  use crate::session::OfflineAccount;
  use std::sync::Arc;
  use std::time::Duration;

  const FARMERS: &str = r#"[
    {"id": 2, "name": "Ravi Kumar", "email_phone": "9876543210", "address": "Warangal",
     "is_active": true, "created_at": "2026-03-01T10:00:00"},
    {"id": 5, "name": "Lakshmi Devi", "email_phone": "lakshmi@example.com", "address": null,
     "is_active": false, "created_at": null}
  ]"#;

  const HISTORY: &str = r#"[
    {"id": 11, "crop_type": "rice", "disease_prediction": "Rice Blast", "confidence": 91.0,
     "is_healthy": false, "yield_per_ha": null, "total_yield": null, "created_at": "2026-06-01T08:00:00"},
    {"id": 12, "crop_type": "wheat", "disease_prediction": "Yield Prediction", "confidence": 84.0,
     "is_healthy": true, "yield_per_ha": 3.9, "total_yield": 7.8, "created_at": "2026-06-02T08:00:00"}
  ]"#;

  fn service(url: &str) -> (AdminService, SessionStore) {
    let gateway = Gateway::new(url, Duration::from_secs(2)).unwrap();
    let sessions = SessionStore::new(Arc::new(Database::open_in_memory().unwrap()));
    (AdminService::new(gateway, sessions.clone()), sessions)
  }

  #[tokio::test]
  async fn test_list_farmers() {
    let server = MockServer::start(vec![Route::json("GET", "/api/admin/farmers", 200, FARMERS)]).await;
    let (admin, _) = service(&server.url);

    let farmers = admin.list_farmers().await.unwrap();
    assert_eq!(farmers.source, DataSource::Network);
    assert_eq!(farmers.data.len(), 2);
    assert_eq!(farmers.data[0].contact, "9876543210");
    assert!(!farmers.data[1].is_active);
  }

  #[tokio::test]
  async fn test_list_farmers_offline_uses_directory() {
    let (admin, sessions) = service(&unreachable_url().await);
    sessions
      .cache_offline_account(&OfflineAccount::new("Ravi", "ravi@x", "pw1234", Role::Farmer))
      .unwrap();
    sessions
      .cache_offline_account(&OfflineAccount::new("Root", "root@x", "pw1234", Role::Admin))
      .unwrap();

    let farmers = admin.list_farmers().await.unwrap();
    assert!(farmers.is_estimated());
    assert_eq!(farmers.data.len(), 1);
    assert_eq!(farmers.data[0].id, -1);
  }

  #[tokio::test]
  async fn test_list_farmers_forbidden_is_surfaced() {
    let server = MockServer::start(vec![Route::json(
      "GET",
      "/api/admin/farmers",
      403,
      r#"{"detail":"Not authorized."}"#,
    )])
    .await;
    let (admin, _) = service(&server.url);
    let err = admin.list_farmers().await.unwrap_err();
    assert_eq!(err.rejection(), Some("Not authorized."));
  }

  #[tokio::test]
  async fn test_history_batch_degrades_failures_to_placeholders() {
    let server = MockServer::start(vec![
      Route::json("GET", "/api/admin/farmers/2/analysis", 200, HISTORY),
      Route::json("GET", "/api/admin/farmers/5/analysis", 500, r#"{"detail":"db down"}"#),
    ])
    .await;
    let (admin, _) = service(&server.url);

    let histories = admin.history_batch(&[2, 5]).await;
    assert_eq!(histories.len(), 2);
    assert_eq!(histories[0].farmer_id, 2);
    assert!(histories[0].available);
    assert_eq!(histories[0].count(), 2);
    assert_eq!(histories[1], FarmerHistory::placeholder(5));
    assert_eq!(histories[1].count(), 0);
  }

  #[tokio::test]
  async fn test_history_batch_all_unreachable() {
    let (admin, _) = service(&unreachable_url().await);
    let histories = admin.history_batch(&[1, 2, 3]).await;
    assert!(histories.iter().all(|h| !h.available && h.count() == 0));
  }

  #[tokio::test]
  async fn test_toggle_access() {
    let server = MockServer::start(vec![
      Route::json(
        "POST",
        "/api/admin/farmers/2/revoke",
        200,
        r#"{"message": "Farmer access revoked successfully.", "is_active": false}"#,
      ),
      Route::json(
        "POST",
        "/api/admin/farmers/9/revoke",
        404,
        r#"{"detail":"Farmer not found."}"#,
      ),
    ])
    .await;
    let (admin, _) = service(&server.url);

    let change = admin.toggle_access(2).await.unwrap();
    assert!(!change.is_active);
    assert_eq!(change.message, "Farmer access revoked successfully.");

    let err = admin.toggle_access(9).await.unwrap_err();
    assert_eq!(err.to_string(), "Farmer not found.");
  }

  #[tokio::test]
  async fn test_toggle_access_offline_is_an_error() {
    let (admin, _) = service(&unreachable_url().await);
    assert!(admin.toggle_access(2).await.unwrap_err().is_unreachable());
  }
}
