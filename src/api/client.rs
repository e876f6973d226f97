use reqwest::{multipart, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use color_eyre::{eyre::eyre, Result};

use super::api_types::ApiErrorBody;
use super::types::DiseaseImage;
use crate::cache::FetchError;

/// Failure of a single backend exchange.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("request timed out after {}s", .0.as_secs())]
  Timeout(Duration),

  #[error("could not reach the server: {0}")]
  Transport(#[source] reqwest::Error),

  #[error("{}", status_message(.status, .detail))]
  Status { status: u16, detail: Option<String> },

  #[error("unexpected response from the server: {0}")]
  Decode(String),

  #[error("invalid request: {0}")]
  Request(String),
}

fn status_message(status: &u16, detail: &Option<String>) -> String {
  match detail {
    Some(detail) => detail.clone(),
    None => format!("server returned HTTP {}", status),
  }
}

impl GatewayError {
  /// The backend could not be reached at all.
  pub fn is_unreachable(&self) -> bool {
    matches!(self, GatewayError::Timeout(_) | GatewayError::Transport(_))
  }

  /// Reason text of an authoritative 4xx rejection.
  pub fn rejection(&self) -> Option<&str> {
    match self {
      GatewayError::Status {
        status,
        detail: Some(detail),
      } if (400..500).contains(status) => Some(detail),
      _ => None,
    }
  }
}

impl FetchError for GatewayError {
  fn allows_fallback(&self) -> bool {
    match self {
      GatewayError::Timeout(_) | GatewayError::Transport(_) | GatewayError::Decode(_) => true,
      GatewayError::Status { .. } => self.rejection().is_none(),
      GatewayError::Request(_) => false,
    }
  }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Request payload.
pub enum Payload<'a> {
  Empty,
  Json(serde_json::Value),
  /// Multipart upload of one file under the given form field
  File {
    field: &'a str,
    image: &'a DiseaseImage,
  },
}

/// Timed request gateway for the CropDoctor backend.
///
/// Every exchange (connect, send, read body) runs under one deadline;
/// exceeding it drops the in-flight request. No retries.
#[derive(Clone)]
pub struct Gateway {
  http: reqwest::Client,
  base_url: String,
  timeout: Duration,
  token: Arc<RwLock<Option<String>>>,
}

impl Gateway {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
    let parsed =
      Url::parse(base_url).map_err(|e| eyre!("Invalid API url {}: {}", base_url, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
      return Err(eyre!("API url must be http or https: {}", base_url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("cropdoc/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      timeout,
      token: Arc::new(RwLock::new(None)),
    })
  }

  pub fn set_token(&self, token: Option<String>) {
    match self.token.write() {
      Ok(mut slot) => *slot = token,
      Err(e) => warn!(error = %e, "token lock poisoned"),
    }
  }

  pub fn token(&self) -> Option<String> {
    self.token.read().ok().and_then(|t| t.clone())
  }

  fn url(&self, endpoint: &str) -> GatewayResult<Url> {
    let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
    Url::parse(&raw).map_err(|e| GatewayError::Request(format!("{}: {}", raw, e)))
  }

  /// Perform one exchange and return the raw success body.
  pub async fn send(
    &self,
    method: Method,
    endpoint: &str,
    query: &[(&str, &str)],
    payload: Payload<'_>,
  ) -> GatewayResult<Vec<u8>> {
    let url = self.url(endpoint)?;
    let mut request = self.http.request(method.clone(), url);
    if !query.is_empty() {
      request = request.query(query);
    }
    if let Some(token) = self.token() {
      request = request.bearer_auth(token);
    }
    request = match payload {
      Payload::Empty => request,
      Payload::Json(body) => request.json(&body),
      Payload::File { field, image } => {
        let part = multipart::Part::bytes(image.bytes.clone())
          .file_name(image.file_name.clone())
          .mime_str(&image.content_type)
          .map_err(|e| GatewayError::Request(format!("content type: {}", e)))?;
        request.multipart(multipart::Form::new().part(field.to_string(), part))
      }
    };

    let started = Instant::now();
    debug!(%method, endpoint, "request");

    let exchange = async {
      let response = request.send().await.map_err(GatewayError::Transport)?;
      let status = response.status();
      let body = response.bytes().await.map_err(GatewayError::Transport)?;
      Ok::<_, GatewayError>((status, body))
    };

    let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
      Ok(result) => result,
      Err(_) => {
        warn!(%method, endpoint, timeout_secs = self.timeout.as_secs(), "request timed out");
        Err(GatewayError::Timeout(self.timeout))
      }
    }
    .inspect_err(|e| debug!(%method, endpoint, error = %e, "request failed"))?;

    debug!(
      %method,
      endpoint,
      status = status.as_u16(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "response"
    );

    if !status.is_success() {
      return Err(status_error(status, &body));
    }
    Ok(body.to_vec())
  }

  pub async fn get_json<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    query: &[(&str, &str)],
  ) -> GatewayResult<T> {
    let body = self.send(Method::GET, endpoint, query, Payload::Empty).await?;
    decode(&body)
  }

  pub async fn post_json<B: Serialize, T: DeserializeOwned>(
    &self,
    endpoint: &str,
    body: &B,
  ) -> GatewayResult<T> {
    let json = serde_json::to_value(body)
      .map_err(|e| GatewayError::Request(format!("body: {}", e)))?;
    let body = self.send(Method::POST, endpoint, &[], Payload::Json(json)).await?;
    decode(&body)
  }

  /// POST without a body.
  pub async fn post_empty<T: DeserializeOwned>(&self, endpoint: &str) -> GatewayResult<T> {
    let body = self.send(Method::POST, endpoint, &[], Payload::Empty).await?;
    decode(&body)
  }

  pub async fn post_multipart<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    field: &str,
    image: &DiseaseImage,
  ) -> GatewayResult<T> {
    let body = self
      .send(Method::POST, endpoint, &[], Payload::File { field, image })
      .await?;
    decode(&body)
  }

  /// Whether the backend answers its health check within the deadline.
  pub async fn health(&self) -> bool {
    match self.send(Method::GET, "/api/health", &[], Payload::Empty).await {
      Ok(_) => true,
      Err(e) => {
        debug!(error = %e, "health check failed");
        false
      }
    }
  }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> GatewayResult<T> {
  serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn status_error(status: StatusCode, body: &[u8]) -> GatewayError {
  let detail = serde_json::from_slice::<ApiErrorBody>(body)
    .ok()
    .and_then(|b| b.message());
  GatewayError::Status {
    status: status.as_u16(),
    detail,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::test_support::{unreachable_url, MockServer, Route};

  #[derive(Debug, serde::Deserialize, PartialEq)]
  struct Health {
    status: String,
  }

  fn gateway(url: &str) -> Gateway {
    Gateway::new(url, Duration::from_secs(2)).unwrap()
  }

  #[test]
  fn test_rejects_bad_base_url() {
    assert!(Gateway::new("not a url", Duration::from_secs(1)).is_err());
    assert!(Gateway::new("ftp://example.com", Duration::from_secs(1)).is_err());
  }

  #[test]
  fn test_fallback_policy() {
    let rejected = GatewayError::Status {
      status: 400,
      detail: Some("Invalid crop".into()),
    };
    assert!(!rejected.allows_fallback());
    assert_eq!(rejected.rejection(), Some("Invalid crop"));
    assert_eq!(rejected.to_string(), "Invalid crop");

    let bare_4xx = GatewayError::Status {
      status: 404,
      detail: None,
    };
    assert!(bare_4xx.allows_fallback());

    let server = GatewayError::Status {
      status: 500,
      detail: Some("Image analysis failed".into()),
    };
    assert!(server.allows_fallback());
    assert!(server.rejection().is_none());

    assert!(GatewayError::Timeout(Duration::from_secs(8)).allows_fallback());
    assert!(GatewayError::Decode("eof".into()).allows_fallback());
    assert!(!GatewayError::Request("bad".into()).allows_fallback());
  }

  #[tokio::test]
  async fn test_get_json_decodes_body() {
    let server = MockServer::start(vec![Route::json(
      "GET",
      "/api/health",
      200,
      r#"{"status":"healthy"}"#,
    )])
    .await;

    let health: Health = gateway(&server.url).get_json("/api/health", &[]).await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(server.hits(), 1);
  }

  #[tokio::test]
  async fn test_bearer_token_attached_when_present() {
    let server = MockServer::start(vec![Route::json("GET", "/api/health", 200, "{}")]).await;
    let gw = gateway(&server.url);

    gw.send(Method::GET, "/api/health", &[], Payload::Empty).await.unwrap();
    gw.set_token(Some("tok123".into()));
    gw.send(Method::GET, "/api/health", &[], Payload::Empty).await.unwrap();

    let requests = server.requests();
    assert!(requests[0].header("authorization").is_none());
    assert_eq!(requests[1].header("authorization").as_deref(), Some("Bearer tok123"));
  }

  #[tokio::test]
  async fn test_query_is_encoded() {
    let server = MockServer::start(vec![Route::json("GET", "/api/weather", 200, "{}")]).await;
    gateway(&server.url)
      .send(Method::GET, "/api/weather", &[("location", "New Delhi")], Payload::Empty)
      .await
      .unwrap();
    assert_eq!(server.requests()[0].target, "/api/weather?location=New+Delhi");
  }

  #[tokio::test]
  async fn test_status_with_detail() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/auth/login",
      401,
      r#"{"detail":"Invalid credentials. User not found."}"#,
    )])
    .await;

    let err = gateway(&server.url)
      .post_json::<_, serde_json::Value>("/api/auth/login", &serde_json::json!({}))
      .await
      .unwrap_err();
    assert_eq!(err.rejection(), Some("Invalid credentials. User not found."));
  }

  #[tokio::test]
  async fn test_undecodable_success_body() {
    let server = MockServer::start(vec![Route::json("GET", "/api/health", 200, "<html>")]).await;
    let err = gateway(&server.url)
      .get_json::<Health>("/api/health", &[])
      .await
      .unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
  }

  #[tokio::test]
  async fn test_timeout_drops_request() {
    let server = MockServer::start(vec![Route::json("GET", "/api/health", 200, "{}")
      .delayed(Duration::from_secs(5))])
    .await;
    let gw = Gateway::new(&server.url, Duration::from_millis(150)).unwrap();

    let started = Instant::now();
    let err = gw.get_json::<serde_json::Value>("/api/health", &[]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Timeout(_)));
    assert!(err.is_unreachable());
    assert!(started.elapsed() < Duration::from_secs(2));
  }

  #[tokio::test]
  async fn test_connection_refused_is_transport() {
    let gw = gateway(&unreachable_url().await);
    let err = gw.get_json::<serde_json::Value>("/api/health", &[]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
    assert!(!gw.health().await);
  }

  #[tokio::test]
  async fn test_multipart_upload() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/disease/detect",
      200,
      r#"{"ok":true}"#,
    )])
    .await;
    let image = DiseaseImage {
      file_name: "leaf.png".into(),
      content_type: "image/png".into(),
      bytes: vec![0x89, b'P', b'N', b'G'],
    };

    let _: serde_json::Value = gateway(&server.url)
      .post_multipart("/api/disease/detect", "file", &image)
      .await
      .unwrap();

    let request = &server.requests()[0];
    assert!(request
      .header("content-type")
      .is_some_and(|ct| ct.starts_with("multipart/form-data")));
    assert!(request.body_text().contains("name=\"file\""));
    assert!(request.body_text().contains("filename=\"leaf.png\""));
  }
}
