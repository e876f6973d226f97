//! In-process HTTP responder for gateway and service tests.
//!
//! An axum router whose fallback answers every request from a list of
//! canned routes. Every request is recorded for assertions.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct Route {
  method: String,
  path: String,
  status: u16,
  body: String,
  delay: Option<Duration>,
}

impl Route {
  pub fn json(method: &str, path: &str, status: u16, body: &str) -> Self {
    Self {
      method: method.to_string(),
      path: path.to_string(),
      status,
      body: body.to_string(),
      delay: None,
    }
  }

  /// Hold the response back; used to trip client deadlines.
  pub fn delayed(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
  pub method: String,
  /// Path plus query string
  pub target: String,
  headers: HeaderMap,
  body: Bytes,
}

impl RecordedRequest {
  pub fn header(&self, name: &str) -> Option<String> {
    self
      .headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string)
  }

  pub fn path(&self) -> &str {
    self.target.split('?').next().unwrap_or_default()
  }

  pub fn body_text(&self) -> String {
    String::from_utf8_lossy(&self.body).to_string()
  }

  pub fn json(&self) -> serde_json::Value {
    serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
  }
}

struct ServerState {
  routes: Vec<Route>,
  requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockServer {
  pub url: String,
  state: Arc<ServerState>,
  task: JoinHandle<()>,
}

impl MockServer {
  pub async fn start(routes: Vec<Route>) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let state = Arc::new(ServerState {
      routes,
      requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
      .fallback(respond)
      .with_state(Arc::clone(&state));
    let task = tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });

    Self { url, state, task }
  }

  pub fn requests(&self) -> Vec<RecordedRequest> {
    self.state.requests.lock().unwrap().clone()
  }

  pub fn hits(&self) -> usize {
    self.state.requests.lock().unwrap().len()
  }

  pub fn hits_for(&self, path: &str) -> usize {
    self
      .state
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.path() == path)
      .count()
  }
}

impl Drop for MockServer {
  fn drop(&mut self) {
    self.task.abort();
  }
}

/// URL of a port nothing listens on.
pub async fn unreachable_url() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{}", addr)
}

async fn respond(
  State(state): State<Arc<ServerState>>,
  method: Method,
  uri: Uri,
  headers: HeaderMap,
  body: Bytes,
) -> Response {
  let request = RecordedRequest {
    method: method.to_string(),
    target: uri
      .path_and_query()
      .map(|pq| pq.as_str().to_string())
      .unwrap_or_else(|| uri.path().to_string()),
    headers,
    body,
  };

  let route = state
    .routes
    .iter()
    .find(|r| r.method == request.method && r.path == request.path())
    .cloned();
  state.requests.lock().unwrap().push(request);

  let (status, body) = match route {
    Some(route) => {
      if let Some(delay) = route.delay {
        tokio::time::sleep(delay).await;
      }
      let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, route.body)
    }
    None => (StatusCode::NOT_FOUND, r#"{"detail":"Not Found"}"#.to_string()),
  };
  (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
