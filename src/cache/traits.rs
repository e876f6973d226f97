//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
#[cfg(test)]
use std::sync::Mutex;

/// A request that can be looked up in the cache.
///
/// Keys are held across the fetch, so they must be shareable with the
/// task running it.
pub trait QueryKey: Send + Sync {
  /// Stable, fixed-length key derived from the request's semantic fields
  fn cache_hash(&self) -> String;

  /// Human-readable description for logs
  fn description(&self) -> String;
}

/// Errors from a fetch that may be replaced by a locally estimated value.
pub trait FetchError: std::fmt::Display {
  /// Whether the caller should fall back instead of surfacing the error
  fn allows_fallback(&self) -> bool;
}

/// Source of "now" for TTL checks.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self {
      now: Mutex::new(start),
    }
  }

  pub fn advance(&self, by: chrono::Duration) {
    if let Ok(mut now) = self.now.lock() {
      *now += by;
    }
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
  }
}

/// A value together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: DataSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> Sourced<T> {
  /// Fresh data from the backend.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: DataSource::Network,
      cached_at: None,
    }
  }

  /// Data served from a still-valid cache entry.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: DataSource::Cache,
      cached_at: Some(cached_at),
    }
  }

  /// Locally estimated stand-in for an unreachable backend.
  pub fn estimated(data: T) -> Self {
    Self {
      data,
      source: DataSource::Estimated,
      cached_at: None,
    }
  }

  #[cfg(test)]
  pub fn is_estimated(&self) -> bool {
    self.source == DataSource::Estimated
  }
}

/// Indicates where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
  /// Backend-verified result
  Network,
  /// Backend result served from the cache
  Cache,
  /// Backend unreachable, value computed locally
  Estimated,
}

impl DataSource {
  pub fn label(&self) -> &'static str {
    match self {
      DataSource::Network => "live",
      DataSource::Cache => "cached",
      DataSource::Estimated => "estimated",
    }
  }
}
