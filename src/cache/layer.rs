//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::storage::{CacheEntry, CacheStorage};
use super::traits::{Clock, FetchError, QueryKey, Sourced, SystemClock};

/// One lock per key hash with a fetch in flight
type Flights = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the services and the gateway. Only successful
/// remote results are written; estimates produced on failure never are.
/// Concurrent fetches of the same key are serialized, so identical requests
/// reach the backend once per TTL window.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// How long a stored value may be served
  ttl: Duration,
  clock: Arc<dyn Clock>,
  flights: Arc<Flights>,
  /// Bumped by `clear`. Writes are checked against it under this lock, so a
  /// fetch that started before a clear never repopulates the cache.
  generation: Arc<Mutex<u64>>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      ttl: Duration::minutes(5),
      clock: Arc::new(SystemClock),
      flights: Arc::new(Mutex::new(HashMap::new())),
      generation: Arc::new(Mutex::new(0)),
    }
  }

  /// Set the time-to-live for cached data.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Replace the clock used for TTL checks.
  #[cfg(test)]
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// An entry is valid only while `now - stored_at < ttl`.
  fn is_valid(&self, stored_at: DateTime<Utc>) -> bool {
    self.clock.now() - stored_at < self.ttl
  }

  /// Get a still-valid value. Expired, absent and undecodable entries are misses.
  pub fn get<T: DeserializeOwned>(&self, key: &dyn QueryKey) -> Result<Option<Sourced<T>>> {
    let Some(entry) = self.storage.get(&key.cache_hash())? else {
      return Ok(None);
    };

    if !self.is_valid(entry.stored_at) {
      return Ok(None);
    }

    match serde_json::from_value(entry.value) {
      Ok(data) => Ok(Some(Sourced::from_cache(data, entry.stored_at))),
      Err(e) => {
        warn!(query = %key.description(), error = %e, "discarding undecodable cache entry");
        Ok(None)
      }
    }
  }

  /// Store a value, overwriting whatever the slot held.
  pub fn put<T: Serialize>(&self, key: &dyn QueryKey, value: &T) -> Result<()> {
    let generation = self.current_generation()?;
    self.put_if_current(key, value, generation)
  }

  /// Drop every cached value. Fetches already in flight will not write back.
  pub fn clear(&self) -> Result<()> {
    let mut generation = self
      .generation
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    *generation += 1;
    self.storage.clear()
  }

  fn current_generation(&self) -> Result<u64> {
    self
      .generation
      .lock()
      .map(|g| *g)
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Write unless the cache was cleared since `generation` was read.
  fn put_if_current<T: Serialize>(&self, key: &dyn QueryKey, value: &T, generation: u64) -> Result<()> {
    let value =
      serde_json::to_value(value).map_err(|e| eyre!("Failed to serialize cache value: {}", e))?;

    let current = self
      .generation
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    if *current != generation {
      debug!(query = %key.description(), "cache cleared during fetch, dropping result");
      return Ok(());
    }
    self.storage.put(
      &key.cache_hash(),
      CacheEntry {
        value,
        stored_at: self.clock.now(),
      },
    )
  }

  /// Cached value for the key, logging the outcome. Storage errors are misses.
  fn lookup<T: DeserializeOwned>(&self, key: &dyn QueryKey) -> Option<Sourced<T>> {
    match self.get::<T>(key) {
      Ok(Some(hit)) => {
        debug!(query = %key.description(), "cache hit");
        Some(hit)
      }
      Ok(None) => {
        debug!(query = %key.description(), "cache miss");
        None
      }
      Err(e) => {
        warn!(query = %key.description(), error = %e, "cache read failed");
        None
      }
    }
  }

  fn flight(&self, hash: &str) -> Result<Arc<tokio::sync::Mutex<()>>> {
    let mut flights = self
      .flights
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(Arc::clone(flights.entry(hash.to_string()).or_default()))
  }

  /// Forget the key's lock once no other caller holds it.
  fn end_flight(&self, hash: &str, flight: Arc<tokio::sync::Mutex<()>>) {
    drop(flight);
    if let Ok(mut flights) = self.flights.lock() {
      if flights.get(hash).is_some_and(|f| Arc::strong_count(f) == 1) {
        flights.remove(hash);
      }
    }
  }

  /// Fetch with cache-first strategy and local fallback.
  ///
  /// 1. Valid cache entry - return it without calling the fetcher
  /// 2. Otherwise wait for any in-flight fetch of the same key and check again
  /// 3. Fetch; on success write through and return
  /// 4. On a failure that allows fallback, return the estimate (not cached)
  /// 5. Any other failure is returned to the caller
  ///
  /// Cache storage errors are logged and treated as misses.
  pub async fn fetch_or_estimate<T, E, F, Fut, G>(
    &self,
    key: &dyn QueryKey,
    fetcher: F,
    estimate: G,
  ) -> std::result::Result<Sourced<T>, E>
  where
    T: Serialize + DeserializeOwned,
    E: FetchError,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    G: FnOnce() -> T,
  {
    if let Some(hit) = self.lookup(key) {
      return Ok(hit);
    }

    let hash = key.cache_hash();
    let flight = match self.flight(&hash) {
      Ok(flight) => flight,
      Err(e) => {
        warn!(query = %key.description(), error = %e, "fetching without key lock");
        return self.fetch_and_store(key, fetcher, estimate).await;
      }
    };

    let result = {
      let _guard = flight.lock().await;
      match self.lookup(key) {
        Some(hit) => Ok(hit),
        None => self.fetch_and_store(key, fetcher, estimate).await,
      }
    };
    self.end_flight(&hash, flight);
    result
  }

  async fn fetch_and_store<T, E, F, Fut, G>(
    &self,
    key: &dyn QueryKey,
    fetcher: F,
    estimate: G,
  ) -> std::result::Result<Sourced<T>, E>
  where
    T: Serialize,
    E: FetchError,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    G: FnOnce() -> T,
  {
    let generation = self.current_generation();

    match fetcher().await {
      Ok(data) => {
        let stored = generation.and_then(|g| self.put_if_current(key, &data, g));
        if let Err(e) = stored {
          warn!(query = %key.description(), error = %e, "cache write failed");
        }
        Ok(Sourced::from_network(data))
      }
      Err(e) if e.allows_fallback() => {
        info!(query = %key.description(), error = %e, "backend unavailable, using estimate");
        Ok(Sourced::estimated(estimate()))
      }
      Err(e) => Err(e),
    }
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
      clock: Arc::clone(&self.clock),
      flights: Arc::clone(&self.flights),
      generation: Arc::clone(&self.generation),
    }
  }
}
