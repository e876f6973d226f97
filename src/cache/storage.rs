//! Cache storage trait and in-memory implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// A stored value with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  /// Serialized value
  pub value: serde_json::Value,
  /// When the value was stored
  pub stored_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Storage never judges freshness; the layer compares `stored_at` with its TTL.
pub trait CacheStorage: Send + Sync {
  /// Get the entry for a key, fresh or not.
  fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

  /// Store an entry, overwriting any previous one for the key.
  fn put(&self, key: &str, entry: CacheEntry) -> Result<()>;

  /// Drop every entry.
  fn clear(&self) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Result<Option<CacheEntry>> {
    Ok(None)
  }

  fn put(&self, _key: &str, _entry: CacheEntry) -> Result<()> {
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    Ok(())
  }
}

/// Process-local storage; entries do not survive a restart.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.get(key).cloned())
  }

  fn put(&self, key: &str, entry: CacheEntry) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.insert(key.to_string(), entry);
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.clear();
    Ok(())
  }
}

/// Storage selected at runtime from configuration.
pub enum Storage {
  Memory(MemoryStorage),
  Noop(NoopStorage),
}

impl Storage {
  pub fn from_enabled(enabled: bool) -> Self {
    if enabled {
      Storage::Memory(MemoryStorage::new())
    } else {
      Storage::Noop(NoopStorage)
    }
  }
}

impl CacheStorage for Storage {
  fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
    match self {
      Storage::Memory(s) => s.get(key),
      Storage::Noop(s) => s.get(key),
    }
  }

  fn put(&self, key: &str, entry: CacheEntry) -> Result<()> {
    match self {
      Storage::Memory(s) => s.put(key, entry),
      Storage::Noop(s) => s.put(key, entry),
    }
  }

  fn clear(&self) -> Result<()> {
    match self {
      Storage::Memory(s) => s.clear(),
      Storage::Noop(s) => s.clear(),
    }
  }
}
