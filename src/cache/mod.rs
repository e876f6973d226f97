//! Response caching with a fixed time-to-live.
//!
//! This module is backend-agnostic:
//! - Stores serialized values under a hashed request key
//! - Serves a value only while it is younger than the TTL; expired entries are
//!   misses and get overwritten by the next write
//! - Writes through successful fetches only, so a locally estimated value is
//!   never pinned in the cache

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
#[cfg(test)]
pub use storage::MemoryStorage;
pub use storage::Storage;
pub use traits::{DataSource, FetchError, QueryKey, Sourced};
