//! Key-value result cache with TTL, and the best-effort layer around it.
//!
//! Derived artifacts (alias tables, mission indexes, parameter maps) are
//! memoized by string key. The backing store is injected as an
//! `Arc<dyn KvCache>` so the core never reaches for a process-wide singleton
//! and tests can substitute an in-memory or deliberately failing cache.
//!
//! The store is treated as unreliable: [`CacheLayer`] swallows every
//! [`CacheError`] (logging it at `warn`) and reports a miss, so the caller
//! simply rebuilds from source. Values are serialized to JSON before the
//! single `put`, so a reader never observes a partially built value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures reported by a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached or its state is unusable.
    #[error("cache unavailable: {details}")]
    Unavailable { details: String },
}

// ---------------------------------------------------------------------------
// KvCache
// ---------------------------------------------------------------------------

/// A string key-value store with per-entry time-to-live.
pub trait KvCache: Send + Sync {
    /// Fetch a live entry.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key` for `ttl`. A zero TTL stores nothing and
    /// drops any existing entry.
    fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Drop an entry if present.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// A mutex-guarded in-process [`KvCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries.lock().map_err(|e| CacheError::Unavailable {
            details: e.to_string(),
        })
    }
}

impl KvCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        if ttl.is_zero() {
            entries.remove(key);
            return Ok(());
        }
        entries.insert(
            key.to_owned(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CacheLayer
// ---------------------------------------------------------------------------

/// Best-effort JSON memoization over an optional [`KvCache`].
///
/// Every failure (backend error, undecodable payload, unserializable value)
/// degrades to a miss or a skipped write. A layer built with
/// [`CacheLayer::disabled`] always misses.
#[derive(Clone, Default)]
pub struct CacheLayer {
    backend: Option<Arc<dyn KvCache>>,
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("enabled", &self.backend.is_some())
            .finish()
    }
}

impl CacheLayer {
    /// Wrap a cache backend.
    pub fn new(backend: Arc<dyn KvCache>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A layer with no backend; every lookup misses.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Returns `true` if a backend is attached.
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Fetch and decode a cached value.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;
        let raw = match backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "cache get failed -- rebuilding from source");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cached payload undecodable -- rebuilding from source");
                None
            }
        }
    }

    /// Encode and store a fully built value.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "value not serializable -- skipping cache put");
                return;
            }
        };
        if let Err(e) = backend.put(key, raw, ttl) {
            warn!(key = %key, error = %e, "cache put failed");
        }
    }

    /// Drop a cached value.
    pub fn remove(&self, key: &str) {
        if let Some(backend) = self.backend.as_ref() {
            if let Err(e) = backend.remove(key) {
                warn!(key = %key, error = %e, "cache remove failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
