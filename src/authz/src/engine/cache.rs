//! TTL decision cache
//!
//! The cache carries no lock of its own; it lives inside the engine state
//! and is guarded by the engine's read-write lock. Expired entries are only
//! removed by an explicit sweep, which the engine runs after a write once
//! the cache grows past its sweep threshold.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::decision::Decision;
use crate::types::AccessRequest;

/// Cache key. Attribute values are deliberately not part of the key, so a
/// cached decision outlives attribute changes until it expires.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub user_id: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
}

impl CacheKey {
    pub fn from_request(request: &AccessRequest) -> Self {
        Self {
            user_id: request.subject.user_id.clone(),
            action: request.action.as_str().to_string(),
            resource_type: request.resource.resource_type.clone(),
            resource_id: request.resource.id.clone(),
        }
    }
}

/// Decision with an absolute expiry
#[derive(Debug, Clone)]
pub struct CachedDecision {
    pub decision: Decision,
    pub expires_at: Instant,
}

impl CachedDecision {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Decision cache with lazy sweep-on-write cleanup
#[derive(Debug)]
pub struct DecisionCache {
    entries: HashMap<CacheKey, CachedDecision>,
    ttl: Duration,
    sweep_threshold: usize,
}

impl DecisionCache {
    pub fn new(ttl: Duration, sweep_threshold: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            sweep_threshold,
        }
    }

    /// Unexpired decision for `key`, if any
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<&Decision> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| &entry.decision)
    }

    /// Store a decision expiring `ttl` after `now`. Returns the number of
    /// expired entries swept if the cache grew past the threshold.
    pub fn insert(&mut self, key: CacheKey, decision: Decision, now: Instant) -> usize {
        self.entries.insert(
            key,
            CachedDecision {
                decision,
                expires_at: now + self.ttl,
            },
        );

        if self.entries.len() > self.sweep_threshold {
            self.sweep_expired(now)
        } else {
            0
        }
    }

    /// Remove every expired entry
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Drop all entries for one subject
    pub fn invalidate_user(&mut self, user_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.user_id != user_id);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self, now: Instant) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            expired: self.entries.values().filter(|e| e.is_expired(now)).count(),
            sweep_threshold: self.sweep_threshold,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    /// Entries past their expiry that have not been swept yet
    pub expired: usize,
    pub sweep_threshold: usize,
}
