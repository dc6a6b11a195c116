//! Scoped storage of computed tables between an upload and its follow-up queries.
//!
//! Entries expire `ttl_secs` after insertion. When full, inserting evicts
//! expired entries first and then the oldest live entry.

use counter_aggregation::DenseTable;
use counter_core::{Error, Lookup, Result, Second, SessionConfig};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(SessionId)
            .map_err(|_| Error::session_not_found(s))
    }
}

#[derive(Debug)]
struct Entry {
    table: Arc<DenseTable>,
    inserted_at: Instant,
}

/// Thread-safe map from session id to an immutable table.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    max_sessions: usize,
    entries: RwLock<HashMap<SessionId, Entry>>,
}

impl SessionStore {
    /// Create a new store.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
            max_sessions: config.max_sessions.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a table and return its new session id.
    pub fn insert(&self, table: DenseTable) -> SessionId {
        self.insert_at(table, Instant::now())
    }

    /// Store a table as of `now`.
    pub fn insert_at(&self, table: DenseTable, now: Instant) -> SessionId {
        let mut entries = self.write();
        let expired = Self::purge(&mut entries, self.ttl, now);

        let mut displaced = 0;
        while entries.len() >= self.max_sessions {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    entries.remove(&id);
                    displaced += 1;
                }
                None => break,
            }
        }

        let id = SessionId::new();
        entries.insert(
            id,
            Entry {
                table: Arc::new(table),
                inserted_at: now,
            },
        );
        debug!(session = %id, expired, displaced, live = entries.len(), "stored session table");
        id
    }

    /// Table for a live session.
    pub fn get(&self, id: &SessionId) -> Result<Arc<DenseTable>> {
        self.get_at(id, Instant::now())
    }

    /// Table for a session that is live as of `now`.
    pub fn get_at(&self, id: &SessionId, now: Instant) -> Result<Arc<DenseTable>> {
        let entries = self.read();
        match entries.get(id) {
            Some(entry) if !is_expired(entry, self.ttl, now) => Ok(Arc::clone(&entry.table)),
            _ => Err(Error::session_not_found(id.to_string())),
        }
    }

    /// Point lookup within a session's table.
    pub fn lookup(&self, id: &SessionId, second: Second) -> Result<Lookup> {
        Ok(self.get(id)?.lookup(second))
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.write().remove(id).is_some()
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    /// Drop sessions expired as of `now`.
    pub fn evict_expired_at(&self, now: Instant) -> usize {
        let removed = Self::purge(&mut self.write(), self.ttl, now);
        if removed > 0 {
            info!(removed, "evicted expired sessions");
        }
        removed
    }

    /// Number of stored sessions, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn purge(entries: &mut HashMap<SessionId, Entry>, ttl: Duration, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, e| !is_expired(e, ttl, now));
        before - entries.len()
    }

    // Every mutation completes before the guard drops, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Entry>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Entry>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

fn is_expired(entry: &Entry, ttl: Duration, now: Instant) -> bool {
    now.saturating_duration_since(entry.inserted_at) >= ttl
}
