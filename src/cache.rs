use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::card::CardTable;
use crate::error::Result;

/// Identity of a fetch: the same token, pipe and page size always yield the same table.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    token: String,
    pub pipe_id: String,
    pub page_size: u32,
}

impl CacheKey {
    pub fn new(token: impl Into<String>, pipe_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            token: token.into(),
            pipe_id: pipe_id.into(),
            page_size,
        }
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field("token", &"<redacted>")
            .field("pipe_id", &self.pipe_id)
            .field("page_size", &self.page_size)
            .finish()
    }
}

struct Entry {
    table: Arc<CardTable>,
    fetched_at: Instant,
}

type Slot = Arc<Mutex<Option<Entry>>>;
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Process-local memoization of card tables, invalidated purely by age.
///
/// Expiry is checked when an entry is read. Each key has its own lock, held
/// across the fetch, so concurrent callers for one key wait for a single
/// fetch instead of issuing duplicates.
pub struct CardCache {
    ttl: Duration,
    clock: Clock,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl CardCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(Instant::now))
    }

    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached table for `key`, or run `fetch` and remember its result.
    /// Errors are returned to the caller and never cached.
    pub fn get_or_fetch<F>(&self, key: &CacheKey, fetch: F) -> Result<Arc<CardTable>>
    where
        F: FnOnce() -> Result<CardTable>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(key.clone()).or_default().clone()
        };
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = entry.as_ref() {
            let age = (self.clock)().saturating_duration_since(cached.fetched_at);
            if age < self.ttl {
                debug!(?key, age_ms = age.as_millis() as u64, "card cache hit");
                return Ok(cached.table.clone());
            }
            debug!(?key, "card cache entry expired");
            *entry = None;
        }

        let table = Arc::new(fetch()?);
        *entry = Some(Entry {
            table: table.clone(),
            fetched_at: (self.clock)(),
        });
        debug!(?key, cards = table.len(), "card cache filled");
        Ok(table)
    }

    pub fn invalidate(&self, key: &CacheKey) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Number of keys currently holding a table, expired or not.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
