//! Generic TTL cache shared by the upstream clients and the API response
//! layer. Entries are retained after expiry: a fresh read ignores them, but
//! the stale read path lets a caller fall back to the last known payload
//! when a live refresh fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};

/// Time source for TTL decisions. Injected so tests can expire entries
/// without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: starts at a fixed instant and only moves
/// when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    stored_at: DateTime<Utc>,
}

pub struct TtlCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_system_clock(ttl_secs: u64) -> Self {
        Self::new(ttl_secs, Arc::new(SystemClock))
    }

    /// Entry younger than the TTL, or nothing.
    pub fn get_fresh(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().expect("cache lock poisoned");
        let entry = entries.get(key)?;
        if self.clock.now() - entry.stored_at < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Entry of any age. Only for failure fallback, never for a normal read.
    pub fn get_stale(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().expect("cache lock poisoned");
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: &str, value: T) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(key.to_owned(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical cache key for a query: filters sorted by name so parameter
/// order never splits one logical query across two slots.
pub fn cache_key(endpoint: &str, filters: &[(&str, String)]) -> String {
    if filters.is_empty() {
        return endpoint.to_owned();
    }
    let mut pairs: Vec<&(&str, String)> = filters.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(&b.1)));
    let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{endpoint}?{}", query.join("&"))
}
