//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use plugin_freshness::freshness::cache::{LookupStore, SqliteStore};
use plugin_freshness::freshness::clock::ManualClock;
use plugin_freshness::freshness::error::RegistryError;
use plugin_freshness::freshness::registry::Registry;
use plugin_freshness::freshness::resolver::StalenessResolver;
use plugin_freshness::freshness::types::Lookup;

/// Registry answering from a fixed table and counting every fetch
#[derive(Default)]
pub struct CountingRegistry {
    answers: HashMap<String, Answer>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

#[derive(Clone)]
enum Answer {
    Found(String),
    NotFound,
    Fail,
}

impl CountingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_updated(mut self, slug: &str, last_updated: &str) -> Self {
        self.answers
            .insert(slug.to_string(), Answer::Found(last_updated.to_string()));
        self
    }

    pub fn with_not_found(mut self, slug: &str) -> Self {
        self.answers.insert(slug.to_string(), Answer::NotFound);
        self
    }

    pub fn with_failure(mut self, slug: &str) -> Self {
        self.answers.insert(slug.to_string(), Answer::Fail);
        self
    }

    /// Make every fetch take `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for CountingRegistry {
    async fn fetch_last_updated(&self, slug: &str) -> Result<Lookup, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.answers.get(slug) {
            Some(Answer::Found(last_updated)) => Ok(Lookup::Found(last_updated.clone())),
            Some(Answer::NotFound) | None => Ok(Lookup::NotFound),
            Some(Answer::Fail) => Err(RegistryError::Status(503)),
        }
    }
}

/// 2025-06-01T00:00:00Z
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

/// Create a SQLite-backed store in a temporary directory
pub fn create_test_store() -> (TempDir, Arc<SqliteStore>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::new(&db_path).unwrap();
    (temp_dir, Arc::new(store))
}

/// Create a resolver over `registry` and `store` with a manual clock at `start_time()`
pub fn create_test_resolver(
    registry: Arc<CountingRegistry>,
    store: Arc<dyn LookupStore>,
) -> (StalenessResolver, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let resolver = StalenessResolver::new(registry, store, clock.clone());
    (resolver, clock)
}
