//! Cache-through lookup and staleness resolution
//!
//! This is the entry point every report surface calls. Failures never escape
//! as errors: they come back as [`LookupStatus::Failed`] and are logged here.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::TimeDelta;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_CACHE_TTL_SECS;
use crate::freshness::cache::{LookupStore, cache_key};
use crate::freshness::clock::Clock;
use crate::freshness::error::RegistryError;
use crate::freshness::registry::Registry;
use crate::freshness::staleness::StalenessPolicy;
use crate::freshness::types::{Lookup, LookupResult, LookupStatus};
use crate::plugin::types::PluginInfo;

/// Resolved state of one plugin, ready for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Display name
    pub name: String,
    pub slug: String,
    pub status: LookupStatus,
    /// Last-updated value, present only when `status` is `Found`
    pub raw_timestamp: Option<String>,
    /// Present only when `status` is `Found`
    pub is_stale: Option<bool>,
}

impl Resolution {
    pub fn is_stale(&self) -> bool {
        self.is_stale == Some(true)
    }
}

/// Return the live store entry for `slug`, or run `fetch` and store its answer.
///
/// Store errors are logged and otherwise ignored: an unreadable store behaves
/// like a miss and an unwritable one still yields the fetched value. Fetch
/// errors are never stored, so the next call fetches again.
pub async fn get_or_fetch<F, Fut>(
    store: &dyn LookupStore,
    clock: &dyn Clock,
    ttl: TimeDelta,
    slug: &str,
    fetch: F,
) -> LookupResult
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Lookup, RegistryError>>,
{
    let key = cache_key(slug);

    let cached = store
        .get(&key, clock.now())
        .inspect_err(|e| warn!("Failed to read cached lookup for {}: {}", slug, e))
        .ok()
        .flatten();

    if let Some(lookup) = cached {
        debug!("Cache hit for {}", slug);
        return lookup.into();
    }
    debug!("Cache miss for {}", slug);

    match fetch().await {
        Ok(lookup) => {
            let _ = store
                .set(&key, &lookup, ttl, clock.now())
                .inspect(|_| info!("Cached lookup for {}: {:?}", slug, lookup))
                .inspect_err(|e| error!("Failed to cache lookup for {}: {}", slug, e));
            lookup.into()
        }
        Err(e) => {
            warn!("Failed to fetch last-updated date for {}: {}", slug, e);
            LookupResult::Failed
        }
    }
}

/// Composes the registry, the lookup store and the staleness rule
pub struct StalenessResolver {
    registry: Arc<dyn Registry>,
    store: Arc<dyn LookupStore>,
    clock: Arc<dyn Clock>,
    policy: StalenessPolicy,
    ttl: TimeDelta,
    /// One lock per slug being looked up, so concurrent callers share a fetch
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl StalenessResolver {
    pub fn new(
        registry: Arc<dyn Registry>,
        store: Arc<dyn LookupStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            store,
            clock,
            policy: StalenessPolicy::default(),
            ttl: TimeDelta::seconds(DEFAULT_CACHE_TTL_SECS),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    /// Cache-through lookup of a single slug
    pub async fn lookup(&self, slug: &str) -> LookupResult {
        let slot = self.acquire_slot(slug);

        let result = {
            let _guard = slot.lock().await;
            get_or_fetch(
                self.store.as_ref(),
                self.clock.as_ref(),
                self.ttl,
                slug,
                || self.registry.fetch_last_updated(slug),
            )
            .await
        };

        self.release_slot(slug, slot);
        result
    }

    /// Look up `slug` and classify the answer against the current time
    pub async fn resolve(&self, slug: &str, display_name: &str) -> Resolution {
        let result = self.lookup(slug).await;
        let status = result.status();

        let (raw_timestamp, is_stale) = match result {
            LookupResult::Found(timestamp) => {
                let verdict = self.policy.classify(&timestamp, self.clock.now());
                (Some(verdict.raw_timestamp), Some(verdict.is_stale))
            }
            LookupResult::NotFound | LookupResult::Failed => (None, None),
        };

        Resolution {
            name: display_name.to_string(),
            slug: slug.to_string(),
            status,
            raw_timestamp,
            is_stale,
        }
    }

    pub async fn resolve_plugin(&self, plugin: &PluginInfo) -> Resolution {
        self.resolve(plugin.slug(), &plugin.name).await
    }

    /// Resolve every plugin one after another, preserving order
    pub async fn resolve_all(&self, plugins: &[PluginInfo]) -> Vec<Resolution> {
        let mut resolutions = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            resolutions.push(self.resolve_plugin(plugin).await);
        }
        resolutions
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn acquire_slot(&self, slug: &str) -> Arc<AsyncMutex<()>> {
        self.lock_in_flight()
            .entry(slug.to_string())
            .or_default()
            .clone()
    }

    fn release_slot(&self, slug: &str, slot: Arc<AsyncMutex<()>>) {
        let mut in_flight = self.lock_in_flight();
        // Only the map and this caller still hold the slot
        if Arc::strong_count(&slot) == 2 {
            in_flight.remove(slug);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::clock::ManualClock;
    use crate::freshness::error::CacheError;
    use crate::freshness::memory::MemoryStore;
    use crate::freshness::registry::MockRegistry;
    use chrono::{DateTime, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn resolver_with(
        registry: MockRegistry,
    ) -> (StalenessResolver, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let resolver = StalenessResolver::new(Arc::new(registry), store.clone(), clock.clone());
        (resolver, store, clock)
    }

    #[tokio::test]
    async fn resolve_serves_second_call_from_cache() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .withf(|slug| slug == "akismet")
            .times(1)
            .returning(|_| Ok(Lookup::Found("2024-03-05 2:15pm GMT".to_string())));
        let (resolver, _store, _clock) = resolver_with(registry);

        let first = resolver.resolve("akismet", "Akismet").await;
        let second = resolver.resolve("akismet", "Akismet").await;

        assert_eq!(first, second);
        assert_eq!(
            first,
            Resolution {
                name: "Akismet".to_string(),
                slug: "akismet".to_string(),
                status: LookupStatus::Found,
                raw_timestamp: Some("2024-03-05 2:15pm GMT".to_string()),
                is_stale: Some(false),
            }
        );
    }

    #[tokio::test]
    async fn resolve_refetches_after_ttl_expiry() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .times(2)
            .returning(|_| Ok(Lookup::Found("2024-03-05".to_string())));
        let (resolver, _store, clock) = resolver_with(registry);

        resolver.resolve("akismet", "Akismet").await;
        clock.advance(TimeDelta::hours(23));
        resolver.resolve("akismet", "Akismet").await;
        clock.advance(TimeDelta::hours(1) + TimeDelta::seconds(1));
        resolver.resolve("akismet", "Akismet").await;
    }

    #[tokio::test]
    async fn failed_lookup_is_not_cached() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .times(2)
            .returning(|_| Err(RegistryError::Status(500)));
        let (resolver, store, clock) = resolver_with(registry);

        let first = resolver.resolve("akismet", "Akismet").await;
        assert_eq!(store.get(&cache_key("akismet"), clock.now()).unwrap(), None);
        let second = resolver.resolve("akismet", "Akismet").await;

        assert_eq!(first.status, LookupStatus::Failed);
        assert_eq!(first.raw_timestamp, None);
        assert_eq!(first.is_stale, None);
        assert_eq!(second.status, LookupStatus::Failed);
    }

    #[tokio::test]
    async fn not_found_is_cached() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .times(1)
            .returning(|_| Ok(Lookup::NotFound));
        let (resolver, store, clock) = resolver_with(registry);

        let first = resolver.resolve("custom", "Custom").await;
        let second = resolver.resolve("custom", "Custom").await;

        assert_eq!(first.status, LookupStatus::NotFound);
        assert_eq!(second.status, LookupStatus::NotFound);
        assert_eq!(first.is_stale, None);
        assert_eq!(
            store.get(&cache_key("custom"), clock.now()).unwrap(),
            Some(Lookup::NotFound)
        );
    }

    #[tokio::test]
    async fn cached_timestamp_is_returned_byte_for_byte() {
        let raw = "2024-03-05 2:15pm GMT &amp; &lt;b&gt;";
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .times(1)
            .returning(move |_| Ok(Lookup::Found(raw.to_string())));
        let (resolver, _store, _clock) = resolver_with(registry);

        let fetched = resolver.lookup("akismet").await;
        let cached = resolver.lookup("akismet").await;

        assert_eq!(fetched, LookupResult::Found(raw.to_string()));
        assert_eq!(cached, LookupResult::Found(raw.to_string()));
    }

    #[tokio::test]
    async fn staleness_is_recomputed_as_time_passes() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .times(1)
            .returning(|_| Ok(Lookup::Found("2023-06-01".to_string())));
        let (resolver, _store, clock) = resolver_with(registry);
        let resolver = resolver.with_ttl(TimeDelta::days(30));

        assert_eq!(resolver.resolve("old", "Old").await.is_stale, Some(false));
        clock.advance(TimeDelta::days(1));
        assert_eq!(resolver.resolve("old", "Old").await.is_stale, Some(true));
    }

    #[tokio::test]
    async fn resolve_all_preserves_plugin_order() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .returning(|slug| match slug {
                "fresh" => Ok(Lookup::Found("2025-01-01".to_string())),
                "stale" => Ok(Lookup::Found("2020-01-01".to_string())),
                _ => Ok(Lookup::NotFound),
            });
        let (resolver, _store, _clock) = resolver_with(registry);

        let plugins = vec![
            PluginInfo::new("stale/stale.php", "Stale Plugin"),
            PluginInfo::new("custom/custom.php", "Custom Plugin"),
            PluginInfo::new("fresh/fresh.php", "Fresh Plugin"),
        ];
        let resolutions = resolver.resolve_all(&plugins).await;

        let summary: Vec<_> = resolutions
            .iter()
            .map(|r| (r.name.as_str(), r.slug.as_str(), r.status, r.is_stale))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Stale Plugin", "stale", LookupStatus::Found, Some(true)),
                ("Custom Plugin", "custom", LookupStatus::NotFound, None),
                ("Fresh Plugin", "fresh", LookupStatus::Found, Some(false)),
            ]
        );
    }

    struct BrokenStore;

    impl LookupStore for BrokenStore {
        fn get(&self, _key: &str, _now: DateTime<Utc>) -> Result<Option<Lookup>, CacheError> {
            Err(CacheError::LockPoisoned)
        }

        fn set(
            &self,
            _key: &str,
            _value: &Lookup,
            _ttl: TimeDelta,
            _now: DateTime<Utc>,
        ) -> Result<(), CacheError> {
            Err(CacheError::LockPoisoned)
        }

        fn remove(&self, _key: &str) -> Result<bool, CacheError> {
            Err(CacheError::LockPoisoned)
        }

        fn clear(&self) -> Result<usize, CacheError> {
            Err(CacheError::LockPoisoned)
        }

        fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize, CacheError> {
            Err(CacheError::LockPoisoned)
        }
    }

    #[tokio::test]
    async fn broken_store_degrades_to_direct_fetch() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .times(2)
            .returning(|_| Ok(Lookup::Found("2024-03-05".to_string())));
        let resolver = StalenessResolver::new(
            Arc::new(registry),
            Arc::new(BrokenStore),
            Arc::new(ManualClock::new(start())),
        );

        let first = resolver.lookup("akismet").await;
        let second = resolver.lookup("akismet").await;

        assert_eq!(first, LookupResult::Found("2024-03-05".to_string()));
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn in_flight_slots_are_released() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_last_updated()
            .returning(|_| Ok(Lookup::NotFound));
        let (resolver, _store, _clock) = resolver_with(registry);

        resolver.lookup("a").await;
        resolver.lookup("b").await;

        assert!(resolver.lock_in_flight().is_empty());
    }
}
