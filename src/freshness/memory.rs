//! Process-local lookup store

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};

use crate::freshness::cache::LookupStore;
use crate::freshness::error::CacheError;
use crate::freshness::types::Lookup;

#[derive(Debug, Clone)]
struct Entry {
    value: Lookup,
    expires_at: DateTime<Utc>,
}

/// Keeps lookups in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::LockPoisoned)
    }
}

impl LookupStore for MemoryStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Lookup>, CacheError> {
        let entries = self.lock_entries()?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone()))
    }

    fn set(
        &self,
        key: &str,
        value: &Lookup,
        ttl: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(CacheError::ExpiryOutOfRange { now, ttl })?;
        let mut entries = self.lock_entries()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.lock_entries()?.remove(key).is_some())
    }

    fn clear(&self) -> Result<usize, CacheError> {
        let mut entries = self.lock_entries()?;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut entries = self.lock_entries()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }
}
