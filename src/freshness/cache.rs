//! Lookup store trait and SQLite implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::freshness::error::CacheError;
use crate::freshness::types::Lookup;

const KEY_PREFIX: &str = "last_updated_";

const STATUS_FOUND: &str = "found";
const STATUS_NOT_FOUND: &str = "not_found";

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: index for expiry scans
    &["CREATE INDEX IF NOT EXISTS idx_lookups_expires_at ON lookups(expires_at)"],
];

/// Derive the store key for a plugin slug: a fixed prefix and the hex SHA-256
/// of the slug.
pub fn cache_key(slug: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(slug.as_bytes());
    format!("{}{}", KEY_PREFIX, hex::encode(hasher.finalize()))
}

/// Key/value storage for registry lookups with per-entry expiry.
///
/// Entries whose expiry is not after `now` must read as absent.
pub trait LookupStore: Send + Sync + 'static {
    /// Get a live entry
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Lookup>, CacheError>;

    /// Store an entry expiring `ttl` after `now`, replacing any previous entry
    fn set(
        &self,
        key: &str,
        value: &Lookup,
        ttl: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError>;

    /// Remove an entry, returning whether one existed
    fn remove(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every entry, returning how many were removed
    fn clear(&self) -> Result<usize, CacheError>;

    /// Remove expired entries, returning how many were removed
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(db_path: &Path) -> Result<Self, CacheError> {
        info!("Initializing lookup store at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.create_schema()?;
        info!("Lookup store initialized successfully");

        Ok(store)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS lookups (
                key TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                last_updated TEXT,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), CacheError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }
}

impl LookupStore for SqliteStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Lookup>, CacheError> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT status, last_updated FROM lookups WHERE key = ?1 AND expires_at > ?2",
                (key, now.timestamp_millis()),
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        let lookup = match row {
            None => None,
            Some((status, Some(last_updated))) if status == STATUS_FOUND => {
                Some(Lookup::Found(last_updated))
            }
            Some((status, _)) if status == STATUS_NOT_FOUND => Some(Lookup::NotFound),
            Some((status, _)) => {
                debug!("Ignoring unreadable entry {} (status {})", key, status);
                None
            }
        };

        Ok(lookup)
    }

    fn set(
        &self,
        key: &str,
        value: &Lookup,
        ttl: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let (status, last_updated) = match value {
            Lookup::Found(last_updated) => (STATUS_FOUND, Some(last_updated.as_str())),
            Lookup::NotFound => (STATUS_NOT_FOUND, None),
        };
        let created_at = now.timestamp_millis();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(CacheError::ExpiryOutOfRange { now, ttl })?
            .timestamp_millis();

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO lookups (key, status, last_updated, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(key) DO UPDATE SET
                status = excluded.status,
                last_updated = excluded.last_updated,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            "#,
            (key, status, last_updated, created_at, expires_at),
        )?;

        debug!("Stored {} lookup for {}", status, key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM lookups WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    fn clear(&self) -> Result<usize, CacheError> {
        let conn = self.lock_conn()?;
        Ok(conn.execute("DELETE FROM lookups", [])?)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let conn = self.lock_conn()?;
        Ok(conn.execute(
            "DELETE FROM lookups WHERE expires_at <= ?1",
            [now.timestamp_millis()],
        )?)
    }
}
