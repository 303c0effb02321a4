// Namespaced key-value adapter: in-memory cache mirrored to a durable medium

use crate::clock::Clock;
use crate::dates::add_clamped;
use chrono::{DateTime, Duration, Utc};
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default namespace for every key written by the adapter
pub const DEFAULT_PREFIX: &str = "life_productivity_hub_";

/// Handle shared by every store in a single-threaded application
pub type SharedKv = Rc<RefCell<KvStore>>;

/// A stored value with its write time and optional expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub value: Value,
    pub stored_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if now > at)
    }
}

/// Durable backing for the adapter. Keys arrive fully namespaced.
pub trait Medium {
    fn read(&self, key: &str) -> Result<Option<Entry>>;
    fn write(&mut self, key: &str, entry: &Entry) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

// ============================================================================
// SQLite medium
// ============================================================================

/// SQLite-backed medium, one row per key
pub struct SqliteMedium {
    db: Connection,
    base_path: Option<PathBuf>,
    // Held for the lifetime of the medium; released on drop
    _lock: Option<File>,
}

impl SqliteMedium {
    /// Open or create the medium in `dir`, taking the directory's writer lock
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let base_path = dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create data directory")?;

        let lock = File::create(base_path.join(".lock")).context("Failed to create lock file")?;
        lock.try_lock_exclusive()
            .map_err(|e| eyre!("Data directory {} is in use by another process: {}", base_path.display(), e))?;

        let db = Connection::open(base_path.join("lifehub.db")).context("Failed to open SQLite database")?;
        let medium = Self {
            db,
            base_path: Some(base_path),
            _lock: Some(lock),
        };
        medium.create_schema()?;

        info!(path = ?medium.base_path, "Opened durable medium");
        Ok(medium)
    }

    /// Medium that lives only as long as the process
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let medium = Self {
            db,
            base_path: None,
            _lock: None,
        };
        medium.create_schema()?;
        Ok(medium)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating key-value schema");
        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                entry_json TEXT NOT NULL,
                stored_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl Medium for SqliteMedium {
    fn read(&self, key: &str) -> Result<Option<Entry>> {
        let json: Option<String> = self
            .db
            .query_row("SELECT entry_json FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;

        match json {
            Some(json) => {
                let entry = serde_json::from_str(&json).context("Failed to deserialize stored entry")?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    fn write(&mut self, key: &str, entry: &Entry) -> Result<()> {
        let json = serde_json::to_string(entry).context("Failed to serialize entry")?;
        self.db.execute(
            "INSERT OR REPLACE INTO kv (key, entry_json, stored_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, json, entry.stored_at.timestamp_millis()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.db.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.db.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Key-value adapter. The in-memory cache is authoritative for the session;
/// durable writes that fail are logged and otherwise ignored.
pub struct KvStore {
    prefix: String,
    cache: HashMap<String, Entry>,
    medium: Box<dyn Medium>,
    clock: Arc<dyn Clock>,
}

impl KvStore {
    pub fn new(prefix: impl Into<String>, medium: Box<dyn Medium>, clock: Arc<dyn Clock>) -> Self {
        Self {
            prefix: prefix.into(),
            cache: HashMap::new(),
            medium,
            clock,
        }
    }

    /// Wrap into the shared handle stores hold on to
    pub fn shared(self) -> SharedKv {
        Rc::new(RefCell::new(self))
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Fetch a value. Expired entries are evicted and reported absent.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let storage_key = self.namespaced(key);

        let entry = match self.cache.get(&storage_key) {
            Some(entry) => Some(entry.clone()),
            None => match self.medium.read(&storage_key) {
                Ok(Some(entry)) => {
                    self.cache.insert(storage_key.clone(), entry.clone());
                    Some(entry)
                }
                Ok(None) => None,
                Err(e) => {
                    warn!(key = %storage_key, error = ?e, "Failed to read from durable medium");
                    None
                }
            },
        }?;

        if entry.is_expired(self.clock.now()) {
            debug!(key = %storage_key, "Evicting expired entry");
            self.remove(key);
            return None;
        }

        Some(entry.value)
    }

    /// Fetch and deserialize. A value of the wrong shape is logged and treated as absent.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key, error = ?e, "Stored value has unexpected shape, ignoring");
                None
            }
        }
    }

    /// Store a value, optionally expiring after `ttl`
    pub fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) {
        let storage_key = self.namespaced(key);
        let now = self.clock.now();
        let entry = Entry {
            value,
            stored_at: now,
            expires_at: ttl.map(|ttl| add_clamped(now, ttl)),
        };

        if let Err(e) = self.medium.write(&storage_key, &entry) {
            warn!(key = %storage_key, error = ?e, "Failed to mirror write to durable medium");
        }
        self.cache.insert(storage_key, entry);
    }

    /// Serialize and store. Serialization failures are logged and leave the key untouched.
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => self.set(key, json, None),
            Err(e) => warn!(key, error = ?e, "Failed to serialize value"),
        }
    }

    pub fn remove(&mut self, key: &str) {
        let storage_key = self.namespaced(key);
        self.cache.remove(&storage_key);
        if let Err(e) = self.medium.remove(&storage_key) {
            warn!(key = %storage_key, error = ?e, "Failed to remove from durable medium");
        }
    }

    /// Remove every key in this adapter's namespace
    pub fn clear(&mut self) {
        self.cache.retain(|key, _| !key.starts_with(&self.prefix));

        match self.medium.keys() {
            Ok(keys) => {
                for key in keys.into_iter().filter(|k| k.starts_with(&self.prefix)) {
                    if let Err(e) = self.medium.remove(&key) {
                        warn!(key = %key, error = ?e, "Failed to remove from durable medium");
                    }
                }
            }
            Err(e) => warn!(error = ?e, "Failed to list durable keys for clear"),
        }
    }

    /// Live keys in this namespace, without the prefix, sorted. Expired
    /// entries are left out whether they sit in the cache or only on disk.
    pub fn list_keys(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        match self.medium.keys() {
            Ok(durable) => keys.extend(
                durable
                    .into_iter()
                    .filter(|key| key.starts_with(&self.prefix) && !self.cache.contains_key(key))
                    .filter(|key| self.is_live_on_medium(key, now)),
            ),
            Err(e) => warn!(error = ?e, "Failed to list durable keys"),
        }

        let mut keys: Vec<String> = keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    fn is_live_on_medium(&self, storage_key: &str, now: DateTime<Utc>) -> bool {
        match self.medium.read(storage_key) {
            Ok(Some(entry)) => !entry.is_expired(now),
            Ok(None) => false,
            Err(e) => {
                warn!(key = %storage_key, error = ?e, "Failed to read durable entry while listing");
                true
            }
        }
    }
}
