//src/storage.rs
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub const USER_KEY: &str = "gofit_user";
pub const WORKOUTS_KEY: &str = "gofit_workouts";
pub const EXERCISES_KEY: &str = "gofit_exercises";
pub const USER_STATS_KEY: &str = "gofit_userStats";

/// Keys in the order the state container reads and writes them.
pub const SNAPSHOT_KEYS: [&str; 4] = [USER_KEY, WORKOUTS_KEY, EXERCISES_KEY, USER_STATS_KEY];

/// A paused session, kept apart from the snapshot so a later process can resume it.
pub const PAUSED_SESSION_KEY: &str = "gofit_pausedSession";

const DB_FILE_NAME: &str = "gofit.sqlite";
const APP_DATA_DIR: &str = "gofit";
const DATA_ENV_VAR: &str = "GOFIT_DATA_DIR";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed")]
    Connection(#[source] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing store file")]
    Io(#[from] std::io::Error),
    #[error("Store query failed: {0}")]
    QueryFailed(#[source] rusqlite::Error),
    #[error("Store write failed: {0}")]
    WriteFailed(#[source] rusqlite::Error),
    #[error("Failed to serialize '{key}': {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Stored value for '{key}' is not valid: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Store is unavailable: {0}")]
    Unavailable(String),
}

/// String-keyed store of JSON text, the device-local persistence the state
/// container snapshots into.
pub trait KeyValueStore {
    /// # Errors
    /// Returns `StorageError` if the read fails.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Reads several keys as one operation. Values come back in key order.
    /// # Errors
    /// Returns the first `StorageError` hit; no partial result is returned.
    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// # Errors
    /// Returns `StorageError` if the write fails.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// # Errors
    /// Returns `StorageError` if the delete fails.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Removes every key.
    /// # Errors
    /// Returns `StorageError` if the delete fails.
    fn clear(&mut self) -> Result<(), StorageError>;

    /// # Errors
    /// Returns `StorageError` if the query fails.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Gets the path to the SQLite store file within the app's data directory.
/// Exposed at crate root as `get_db_path_util`.
/// # Errors
/// Returns `StorageError::DataDir` if no data directory can be determined.
pub fn get_db_path() -> Result<PathBuf, StorageError> {
    let app_dir = match std::env::var(DATA_ENV_VAR) {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => dirs::data_dir()
            .ok_or(StorageError::DataDir)?
            .join(APP_DATA_DIR),
    };
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Key-value table in SQLite.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the store file and its table.
    /// # Errors
    /// Returns `StorageError::Connection` if the file cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(StorageError::Connection)?;
        Self::from_connection(conn)
    }

    /// # Errors
    /// Returns `StorageError::Connection` if the table cannot be created.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::Connection)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        init_db(&conn)?;
        Ok(Self { conn })
    }
}

/// Initializes the key-value table if it doesn't exist.
fn init_db(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        )",
        [],
    )
    .map_err(StorageError::Connection)?;
    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StorageError::QueryFailed)
    }

    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(StorageError::QueryFailed)?;
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            let value = stmt
                .query_row([key], |row| row.get::<_, String>(0))
                .optional()
                .map_err(StorageError::QueryFailed)?;
            values.push(value);
        }
        Ok(values)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(StorageError::WriteFailed)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(StorageError::WriteFailed)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv", [])
            .map_err(StorageError::WriteFailed)?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv ORDER BY key")
            .map_err(StorageError::QueryFailed)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(StorageError::QueryFailed)?;
        keys.collect::<Result<Vec<String>, _>>()
            .map_err(StorageError::QueryFailed)
    }
}

/// In-memory store. Clones share the same contents, so a caller can keep a
/// handle after moving a clone into the state container.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.lock()?.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_set_get_overwrite() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get(USER_KEY).unwrap(), None);

        store.set(USER_KEY, "{\"a\":1}").unwrap();
        store.set(USER_KEY, "{\"a\":2}").unwrap();

        assert_eq!(store.get(USER_KEY).unwrap().as_deref(), Some("{\"a\":2}"));
        assert_eq!(store.keys().unwrap(), vec![USER_KEY.to_string()]);
    }

    #[test]
    fn test_sqlite_multi_get_keeps_key_order() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set(EXERCISES_KEY, "[]").unwrap();
        store.set(USER_KEY, "null").unwrap();

        let values = store.multi_get(&SNAPSHOT_KEYS).unwrap();
        assert_eq!(
            values,
            vec![Some("null".to_string()), None, Some("[]".to_string()), None]
        );
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.sqlite");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set(WORKOUTS_KEY, "[]").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(WORKOUTS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_sqlite_remove_and_clear() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for key in SNAPSHOT_KEYS {
            store.set(key, "1").unwrap();
        }
        store.remove(USER_KEY).unwrap();
        assert_eq!(store.keys().unwrap().len(), 3);

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
        // Clearing an empty store is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_memory_store_clones_share_contents() {
        let handle = MemoryStore::new();
        let mut owned = handle.clone();
        owned.set(USER_STATS_KEY, "{}").unwrap();

        assert_eq!(handle.get(USER_STATS_KEY).unwrap().as_deref(), Some("{}"));

        owned.clear().unwrap();
        assert!(handle.keys().unwrap().is_empty());
    }
}
