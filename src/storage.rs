// 🗄️ Storage Port - string key → string value persistence
//
// The ledger only ever needs `read(key)` and `write(key, text)`. SQLite is
// the real backend (one kv table, WAL mode); MemoryStore stands in for tests.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Storage key for the expense list
pub const EXPENSES_KEY: &str = "expenses";

/// Storage key for the income list
pub const INCOMES_KEY: &str = "incomes";

/// Key-value persistence consumed by the ledger
pub trait KeyValueStore {
    /// Stored text for `key`, or `None` if it was never written
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the text stored under `key`
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        // WAL for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    /// Number of keys currently stored
    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create kv table")?;
    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))?;
        debug!(key, found = value.is_some(), "kv read");
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE
                 SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Failed to write key '{}'", key))?;
        debug!(key, bytes = value.len(), "kv write");
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, e.g. to simulate corrupt data
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Make every subsequent write fail (quota exceeded, disk gone...)
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Successful writes since creation
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            bail!("storage unavailable");
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_read_missing_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.read(EXPENSES_KEY).unwrap(), None);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_sqlite_write_then_overwrite() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.write(EXPENSES_KEY, "[]").unwrap();
        store.write(EXPENSES_KEY, r#"[{"id":1}]"#).unwrap();
        store.write(INCOMES_KEY, "[]").unwrap();

        assert_eq!(store.read(EXPENSES_KEY).unwrap().as_deref(), Some(r#"[{"id":1}]"#));
        assert_eq!(store.read(INCOMES_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_sqlite_file_survives_reopen() {
        let dir = std::env::temp_dir().join(format!(
            "budget-tracker-test-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let path = dir.join("nested").join("budget.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.write(INCOMES_KEY, r#"[{"id":7,"name":"Salary","amount":2000.0}]"#).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.read(INCOMES_KEY).unwrap().as_deref(),
            Some(r#"[{"id":7,"name":"Salary","amount":2000.0}]"#)
        );

        drop(store);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_memory_store_failing_writes() {
        let mut store = MemoryStore::new().with_entry(INCOMES_KEY, "[]");
        store.set_fail_writes(true);
        assert!(store.write(INCOMES_KEY, "[1]").is_err());
        assert_eq!(store.get(INCOMES_KEY), Some("[]"));

        store.set_fail_writes(false);
        store.write(INCOMES_KEY, "[1]").unwrap();
        assert_eq!(store.read(INCOMES_KEY).unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.write_count(), 1);
    }
}
