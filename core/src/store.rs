//! Save-slot persistence layer.
//!
//! RULE: Only store.rs talks to the database. The session sees a plain
//! key→string surface and only ever reads/writes the serialized save
//! record — storage mechanics stay on this side of the trait.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

use crate::error::GameResult;

/// The storage collaborator: string keys to string payloads.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> GameResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> GameResult<()>;
}

/// SQLite-backed store. One row per save slot.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the save database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> GameResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS save_slot (
                slot     TEXT PRIMARY KEY,
                payload  TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// All slots with their save timestamps, newest first.
    pub fn slots(&self) -> GameResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT slot, saved_at FROM save_slot ORDER BY saved_at DESC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> GameResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM save_slot WHERE slot = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn set(&mut self, key: &str, value: &str) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO save_slot (slot, payload, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET payload = ?2, saved_at = ?3",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> GameResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> GameResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
