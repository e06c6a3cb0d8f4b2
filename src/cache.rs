// 💾 Classification cache - Durable key → record store
//
// Entries are written once (high-confidence generative results only) and
// read many times. No eviction, no TTL, no size bound.
//
// `get` never fails: a missing, unreadable or corrupt entry is a miss.
// `put` may fail; the classifier logs the error and carries on.

use crate::error::CacheError;
use crate::record::ClassificationResult;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tempfile::NamedTempFile;

pub trait CacheStore: Send + Sync {
    /// Backend name, used in logs
    fn name(&self) -> &'static str;

    fn get(&self, key: &str) -> Option<ClassificationResult>;

    fn put(&self, key: &str, result: &ClassificationResult) -> Result<(), CacheError>;
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Process-local cache; lost on restart
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, ClassificationResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<ClassificationResult> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, result: &ClassificationResult) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries
            .entry(key.to_string())
            .or_insert_with(|| result.clone());
        Ok(())
    }
}

// ============================================================================
// FILE (one JSON document per key)
// ============================================================================

/// `<dir>/<key>.json`, pretty-printed. The directory is created on first write.
///
/// Entries are staged in a temp file in the same directory and renamed into
/// place without clobbering, so a reader never sees a half-written document
/// and the first writer of a key wins.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl CacheStore for FileCache {
    fn name(&self) -> &'static str {
        "file"
    }

    fn get(&self, key: &str) -> Option<ClassificationResult> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;

        match serde_json::from_str(&content) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache entry treated as miss");
                None
            }
        }
    }

    fn put(&self, key: &str, result: &ClassificationResult) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        if path.exists() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(result)?;

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(json.as_bytes())?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(key, "cache entry already written, keeping first");
                Ok(())
            }
            Err(e) => Err(CacheError::Io(e.error)),
        }
    }
}

// ============================================================================
// SQLITE
// ============================================================================

/// Single-table SQLite store in WAL mode
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CacheError> {
        setup_cache_table(&conn)?;
        Ok(SqliteCache {
            conn: Mutex::new(conn),
        })
    }

    pub fn count(&self) -> Result<i64, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let count = conn.query_row("SELECT COUNT(*) FROM classification_cache", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn setup_cache_table(conn: &Connection) -> Result<(), CacheError> {
    // Crash recovery for file-backed databases; in-memory ones ignore it
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classification_cache (
            cache_key TEXT PRIMARY KEY,
            record TEXT NOT NULL,
            cached_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl CacheStore for SqliteCache {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn get(&self, key: &str) -> Option<ClassificationResult> {
        let conn = self.conn.lock().ok()?;

        let record: Option<String> = conn
            .query_row(
                "SELECT record FROM classification_cache WHERE cache_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .unwrap_or_else(|e| {
                tracing::warn!(key, error = %e, "cache read failed, treating as miss");
                None
            });

        match serde_json::from_str(&record?) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt cache row treated as miss");
                None
            }
        }
    }

    fn put(&self, key: &str, result: &ClassificationResult) -> Result<(), CacheError> {
        let json = serde_json::to_string(result)?;
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;

        // Write-once: a concurrent duplicate keeps the first entry
        conn.execute(
            "INSERT OR IGNORE INTO classification_cache (cache_key, record, cached_at)
             VALUES (?1, ?2, ?3)",
            params![key, json, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
