//! Database module - SQLite cache of enriched exercises

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::enrich::{EnrichmentRecord, ExerciseStore, normalize_name};

/// Fixed-width UTC timestamp, so text order is time order
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Cached entry as listed by `cache list`
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub record: EnrichmentRecord,
    pub updated_at: DateTime<Utc>,
}

/// Exercise cache wrapper
pub struct ExerciseCache {
    conn: Connection,
}

impl ExerciseCache {
    /// Open or create cache database, parent folders included
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("cannot open cache {}", path.display()))?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    pub fn open_in_memory() -> Result<Self> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS exercises (
                key TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Number of cached exercises
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM exercises", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// All entries, most recent first; undecodable rows are skipped
    pub fn list(&self) -> Result<Vec<CacheEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, body, updated_at FROM exercises ORDER BY updated_at DESC")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let entries = rows
            .into_iter()
            .filter_map(|(key, body, updated)| {
                let record = serde_json::from_str(&body).ok()?;
                let updated_at = DateTime::parse_from_rfc3339(&updated)
                    .map(|d| d.with_timezone(&Utc))
                    .ok()?;
                Some(CacheEntry {
                    key,
                    record,
                    updated_at,
                })
            })
            .collect();
        Ok(entries)
    }

    /// Delete everything, or only entries older than `older_than_days`
    pub fn clear(&self, older_than_days: Option<u32>) -> Result<usize> {
        let removed = match older_than_days {
            Some(days) => {
                let cutoff = Utc::now() - Duration::days(i64::from(days));
                self.conn.execute(
                    "DELETE FROM exercises WHERE updated_at < ?1",
                    params![timestamp(cutoff)],
                )?
            }
            None => self.conn.execute("DELETE FROM exercises", [])?,
        };
        Ok(removed)
    }

    fn put_at(&self, name: &str, record: &EnrichmentRecord, at: DateTime<Utc>) -> Result<()> {
        let body = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO exercises (key, body, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![normalize_name(name), body, timestamp(at)],
        )?;
        Ok(())
    }
}

impl ExerciseStore for ExerciseCache {
    fn get(&self, name: &str) -> Result<Option<EnrichmentRecord>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM exercises WHERE key = ?1",
                params![normalize_name(name)],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => {
                let record = serde_json::from_str(&body)
                    .with_context(|| format!("corrupt cache entry for {name}"))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn put(&self, name: &str, record: &EnrichmentRecord) -> Result<()> {
        self.put_at(name, record, Utc::now())
    }
}
