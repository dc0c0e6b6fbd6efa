//! SQLite-backed trending store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{subject_key, TrendingError, TrendingRecord, TrendingStore};
use crate::metadata::{Query, SearchResult};

/// How long a writer waits for another connection holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed trending store.
///
/// The counter is updated with a single `INSERT ... ON CONFLICT DO UPDATE`
/// statement, so several processes may share one database file.
pub struct SqliteTrendingStore {
    conn: Mutex<Connection>,
}

impl SqliteTrendingStore {
    /// Create a new SQLite store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TrendingError> {
        let conn = Connection::open(path).map_err(|e| TrendingError::Database(e.to_string()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| TrendingError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self, TrendingError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TrendingError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TrendingError> {
        conn.execute_batch(
            r#"
            -- One row per movie selected by a search
            CREATE TABLE IF NOT EXISTS trending_searches (
                subject_key TEXT PRIMARY KEY,
                search_term TEXT NOT NULL,
                movie_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                poster_url TEXT,
                count INTEGER NOT NULL DEFAULT 1 CHECK (count >= 1),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_trending_searches_count ON trending_searches(count DESC);
            "#,
        )
        .map_err(|e| TrendingError::Database(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, TrendingError> {
        self.conn
            .lock()
            .map_err(|_| TrendingError::Database("connection lock poisoned".to_string()))
    }

    /// Get a record by subject key.
    pub fn get(&self, key: &str) -> Result<Option<TrendingRecord>, TrendingError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT subject_key, search_term, movie_id, title, poster_url, count, created_at
             FROM trending_searches WHERE subject_key = ?",
            params![key],
            Self::row_to_record,
        )
        .optional()
        .map_err(|e| TrendingError::Database(e.to_string()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TrendingRecord> {
        let created_at_str: String = row.get(6)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let movie_id: i64 = row.get(2)?;
        let count: i64 = row.get(5)?;

        Ok(TrendingRecord {
            id: row.get(0)?,
            search_term: row.get(1)?,
            movie_id: movie_id as u64,
            title: row.get(3)?,
            poster_url: row.get(4)?,
            count: count as u64,
            created_at,
        })
    }
}

#[async_trait]
impl TrendingStore for SqliteTrendingStore {
    async fn record_hit(
        &self,
        query: &Query,
        chosen: &SearchResult,
    ) -> Result<TrendingRecord, TrendingError> {
        let key = subject_key(chosen.id);
        let now = Utc::now().to_rfc3339();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO trending_searches
                (subject_key, search_term, movie_id, title, poster_url, count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
             ON CONFLICT(subject_key) DO UPDATE SET
                count = count + 1,
                updated_at = excluded.updated_at",
            params![
                &key,
                query.as_str(),
                chosen.id as i64,
                &chosen.title,
                &chosen.poster_url,
                &now,
            ],
        )
        .map_err(|e| TrendingError::Database(e.to_string()))?;

        conn.query_row(
            "SELECT subject_key, search_term, movie_id, title, poster_url, count, created_at
             FROM trending_searches WHERE subject_key = ?",
            params![&key],
            Self::row_to_record,
        )
        .map_err(|e| TrendingError::Database(e.to_string()))
    }

    async fn top_trending(&self, limit: usize) -> Result<Vec<TrendingRecord>, TrendingError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT subject_key, search_term, movie_id, title, poster_url, count, created_at
                 FROM trending_searches
                 ORDER BY count DESC, rowid ASC
                 LIMIT ?",
            )
            .map_err(|e| TrendingError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_record)
            .map_err(|e| TrendingError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| TrendingError::Database(e.to_string()))?);
        }
        Ok(records)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
