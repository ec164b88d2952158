//! SQLite-backed snapshot storage.
//!
//! Each `(channel_id, max_results)` pair owns one row holding the whole video
//! list as JSON plus the fetch time in Unix milliseconds. Writes are a single
//! upsert statement, so a reader sees either the previous snapshot or the new
//! one and never a mix. Like the rest of the tooling, every operation opens a
//! short-lived connection; `SqliteSnapshots` is therefore cheap to share across
//! blocking tasks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::cache::{CacheEntry, CacheKey, SnapshotBackend};
use crate::error::CacheError;
use crate::models::VideoSummary;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Row count per channel, as reported by [`SqliteSnapshots::stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshotStats {
    pub channel_id: String,
    pub entries: u64,
    pub newest: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SqliteSnapshots {
    db_path: PathBuf,
}

impl SqliteSnapshots {
    /// Opens (and if necessary creates) the cache DB and its table. WAL mode
    /// keeps readers from blocking the writer.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("opening cache DB {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("enabling WAL mode for cache DB")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS channel_snapshots (
                channel_id TEXT NOT NULL,
                max_results INTEGER NOT NULL,
                videos_json TEXT NOT NULL,
                fetched_at INTEGER NOT NULL,
                PRIMARY KEY (channel_id, max_results)
            );

            CREATE INDEX IF NOT EXISTS idx_snapshots_fetched_at
                ON channel_snapshots(fetched_at);
            "#,
        )
        .context("creating channel_snapshots table")?;

        Ok(Self {
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&Connection) -> Result<T, CacheError>,
    {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        f(&conn)
    }

    /// Deletes every snapshot fetched before `cutoff`. Returns the number of
    /// rows removed.
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, CacheError> {
        self.with_connection(|conn| {
            let removed = conn.execute(
                "DELETE FROM channel_snapshots WHERE fetched_at < ?1",
                params![cutoff.timestamp_millis()],
            )?;
            Ok(removed)
        })
    }

    pub fn stats(&self) -> Result<Vec<ChannelSnapshotStats>, CacheError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT channel_id, COUNT(*), MAX(fetched_at)
                FROM channel_snapshots
                GROUP BY channel_id
                ORDER BY channel_id
                "#,
            )?;

            let mut rows = stmt.query([])?;
            let mut stats = Vec::new();
            while let Some(row) = rows.next()? {
                let newest: Option<i64> = row.get(2)?;
                stats.push(ChannelSnapshotStats {
                    channel_id: row.get(0)?,
                    entries: row.get::<_, i64>(1)?.max(0) as u64,
                    newest: newest.and_then(DateTime::from_timestamp_millis),
                });
            }
            Ok(stats)
        })
    }
}

impl SnapshotBackend for SqliteSnapshots {
    fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        self.with_connection(|conn| {
            let row: Option<(String, i64)> = conn
                .query_row(
                    r#"
                    SELECT videos_json, fetched_at
                    FROM channel_snapshots
                    WHERE channel_id = ?1 AND max_results = ?2
                    "#,
                    params![key.channel_id, key.limit],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((videos_json, fetched_at)) = row else {
                return Ok(None);
            };

            let videos: Vec<VideoSummary> = serde_json::from_str(&videos_json)?;
            let fetched_at = DateTime::from_timestamp_millis(fetched_at).ok_or_else(|| {
                CacheError::Unavailable(format!("invalid fetched_at {fetched_at}"))
            })?;
            Ok(Some(CacheEntry { videos, fetched_at }))
        })
    }

    fn store(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        let videos_json = serde_json::to_string(&entry.videos)?;
        self.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO channel_snapshots (channel_id, max_results, videos_json, fetched_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(channel_id, max_results) DO UPDATE SET
                    videos_json = excluded.videos_json,
                    fetched_at = excluded.fetched_at
                "#,
                params![
                    key.channel_id,
                    key.limit,
                    videos_json,
                    entry.fetched_at.timestamp_millis()
                ],
            )?;
            Ok(())
        })
    }

    fn evict(&self, key: &CacheKey, fetched_at: DateTime<Utc>) -> Result<(), CacheError> {
        self.with_connection(|conn| {
            conn.execute(
                r#"
                DELETE FROM channel_snapshots
                WHERE channel_id = ?1 AND max_results = ?2 AND fetched_at = ?3
                "#,
                params![key.channel_id, key.limit, fetched_at.timestamp_millis()],
            )?;
            Ok(())
        })
    }
}
