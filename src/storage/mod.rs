use crate::ncm::models::{LyricPayload, TrackId};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// Key under which the playback session blob is stored.
pub const SESSION_KEY: &str = "playback_session";

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let s = Self {
            conn: Connection::open_in_memory().context("open in-memory db")?,
        };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS lyrics_cache (
  track_id INTEGER PRIMARY KEY,
  primary_lrc TEXT NOT NULL,
  translation_lrc TEXT,
  fetched_at INTEGER NOT NULL
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Last write wins.
    pub fn put(&self, key: &str, value: &str, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO kv(key, value, updated_at)
VALUES(?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET
  value=excluded.value,
  updated_at=excluded.updated_at
"#,
                params![key, value, now_unix],
            )
            .with_context(|| format!("put {key}"))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key=?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("get {key}"))
    }

    pub fn cache_lyrics(
        &self,
        track_id: TrackId,
        payload: &LyricPayload,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO lyrics_cache(track_id, primary_lrc, translation_lrc, fetched_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(track_id) DO UPDATE SET
  primary_lrc=excluded.primary_lrc,
  translation_lrc=excluded.translation_lrc,
  fetched_at=excluded.fetched_at
"#,
                params![
                    track_id as i64,
                    payload.primary,
                    payload.translation,
                    now_unix
                ],
            )
            .context("cache lyrics")?;
        Ok(())
    }

    pub fn get_lyrics(&self, track_id: TrackId) -> anyhow::Result<Option<LyricPayload>> {
        self.conn
            .query_row(
                "SELECT primary_lrc, translation_lrc FROM lyrics_cache WHERE track_id=?1",
                params![track_id as i64],
                |row| {
                    Ok(LyricPayload {
                        primary: row.get(0)?,
                        translation: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("get cached lyrics")
    }
}

/// Opens a connection per operation so it can move into `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> anyhow::Result<Storage> {
        Storage::open(&self.path)
    }

    pub fn put(&self, key: &str, value: &str, now_unix: i64) -> anyhow::Result<()> {
        self.open()?.put(key, value, now_unix)
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.open()?.get(key)
    }

    pub fn cache_lyrics(
        &self,
        track_id: TrackId,
        payload: &LyricPayload,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.open()?.cache_lyrics(track_id, payload, now_unix)
    }

    pub fn get_lyrics(&self, track_id: TrackId) -> anyhow::Result<Option<LyricPayload>> {
        self.open()?.get_lyrics(track_id)
    }
}

pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_last_write_wins() {
        let s = Storage::open_in_memory().unwrap();
        assert_eq!(s.get(SESSION_KEY).unwrap(), None);
        s.put(SESSION_KEY, "{\"a\":1}", 1).unwrap();
        s.put(SESSION_KEY, "{\"a\":2}", 2).unwrap();
        assert_eq!(s.get(SESSION_KEY).unwrap().as_deref(), Some("{\"a\":2}"));
    }

    #[test]
    fn test_lyrics_cache() {
        let s = Storage::open_in_memory().unwrap();
        let payload = LyricPayload {
            primary: "[00:01.00]x".to_string(),
            translation: None,
        };
        s.cache_lyrics(42, &payload, 10).unwrap();
        assert_eq!(s.get_lyrics(42).unwrap(), Some(payload));
        assert_eq!(s.get_lyrics(43).unwrap(), None);
    }

    #[test]
    fn test_handle_reopens_file() {
        let path = std::env::temp_dir()
            .join(format!("tonearm-storage-{}", std::process::id()))
            .join("state.sqlite3");
        let handle = StorageHandle::new(path.clone());
        handle.put("k", "v", 0).unwrap();
        assert_eq!(handle.get("k").unwrap().as_deref(), Some("v"));
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
