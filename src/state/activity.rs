//! Activity log persistence.
//!
//! The on-disk format is a single pretty-printed JSON array of `LogEntry`,
//! rewritten in full on every append. Writes within one process are
//! serialized by a mutex. Every write goes to its own uniquely named temp file
//! in the log's directory and is then renamed over the log, so readers never
//! observe a half-written array. Independent writers (two processes, or two
//! stores on one path) can still lose an update (last writer wins) but never
//! corrupt the file.

use crate::types::LogEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Append-only store for activity entries.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn append(&self, entry: LogEntry) -> Result<()>;

    /// All entries in insertion order.
    async fn read_all(&self) -> Result<Vec<LogEntry>>;
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<LogEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Corrupt activity log {}", self.path.display()))
    }

    async fn store(&self, entries: &[LogEntry]) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries).context("Failed to serialize activity log")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&path, &json))
            .await
            .context("Activity log writer panicked")?
    }
}

/// Write `contents` to a fresh temp file beside `path`, then rename it over `path`.
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl ActivityStore for JsonFileStore {
    async fn append(&self, entry: LogEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.push(entry);
        self.store(&entries).await?;
        debug!("Activity log now has {} entries", entries.len());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LogEntry>> {
        self.load().await
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store (`activity_log = ""` in the config disables the file).
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn append(&self, entry: LogEntry) -> Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LogEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}
