//! The synced page cache.
//!
//! [`SyncCache`] owns the current [`Snapshot`] and its JSON file. Readers get
//! an `Arc` to the snapshot that was current when they asked; a sync builds a
//! whole new snapshot and swaps the pointer, so a reader sees either the old
//! snapshot or the new one, never a mix.
//!
//! # Lifecycle
//!
//! 1. [`SyncCache::open`] loads the cache file if it exists. A missing or
//!    unreadable file is logged and yields an empty cache.
//! 2. [`SyncCache::synchronize`] crawls, swaps, then persists. Overlapping
//!    calls are serialized.
//! 3. [`SyncCache::get`] returns the current snapshot at any time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::crawl::{crawl, CrawlOptions};
use crate::error::{Result, SyncError};
use crate::models::Snapshot;
use crate::reader::TreeReader;
use crate::traits::PageSource;

/// The cache type shared by the CLI and server: any remote behind a trait object.
pub type SharedCache = Arc<SyncCache<Arc<dyn PageSource>>>;

pub struct SyncCache<S> {
    reader: TreeReader<S>,
    root_page_id: String,
    options: CrawlOptions,
    path: PathBuf,
    current: RwLock<Arc<Snapshot>>,
    sync_lock: Mutex<()>,
}

impl<S: PageSource> SyncCache<S> {
    /// Create the cache and load whatever the file at `path` holds.
    pub fn open(
        reader: TreeReader<S>,
        root_page_id: impl Into<String>,
        options: CrawlOptions,
        path: impl Into<PathBuf>,
    ) -> Self {
        let path = path.into();
        let snapshot = match load_snapshot(&path) {
            Ok(Some(snapshot)) => {
                info!(
                    pages = snapshot.len(),
                    synced = ?snapshot.last_synced_at,
                    "loaded cache from {}",
                    path.display()
                );
                snapshot
            }
            Ok(None) => Snapshot::default(),
            Err(e) => {
                warn!("failed to load cache file, starting empty: {}", e);
                Snapshot::default()
            }
        };

        Self {
            reader,
            root_page_id: root_page_id.into(),
            options,
            path,
            current: RwLock::new(Arc::new(snapshot)),
            sync_lock: Mutex::new(()),
        }
    }

    /// The current snapshot.
    pub fn get(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True while a sync is running.
    pub fn is_syncing(&self) -> bool {
        self.sync_lock.try_lock().is_err()
    }

    /// Crawl the remote tree and replace the snapshot. Returns the page count.
    ///
    /// On crawl failure the current snapshot is kept and the error returned.
    /// A failed file write is logged only: the new snapshot stays live in
    /// memory and the file catches up on the next successful sync.
    pub async fn synchronize(&self) -> Result<usize> {
        let _guard = self.sync_lock.lock().await;
        info!(root = %self.root_page_id, "starting sync");

        let previous: HashMap<String, _> = self
            .get()
            .pages
            .iter()
            .map(|doc| (doc.id.clone(), doc.clone()))
            .collect();

        let output = crawl(&self.reader, &self.root_page_id, &previous, &self.options).await?;

        let snapshot = Arc::new(Snapshot {
            pages: output.pages,
            last_synced_at: Some(Utc::now()),
        });
        let count = snapshot.len();
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = snapshot.clone();

        let path = self.path.clone();
        let to_save = snapshot.clone();
        match tokio::task::spawn_blocking(move || save_snapshot(&path, &to_save)).await {
            Ok(Ok(())) => info!(pages = count, "saved cache to {}", self.path.display()),
            Ok(Err(e)) => error!("failed to save cache file: {}", e),
            Err(e) => error!("cache write task failed: {}", e),
        }

        info!(pages = count, "sync complete");
        Ok(count)
    }
}

impl SyncCache<Arc<dyn PageSource>> {
    /// Wire a cache from configuration around an already-built remote.
    pub fn from_config(config: &Config, source: Arc<dyn PageSource>) -> SharedCache {
        Arc::new(SyncCache::open(
            TreeReader::new(source, config.notion.rate_limit()),
            config.notion.root_page_id.clone(),
            CrawlOptions {
                exclude_marker: config.sync.exclude_marker.clone(),
                on_unchanged: config.sync.on_unchanged,
            },
            config.cache.path.clone(),
        ))
    }
}

/// Read a snapshot file. `Ok(None)` when the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SyncError::Storage {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Write a snapshot file atomically: temp file in the same directory, then rename.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let storage = |source: std::io::Error| SyncError::Storage {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(storage)?;
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, json).map_err(storage)?;
    std::fs::rename(&tmp, path).map_err(storage)?;
    Ok(())
}
