//! Error taxonomy for the sync pipeline.
//!
//! Remote failures abort the crawl that hit them and leave the cache
//! untouched. Storage failures are split by direction: an unreadable cache
//! file at startup degrades to an empty snapshot, and a failed write after a
//! sync is logged without undoing the in-memory swap. Malformed remote data
//! never becomes an error; decoding falls back to defaults instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the remote reader, crawler, and cache.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote API answered with a failure status.
    #[error("{operation} failed for {id}: {message}")]
    Remote {
        /// Which remote call failed (e.g. `"retrieve page"`).
        operation: &'static str,
        /// Page or block id the call was made for.
        id: String,
        /// Status line plus a truncated response body.
        message: String,
    },

    /// Transport-level failure (DNS, TLS, timeout, undecodable body).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading or writing the snapshot file failed.
    #[error("cache file {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file could not be encoded or decoded.
    #[error("cache file format: {0}")]
    Format(#[from] serde_json::Error),

    /// Client setup failed (token environment variable not set).
    #[error("configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// True for failures that originate from the remote API.
    pub fn is_remote(&self) -> bool {
        matches!(self, SyncError::Remote { .. } | SyncError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
