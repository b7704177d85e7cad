//! Core data models used throughout the mirror.
//!
//! These types represent the cached pages, the snapshot that holds them, and
//! the search results computed over a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a page has no title property or an empty one.
pub const UNTITLED: &str = "Untitled";

/// One cached page: its flattened plain-text content plus metadata.
///
/// `content` covers the page's own blocks only; child pages are separate
/// documents. Values are never edited in place, a sync produces new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub last_synced_at: DateTime<Utc>,
    /// Remote modification timestamp, verbatim. Empty when the API omitted it.
    pub last_edited_at: String,
    /// Child-page ids found the last time this page's blocks were fetched.
    ///
    /// `None` for documents written by builds that did not record children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_ids: Option<Vec<String>>,
}

/// The complete, ordered result of one crawl.
///
/// Documents appear in depth-first pre-order of first visit and ids are
/// unique. The snapshot is also the on-disk shape of the cache file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub pages: Vec<Document>,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Document> {
        self.pages.iter().find(|d| d.id == id)
    }
}

/// Page metadata returned by a single metadata fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub last_edited: String,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            title: UNTITLED.to_string(),
            last_edited: String::new(),
        }
    }
}

/// A ranked search hit. Borrows the document from the snapshot it came from.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<'a> {
    pub document: &'a Document,
    pub score: u32,
    pub snippet: String,
}

/// Public URL of a Notion page.
pub fn page_url(page_id: &str) -> String {
    format!("https://www.notion.so/{}", page_id.replace('-', ""))
}
