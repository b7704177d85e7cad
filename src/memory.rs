//! In-memory [`PageSource`] for tests and offline demos.
//!
//! Holds pages and block listings behind `std::sync::RwLock` and counts every
//! call per id, so tests can assert how many remote round-trips a crawl made.
//! Clones share state: mutate the workspace between crawls through any clone.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::blocks::{Block, BlockKind, RichText};
use crate::error::{Result, SyncError};
use crate::models::PageMeta;
use crate::traits::{BlockPage, PageSource};

#[derive(Default)]
struct State {
    pages: HashMap<String, PageMeta>,
    children: HashMap<String, Vec<Block>>,
    failing: Vec<String>,
    listing_page_size: Option<usize>,
    meta_calls: HashMap<String, usize>,
    list_calls: HashMap<String, usize>,
}

/// In-memory remote workspace.
#[derive(Clone, Default)]
pub struct InMemoryWorkspace {
    state: Arc<RwLock<State>>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    // ── builders ──

    /// Register a page with its title and modification timestamp.
    pub fn page(self, id: &str, title: &str, last_edited: &str) -> Self {
        self.write().pages.insert(
            id.to_string(),
            PageMeta {
                title: title.to_string(),
                last_edited: last_edited.to_string(),
            },
        );
        self
    }

    /// Append a block to a page's or block's child listing.
    pub fn block(self, parent: &str, block: Block) -> Self {
        self.push_block(parent, block);
        self
    }

    pub fn paragraphs(self, parent: &str, lines: &[&str]) -> Self {
        for (i, line) in lines.iter().enumerate() {
            self.push_block(
                parent,
                Block::new(
                    format!("{}-p{}", parent, i),
                    BlockKind::Paragraph(RichText::from(*line)),
                ),
            );
        }
        self
    }

    /// Append a child-page reference. The child page itself is registered separately.
    pub fn child_page(self, parent: &str, child: &str) -> Self {
        self.push_block(parent, Block::new(child, BlockKind::ChildPage));
        self
    }

    /// Append a block that has children of its own, listed under `id`.
    pub fn container(self, parent: &str, id: &str, kind: BlockKind) -> Self {
        self.push_block(parent, Block::new(id, kind).with_children());
        self
    }

    /// Split listings into pages of `size` blocks.
    pub fn with_listing_page_size(self, size: usize) -> Self {
        self.write().listing_page_size = Some(size.max(1));
        self
    }

    /// Every call naming `id` fails.
    pub fn failing(self, id: &str) -> Self {
        self.write().failing.push(id.to_string());
        self
    }

    // ── mutation between crawls ──

    fn push_block(&self, parent: &str, block: Block) {
        self.write()
            .children
            .entry(parent.to_string())
            .or_default()
            .push(block);
    }

    /// Set a new modification timestamp on a page.
    pub fn touch(&self, id: &str, last_edited: &str) {
        if let Some(meta) = self.write().pages.get_mut(id) {
            meta.last_edited = last_edited.to_string();
        }
    }

    /// Replace a page's or block's listing.
    pub fn set_blocks(&self, parent: &str, blocks: Vec<Block>) {
        self.write().children.insert(parent.to_string(), blocks);
    }

    /// Remove the child-page reference `child` from `parent`'s listing.
    pub fn detach(&self, parent: &str, child: &str) {
        if let Some(blocks) = self.write().children.get_mut(parent) {
            blocks.retain(|b| !(b.kind == BlockKind::ChildPage && b.id == child));
        }
    }

    pub fn clear_failures(&self) {
        self.write().failing.clear();
    }

    pub fn fail(&self, id: &str) {
        self.write().failing.push(id.to_string());
    }

    // ── call accounting ──

    pub fn meta_calls(&self, id: &str) -> usize {
        self.read().meta_calls.get(id).copied().unwrap_or(0)
    }

    pub fn list_calls(&self, id: &str) -> usize {
        self.read().list_calls.get(id).copied().unwrap_or(0)
    }

    pub fn total_list_calls(&self) -> usize {
        self.read().list_calls.values().sum()
    }

    pub fn reset_counts(&self) {
        let mut state = self.write();
        state.meta_calls.clear();
        state.list_calls.clear();
    }
}

fn injected_failure(operation: &'static str, id: &str) -> SyncError {
    SyncError::Remote {
        operation,
        id: id.to_string(),
        message: "injected failure".to_string(),
    }
}

#[async_trait]
impl PageSource for InMemoryWorkspace {
    async fn retrieve_page(&self, page_id: &str) -> Result<PageMeta> {
        let mut state = self.write();
        *state.meta_calls.entry(page_id.to_string()).or_default() += 1;

        if state.failing.iter().any(|f| f == page_id) {
            return Err(injected_failure("retrieve page", page_id));
        }
        state
            .pages
            .get(page_id)
            .cloned()
            .ok_or_else(|| SyncError::Remote {
                operation: "retrieve page",
                id: page_id.to_string(),
                message: "HTTP 404 Not Found: object_not_found".to_string(),
            })
    }

    async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<BlockPage> {
        let mut state = self.write();
        *state.list_calls.entry(block_id.to_string()).or_default() += 1;

        if state.failing.iter().any(|f| f == block_id) {
            return Err(injected_failure("list block children", block_id));
        }

        let all = state.children.get(block_id).cloned().unwrap_or_default();
        let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let size = state.listing_page_size.unwrap_or(usize::MAX);
        let end = start.saturating_add(size).min(all.len());

        Ok(BlockPage {
            blocks: all.get(start..end).map(<[Block]>::to_vec).unwrap_or_default(),
            next_cursor: (end < all.len()).then(|| end.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_pages_and_counts() {
        let ws = InMemoryWorkspace::new()
            .page("p", "P", "t")
            .paragraphs("p", &["a", "b", "c"])
            .with_listing_page_size(2);

        let first = ws.list_children("p", None).await.unwrap();
        assert_eq!(first.blocks.len(), 2);
        let second = ws
            .list_children("p", first.next_cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(second.blocks.len(), 1);
        assert_eq!(second.next_cursor, None);
        assert_eq!(ws.list_calls("p"), 2);
    }

    #[tokio::test]
    async fn test_unknown_page_is_remote_error() {
        let ws = InMemoryWorkspace::new();
        let err = ws.retrieve_page("nope").await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(ws.meta_calls("nope"), 1);
    }

    #[tokio::test]
    async fn test_detach_removes_reference() {
        let ws = InMemoryWorkspace::new()
            .page("p", "P", "t")
            .child_page("p", "c1")
            .child_page("p", "c2");
        ws.detach("p", "c1");
        let listing = ws.list_children("p", None).await.unwrap();
        let ids: Vec<&str> = listing.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c2"]);
    }
}
