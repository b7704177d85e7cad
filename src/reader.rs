//! Paced, paginated reads of the remote page tree.
//!
//! [`TreeReader`] wraps a [`PageSource`] and owns the request pacing: a fixed
//! delay follows every remote call, listing pages and nested-container
//! fetches included. Only one call is ever in flight, which keeps the crawl
//! under the API's request-rate ceiling without any token accounting.

use std::time::Duration;

use tracing::debug;

use crate::blocks::{Block, BlockKind};
use crate::error::Result;
use crate::models::PageMeta;
use crate::traits::PageSource;

pub struct TreeReader<S> {
    source: S,
    delay: Duration,
}

impl<S: PageSource> TreeReader<S> {
    pub fn new(source: S, delay: Duration) -> Self {
        Self { source, delay }
    }

    async fn pace(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Title and modification timestamp of a page.
    pub async fn fetch_meta(&self, page_id: &str) -> Result<PageMeta> {
        let meta = self.source.retrieve_page(page_id).await?;
        self.pace().await;
        Ok(meta)
    }

    /// All direct child blocks of a page or block, following cursors to the end.
    pub async fn fetch_blocks(&self, block_id: &str) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .source
                .list_children(block_id, cursor.as_deref())
                .await?;
            self.pace().await;
            blocks.extend(page.blocks);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(block_id, count = blocks.len(), "fetched blocks");
        Ok(blocks)
    }

    /// Child-page ids referenced by `blocks`, in document order.
    ///
    /// Child pages may sit inside layout or grouping blocks (columns,
    /// toggles, list items, ...). Such containers are opened with further
    /// fetches and searched the same way, so the result is flat.
    pub async fn child_page_ids(&self, blocks: &[Block]) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        // Containers are expanded in place, so pending work is kept as a
        // stack of block lists with a position in each.
        let mut stack: Vec<(Vec<Block>, usize)> = vec![(blocks.to_vec(), 0)];

        while let Some((level, pos)) = stack.last_mut() {
            let Some(block) = level.get(*pos) else {
                stack.pop();
                continue;
            };
            *pos += 1;

            if block.kind == BlockKind::ChildPage {
                ids.push(block.id.clone());
            } else if block.may_hide_pages() {
                let container_id = block.id.clone();
                let nested = self.fetch_blocks(&container_id).await?;
                stack.push((nested, 0));
            }
        }

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryWorkspace as FakeWorkspace;

    #[tokio::test]
    async fn test_fetch_blocks_follows_cursors() {
        let ws = FakeWorkspace::new()
            .page("root", "Root", "t1")
            .paragraphs("root", &["one", "two", "three", "four", "five"])
            .with_listing_page_size(2);
        let reader = TreeReader::new(ws.clone(), Duration::ZERO);

        let blocks = reader.fetch_blocks("root").await.unwrap();
        assert_eq!(blocks.len(), 5);
        assert_eq!(ws.list_calls("root"), 3);
    }

    #[tokio::test]
    async fn test_child_pages_found_inside_containers() {
        let ws = FakeWorkspace::new()
            .page("root", "Root", "t1")
            .child_page("root", "a")
            .container("root", "cols", BlockKind::ColumnList)
            .container("cols", "col1", BlockKind::Column)
            .child_page("col1", "b")
            .container("cols", "col2", BlockKind::Column)
            .child_page("col2", "c")
            .child_page("root", "d");
        let reader = TreeReader::new(ws.clone(), Duration::ZERO);

        let blocks = reader.fetch_blocks("root").await.unwrap();
        let ids = reader.child_page_ids(&blocks).await.unwrap();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(ws.list_calls("cols"), 1);
        assert_eq!(ws.list_calls("col1"), 1);
    }

    #[tokio::test]
    async fn test_non_container_children_not_opened() {
        let ws = FakeWorkspace::new()
            .page("root", "Root", "t1")
            .container(
                "root",
                "para",
                BlockKind::Paragraph(crate::blocks::RichText::from("has children")),
            )
            .child_page("para", "hidden");
        let reader = TreeReader::new(ws.clone(), Duration::ZERO);

        let blocks = reader.fetch_blocks("root").await.unwrap();
        let ids = reader.child_page_ids(&blocks).await.unwrap();
        assert!(ids.is_empty());
        assert_eq!(ws.list_calls("para"), 0);
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let ws = FakeWorkspace::new().page("root", "Root", "t1").failing("root");
        let reader = TreeReader::new(ws, Duration::ZERO);
        assert!(reader.fetch_blocks("root").await.is_err());
        assert!(reader.fetch_meta("root").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_after_every_call() {
        let ws = FakeWorkspace::new()
            .page("root", "Root", "t1")
            .paragraphs("root", &["a", "b", "c"])
            .with_listing_page_size(1);
        let reader = TreeReader::new(ws, Duration::from_millis(350));

        let start = tokio::time::Instant::now();
        reader.fetch_meta("root").await.unwrap();
        reader.fetch_blocks("root").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(350 * 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_after_container_fetches() {
        let ws = FakeWorkspace::new()
            .page("root", "Root", "t1")
            .child_page("root", "a")
            .block("root", Block::new("cols", BlockKind::ColumnList).with_children())
            .block("cols", Block::new("col1", BlockKind::Column).with_children())
            .child_page("col1", "b");
        let reader = TreeReader::new(ws.clone(), Duration::from_millis(350));

        let start = tokio::time::Instant::now();
        reader.fetch_meta("root").await.unwrap();
        let blocks = reader.fetch_blocks("root").await.unwrap();
        let ids = reader.child_page_ids(&blocks).await.unwrap();

        assert_eq!(ids, vec!["a", "b"]);
        // meta, root listing, then one listing each for cols and col1
        assert_eq!(start.elapsed(), Duration::from_millis(350 * 4));
    }
}
