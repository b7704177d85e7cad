//! The remote seam.
//!
//! [`PageSource`] is the only way the mirror talks to the remote workspace.
//! Each method maps to exactly one remote request; pagination, pacing, and
//! child-page discovery live above it in [`TreeReader`](crate::reader::TreeReader).
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌──────────────┐
//! │ TreeCrawler│──▶│ TreeReader │──▶│  PageSource   │
//! │  (crawl)   │   │ paginate + │   │ NotionClient  │
//! └────────────┘   │   pace     │   │ or test fake  │
//!                  └────────────┘   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use notion_mirror::error::Result;
//! use notion_mirror::models::PageMeta;
//! use notion_mirror::traits::{BlockPage, PageSource};
//!
//! struct EmptyWorkspace;
//!
//! #[async_trait]
//! impl PageSource for EmptyWorkspace {
//!     async fn retrieve_page(&self, _page_id: &str) -> Result<PageMeta> {
//!         Ok(PageMeta::default())
//!     }
//!
//!     async fn list_children(&self, _block_id: &str, _cursor: Option<&str>) -> Result<BlockPage> {
//!         Ok(BlockPage::default())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::blocks::Block;
use crate::error::Result;
use crate::models::PageMeta;

/// One page of a paginated child-block listing.
#[derive(Debug, Clone, Default)]
pub struct BlockPage {
    pub blocks: Vec<Block>,
    /// Cursor for the next page; `None` when the listing is complete.
    pub next_cursor: Option<String>,
}

/// A remote document tree.
///
/// Implementations must not retry: failures propagate so the crawl aborts
/// and the previous snapshot stays in place.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a page's title and modification timestamp.
    ///
    /// Missing fields default (see [`PageMeta::default`]) instead of erroring.
    async fn retrieve_page(&self, page_id: &str) -> Result<PageMeta>;

    /// Fetch one page of direct children of a page or block.
    async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<BlockPage>;
}

#[async_trait]
impl<S: PageSource + ?Sized> PageSource for std::sync::Arc<S> {
    async fn retrieve_page(&self, page_id: &str) -> Result<PageMeta> {
        (**self).retrieve_page(page_id).await
    }

    async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<BlockPage> {
        (**self).list_children(block_id, cursor).await
    }
}
