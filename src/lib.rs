//! # Notion Mirror
//!
//! Incrementally mirrors a Notion page tree into a local flat cache of
//! plain-text documents and answers keyword queries against that cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌────────────┐
//! │ PageSource  │──▶│ TreeReader  │──▶│  crawl()   │
//! │ Notion API  │   │ paginate +  │   │ DFS + hit/ │
//! └─────────────┘   │ pace calls  │   │ miss reuse │
//!                   └─────────────┘   └─────┬──────┘
//!                                           ▼
//!                   ┌─────────────┐   ┌────────────┐
//!                   │  search()   │◀──│ SyncCache  │
//!                   │ TF ranking  │   │ Arc swap + │
//!                   └─────────────┘   │ JSON file  │
//!                                     └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export NOTION_TOKEN=secret_...
//! nmirror sync                     # crawl and write the cache file
//! nmirror search "연차 신청"        # query the cache
//! nmirror serve                    # HTTP API + periodic sync
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Documents, snapshots, search results |
//! | [`blocks`] | Typed content blocks |
//! | [`parser`] | Block flattening to plain text |
//! | [`traits`] | The `PageSource` remote seam |
//! | [`connector_notion`] | Notion REST API client |
//! | [`memory`] | In-memory workspace for tests |
//! | [`reader`] | Paced, paginated tree reads |
//! | [`crawl`] | Page-tree crawler |
//! | [`cache`] | Snapshot ownership and persistence |
//! | [`search`] | Keyword relevance ranking |
//! | [`scheduler`] | Periodic sync task |
//! | [`server`] | HTTP API |
//! | [`error`] | Error taxonomy |

pub mod blocks;
pub mod cache;
pub mod config;
pub mod connector_notion;
pub mod crawl;
pub mod error;
pub mod memory;
pub mod models;
pub mod parser;
pub mod reader;
pub mod scheduler;
pub mod search;
pub mod server;
pub mod traits;
