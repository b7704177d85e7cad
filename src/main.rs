//! # Notion Mirror CLI (`nmirror`)
//!
//! ## Usage
//!
//! ```bash
//! nmirror --config ./config/nmirror.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nmirror sync` | Crawl the Notion tree and replace the cache |
//! | `nmirror search "<query>"` | Search the cached pages |
//! | `nmirror get <id>` | Print one cached page |
//! | `nmirror pages` | List cached pages |
//! | `nmirror serve` | Start the HTTP server and periodic sync |
//!
//! `search`, `get`, and `pages` read the cache file only and work offline.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use notion_mirror::cache::{load_snapshot, SharedCache, SyncCache};
use notion_mirror::config::{self, Config};
use notion_mirror::connector_notion::NotionClient;
use notion_mirror::models::Snapshot;
use notion_mirror::search::search;
use notion_mirror::server;
use notion_mirror::traits::PageSource;

/// Notion Mirror: a local plain-text cache of a Notion page tree with
/// keyword search.
#[derive(Parser)]
#[command(name = "nmirror", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/nmirror.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the Notion page tree and replace the cached snapshot.
    ///
    /// Pages whose last-edited time is unchanged reuse their cached text.
    /// On failure the existing cache is left as it was.
    Sync,

    /// Search cached pages.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a cached page by id.
    Get {
        /// Notion page id.
        id: String,
    },

    /// List cached pages in crawl order.
    Pages,

    /// Start the HTTP server.
    ///
    /// Also runs a sync immediately and then every `[sync].interval_secs`,
    /// unless the interval is 0.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notion_mirror=info,nmirror=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sync => {
            let cache = connect(&cfg)?;
            let count = cache.synchronize().await?;
            println!("sync");
            println!("  pages cached: {}", count);
            println!("  cache file: {}", cache.path().display());
            println!("ok");
        }
        Commands::Search { query, limit } => {
            let snapshot = read_cache(&cfg)?;
            let limit = limit.unwrap_or(cfg.search.max_results);
            let results = search(&query, &snapshot.pages, limit);
            if results.is_empty() {
                println!("No results.");
            }
            for (i, result) in results.iter().enumerate() {
                println!("{}. [{}] {}", i + 1, result.score, result.document.title);
                println!("    url: {}", result.document.url);
                println!("    excerpt: \"{}\"", result.snippet);
                println!("    id: {}", result.document.id);
                println!();
            }
        }
        Commands::Get { id } => {
            let snapshot = read_cache(&cfg)?;
            let doc = snapshot
                .find(&id)
                .with_context(|| format!("page not found: {}", id))?;
            println!("--- page ---");
            println!("id: {}", doc.id);
            println!("title: {}", doc.title);
            println!("url: {}", doc.url);
            println!("last edited: {}", doc.last_edited_at);
            println!("last synced: {}", doc.last_synced_at.to_rfc3339());
            println!("--- content ---");
            println!("{}", doc.content);
        }
        Commands::Pages => {
            let snapshot = read_cache(&cfg)?;
            println!("{:<34} {:<26} TITLE", "ID", "LAST EDITED");
            for doc in &snapshot.pages {
                println!("{:<34} {:<26} {}", doc.id, doc.last_edited_at, doc.title);
            }
            match snapshot.last_synced_at {
                Some(at) => println!("{} pages, synced {}", snapshot.len(), at.to_rfc3339()),
                None => println!("{} pages, never synced", snapshot.len()),
            }
        }
        Commands::Serve => {
            let cache = connect(&cfg)?;
            server::run_server(&cfg, cache).await?;
        }
    }

    Ok(())
}

fn connect(cfg: &Config) -> Result<SharedCache> {
    let client = NotionClient::from_env(&cfg.notion)?;
    let source: Arc<dyn PageSource> = Arc::new(client);
    Ok(SyncCache::from_config(cfg, source))
}

/// Read the cache file for offline commands. A missing file reads as empty.
fn read_cache(cfg: &Config) -> Result<Snapshot> {
    Ok(load_snapshot(&cfg.cache.path)
        .with_context(|| format!("Failed to read cache file: {}", cfg.cache.path.display()))?
        .unwrap_or_default())
}
