use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::crawl::UnchangedPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub notion: NotionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotionConfig {
    pub root_page_id: String,
    /// Name of the environment variable holding the integration token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_env() -> String {
    "NOTION_TOKEN".to_string()
}
fn default_api_base() -> String {
    "https://api.notion.com".to_string()
}
fn default_api_version() -> String {
    "2022-06-28".to_string()
}
fn default_page_size() -> u32 {
    100
}
fn default_rate_limit_ms() -> u64 {
    350
}
fn default_timeout_secs() -> u64 {
    30
}

impl NotionConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/notion-cache.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Seconds between scheduled syncs. `0` disables the scheduler.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Pages whose title contains this are skipped with their subtree.
    #[serde(default = "default_exclude_marker")]
    pub exclude_marker: String,
    #[serde(default)]
    pub on_unchanged: UnchangedPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            exclude_marker: default_exclude_marker(),
            on_unchanged: UnchangedPolicy::default(),
        }
    }
}

fn default_interval_secs() -> u64 {
    24 * 24 * 60 * 60
}
fn default_exclude_marker() -> String {
    "이전".to_string()
}

impl SyncConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

fn default_max_results() -> usize {
    crate::search::MAX_RESULTS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.notion.root_page_id.trim().is_empty() {
        anyhow::bail!("notion.root_page_id must not be empty");
    }

    if !(1..=100).contains(&config.notion.page_size) {
        anyhow::bail!("notion.page_size must be in [1, 100]");
    }

    if config.sync.exclude_marker.is_empty() {
        anyhow::bail!("sync.exclude_marker must not be empty");
    }

    if config.search.max_results < 1 {
        anyhow::bail!("search.max_results must be >= 1");
    }

    Ok(config)
}
