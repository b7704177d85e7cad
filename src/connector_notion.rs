//! Notion REST API connector.
//!
//! Implements [`PageSource`] over the public Notion API with plain `reqwest`
//! calls: one `GET /v1/pages/{id}` per metadata fetch and one
//! `GET /v1/blocks/{id}/children` per listing page.
//!
//! # Configuration
//!
//! ```toml
//! [notion]
//! root_page_id = "0f1e2d3c4b5a69788796a5b4c3d2e1f0"
//! token_env = "NOTION_TOKEN"
//! # api_base = "http://localhost:9000"   # test double
//! ```
//!
//! # Environment Variables
//!
//! The integration token is read from the variable named by `token_env`
//! (default `NOTION_TOKEN`). It never lives in the config file.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::blocks::{Block, RichText};
use crate::config::NotionConfig;
use crate::error::{Result, SyncError};
use crate::models::{PageMeta, UNTITLED};
use crate::traits::{BlockPage, PageSource};

/// Longest slice of an error body carried into [`SyncError::Remote`].
const ERROR_BODY_LIMIT: usize = 500;

/// HTTP client for one Notion integration.
pub struct NotionClient {
    client: reqwest::Client,
    api_base: String,
    api_version: String,
    token: String,
    page_size: u32,
}

impl NotionClient {
    /// Build a client with an explicit token.
    pub fn new(token: impl Into<String>, config: &NotionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            token: token.into(),
            page_size: config.page_size,
        })
    }

    /// Build a client reading the token from the configured environment variable.
    pub fn from_env(config: &NotionConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env).map_err(|_| {
            SyncError::Config(format!(
                "{} environment variable not set",
                config.token_env
            ))
        })?;
        Self::new(token, config)
    }

    async fn get_json(
        &self,
        operation: &'static str,
        id: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value> {
        let resp = request
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.api_version)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Remote {
                operation,
                id: id.to_string(),
                message: format!(
                    "HTTP {}: {}",
                    status,
                    body.chars().take(ERROR_BODY_LIMIT).collect::<String>()
                ),
            });
        }

        Ok(resp.json::<Value>().await?)
    }
}

#[async_trait]
impl PageSource for NotionClient {
    async fn retrieve_page(&self, page_id: &str) -> Result<PageMeta> {
        debug!(page_id, "retrieve page");
        let url = format!("{}/v1/pages/{}", self.api_base, page_id);
        let body = self
            .get_json("retrieve page", page_id, self.client.get(&url))
            .await?;
        Ok(parse_page_meta(&body))
    }

    async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<BlockPage> {
        debug!(block_id, cursor, "list block children");
        let url = format!("{}/v1/blocks/{}/children", self.api_base, block_id);
        let mut request = self
            .client
            .get(&url)
            .query(&[("page_size", self.page_size.to_string())]);
        if let Some(cursor) = cursor {
            request = request.query(&[("start_cursor", cursor)]);
        }

        let body = self.get_json("list block children", block_id, request).await?;
        Ok(parse_block_page(&body))
    }
}

/// Read title and `last_edited_time` from a page object.
///
/// The title comes from whichever property has `type == "title"`.
/// Objects without `properties` carry no usable metadata at all.
fn parse_page_meta(page: &Value) -> PageMeta {
    let Some(properties) = page.get("properties").and_then(Value::as_object) else {
        return PageMeta::default();
    };

    let title = properties
        .values()
        .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
        .and_then(|prop| prop.get("title"))
        .and_then(RichText::from_json)
        .filter(|text| !text.0.is_empty())
        .map(|text| text.plain())
        .unwrap_or_else(|| UNTITLED.to_string());

    let last_edited = page
        .get("last_edited_time")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    PageMeta { title, last_edited }
}

fn parse_block_page(body: &Value) -> BlockPage {
    let blocks = body
        .get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().map(Block::from_json).collect())
        .unwrap_or_default();

    let has_more = body
        .get("has_more")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let next_cursor = if has_more {
        body.get("next_cursor")
            .and_then(Value::as_str)
            .map(str::to_string)
    } else {
        None
    };

    BlockPage {
        blocks,
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockKind;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(api_base: &str) -> NotionConfig {
        crate::config::parse_config(&format!(
            "[notion]\nroot_page_id = \"root\"\napi_base = \"{}\"\n",
            api_base
        ))
        .unwrap()
        .notion
    }

    #[test]
    fn test_parse_page_meta_title_property() {
        let meta = parse_page_meta(&json!({
            "last_edited_time": "2024-05-01T10:00:00.000Z",
            "properties": {
                "Tags": { "type": "multi_select", "multi_select": [] },
                "Name": {
                    "type": "title",
                    "title": [{ "plain_text": "휴가 " }, { "plain_text": "정책" }]
                }
            }
        }));
        assert_eq!(meta.title, "휴가 정책");
        assert_eq!(meta.last_edited, "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn test_parse_page_meta_defaults() {
        let empty_title = parse_page_meta(&json!({
            "last_edited_time": "2024-05-01T10:00:00.000Z",
            "properties": { "title": { "type": "title", "title": [] } }
        }));
        assert_eq!(empty_title.title, UNTITLED);
        assert_eq!(empty_title.last_edited, "2024-05-01T10:00:00.000Z");

        let no_properties = parse_page_meta(&json!({ "object": "page", "id": "x" }));
        assert_eq!(no_properties, PageMeta::default());
    }

    #[test]
    fn test_parse_block_page_cursor_only_when_more() {
        let done = parse_block_page(&json!({
            "results": [],
            "has_more": false,
            "next_cursor": "ignored"
        }));
        assert_eq!(done.next_cursor, None);

        let more = parse_block_page(&json!({
            "results": [{ "id": "b", "type": "divider", "divider": {} }],
            "has_more": true,
            "next_cursor": "c2"
        }));
        assert_eq!(more.next_cursor.as_deref(), Some("c2"));
        assert_eq!(more.blocks[0].kind, BlockKind::Divider);
    }

    #[tokio::test]
    async fn test_retrieve_page_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/pages/p1"))
            .and(header("Authorization", "Bearer secret"))
            .and(header("Notion-Version", "2022-06-28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "last_edited_time": "2024-06-01T00:00:00.000Z",
                "properties": {
                    "Name": { "type": "title", "title": [{ "plain_text": "Onboarding" }] }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = NotionClient::new("secret", &test_config(&server.uri())).unwrap();
        let meta = client.retrieve_page("p1").await.unwrap();
        assert_eq!(meta.title, "Onboarding");
        assert_eq!(meta.last_edited, "2024-06-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn test_list_children_passes_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/blocks/p1/children"))
            .and(query_param("start_cursor", "c2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "id": "b2",
                    "type": "child_page",
                    "has_children": true,
                    "child_page": { "title": "Nested" }
                }],
                "has_more": false,
                "next_cursor": null
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/blocks/p1/children"))
            .and(query_param("page_size", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "id": "b1",
                    "type": "paragraph",
                    "paragraph": { "rich_text": [{ "plain_text": "hi" }] }
                }],
                "has_more": true,
                "next_cursor": "c2"
            })))
            .mount(&server)
            .await;

        let client = NotionClient::new("secret", &test_config(&server.uri())).unwrap();

        let first = client.list_children("p1", None).await.unwrap();
        assert_eq!(first.blocks.len(), 1);
        assert_eq!(first.next_cursor.as_deref(), Some("c2"));

        let second = client.list_children("p1", Some("c2")).await.unwrap();
        assert_eq!(second.blocks[0].kind, BlockKind::ChildPage);
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn test_http_failure_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/pages/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("object_not_found"))
            .mount(&server)
            .await;

        let client = NotionClient::new("secret", &test_config(&server.uri())).unwrap();
        let err = client.retrieve_page("missing").await.unwrap_err();
        assert!(err.is_remote());
        let msg = err.to_string();
        assert!(msg.contains("404"), "unexpected message: {}", msg);
        assert!(msg.contains("object_not_found"));
    }
}
