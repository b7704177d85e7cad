//! HTTP API tests: the router served on an ephemeral port, driven by reqwest.

use std::sync::Arc;
use std::time::Duration;

use notion_mirror::cache::{SharedCache, SyncCache};
use notion_mirror::crawl::{CrawlOptions, UnchangedPolicy};
use notion_mirror::memory::InMemoryWorkspace;
use notion_mirror::reader::TreeReader;
use notion_mirror::server::router;
use notion_mirror::traits::PageSource;
use serde_json::{json, Value};
use tempfile::TempDir;

struct TestServer {
    base: String,
    ws: InMemoryWorkspace,
    handle: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start() -> TestServer {
    let tmp = TempDir::new().unwrap();
    let ws = InMemoryWorkspace::new()
        .page("root", "Handbook", "t0")
        .paragraphs("root", &["welcome to the team"])
        .child_page("root", "deploy")
        .page("deploy", "Deploy guide", "t0")
        .paragraphs("deploy", &["run the deploy script", "check the dashboard"]);

    let source: Arc<dyn PageSource> = Arc::new(ws.clone());
    let cache: SharedCache = Arc::new(SyncCache::open(
        TreeReader::new(source, Duration::ZERO),
        "root",
        CrawlOptions {
            exclude_marker: "이전".to_string(),
            on_unchanged: UnchangedPolicy::Trust,
        },
        tmp.path().join("cache.json"),
    ));

    let app = router(cache, 5);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        ws,
        handle,
        _tmp: tmp,
    }
}

#[tokio::test]
async fn test_health_before_and_after_sync() {
    let server = start().await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["pages"], 0);
    assert!(health["last_synced_at"].is_null());

    let resp = client
        .post(format!("{}/sync", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["pages"], 2);

    let health: Value = client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["pages"], 2);
    assert!(health["last_synced_at"].is_string());
}

#[tokio::test]
async fn test_search_and_page_lookup() {
    let server = start().await;
    let client = reqwest::Client::new();
    client
        .post(format!("{}/sync", server.base))
        .send()
        .await
        .unwrap();

    let body: Value = client
        .post(format!("{}/tools/search", server.base))
        .json(&json!({ "query": "deploy script" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "deploy");
    assert_eq!(results[0]["url"], "https://www.notion.so/deploy");
    assert!(results[0]["snippet"].as_str().unwrap().contains("deploy script"));

    let pages: Value = client
        .get(format!("{}/pages", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = pages["pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["root", "deploy"]);

    let page: Value = client
        .get(format!("{}/pages/deploy", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["title"], "Deploy guide");
    assert_eq!(page["content"], "run the deploy script\ncheck the dashboard");
}

#[tokio::test]
async fn test_error_contract() {
    let server = start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/tools/search", server.base))
        .json(&json!({ "query": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .get(format!("{}/pages/missing", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    server.ws.fail("deploy");
    let resp = client
        .post(format!("{}/sync", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "remote_error");
}
