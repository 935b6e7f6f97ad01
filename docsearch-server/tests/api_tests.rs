use std::sync::Arc;

use async_trait::async_trait;
use docsearch_rag::{
    Document, EmbeddingProvider, InMemoryVectorStore, RagError, Result, SearchService,
    TextGenerator,
};
use docsearch_server::{AppState, app_router};
use serde_json::{Value, json};

struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed_document(&self, text: &str, _title: &str) -> Result<Vec<f32>> {
        self.embed_query(text).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("explode") {
            return Err(RagError::EmbeddingError { provider: "stub".into(), message: "quota".into() });
        }
        let lower = text.to_lowercase();
        Ok(vec![lower.matches("vtgate").count() as f32, lower.matches("backup").count() as f32, 0.1])
    }

    fn dimensions(&self) -> usize {
        3
    }
}

struct StubGenerator;

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.contains("search query enhancer") {
            Ok("vtgate proxy".into())
        } else {
            Ok(format!("generated {} chars", prompt.len()))
        }
    }
}

fn page(id: u64, title: &str, version: &str, content: &str) -> Document {
    Document {
        id_parent: id,
        title: title.into(),
        url: format!("https://vitess.io/docs/{id}/"),
        version_or_commonresource: version.into(),
        content: content.into(),
        char_count: content.len() as u64,
        approx_token_count: 0,
    }
}

async fn service(populated: bool) -> Arc<SearchService> {
    let service = SearchService::builder()
        .embedding_provider(Arc::new(StubEmbedder))
        .generator(Arc::new(StubGenerator))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .expect("service");

    if populated {
        let corpus = vec![
            page(1, "VTGate", "v22.0 (Development)", "VTGate is the vtgate proxy"),
            page(2, "Backups", "v21.0 (Stable)", "Take a backup"),
            page(3, "FAQ", "Common Resources", "Frequently asked vtgate backup questions"),
        ];
        service.ingest_if_empty(&corpus).await.expect("ingest");
    }
    Arc::new(service)
}

async fn spawn_server(service: Arc<SearchService>) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn post(base: &str, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .expect("post response");
    let status = response.status().as_u16();
    (status, response.json().await.expect("json body"))
}

async fn get(base: &str, path: &str) -> (u16, Value) {
    let response = reqwest::get(format!("{base}{path}")).await.expect("get response");
    let status = response.status().as_u16();
    (status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn query_applies_request_defaults() {
    let (base, handle) = spawn_server(service(true).await).await;

    let (status, body) = post(&base, "/query", json!({ "query": "vtgate" })).await;
    assert_eq!(status, 200);

    let results = body["results"].as_array().expect("results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["metadata"]["title"], "VTGate");
    assert!(results[0]["similarity_score"].as_f64().expect("score") > 0.9);
    assert_eq!(body["filter_used"]["$or"][0]["version_or_commonresource"], "v22.0 (Development)");

    handle.abort();
}

#[tokio::test]
async fn query_without_version_reports_none_filter() {
    let (base, handle) = spawn_server(service(true).await).await;

    let (status, body) =
        post(&base, "/query", json!({ "query": "backup", "version": "", "n_results": 1 })).await;
    assert_eq!(status, 200);
    assert_eq!(body["filter_used"], "None");
    assert_eq!(body["results"][0]["metadata"]["title"], "Backups");

    handle.abort();
}

#[tokio::test]
async fn raw_query_without_matches_says_so() {
    let (base, handle) = spawn_server(service(true).await).await;

    let (status, body) = post(
        &base,
        "/rawquery-cli",
        json!({ "query": "vtgate", "version": "v9.0", "include_resources": false }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["summary"], "No results found for your query.");
    assert_eq!(body["results"], json!([]));

    handle.abort();
}

#[tokio::test]
async fn enhance_query_returns_rewrite_and_summary() {
    let (base, handle) = spawn_server(service(true).await).await;

    let (status, body) = post(&base, "/enhance-query-cli", json!({ "query": "proxy?" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["enhanced_query"], "vtgate proxy");
    assert!(body["summary"].as_str().expect("summary").starts_with("generated"));
    assert_eq!(body["references"][0]["number"], 1);

    handle.abort();
}

#[tokio::test]
async fn failures_map_to_detail() {
    let (base, handle) = spawn_server(service(false).await).await;

    let (status, body) = post(&base, "/query", json!({ "query": "vtgate" })).await;
    assert_eq!(status, 500);
    assert!(body["detail"].as_str().expect("detail").contains("does not exist"));

    let (status, body) = post(&base, "/test", json!({ "text": "explode" })).await;
    assert_eq!(status, 500);
    assert!(body["detail"].as_str().expect("detail").contains("quota"));

    handle.abort();
}

#[tokio::test]
async fn inspect_reports_errors_in_body() {
    let (base, handle) = spawn_server(service(false).await).await;

    let (status, body) = get(&base, "/inspect").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "error");

    handle.abort();
}

#[tokio::test]
async fn introspection_routes() {
    let (base, handle) = spawn_server(service(true).await).await;

    let (_, root) = get(&base, "/").await;
    assert!(root["message"].as_str().expect("message").contains("Documentation Search"));

    let (status, versions) = get(&base, "/versions").await;
    assert_eq!(status, 200);
    assert_eq!(versions["available_versions"][0], "v22.0 (Development)");
    assert_eq!(versions["database_versions"].as_array().expect("versions").len(), 3);

    let (status, stats) = get(&base, "/chromadb-stats").await;
    assert_eq!(status, 200);
    assert_eq!(stats["collection_info"]["total_records"], 3);
    assert_eq!(stats["common_resources"]["found_resources"], json!(["FAQ"]));

    let (status, report) = get(&base, "/inspect").await;
    assert_eq!(status, 200);
    assert_eq!(report["status"], "populated");

    handle.abort();
}

#[tokio::test]
async fn diagnostics_routes() {
    let (base, handle) = spawn_server(service(false).await).await;

    let (status, body) = post(&base, "/test", json!({ "text": "vtgate" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["embedding"].as_array().expect("embedding").len(), 3);

    let (status, body) = post(&base, "/testgeminiflash", json!({})).await;
    assert_eq!(status, 200);
    assert!(body["response"].as_str().expect("response").starts_with("generated"));

    handle.abort();
}
