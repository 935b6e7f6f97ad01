use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use docsearch_rag::{
    CollectionStats, EnhancedSearchResponse, SearchRequest, SearchResponse, SearchService,
    SummaryResponse, VersionsResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::ApiResult;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
}

impl AppState {
    pub fn new(service: Arc<SearchService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    "How does RLHF work?".to_string()
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/query", post(query))
        .route("/rawquery-cli", post(raw_query))
        .route("/enhance-query-cli", post(enhance_query))
        .route("/versions", get(versions))
        .route("/chromadb-stats", get(stats))
        .route("/inspect", get(inspect))
        .route("/test", post(test_embedding))
        .route("/testgeminiflash", post(test_generation))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("docsearch listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Json(json!({ "message": "Vitess Documentation Search API" }))
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    Ok(Json(state.service.search(&request).await?))
}

async fn raw_query(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SummaryResponse>> {
    Ok(Json(state.service.summarize(&request).await?))
}

async fn enhance_query(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<EnhancedSearchResponse>> {
    Ok(Json(state.service.enhanced_search(&request).await?))
}

async fn versions(State(state): State<AppState>) -> ApiResult<Json<VersionsResponse>> {
    Ok(Json(state.service.versions().await?))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<CollectionStats>> {
    Ok(Json(state.service.stats().await?))
}

/// Errors are reported in the body with a 200 so the page always renders.
async fn inspect(State(state): State<AppState>) -> Response {
    match state.service.inspect().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!(error = %e, "inspection failed");
            Json(json!({ "status": "error", "message": e.to_string() })).into_response()
        }
    }
}

async fn test_embedding(
    State(state): State<AppState>,
    Json(request): Json<EmbeddingRequest>,
) -> ApiResult<Json<Value>> {
    let embedding = state.service.embed_text(&request.text).await?;
    Ok(Json(json!({ "embedding": embedding })))
}

async fn test_generation(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> ApiResult<Json<Value>> {
    let response = state.service.complete(&request.prompt).await?;
    Ok(Json(json!({ "response": response })))
}
