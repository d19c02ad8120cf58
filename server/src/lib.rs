use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use docsearch_core::persist::{load_index, IndexPaths};
use docsearch_core::{DocId, DocMeta, Document, EngineConfig, IndexBuilder, IndexHandle, QueryEngine, SearchHit};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    /// Generation of the snapshot that answered the query.
    pub generation: u64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct PublishResponse {
    pub generation: u64,
    pub num_docs: usize,
    pub num_terms: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub index_dir: PathBuf,
    pub handle: Arc<IndexHandle>,
    pub engine: QueryEngine,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

pub fn build_app(index_dir: String) -> Result<Router> {
    build_app_with_config(index_dir, &EngineConfig::default())
}

pub fn build_app_with_config(index_dir: String, config: &EngineConfig) -> Result<Router> {
    // Load the persisted index at startup; its tokenizer settings travel with it
    let index = load_index(&IndexPaths::new(&index_dir))?;
    tracing::info!(index_dir = %index_dir, num_docs = index.num_docs(), num_terms = index.num_terms(), "index loaded");
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState {
        index_dir: PathBuf::from(&index_dir),
        handle: Arc::new(IndexHandle::new(index)),
        engine: QueryEngine::new(config.scoring),
        admin_token,
    };
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/rebuild", post(index_rebuild))
        .route("/index/reload", post(index_reload))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let (generation, snapshot) = state.handle.versioned();

    let ranked = state.engine.search(&snapshot, &params.q);
    let total_hits = ranked.len();
    let k = params.k.clamp(1, MAX_K);
    let results = state.engine.resolve(&snapshot, &ranked[..total_hits.min(k)]);

    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), generation, total_hits, results })
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<DocMeta>, ApiError> {
    let snapshot = state.handle.snapshot();
    match snapshot.metadata_for(doc_id) {
        Ok(meta) => Ok(Json(meta.clone())),
        Err(err) => Err((StatusCode::NOT_FOUND, err.to_string())),
    }
}

/// Replace the served index with one built from the posted documents.
/// A rejected build leaves the current index serving.
async fn index_rebuild(State(state): State<AppState>, headers: HeaderMap, Json(docs): Json<Vec<Document>>) -> Result<Json<PublishResponse>, ApiError> {
    authorize(&state, &headers)?;
    let handle = state.handle.clone();
    let published = tokio::task::spawn_blocking(move || {
        let builder = IndexBuilder::new(handle.snapshot().tokenizer().clone());
        handle.rebuild(&builder, docs)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match published {
        Ok((generation, index)) => Ok(Json(PublishResponse { generation, num_docs: index.num_docs(), num_terms: index.num_terms() })),
        Err(err) => Err((StatusCode::BAD_REQUEST, err.to_string())),
    }
}

/// Re-read the index directory (e.g. after the indexer rewrote it) and publish it.
async fn index_reload(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<PublishResponse>, ApiError> {
    authorize(&state, &headers)?;
    let handle = state.handle.clone();
    let index_dir = state.index_dir.clone();
    let loaded = tokio::task::spawn_blocking(move || {
        load_index(&IndexPaths::new(&index_dir)).map(|index| handle.publish(index))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match loaded {
        Ok((generation, index)) => Ok(Json(PublishResponse { generation, num_docs: index.num_docs(), num_terms: index.num_terms() })),
        Err(err) => {
            tracing::warn!(%err, "reload failed, keeping published index");
            Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
