use anyhow::Result;
use axum::{
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use pagesearch_core::query::search;
use pagesearch_core::{CorpusStore, RankerConfig, SnapshotCell};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CorpusStore>,
    pub snapshot: Arc<SnapshotCell>,
    pub ranker: Arc<RankerConfig>,
    pub admin_token: Option<String>,
}

pub fn build_app(store_dir: &str, ranker: RankerConfig) -> Result<Router> {
    // Load the published tables at startup
    let store = CorpusStore::open(store_dir)?;
    let snapshot = store.load_snapshot()?;
    tracing::info!(num_docs = snapshot.num_docs(), ranked = snapshot.ranks.len(), "snapshot loaded");
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState {
        store: Arc::new(store),
        snapshot: Arc::new(SnapshotCell::new(snapshot)),
        ranker: Arc::new(ranker),
        admin_token,
    };
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
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
        .route("/", get(query_page))
        .route("/searchengine", get(results_page).post(results_form))
        .route("/api/search", get(search_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/admin/reload", post(reload))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Rank off the async workers; results come from whatever snapshot is published right now.
async fn ranked_urls(state: &AppState, q: String, k: Option<usize>) -> Result<Vec<String>, (StatusCode, String)> {
    let snapshot = state.snapshot.load();
    let mut config = (*state.ranker).clone();
    if let Some(k) = k {
        config.top_final = k.clamp(1, 100);
    }
    tokio::task::spawn_blocking(move || search(&q, &snapshot, &config))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let results = ranked_urls(&state, params.q.clone(), params.k).await?;
    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, hits = results.len(), "search served");
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

async fn query_page() -> Html<&'static str> {
    Html(QUERY_PAGE)
}

async fn results_page(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Html<String>, (StatusCode, String)> {
    render_results(&state, params).await
}

async fn results_form(State(state): State<AppState>, Form(params): Form<SearchParams>) -> Result<Html<String>, (StatusCode, String)> {
    render_results(&state, params).await
}

async fn render_results(state: &AppState, params: SearchParams) -> Result<Html<String>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let urls = ranked_urls(state, params.q.clone(), params.k).await?;
    let items: String = urls
        .iter()
        .map(|u| {
            let u = escape_html(u);
            format!("<li><a href=\"{u}\">{u}</a></li>\n")
        })
        .collect();
    let body = if urls.is_empty() { "<p>No matching pages.</p>".to_string() } else { format!("<ol>\n{items}</ol>") };
    Ok(Html(format!(
        "<!doctype html>\n<html><head><title>Results</title></head><body>\n<h1>Results for \"{}\"</h1>\n{}\n<p>{:.3} s</p>\n<a href=\"/\">New search</a>\n</body></html>",
        escape_html(&params.q),
        body,
        start.elapsed().as_secs_f64()
    )))
}

const QUERY_PAGE: &str = r#"<!doctype html>
<html><head><title>Search</title></head><body>
<h1>Search</h1>
<form action="/searchengine" method="post">
<input type="text" name="q" autofocus>
<input type="submit" value="Search">
</form>
</body></html>"#;

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// --- Admin endpoints ---

/// Re-read the store and publish a fresh snapshot. In-flight searches keep the old one.
async fn reload(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let store = state.store.clone();
    let snapshot = tokio::task::spawn_blocking(move || store.load_snapshot())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    let num_docs = snapshot.num_docs();
    state.snapshot.publish(snapshot);
    tracing::info!(num_docs, "snapshot republished");
    Ok(Json(serde_json::json!({ "num_docs": num_docs })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
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
