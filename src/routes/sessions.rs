use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{
    config::Config,
    error::AppError,
    models::{ColumnStats, ColumnType, DataSession, Row, StatusCheck},
    services::{ingest, stats},
    AppState,
};

const PREVIEW_ROWS: usize = 100;
const STATUS_LIST_LIMIT: usize = 1000;

pub fn routes(config: &Config) -> Router<Arc<AppState>> {
    let cors = cors_layer(&config.cors_origins);

    Router::new()
        .nest(
            "/api",
            Router::new()
                .route("/", get(root))
                .route("/status", post(create_status_check).get(get_status_checks))
                .route("/fetch-data", post(fetch_data))
                .route("/session/:session_id", get(get_session).delete(delete_session))
                .route("/session/:session_id/data", get(get_session_data))
                .route("/session/:session_id/analytics", get(get_session_analytics))
                .route("/analyze", post(analyze_columns)),
        )
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    if origins.iter().any(|origin| origin == "*") {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(parsed))
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Analytics Dashboard API" }))
}

#[derive(Debug, Deserialize)]
pub struct StatusCheckCreate {
    client_name: String,
}

async fn create_status_check(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StatusCheckCreate>,
) -> Result<Json<StatusCheck>, AppError> {
    let check = StatusCheck::new(request.client_name);
    state.store.insert_status(&check).await?;
    Ok(Json(check))
}

async fn get_status_checks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StatusCheck>>, AppError> {
    Ok(Json(state.store.list_status(STATUS_LIST_LIMIT).await?))
}

#[derive(Debug, Deserialize)]
pub struct FetchDataRequest {
    url: String,
}

#[derive(Debug, Serialize)]
pub struct FetchDataResponse {
    session_id: String,
    columns: Vec<String>,
    column_types: IndexMap<String, ColumnType>,
    row_count: usize,
    preview: Vec<Row>,
}

#[axum::debug_handler]
async fn fetch_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FetchDataRequest>,
) -> Result<Json<FetchDataResponse>, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Fetching webhook data, URL length: {}", request.url.len());

    let payload = ingest::fetch_payload(&request.url, state.config.fetch_timeout()).await?;
    let table = ingest::normalize_payload(payload)?;
    tracing::info!(
        "Payload normalized: {} rows, {} columns, took {:?}",
        table.rows.len(),
        table.columns.len(),
        start.elapsed()
    );

    // Types are inferred once here and reused by every later analysis call.
    let infer_start = std::time::Instant::now();
    let column_types: IndexMap<String, ColumnType> = table
        .columns
        .iter()
        .map(|column| {
            let vector = ingest::column_vector(&table.rows, column);
            (column.clone(), stats::infer(&vector))
        })
        .collect();
    tracing::info!("Schema inference completed in {:?}", infer_start.elapsed());

    let session = DataSession::new(request.url, table.rows, table.columns, column_types);
    state.store.insert_session(&session).await?;
    tracing::info!(
        "Session {} created with {} rows in {:?}",
        session.id,
        session.row_count,
        start.elapsed()
    );

    let preview: Vec<Row> = session.data.iter().take(PREVIEW_ROWS).cloned().collect();
    Ok(Json(FetchDataResponse {
        session_id: session.id.clone(),
        columns: session.columns.clone(),
        column_types: session.column_types.clone(),
        row_count: session.row_count,
        preview,
    }))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<DataSession>, AppError> {
    let session = state.store.get_session(&session_id).await?;
    Ok(Json((*session).clone()))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_page_size")]
    page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct PagedRows {
    data: Vec<Row>,
    total: usize,
    page: usize,
    page_size: usize,
    total_pages: usize,
}

async fn get_session_data(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PagedRows>, AppError> {
    let session = state.store.get_session(&session_id).await?;
    Ok(Json(paginate(&session.data, params.page, params.page_size)))
}

fn paginate(rows: &[Row], page: usize, page_size: usize) -> PagedRows {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = rows.len();
    let start = (page - 1).saturating_mul(page_size);
    let data: Vec<Row> = rows.iter().skip(start).take(page_size).cloned().collect();

    PagedRows {
        data,
        total,
        page,
        page_size,
        total_pages: (total + page_size - 1) / page_size,
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsRequest {
    session_id: String,
    columns: Vec<String>,
}

/// Unknown columns are rejected up front rather than skipped, so a typo in a
/// dashboard request surfaces instead of silently returning partial results.
#[axum::debug_handler]
async fn analyze_columns(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyticsRequest>,
) -> Result<Json<Value>, AppError> {
    let start = std::time::Instant::now();
    let session = state.store.get_session(&request.session_id).await?;
    tracing::info!(
        "Analyzing {} columns for session {}",
        request.columns.len(),
        request.session_id
    );

    for column in &request.columns {
        if !session.columns.contains(column) {
            return Err(AppError::UnknownColumn(column.clone()));
        }
    }

    // Each column's computation touches only its own vector.
    let analytics: Vec<ColumnStats> = request
        .columns
        .par_iter()
        .map(|column| {
            let vector = ingest::column_vector(&session.data, column);
            let column_type = session
                .column_types
                .get(column)
                .copied()
                .unwrap_or(ColumnType::Categorical);
            stats::analyze_column(column, &vector, column_type)
        })
        .collect();

    state
        .store
        .save_analytics(&request.session_id, analytics.clone(), request.columns.clone())
        .await?;
    tracing::info!("Analysis completed in {:?}", start.elapsed());

    Ok(Json(json!({ "analytics": analytics })))
}

async fn get_session_analytics(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = state.store.get_session(&session_id).await?;
    Ok(Json(json!({
        "analytics": session.analytics.clone().unwrap_or_default(),
        "analyzed_columns": session.analyzed_columns.clone().unwrap_or_default(),
    })))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.store.delete_session(&session_id).await?;
    Ok(Json(json!({ "message": "Session deleted successfully" })))
}
