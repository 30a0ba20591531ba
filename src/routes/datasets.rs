use crate::error::AppError;
use crate::services::{advisor, loader, profile, profile::DatasetProfile, table::Table};
use crate::AppState;
use axum::{extract::State, http::Method, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/datasets/analyze", post(analyze_dataset))
        .route("/datasets/suggest", post(suggest_charts))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    path: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    path: String,
    /// When present, suggestions are scoped to this column selection;
    /// when absent, the whole table is considered.
    columns: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    suggestions: Vec<&'static str>,
}

/// Load a table off the async runtime, enforcing the configured size cap
/// before touching the contents.
async fn load_table(state: &AppState, path: String) -> Result<Table, AppError> {
    let path = PathBuf::from(path);
    let metadata = std::fs::metadata(&path)
        .map_err(|e| AppError::InvalidInput(format!("Cannot read '{}': {}", path.display(), e)))?;
    if metadata.len() > state.config.max_file_size as u64 {
        return Err(AppError::InvalidInput(format!(
            "File exceeds the {} byte limit",
            state.config.max_file_size
        )));
    }

    tokio::task::spawn_blocking(move || loader::load(&path))
        .await
        .map_err(|e| AppError::Internal(format!("Loader task failed: {}", e)))?
}

#[axum::debug_handler]
async fn analyze_dataset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<DatasetProfile>, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Analyzing dataset at '{}'", request.path);

    let table = load_table(&state, request.path).await?;
    let profile = profile::analyze(&table);

    tracing::info!(
        "Analysis completed in {:?}: {} rows, {} columns",
        start.elapsed(),
        profile.row_count,
        profile.column_count
    );
    Ok(Json(profile))
}

#[axum::debug_handler]
async fn suggest_charts(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, AppError> {
    let start = std::time::Instant::now();
    tracing::info!(
        "Suggesting charts for '{}' (selection: {:?})",
        request.path,
        request.columns
    );

    let table = load_table(&state, request.path).await?;
    let suggestions = match &request.columns {
        Some(columns) => advisor::suggest_for_columns(&table, columns)?,
        None => advisor::suggest_for_table(&table),
    };

    tracing::info!(
        "Produced {} suggestions in {:?}",
        suggestions.len(),
        start.elapsed()
    );
    Ok(Json(SuggestResponse { suggestions }))
}
