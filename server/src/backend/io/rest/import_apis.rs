//! # REST API for Data Import
//!
//! Admin-only. A rejected document answers 422 and leaves every collection
//! untouched.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use log::info;

use crate::backend::io::rest::{error_response, AuthUser};
use crate::backend::AppState;
use shared::{ImportDataRequest, ImportFromPathRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(import_document))
        .route("/from-path", post(import_from_path))
}

pub async fn import_document(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<ImportDataRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/data/import - mode: {}, {} bytes",
        request.mode,
        request.content.len()
    );

    match state
        .import_service
        .import_document(&actor, &request.content, request.mode)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("import data", e),
    }
}

pub async fn import_from_path(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<ImportFromPathRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/data/import/from-path - mode: {}, path: {}",
        request.mode, request.file_path
    );

    match state
        .import_service
        .import_from_path(&actor, &request.file_path, request.mode)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("import data", e),
    }
}
