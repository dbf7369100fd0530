//! # REST API for Data Export
//!
//! Endpoints for downloading the whole farm as one JSON document, writing
//! that document to a directory on the server, or exporting one collection
//! as CSV.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::info;

use crate::backend::io::rest::errors::message_response;
use crate::backend::io::rest::{error_response, AuthUser};
use crate::backend::AppState;
use shared::{Collection, ExportToPathRequest};

/// Create a router for export related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(export_document))
        .route("/to-path", post(export_to_path))
        .route("/csv/:collection", get(export_csv))
}

/// Download the export document as an attachment
pub async fn export_document(State(state): State<AppState>, AuthUser(actor): AuthUser) -> impl IntoResponse {
    info!("GET /api/data/export");

    match state.export_service.export_document(&actor).await {
        Ok(export) => {
            let disposition = format!("attachment; filename=\"{}\"", export.filename);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                export.content,
            )
                .into_response()
        }
        Err(e) => error_response("export data", e),
    }
}

/// Export data directly to a specified directory (or the default location)
pub async fn export_to_path(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<ExportToPathRequest>,
) -> impl IntoResponse {
    info!("POST /api/data/export/to-path - custom_path: {:?}", request.custom_path);

    match state.export_service.export_to_path(&actor, request.custom_path).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("export to path", e),
    }
}

pub async fn export_csv(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(collection): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/data/export/csv/{}", collection);

    let Some(collection) = Collection::from_name(&collection) else {
        return message_response(StatusCode::NOT_FOUND, format!("Unknown collection: {}", collection));
    };

    match state.export_service.export_csv(&actor, collection).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("export CSV", e),
    }
}
