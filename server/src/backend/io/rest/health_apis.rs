//! # REST API for Health Records

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use log::info;

use crate::backend::io::rest::{error_response, AuthUser};
use crate::backend::AppState;
use shared::{CreateHealthRecordRequest, UpdateHealthRecordRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health-records", get(list_health_records).post(create_health_record))
        .route("/health-records/:id", put(update_health_record))
}

pub async fn list_health_records(State(state): State<AppState>, AuthUser(actor): AuthUser) -> impl IntoResponse {
    info!("GET /api/health-records");

    match state.health_service.list_health_records(&actor).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => error_response("list health records", e),
    }
}

pub async fn create_health_record(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateHealthRecordRequest>,
) -> impl IntoResponse {
    info!("POST /api/health-records - request: {:?}", request);

    match state.health_service.create_health_record(&actor, request).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response("create health record", e),
    }
}

pub async fn update_health_record(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateHealthRecordRequest>,
) -> impl IntoResponse {
    info!("PUT /api/health-records/{} - request: {:?}", id, request);

    match state.health_service.update_health_record(&actor, id, request).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response("update health record", e),
    }
}
