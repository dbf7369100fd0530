//! # REST API for Breeding Records

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
use shared::{CreateBreedingRecordRequest, UpdateBreedingRecordRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/breeding-records", get(list_breeding_records).post(create_breeding_record))
        .route("/breeding-records/:id", put(update_breeding_record))
}

pub async fn list_breeding_records(State(state): State<AppState>, AuthUser(actor): AuthUser) -> impl IntoResponse {
    info!("GET /api/breeding-records");

    match state.breeding_service.list_breeding_records(&actor).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => error_response("list breeding records", e),
    }
}

pub async fn create_breeding_record(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateBreedingRecordRequest>,
) -> impl IntoResponse {
    info!("POST /api/breeding-records - request: {:?}", request);

    match state.breeding_service.create_breeding_record(&actor, request).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response("create breeding record", e),
    }
}

pub async fn update_breeding_record(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateBreedingRecordRequest>,
) -> impl IntoResponse {
    info!("PUT /api/breeding-records/{} - request: {:?}", id, request);

    match state.breeding_service.update_breeding_record(&actor, id, request).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response("update breeding record", e),
    }
}
