//! # REST API for Rabbits
//!
//! Listing is filtered to the caller's assignments; any role may register a
//! rabbit.

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
use shared::{CreateRabbitRequest, UpdateRabbitRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rabbits", get(list_rabbits).post(create_rabbit))
        .route("/rabbits/:id", put(update_rabbit))
        .route("/rabbits/:id/health-records", get(list_rabbit_health_records))
}

pub async fn list_rabbits(State(state): State<AppState>, AuthUser(actor): AuthUser) -> impl IntoResponse {
    info!("GET /api/rabbits");

    match state.rabbit_service.list_rabbits(&actor).await {
        Ok(rabbits) => (StatusCode::OK, Json(rabbits)).into_response(),
        Err(e) => error_response("list rabbits", e),
    }
}

pub async fn create_rabbit(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateRabbitRequest>,
) -> impl IntoResponse {
    info!("POST /api/rabbits - request: {:?}", request);

    match state.rabbit_service.create_rabbit(&actor, request).await {
        Ok(rabbit) => (StatusCode::CREATED, Json(rabbit)).into_response(),
        Err(e) => error_response("create rabbit", e),
    }
}

pub async fn update_rabbit(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRabbitRequest>,
) -> impl IntoResponse {
    info!("PUT /api/rabbits/{} - request: {:?}", id, request);

    match state.rabbit_service.update_rabbit(&actor, id, request).await {
        Ok(rabbit) => (StatusCode::OK, Json(rabbit)).into_response(),
        Err(e) => error_response("update rabbit", e),
    }
}

/// Health history of one rabbit; `:id` is the rabbit's tag
pub async fn list_rabbit_health_records(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(tag_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/rabbits/{}/health-records", tag_id);

    match state.health_service.list_for_rabbit(&actor, &tag_id).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => error_response("list health records", e),
    }
}
