//! # REST API for Feed
//!
//! Inventory is readable by everyone and managed by admins and managers.
//! Any role may record consumption, which draws from stock.

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
use shared::{CreateFeedConsumptionRequest, CreateFeedInventoryRequest, UpdateFeedInventoryRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feed-inventory", get(list_inventory).post(create_inventory_item))
        .route("/feed-inventory/:id", put(update_inventory_item))
        .route("/feed-consumption", get(list_consumption).post(record_consumption))
}

pub async fn list_inventory(State(state): State<AppState>, AuthUser(_actor): AuthUser) -> impl IntoResponse {
    info!("GET /api/feed-inventory");

    match state.feed_service.list_inventory().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => error_response("list feed inventory", e),
    }
}

pub async fn create_inventory_item(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateFeedInventoryRequest>,
) -> impl IntoResponse {
    info!("POST /api/feed-inventory - request: {:?}", request);

    match state.feed_service.create_inventory_item(&actor, request).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => error_response("add feed", e),
    }
}

pub async fn update_inventory_item(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateFeedInventoryRequest>,
) -> impl IntoResponse {
    info!("PUT /api/feed-inventory/{} - request: {:?}", id, request);

    match state.feed_service.update_inventory_item(&actor, id, request).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => error_response("update feed", e),
    }
}

pub async fn list_consumption(State(state): State<AppState>, AuthUser(_actor): AuthUser) -> impl IntoResponse {
    info!("GET /api/feed-consumption");

    match state.feed_service.list_consumption().await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => error_response("list feed consumption", e),
    }
}

pub async fn record_consumption(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateFeedConsumptionRequest>,
) -> impl IntoResponse {
    info!("POST /api/feed-consumption - request: {:?}", request);

    match state.feed_service.record_consumption(&actor, request).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response("record feed consumption", e),
    }
}
