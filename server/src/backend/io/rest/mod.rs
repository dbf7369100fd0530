//! # REST API Interface Layer
//!
//! HTTP endpoints for the rabbit farm. Handlers authenticate the caller,
//! hand the request to a domain service and translate the result into a
//! status code and JSON body.
//!
//! ## Conventions
//!
//! - Every route except `/login` requires `Authorization: Bearer <token>`
//! - Create endpoints answer `201 Created`
//! - Failures answer `{"message": ...}` with the status chosen in [`errors`]
//! - Each resource module exposes a `router()` that is merged under `/api`

pub mod activity_apis;
pub mod auth;
pub mod breeding_apis;
pub mod dashboard_apis;
pub mod errors;
pub mod export_apis;
pub mod feed_apis;
pub mod health_apis;
pub mod import_apis;
pub mod rabbit_apis;
pub mod task_apis;
pub mod user_apis;

use axum::Router;

use crate::backend::AppState;

pub use auth::AuthUser;
pub use errors::{error_response, status_for};

/// All API routes, relative to `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(user_apis::router())
        .merge(rabbit_apis::router())
        .merge(breeding_apis::router())
        .merge(health_apis::router())
        .merge(feed_apis::router())
        .merge(task_apis::router())
        .merge(activity_apis::router())
        .merge(dashboard_apis::router())
        .nest("/data/export", export_apis::router())
        .nest("/data/import", import_apis::router())
}
