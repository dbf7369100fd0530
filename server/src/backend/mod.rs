//! # Backend Module
//!
//! Contains all non-UI logic for the rabbit farm.
//!
//! This module brings together:
//! - **Domain**: Business rules for herd, feed, task and user management
//! - **Storage**: Keyed JSON collections behind a pluggable key-value backend
//! - **IO**: The REST API that exposes the domain to clients
//! - **Config**: Server, storage and farm settings loaded from YAML
//!
//! ## Architecture
//!
//! ```text
//! HTTP clients
//!     ↓
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (Business logic, services)
//!     ↓
//! Storage Layer (Key-value collections)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::{info, warn};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::config::FarmConfig;
use crate::backend::domain::{
    ActivityService, AuthService, BreedingService, DashboardService, ExportService, FeedService, HealthService,
    ImportService, RabbitService, TaskService, UserService,
};
use crate::backend::storage::FarmStore;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub store: FarmStore,
    pub activity_service: ActivityService,
    pub user_service: UserService,
    pub auth_service: AuthService,
    pub rabbit_service: RabbitService,
    pub breeding_service: BreedingService,
    pub health_service: HealthService,
    pub feed_service: FeedService,
    pub task_service: TaskService,
    pub dashboard_service: DashboardService,
    pub export_service: ExportService,
    pub import_service: ImportService,
}

impl AppState {
    /// Wire every service onto one store
    pub fn new(store: FarmStore, config: &FarmConfig) -> Self {
        let activity_service = ActivityService::new(store.clone());
        let user_service = UserService::new(store.clone(), activity_service.clone());
        let auth_service = AuthService::new(user_service.clone(), activity_service.clone());
        let rabbit_service = RabbitService::new(store.clone(), activity_service.clone());
        let health_service = HealthService::new(store.clone(), rabbit_service.clone(), activity_service.clone());

        Self {
            breeding_service: BreedingService::new(store.clone(), activity_service.clone()),
            feed_service: FeedService::new(store.clone(), activity_service.clone()),
            task_service: TaskService::new(store.clone(), activity_service.clone()),
            dashboard_service: DashboardService::new(store.clone(), config.farm.total_cages),
            export_service: ExportService::new(store.clone(), config.farm.export_prefix.clone()),
            import_service: ImportService::new(store.clone()),
            store,
            activity_service,
            user_service,
            auth_service,
            rabbit_service,
            health_service,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &FarmConfig) -> Result<AppState> {
    info!("Setting up storage");
    let store = FarmStore::init(&config.storage)?;

    info!("Setting up domain model");
    let app_state = AppState::new(store, config);

    if let Some(admin) = app_state.user_service.ensure_default_admin(&config.farm.default_admin).await? {
        warn!(
            "No users found; created default admin '{}'. Change its password.",
            admin.username
        );
    }

    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) if cors_origin != "*" => cors.allow_origin(origin),
        Ok(_) => cors.allow_origin(Any),
        Err(e) => {
            warn!("Ignoring invalid CORS origin '{}': {}", cors_origin, e);
            cors
        }
    };

    Router::new()
        .nest("/api", io::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
