//! # Domain Module
//!
//! Business rules for the rabbit farm: who may see and change which records,
//! how records are created and updated, and how whole-farm snapshots are
//! exported and imported.
//!
//! ## Module Organization
//!
//! - **access**: Role checks shared by every service
//! - **user_service** / **auth_service**: Accounts, login and sessions
//! - **rabbit_service**, **breeding_service**, **health_service**: Herd records
//! - **feed_service**: Feed inventory and consumption
//! - **task_service**: Farm tasks and their completion
//! - **activity_service**: Audit trail of user actions
//! - **dashboard_service**: Aggregated statistics
//! - **export_service** / **import_service**: JSON snapshots and CSV export
//!
//! ## Business Rules
//!
//! - Workers see only the rabbits whose tags they are assigned, and the
//!   breeding, health and task records attached to those
//! - Only admins manage users and import data; admins and managers export
//! - Merge import keeps existing records on id collision, replace import
//!   overwrites every collection present in the document
//! - Credentials are never written to an export and never read from an import
//!
//! Services return `anyhow::Result` and raise the typed errors in [`errors`],
//! which the REST layer maps to status codes.

pub mod access;
pub mod activity_service;
pub mod auth_service;
pub mod breeding_service;
pub mod dashboard_service;
pub mod errors;
pub mod export_service;
pub mod feed_service;
pub mod health_service;
pub mod import_service;
pub mod rabbit_service;
pub mod task_service;
pub mod user_service;

#[cfg(test)]
pub mod test_support;

pub use activity_service::{ActivityService, DEFAULT_ACTIVITY_LIMIT};
pub use auth_service::AuthService;
pub use breeding_service::BreedingService;
pub use dashboard_service::{compute_stats, DashboardService};
pub use errors::{DataExchangeError, DomainError, ImportStage};
pub use export_service::ExportService;
pub use feed_service::FeedService;
pub use health_service::HealthService;
pub use import_service::ImportService;
pub use rabbit_service::RabbitService;
pub use task_service::TaskService;
pub use user_service::UserService;
