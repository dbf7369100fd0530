//! # IO Module
//!
//! The adapter layer between HTTP clients and the domain services. It turns
//! requests into service calls and service results into JSON responses with
//! the right status codes.
//!
//! ## Current Implementation
//!
//! - **Web Framework**: Axum
//! - **Serialization**: Serde JSON, camelCase field names
//! - **Authentication**: Bearer tokens resolved by an extractor
//! - **Error Handling**: Typed domain errors downcast into status codes

pub mod rest;

pub use rest::*;
