//! # Storage Traits
//!
//! This module defines the storage port the rest of the backend is written
//! against. A store is a flat key-value map: each key holds the JSON text of
//! one collection (or of the settings object), mirroring how the records are
//! laid out in exported documents.

use anyhow::Result;
use async_trait::async_trait;

/// Trait defining the interface for the persisted key-value store
///
/// Implementations only need to provide whole-value reads and writes. Callers
/// that read, modify and write a value back must hold the store's write lock
/// (see [`crate::backend::storage::FarmStore::write`]); the store itself does
/// no coordination between keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: String) -> Result<()>;
}
