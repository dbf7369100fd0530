//! # Storage Module
//!
//! Handles all data persistence for the rabbit farm backend.
//!
//! Records live in a flat key-value store. Each collection (users, rabbits,
//! breeding records and so on) is stored as the JSON text of an array under a
//! fixed key, which is the same layout used by exported data documents. The
//! backing store is swappable: an in-process map for development and tests, or
//! a directory holding one JSON file per key.
//!
//! ## Key Responsibilities
//!
//! - **Storage Port**: [`KeyValueStore`] is the only interface the rest of the
//!   backend writes against
//! - **Write Coordination**: [`FarmStore`] owns the single write lock every
//!   read-modify-write sequence must hold
//! - **Typed Collections**: [`CollectionRepository`] loads, validates and saves
//!   one record type, allocating ids and merging by id
//!
//! ## Consistency
//!
//! The store has no transactions. Multi-collection changes (imports, a feed
//! draw plus its consumption record) take the write lock once and use the
//! `_locked` repository methods, so no other writer interleaves. A failure in
//! the middle of a multi-key write on the file backend can still leave some
//! keys updated.

pub mod connection;
pub mod json_file;
pub mod memory;
pub mod repository;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use connection::{FarmStore, WriteGuard};
pub use json_file::{default_data_directory, JsonFileStore};
pub use memory::MemoryStore;
pub use repository::{union_by_id, CollectionRepository, MergeOutcome};
pub use traits::KeyValueStore;
