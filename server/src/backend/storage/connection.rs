use anyhow::Result;
use log::info;
use shared::FarmRecord;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use super::json_file::JsonFileStore;
use super::memory::MemoryStore;
use super::repository::CollectionRepository;
use super::traits::KeyValueStore;
use crate::backend::config::{StorageBackend, StorageConfig};

/// Handle to the persisted store shared by every repository and service
///
/// Cloning is cheap; all clones see the same data and share one write lock.
#[derive(Clone)]
pub struct FarmStore {
    backend: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

/// Proof that the caller holds the store-wide write lock
///
/// Repository methods ending in `_locked` take this so several collections can
/// be changed as one unit (an import, or a feed draw plus its consumption
/// record) without another writer slipping in between.
pub struct WriteGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl FarmStore {
    /// Wrap an existing key-value store
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Process-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Directory-backed store with one JSON file per collection
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self> {
        Ok(Self::new(Arc::new(JsonFileStore::new(directory)?)))
    }

    /// Initialize the store described by the configuration
    pub fn init(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::File => {
                let store = match &config.data_directory {
                    Some(dir) => JsonFileStore::new(dir)?,
                    None => JsonFileStore::new_default()?,
                };
                info!("Using file storage in {}", store.base_directory().display());
                Ok(Self::new(Arc::new(store)))
            }
        }
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    /// Acquire the store-wide write lock
    pub async fn write(&self) -> WriteGuard<'_> {
        WriteGuard {
            _guard: self.write_lock.lock().await,
        }
    }

    /// Create a repository for one record type
    pub fn repository<T: FarmRecord>(&self) -> CollectionRepository<T> {
        CollectionRepository::new(self.clone())
    }
}
