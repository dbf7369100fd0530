//! Test utilities for automatic cleanup of on-disk test data
//!
//! Provides RAII-based cleanup that removes the data directory even if a test
//! panics or fails.

use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::FarmStore;

/// RAII test environment backed by a temporary directory
pub struct TestEnvironment {
    /// Kept alive so the directory is only removed on drop
    _temp_dir: TempDir,
    /// File-backed store rooted at `<base_path>/data`
    pub store: FarmStore,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let store = FarmStore::open(base_path.join("data"))?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            store,
            base_path,
        })
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if std::env::var("RABBIT_FARM_DEBUG_TESTS").is_ok() {
            println!("Cleaning up test environment: {:?}", self.base_path);
        }
    }
}
