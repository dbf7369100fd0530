use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::traits::KeyValueStore;

const FILE_EXTENSION: &str = "json";

/// JsonFileStore keeps one `<key>.json` file per storage key in a data directory
#[derive(Clone)]
pub struct JsonFileStore {
    base_directory: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `base_directory`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            std::fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a store in the default data directory (~/Documents/Rabbit Farm)
    pub fn new_default() -> Result<Self> {
        Self::new(default_data_directory()?)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys become file names, so keep them to a safe alphabet
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(anyhow::anyhow!("Invalid storage key: {:?}", key));
        }
        Ok(self.base_directory.join(format!("{}.{}", key, FILE_EXTENSION)))
    }
}

/// Resolve the default data directory, falling back to the home directory
/// when there is no Documents folder
pub fn default_data_directory() -> Result<PathBuf> {
    let parent = dirs::document_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(parent.join("Rabbit Farm"))
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension(format!("{}.tmp", FILE_EXTENSION));

        fs::write(&temp_path, value.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .await
            .with_context(|| format!("Failed to move {} into place", temp_path.display()))?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::test_utils::TestEnvironment;

    #[tokio::test]
    async fn test_values_persist_across_instances() {
        let env = TestEnvironment::new().await.expect("Failed to create test environment");

        let store = JsonFileStore::new(&env.base_path).unwrap();
        store
            .set("rabbit_farm_rabbits", r#"[{"id":1}]"#.to_string())
            .await
            .unwrap();

        let reopened = JsonFileStore::new(&env.base_path).unwrap();
        assert_eq!(
            reopened.get("rabbit_farm_rabbits").await.unwrap(),
            Some(r#"[{"id":1}]"#.to_string())
        );
        assert!(env.base_path.join("rabbit_farm_rabbits.json").exists());
        assert!(!env.base_path.join("rabbit_farm_rabbits.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_key_reads_none() {
        let env = TestEnvironment::new().await.expect("Failed to create test environment");
        let store = JsonFileStore::new(&env.base_path).unwrap();

        assert_eq!(store.get("rabbit_farm_tasks").await.unwrap(), None);
        std::fs::write(env.base_path.join("notes.txt"), "hello").unwrap();
        assert_eq!(store.get("notes").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let env = TestEnvironment::new().await.expect("Failed to create test environment");
        let store = JsonFileStore::new(&env.base_path).unwrap();

        assert!(store.set("../escape", "[]".to_string()).await.is_err());
        assert!(store.get("").await.is_err());
    }
}
