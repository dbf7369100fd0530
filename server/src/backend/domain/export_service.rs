//! Export service domain logic.
//!
//! Builds the full data document (every collection plus the settings object,
//! keyed by storage key) and single-collection CSV files. Credentials never
//! leave the store: the session keys are not exported and every user record
//! loses its `password` field.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::backend::domain::access;
use crate::backend::domain::errors::DataExchangeError;
use crate::backend::storage::FarmStore;
use shared::{Collection, ExportCsvResponse, ExportDataResponse, ExportToPathResponse, User, SETTINGS_KEY};

/// Service that handles all export-related business logic
#[derive(Clone)]
pub struct ExportService {
    store: FarmStore,
    prefix: String,
}

impl ExportService {
    pub fn new(store: FarmStore, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Keys included in an export, in document order
    fn exported_keys() -> impl Iterator<Item = &'static str> {
        Collection::ALL
            .into_iter()
            .map(Collection::storage_key)
            .chain(std::iter::once(SETTINGS_KEY))
            .filter(|key| !shared::is_credential_key(key))
    }

    /// Read one stored key as JSON. Unparseable values become `null`
    async fn read_value(&self, key: &str) -> Result<Option<Value>> {
        let Some(raw) = self.store.backend().get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                error!("Error parsing {} from storage: {}", key, e);
                Ok(Some(Value::Null))
            }
        }
    }

    /// Build the export document and per-collection record counts
    pub async fn build_document(&self) -> Result<(Map<String, Value>, BTreeMap<Collection, usize>)> {
        let mut document = Map::new();
        let mut counts = BTreeMap::new();

        for key in Self::exported_keys() {
            let Some(mut value) = self.read_value(key).await? else {
                continue;
            };

            let collection = Collection::from_storage_key(key);
            if collection == Some(Collection::Users) {
                strip_passwords(&mut value);
            }
            if let (Some(collection), Some(records)) = (collection, value.as_array()) {
                counts.insert(collection, records.len());
            }
            document.insert(key.to_string(), value);
        }

        Ok((document, counts))
    }

    /// Export every collection as one pretty-printed JSON document
    pub async fn export_document(&self, actor: &User) -> Result<ExportDataResponse> {
        access::ensure(access::can_export(actor), "Only admins and managers can export data")?;
        info!("EXPORT: Building data document for user {}", actor.id);

        let (document, record_counts) = self.build_document().await?;
        let content = serde_json::to_string_pretty(&Value::Object(document))?;
        let filename = format!("{}_{}.json", self.prefix, Utc::now().format("%Y-%m-%d"));

        info!(
            "EXPORT: Exported {} records across {} collections ({} bytes) as {}",
            record_counts.values().sum::<usize>(),
            record_counts.len(),
            content.len(),
            filename
        );

        Ok(ExportDataResponse {
            content,
            filename,
            record_counts,
        })
    }

    /// Write the export document into a directory (default: Documents)
    pub async fn export_to_path(&self, actor: &User, custom_path: Option<String>) -> Result<ExportToPathResponse> {
        info!("EXPORT: Exporting to path - custom_path: {:?}", custom_path);
        let export = self.export_document(actor).await?;

        let export_dir = match custom_path {
            Some(custom_path) if !custom_path.trim().is_empty() => PathBuf::from(sanitize_path(&custom_path)),
            _ => dirs::document_dir()
                .or_else(dirs::home_dir)
                .context("Could not determine default export directory")?,
        };

        let file_path = export_dir.join(&export.filename);
        tokio::fs::create_dir_all(&export_dir)
            .await
            .with_context(|| format!("Failed to create export directory {}", export_dir.display()))?;
        tokio::fs::write(&file_path, export.content.as_bytes())
            .await
            .with_context(|| format!("Failed to write export file {}", file_path.display()))?;

        let file_path = file_path.to_string_lossy().to_string();
        let record_count = export.record_counts.values().sum();
        info!("EXPORT: Wrote {} records to {}", record_count, file_path);

        Ok(ExportToPathResponse {
            success: true,
            message: format!("File exported successfully to: {}", file_path),
            file_path,
            record_count,
        })
    }

    /// Export a single collection as CSV
    pub async fn export_csv(&self, actor: &User, collection: Collection) -> Result<ExportCsvResponse> {
        access::ensure(access::can_export(actor), "Only admins and managers can export data")?;
        info!("EXPORT: Exporting {} as CSV", collection);

        let mut value = self
            .read_value(collection.storage_key())
            .await?
            .unwrap_or(Value::Array(Vec::new()));
        if collection == Collection::Users {
            strip_passwords(&mut value);
        }

        let records = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
        let csv_content = records_to_csv(records)?.ok_or(DataExchangeError::EmptyCollection(collection))?;
        let filename = format!("{}_{}.csv", collection.name(), Utc::now().format("%Y-%m-%d"));

        Ok(ExportCsvResponse {
            csv_content,
            filename,
            row_count: records.len(),
        })
    }
}

fn strip_passwords(users: &mut Value) {
    if let Some(users) = users.as_array_mut() {
        for user in users.iter_mut().filter_map(Value::as_object_mut) {
            user.remove("password");
        }
    }
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => nested.to_string(),
    }
}

/// Render records as CSV with headers taken from the first record's keys.
/// Returns `None` when there is nothing to export.
pub fn records_to_csv(records: &[Value]) -> Result<Option<String>> {
    let Some(headers) = records.first().and_then(Value::as_object).map(|first| {
        first.keys().cloned().collect::<Vec<String>>()
    }) else {
        return Ok(None);
    };
    if headers.is_empty() {
        return Ok(None);
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .from_writer(Vec::new());
    writer.write_record(&headers)?;
    for record in records {
        writer.write_record(headers.iter().map(|h| csv_cell(record.get(h))))?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e))?;
    Ok(Some(String::from_utf8(bytes)?))
}

/// Basic path sanitization to handle common user input issues
pub fn sanitize_path(path: &str) -> String {
    let mut cleaned = path.trim().to_string();

    // Surrounding quotes from copy-pasted paths
    if cleaned.len() >= 2
        && ((cleaned.starts_with('"') && cleaned.ends_with('"'))
            || (cleaned.starts_with('\'') && cleaned.ends_with('\'')))
    {
        cleaned = cleaned[1..cleaned.len() - 1].trim().to_string();
    }

    cleaned = cleaned.replace("\\ ", " ");

    while cleaned.len() > 1 && (cleaned.ends_with('/') || cleaned.ends_with('\\')) {
        cleaned.pop();
    }

    if cleaned == "~" || cleaned.starts_with("~/") || cleaned.starts_with("~\\") {
        if let Some(home) = dirs::home_dir() {
            cleaned = if cleaned == "~" {
                home.to_string_lossy().to_string()
            } else {
                home.join(&cleaned[2..]).to_string_lossy().to_string()
            };
        }
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::test_support::{admin, manager, worker};
    use crate::backend::storage::test_utils::TestEnvironment;
    use serde_json::json;
    use shared::{AUTH_TOKEN_KEY, SESSION_USER_KEY};

    async fn seeded_store() -> FarmStore {
        let store = FarmStore::in_memory();
        let backend = store.backend();
        backend
            .set(
                "rabbit_farm_users",
                json!([{"id": 1, "username": "admin", "password": "admin123", "fullName": "Admin", "role": "admin"}])
                    .to_string(),
            )
            .await
            .unwrap();
        backend
            .set(
                "rabbit_farm_rabbits",
                json!([{"id": 1, "tagId": "R-1"}, {"id": 2, "tagId": "R-2"}]).to_string(),
            )
            .await
            .unwrap();
        backend.set("rabbit_farm_tasks", "{broken".to_string()).await.unwrap();
        backend.set(SETTINGS_KEY, json!({"farmName": "Sunny Acres"}).to_string()).await.unwrap();
        backend.set(AUTH_TOKEN_KEY, "\"secret-token\"".to_string()).await.unwrap();
        backend.set(SESSION_USER_KEY, json!({"id": 1}).to_string()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_document_excludes_credentials() {
        let service = ExportService::new(seeded_store().await, "rabbit_farm_data");
        let export = service.export_document(&admin()).await.unwrap();

        let document: Value = serde_json::from_str(&export.content).unwrap();
        assert!(document.get(AUTH_TOKEN_KEY).is_none());
        assert!(document.get(SESSION_USER_KEY).is_none());
        assert!(document["rabbit_farm_users"][0].get("password").is_none());
        assert_eq!(document["rabbit_farm_users"][0]["username"], "admin");
        assert_eq!(document[SETTINGS_KEY]["farmName"], "Sunny Acres");
        assert!(!export.content.contains("admin123"));
        assert!(!export.content.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_document_shape() {
        let service = ExportService::new(seeded_store().await, "rabbit_farm_data");
        let export = service.export_document(&manager()).await.unwrap();

        let document: Value = serde_json::from_str(&export.content).unwrap();
        // Corrupt values are exported as null; missing keys are omitted
        assert_eq!(document["rabbit_farm_tasks"], Value::Null);
        assert!(document.get("rabbit_farm_activities").is_none());
        assert_eq!(document["rabbit_farm_rabbits"].as_array().unwrap().len(), 2);

        assert_eq!(export.record_counts.get(&Collection::Rabbits), Some(&2));
        assert_eq!(export.record_counts.get(&Collection::Tasks), None);
        assert!(export.content.contains("\n  \"rabbit_farm_rabbits\": ["));

        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(export.filename, format!("rabbit_farm_data_{}.json", today));
    }

    #[tokio::test]
    async fn test_empty_store_exports_empty_object() {
        let service = ExportService::new(FarmStore::in_memory(), "rabbit_farm_data");
        let export = service.export_document(&admin()).await.unwrap();
        assert_eq!(serde_json::from_str::<Value>(&export.content).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_workers_cannot_export() {
        let service = ExportService::new(seeded_store().await, "rabbit_farm_data");
        assert!(service.export_document(&worker(3, &[])).await.is_err());
        assert!(service.export_csv(&worker(3, &[]), Collection::Rabbits).await.is_err());
    }

    #[tokio::test]
    async fn test_export_to_path_writes_file() {
        let env = TestEnvironment::new().await.expect("Failed to create test environment");
        let service = ExportService::new(seeded_store().await, "backup");
        let target = env.base_path.join("exports");

        let response = service
            .export_to_path(&admin(), Some(format!("\"{}/\"", target.display())))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.record_count, 3);

        let written = std::fs::read_to_string(&response.file_path).unwrap();
        assert!(written.contains("rabbit_farm_rabbits"));
        assert!(response.file_path.starts_with(&target.to_string_lossy().to_string()));
        assert!(response.file_path.ends_with(".json"));
    }

    #[tokio::test]
    async fn test_csv_export() {
        let service = ExportService::new(seeded_store().await, "rabbit_farm_data");
        let export = service.export_csv(&admin(), Collection::Users).await.unwrap();

        assert_eq!(export.row_count, 1);
        assert!(export.filename.starts_with("users_"));
        assert!(!export.csv_content.contains("admin123"));

        let mut reader = csv::Reader::from_reader(export.csv_content.as_bytes());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert!(headers.contains(&"username".to_string()));
        assert!(!headers.contains(&"password".to_string()));
        assert_eq!(reader.records().count(), 1);
    }

    #[tokio::test]
    async fn test_csv_export_of_empty_collection_fails() {
        let service = ExportService::new(FarmStore::in_memory(), "rabbit_farm_data");
        let err = service.export_csv(&admin(), Collection::Tasks).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataExchangeError>(),
            Some(DataExchangeError::EmptyCollection(Collection::Tasks))
        ));
    }

    #[test]
    fn test_records_to_csv_cells() {
        let records = vec![
            json!({"id": 1, "name": "Hay, \"premium\"", "tags": ["a", "b"], "note": null}),
            json!({"id": 2, "name": "Pellets"}),
        ];
        let csv = records_to_csv(&records).unwrap().unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][1], "Hay, \"premium\"");
        assert_eq!(&rows[0][3], "[\"a\",\"b\"]");
        assert_eq!(&rows[0][2], "");
        assert_eq!(&rows[1][3], "");
        assert!(csv.lines().nth(1).unwrap().starts_with("1,"));
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("  \"/tmp/my exports/\"  "), "/tmp/my exports");
        assert_eq!(sanitize_path("'/tmp/out'"), "/tmp/out");
        assert_eq!(sanitize_path("/tmp/my\\ dir"), "/tmp/my dir");
        assert_eq!(sanitize_path("/"), "/");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(sanitize_path("~/farm"), home.join("farm").to_string_lossy());
        }
    }
}
