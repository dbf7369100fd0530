//! Import service domain logic.
//!
//! An import moves through `ReadingFile -> ParsingJson -> ValidatingStructure
//! -> Applying` and ends `Applied` or `Rejected`. Every recognized collection
//! in the document is parsed and validated before anything is written, and
//! all writes happen while holding the store's write lock, so a document is
//! either applied whole or not at all (barring an I/O failure mid-write).
//!
//! * **Replace** overwrites each present collection; the incoming records win.
//! * **Merge** unions by id; existing records win and incoming duplicates are
//!   dropped. A stored collection that no longer parses counts as empty.
//!
//! Credential keys in a document are never written. Incoming user records
//! never carry a password into the store.

use anyhow::Result;
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::backend::domain::access;
use crate::backend::domain::errors::{DataExchangeError, ImportStage};
use crate::backend::domain::export_service::sanitize_path;
use crate::backend::storage::{union_by_id, CollectionRepository, FarmStore, WriteGuard};
use shared::{
    Activity, BreedingRecord, Collection, CollectionImportSummary, FarmRecord, FeedConsumption, FeedInventory,
    HealthRecord, ImportDataResponse, ImportMode, Rabbit, Task, User,
};

/// Parsed and validated records of one collection
#[derive(Debug)]
enum IncomingCollection {
    Users(Vec<User>),
    Rabbits(Vec<Rabbit>),
    BreedingRecords(Vec<BreedingRecord>),
    HealthRecords(Vec<HealthRecord>),
    FeedInventory(Vec<FeedInventory>),
    FeedConsumption(Vec<FeedConsumption>),
    Tasks(Vec<Task>),
    Activities(Vec<Activity>),
}

/// Final contents of one collection, serialized and ready to store
struct PreparedWrite {
    collection: Collection,
    content: String,
    summary: CollectionImportSummary,
}

/// Service that handles replace and merge imports
#[derive(Clone)]
pub struct ImportService {
    store: FarmStore,
}

impl ImportService {
    pub fn new(store: FarmStore) -> Self {
        Self { store }
    }

    /// Import a document read from a file on the server
    pub async fn import_from_path(&self, actor: &User, file_path: &str, mode: ImportMode) -> Result<ImportDataResponse> {
        access::ensure(access::can_import(actor), "Only admins can import data")?;
        let path = sanitize_path(file_path);
        debug!("IMPORT: stage {} ({})", ImportStage::ReadingFile, path);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(source) => return Err(reject(DataExchangeError::Unreadable { path, source })),
        };
        self.apply_document(&content, mode).await
    }

    /// Import a document supplied as text
    pub async fn import_document(&self, actor: &User, content: &str, mode: ImportMode) -> Result<ImportDataResponse> {
        access::ensure(access::can_import(actor), "Only admins can import data")?;
        self.apply_document(content, mode).await
    }

    async fn apply_document(&self, content: &str, mode: ImportMode) -> Result<ImportDataResponse> {
        info!("IMPORT: Starting {} import ({} bytes)", mode, content.len());

        debug!("IMPORT: stage {}", ImportStage::ParsingJson);
        let document: Value = serde_json::from_str(content).map_err(|e| reject(DataExchangeError::MalformedJson(e)))?;

        debug!("IMPORT: stage {}", ImportStage::ValidatingStructure);
        let Value::Object(document) = document else {
            return Err(reject(DataExchangeError::NoValidData));
        };
        let incoming = parse_document(&document).map_err(reject)?;
        if incoming.is_empty() {
            return Err(reject(DataExchangeError::NoValidData));
        }

        debug!("IMPORT: stage {}", ImportStage::Applying);
        let guard = self.store.write().await;
        let mut prepared = Vec::with_capacity(incoming.len());
        for collection in incoming {
            let write = self
                .prepare(&guard, collection, mode)
                .await
                .map_err(|e| reject(DataExchangeError::Storage(e)))?;
            prepared.push(write);
        }

        let mut summaries = Vec::with_capacity(prepared.len());
        for write in prepared {
            self.store
                .backend()
                .set(write.collection.storage_key(), write.content)
                .await
                .map_err(|e| reject(DataExchangeError::Storage(e)))?;
            summaries.push(write.summary);
        }
        drop(guard);

        let written: usize = summaries.iter().map(|s| s.added).sum();
        let success_message = match mode {
            ImportMode::Replace => format!("Imported {} records into {} collections", written, summaries.len()),
            ImportMode::Merge => format!(
                "Merged {} new records into {} collections ({} duplicates skipped)",
                written,
                summaries.len(),
                summaries.iter().map(|s| s.skipped).sum::<usize>()
            ),
        };
        info!("IMPORT: stage {}: {}", ImportStage::Applied, success_message);

        Ok(ImportDataResponse {
            mode,
            collections: summaries,
            success_message,
        })
    }

    async fn prepare(&self, guard: &WriteGuard<'_>, incoming: IncomingCollection, mode: ImportMode) -> Result<PreparedWrite> {
        match incoming {
            IncomingCollection::Users(users) => self.prepare_users(guard, users, mode).await,
            IncomingCollection::Rabbits(records) => self.prepare_records(guard, records, mode).await,
            IncomingCollection::BreedingRecords(records) => self.prepare_records(guard, records, mode).await,
            IncomingCollection::HealthRecords(records) => self.prepare_records(guard, records, mode).await,
            IncomingCollection::FeedInventory(records) => self.prepare_records(guard, records, mode).await,
            IncomingCollection::FeedConsumption(records) => self.prepare_records(guard, records, mode).await,
            IncomingCollection::Tasks(records) => self.prepare_records(guard, records, mode).await,
            IncomingCollection::Activities(records) => self.prepare_records(guard, records, mode).await,
        }
    }

    async fn prepare_records<T: FarmRecord>(
        &self,
        guard: &WriteGuard<'_>,
        incoming: Vec<T>,
        mode: ImportMode,
    ) -> Result<PreparedWrite> {
        let incoming_count = incoming.len();
        let (records, added, skipped) = match mode {
            ImportMode::Replace => (incoming, incoming_count, 0),
            ImportMode::Merge => {
                let existing = self.store.repository::<T>().load_or_empty_locked(guard).await?;
                let (merged, outcome) = union_by_id(existing, incoming);
                (merged, outcome.added, outcome.skipped)
            }
        };

        Ok(PreparedWrite {
            collection: T::COLLECTION,
            content: serde_json::to_string(&records)?,
            summary: CollectionImportSummary {
                collection: T::COLLECTION,
                incoming: incoming_count,
                added,
                skipped,
                total: records.len(),
            },
        })
    }

    /// Users never take a password from a document. On replace, a user that
    /// keeps both its id and its username keeps its stored password.
    async fn prepare_users(&self, guard: &WriteGuard<'_>, incoming: Vec<User>, mode: ImportMode) -> Result<PreparedWrite> {
        let mut incoming: Vec<User> = incoming.into_iter().map(User::without_credentials).collect();

        if mode == ImportMode::Replace {
            let repository: CollectionRepository<User> = self.store.repository();
            let stored_passwords: HashMap<(i64, String), String> = repository
                .load_or_empty_locked(guard)
                .await?
                .into_iter()
                .filter_map(|u| u.password.map(|p| ((u.id, u.username), p)))
                .collect();
            for user in &mut incoming {
                user.password = stored_passwords.get(&(user.id, user.username.clone())).cloned();
            }
        }

        self.prepare_records(guard, incoming, mode).await
    }
}

fn reject(error: DataExchangeError) -> anyhow::Error {
    warn!("IMPORT: stage {} at {}: {}", ImportStage::Rejected, error.stage(), error);
    error.into()
}

/// Parse and validate one collection's array
fn parse_collection<T: FarmRecord>(values: &[Value]) -> Result<Vec<T>, DataExchangeError> {
    let mut seen = HashSet::with_capacity(values.len());
    let mut records = Vec::with_capacity(values.len());

    for (index, value) in values.iter().enumerate() {
        let invalid = |reason: String| DataExchangeError::InvalidRecord {
            collection: T::COLLECTION,
            index,
            reason,
        };

        let record: T = serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?;
        record.validate().map_err(|e| invalid(e.to_string()))?;
        if !seen.insert(record.id()) {
            return Err(invalid(format!("duplicate id {}", record.id())));
        }
        records.push(record);
    }

    Ok(records)
}

/// Pick out every recognized collection whose value is an array.
/// Anything else in the document is ignored.
fn parse_document(document: &Map<String, Value>) -> Result<Vec<IncomingCollection>, DataExchangeError> {
    let mut incoming = Vec::new();

    for collection in Collection::ALL {
        let Some(values) = document.get(collection.storage_key()).and_then(Value::as_array) else {
            continue;
        };
        let parsed = match collection {
            Collection::Users => IncomingCollection::Users(parse_collection(values)?),
            Collection::Rabbits => IncomingCollection::Rabbits(parse_collection(values)?),
            Collection::BreedingRecords => IncomingCollection::BreedingRecords(parse_collection(values)?),
            Collection::HealthRecords => IncomingCollection::HealthRecords(parse_collection(values)?),
            Collection::FeedInventory => IncomingCollection::FeedInventory(parse_collection(values)?),
            Collection::FeedConsumption => IncomingCollection::FeedConsumption(parse_collection(values)?),
            Collection::Tasks => IncomingCollection::Tasks(parse_collection(values)?),
            Collection::Activities => IncomingCollection::Activities(parse_collection(values)?),
        };
        debug!("IMPORT: {} {} records validated", values.len(), collection);
        incoming.push(parsed);
    }

    Ok(incoming)
}
