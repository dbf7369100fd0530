//! # Collection Repository
//!
//! Typed access to one collection of the key-value store. Every mutation is a
//! read-modify-write of the whole collection performed while holding the
//! store-wide write lock, so callers never have to remember the
//! read/merge/write sequence themselves.

use anyhow::{Context, Result};
use log::{debug, error};
use shared::FarmRecord;
use std::collections::HashSet;
use std::marker::PhantomData;

use super::connection::{FarmStore, WriteGuard};
use crate::backend::domain::errors::DomainError;

/// Counts produced by a union-by-id merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Union `incoming` into `existing` by id.
///
/// Every existing record is kept unchanged and in order; incoming records are
/// appended only if their id is not already present. Existing always wins.
pub fn union_by_id<T: FarmRecord>(existing: Vec<T>, incoming: Vec<T>) -> (Vec<T>, MergeOutcome) {
    let mut seen: HashSet<i64> = existing.iter().map(FarmRecord::id).collect();
    let mut merged = existing;
    let mut outcome = MergeOutcome::default();

    for record in incoming {
        if seen.insert(record.id()) {
            merged.push(record);
            outcome.added += 1;
        } else {
            outcome.skipped += 1;
        }
    }

    outcome.total = merged.len();
    (merged, outcome)
}

/// Repository over the collection that stores records of type `T`
#[derive(Clone)]
pub struct CollectionRepository<T> {
    store: FarmStore,
    _record: PhantomData<fn() -> T>,
}

impl<T: FarmRecord> CollectionRepository<T> {
    pub fn new(store: FarmStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    fn key(&self) -> &'static str {
        T::COLLECTION.storage_key()
    }

    /// Read for display. A collection that fails to parse reads as empty.
    async fn load_lenient(&self) -> Result<Vec<T>> {
        match self.store.backend().get(self.key()).await? {
            None => Ok(Vec::new()),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(records) => Ok(records),
                Err(e) => {
                    error!("Error parsing stored {}: {}", T::COLLECTION, e);
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Read before a write. A collection that fails to parse is an error so it
    /// is never silently overwritten.
    pub async fn load_locked(&self, _guard: &WriteGuard<'_>) -> Result<Vec<T>> {
        match self.store.backend().get(self.key()).await? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Stored {} collection is unreadable", T::COLLECTION)),
        }
    }

    /// Read before a write that replaces the collection wholesale. A
    /// collection that fails to parse is logged and read as empty.
    pub async fn load_or_empty_locked(&self, _guard: &WriteGuard<'_>) -> Result<Vec<T>> {
        self.load_lenient().await
    }

    async fn save(&self, records: &[T]) -> Result<()> {
        let content = serde_json::to_string(records)?;
        self.store.backend().set(self.key(), content).await?;
        debug!("Saved {} {}", records.len(), T::COLLECTION);
        Ok(())
    }

    fn check(record: &T) -> Result<()> {
        record
            .validate()
            .map_err(|e| DomainError::Validation(e.to_string()).into())
    }

    /// List every record in stored order
    pub async fn list(&self) -> Result<Vec<T>> {
        self.load_lenient().await
    }

    pub async fn get(&self, id: i64) -> Result<Option<T>> {
        Ok(self.load_lenient().await?.into_iter().find(|r| r.id() == id))
    }

    /// First record matching the predicate
    pub async fn find<P>(&self, predicate: P) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send,
    {
        Ok(self.load_lenient().await?.into_iter().find(|r| predicate(r)))
    }

    /// All records matching the predicate, in stored order
    pub async fn filter<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send,
    {
        Ok(self
            .load_lenient()
            .await?
            .into_iter()
            .filter(|r| predicate(r))
            .collect())
    }

    /// Append a new record. `build` receives the allocated id
    /// (`max(existing ids) + 1`).
    pub async fn insert<F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(i64) -> Result<T> + Send,
    {
        let guard = self.store.write().await;
        self.insert_locked(&guard, build).await
    }

    pub async fn insert_locked<F>(&self, guard: &WriteGuard<'_>, build: F) -> Result<T>
    where
        F: FnOnce(i64) -> Result<T> + Send,
    {
        let mut records = self.load_locked(guard).await?;
        let next_id = records.iter().map(FarmRecord::id).max().unwrap_or(0) + 1;

        let record = build(next_id)?;
        Self::check(&record)?;

        records.push(record.clone());
        self.save(&records).await?;
        Ok(record)
    }

    /// Apply a partial update to the record with `id`.
    /// Returns `None` when no such record exists.
    pub async fn update<F>(&self, id: i64, apply: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut T) -> Result<()> + Send,
    {
        let guard = self.store.write().await;
        self.update_locked(&guard, id, apply).await
    }

    pub async fn update_locked<F>(&self, guard: &WriteGuard<'_>, id: i64, apply: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut T) -> Result<()> + Send,
    {
        let mut records = self.load_locked(guard).await?;
        let Some(position) = records.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };

        let mut updated = records[position].clone();
        apply(&mut updated)?;
        if updated.id() != id {
            return Err(DomainError::Validation("Record id cannot be changed".to_string()).into());
        }
        Self::check(&updated)?;

        records[position] = updated.clone();
        self.save(&records).await?;
        Ok(Some(updated))
    }

    /// Insert the record, or replace the stored record with the same id
    pub async fn upsert(&self, record: T) -> Result<()> {
        Self::check(&record)?;
        let guard = self.store.write().await;
        let mut records = self.load_locked(&guard).await?;

        match records.iter().position(|r| r.id() == record.id()) {
            Some(position) => records[position] = record,
            None => records.push(record),
        }
        self.save(&records).await
    }

    /// Overwrite the whole collection
    pub async fn replace_all(&self, records: Vec<T>) -> Result<usize> {
        let guard = self.store.write().await;
        self.replace_all_locked(&guard, records).await
    }

    pub async fn replace_all_locked(&self, _guard: &WriteGuard<'_>, records: Vec<T>) -> Result<usize> {
        for record in &records {
            Self::check(record)?;
        }
        self.save(&records).await?;
        Ok(records.len())
    }

    /// Union the incoming records into the collection; existing records win
    pub async fn merge(&self, incoming: Vec<T>) -> Result<MergeOutcome> {
        let guard = self.store.write().await;
        for record in &incoming {
            Self::check(record)?;
        }
        let existing = self.load_locked(&guard).await?;
        let (merged, outcome) = union_by_id(existing, incoming);
        self.save(&merged).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::{Gender, HealthStatus, Rabbit, RabbitStatus};

    fn rabbit(id: i64, tag: &str) -> Rabbit {
        Rabbit {
            id,
            tag_id: tag.to_string(),
            breed: "Californian".to_string(),
            gender: Gender::Female,
            birth_date: None,
            acquired_date: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
            status: RabbitStatus::Active,
            weight: None,
            cage_number: None,
            parent_male_id: None,
            parent_female_id: None,
            notes: None,
            created_by: 1,
            health_status: HealthStatus::Healthy,
            created_at: None,
        }
    }

    fn tags(records: &[Rabbit]) -> Vec<&str> {
        records.iter().map(|r| r.tag_id.as_str()).collect()
    }

    #[test]
    fn test_union_existing_wins() {
        let existing = vec![rabbit(1, "R-1")];
        let incoming = vec![rabbit(1, "R-1-DUPLICATE"), rabbit(2, "R-2")];

        let (merged, outcome) = union_by_id(existing, incoming);
        assert_eq!(tags(&merged), vec!["R-1", "R-2"]);
        assert_eq!(outcome, MergeOutcome { added: 1, skipped: 1, total: 2 });
    }

    #[test]
    fn test_union_with_empty_sides() {
        let existing = vec![rabbit(1, "R-1"), rabbit(5, "R-5")];

        let (merged, outcome) = union_by_id(existing.clone(), Vec::new());
        assert_eq!(merged, existing);
        assert_eq!(outcome.added, 0);

        let (merged, outcome) = union_by_id(Vec::new(), existing.clone());
        assert_eq!(merged, existing);
        assert_eq!(outcome.added, 2);
    }

    #[test]
    fn test_union_ids_are_the_union() {
        let existing = vec![rabbit(1, "a"), rabbit(3, "c")];
        let incoming = vec![rabbit(2, "b"), rabbit(3, "c2"), rabbit(4, "d")];

        let (merged, _) = union_by_id(existing, incoming);
        let mut ids: Vec<i64> = merged.iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(merged.iter().find(|r| r.id == 3).unwrap().tag_id, "c");
    }

    #[tokio::test]
    async fn test_insert_allocates_increasing_ids() {
        let repo: CollectionRepository<Rabbit> = FarmStore::in_memory().repository();

        let first = repo.insert(|id| Ok(rabbit(id, "R-1"))).await.unwrap();
        let second = repo.insert(|id| Ok(rabbit(id, "R-2"))).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        repo.replace_all(vec![rabbit(40, "R-40")]).await.unwrap();
        let next = repo.insert(|id| Ok(rabbit(id, "R-41"))).await.unwrap();
        assert_eq!(next.id, 41);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_record() {
        let repo: CollectionRepository<Rabbit> = FarmStore::in_memory().repository();

        let err = repo.insert(|id| Ok(rabbit(id, ""))).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_applies_partial_change() {
        let repo: CollectionRepository<Rabbit> = FarmStore::in_memory().repository();
        repo.insert(|id| Ok(rabbit(id, "R-1"))).await.unwrap();

        let updated = repo
            .update(1, |r| {
                r.status = RabbitStatus::Deceased;
                Ok(())
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, RabbitStatus::Deceased);
        assert_eq!(updated.tag_id, "R-1");
        assert_eq!(repo.get(1).await.unwrap().unwrap().status, RabbitStatus::Deceased);

        assert!(repo.update(99, |_| Ok(())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_cannot_change_id() {
        let repo: CollectionRepository<Rabbit> = FarmStore::in_memory().repository();
        repo.insert(|id| Ok(rabbit(id, "R-1"))).await.unwrap();

        let result = repo
            .update(1, |r| {
                r.id = 7;
                Ok(())
            })
            .await;
        assert!(result.is_err());
        assert!(repo.get(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_or_appends() {
        let repo: CollectionRepository<Rabbit> = FarmStore::in_memory().repository();
        repo.upsert(rabbit(1, "R-1")).await.unwrap();
        repo.upsert(rabbit(1, "R-1-renamed")).await.unwrap();
        repo.upsert(rabbit(2, "R-2")).await.unwrap();

        assert_eq!(tags(&repo.list().await.unwrap()), vec!["R-1-renamed", "R-2"]);
    }

    #[tokio::test]
    async fn test_merge_and_replace() {
        let repo: CollectionRepository<Rabbit> = FarmStore::in_memory().repository();
        repo.insert(|id| Ok(rabbit(id, "R-1"))).await.unwrap();

        let outcome = repo
            .merge(vec![rabbit(1, "R-1-DUPLICATE"), rabbit(2, "R-2")])
            .await
            .unwrap();
        assert_eq!(outcome.added, 1);
        assert_eq!(tags(&repo.list().await.unwrap()), vec!["R-1", "R-2"]);

        repo.replace_all(vec![rabbit(1, "R-1-DUPLICATE"), rabbit(2, "R-2")])
            .await
            .unwrap();
        assert_eq!(tags(&repo.list().await.unwrap()), vec!["R-1-DUPLICATE", "R-2"]);
    }

    #[tokio::test]
    async fn test_corrupt_collection_reads_empty_but_blocks_writes() {
        let store = FarmStore::in_memory();
        store
            .backend()
            .set("rabbit_farm_rabbits", "not json".to_string())
            .await
            .unwrap();
        let repo: CollectionRepository<Rabbit> = store.repository();

        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.insert(|id| Ok(rabbit(id, "R-1"))).await.is_err());
        assert_eq!(
            store.backend().get("rabbit_farm_rabbits").await.unwrap(),
            Some("not json".to_string())
        );

        // A wholesale replace is the way out
        repo.replace_all(vec![rabbit(1, "R-1")]).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_distinct_ids() {
        let repo: CollectionRepository<Rabbit> = FarmStore::in_memory().repository();

        let mut handles = Vec::new();
        for n in 0..10 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert(move |id| Ok(rabbit(id, &format!("R-{}", n)))).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut ids: Vec<i64> = repo.list().await.unwrap().iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=10).collect::<Vec<i64>>());
    }
}
