use anyhow::Result;
use chrono::Utc;
use log::info;

use crate::backend::domain::access;
use crate::backend::domain::activity_service::ActivityService;
use crate::backend::domain::errors::DomainError;
use crate::backend::storage::{CollectionRepository, FarmStore};
use shared::{
    ActivityType, BreedingRecord, CreateBreedingRecordRequest, EntityType, UpdateBreedingRecordRequest, User,
};

/// Service for breeding records
#[derive(Clone)]
pub struct BreedingService {
    store: FarmStore,
    records: CollectionRepository<BreedingRecord>,
    activities: ActivityService,
}

impl BreedingService {
    pub fn new(store: FarmStore, activities: ActivityService) -> Self {
        Self {
            records: store.repository(),
            store,
            activities,
        }
    }

    pub async fn list_breeding_records(&self, actor: &User) -> Result<Vec<BreedingRecord>> {
        info!("Listing breeding records for user {}", actor.id);
        let actor = actor.clone();
        self.records.filter(move |r| access::can_see_breeding(&actor, r)).await
    }

    pub async fn create_breeding_record(
        &self,
        actor: &User,
        request: CreateBreedingRecordRequest,
    ) -> Result<BreedingRecord> {
        info!("Creating breeding record: {} x {}", request.male_id, request.female_id);
        validate_parents(&request.male_id, &request.female_id)?;
        validate_litter(request.litter_size, request.litter_alive)?;
        access::ensure(
            access::can_record_breeding(actor, &request.male_id, &request.female_id),
            "Both rabbits must be assigned to you",
        )?;

        let created_by = actor.id;
        let record = self
            .records
            .insert(move |id| {
                Ok(BreedingRecord {
                    id,
                    male_id: request.male_id.trim().to_string(),
                    female_id: request.female_id.trim().to_string(),
                    mating_date: request.mating_date,
                    expected_birth_date: request.expected_birth_date,
                    actual_birth_date: request.actual_birth_date,
                    status: request.status,
                    litter_size: request.litter_size,
                    litter_alive: request.litter_alive,
                    notes: request.notes,
                    created_by,
                    created_at: Some(Utc::now()),
                })
            })
            .await?;

        info!("Created breeding record with ID: {}", record.id);
        self.activities
            .record(
                actor.id,
                ActivityType::Create,
                format!("Recorded breeding of {} and {}", record.male_id, record.female_id),
                Some((EntityType::Breeding, record.id)),
            )
            .await?;
        Ok(record)
    }

    pub async fn update_breeding_record(
        &self,
        actor: &User,
        id: i64,
        request: UpdateBreedingRecordRequest,
    ) -> Result<BreedingRecord> {
        info!("Updating breeding record: {}", id);

        let guard = self.store.write().await;
        let existing = self
            .records
            .load_locked(&guard)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("Breeding record not found: {}", id)))?;
        access::ensure(
            access::can_see_breeding(actor, &existing),
            "You can only update breeding records of rabbits assigned to you",
        )?;

        let male_id = request.male_id.as_deref().unwrap_or(&existing.male_id);
        let female_id = request.female_id.as_deref().unwrap_or(&existing.female_id);
        validate_parents(male_id, female_id)?;
        access::ensure(
            access::can_record_breeding(actor, male_id, female_id),
            "Both rabbits must be assigned to you",
        )?;
        validate_litter(
            request.litter_size.or(existing.litter_size),
            request.litter_alive.or(existing.litter_alive),
        )?;

        let record = self
            .records
            .update_locked(&guard, id, |record| {
                if let Some(male_id) = request.male_id {
                    record.male_id = male_id.trim().to_string();
                }
                if let Some(female_id) = request.female_id {
                    record.female_id = female_id.trim().to_string();
                }
                if let Some(mating_date) = request.mating_date {
                    record.mating_date = mating_date;
                }
                if request.expected_birth_date.is_some() {
                    record.expected_birth_date = request.expected_birth_date;
                }
                if request.actual_birth_date.is_some() {
                    record.actual_birth_date = request.actual_birth_date;
                }
                if let Some(status) = request.status {
                    record.status = status;
                }
                if request.litter_size.is_some() {
                    record.litter_size = request.litter_size;
                }
                if request.litter_alive.is_some() {
                    record.litter_alive = request.litter_alive;
                }
                if request.notes.is_some() {
                    record.notes = request.notes;
                }
                Ok(())
            })
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Breeding record not found: {}", id)))?;
        drop(guard);

        self.activities
            .record(
                actor.id,
                ActivityType::Update,
                format!("Updated breeding record {}", record.id),
                Some((EntityType::Breeding, record.id)),
            )
            .await?;
        Ok(record)
    }
}

fn validate_parents(male_id: &str, female_id: &str) -> Result<()> {
    if male_id.trim().is_empty() || female_id.trim().is_empty() {
        return Err(DomainError::Validation("Both parents must be given".to_string()).into());
    }
    if male_id.trim() == female_id.trim() {
        return Err(DomainError::Validation("A rabbit cannot be bred with itself".to_string()).into());
    }
    Ok(())
}

fn validate_litter(size: Option<u32>, alive: Option<u32>) -> Result<()> {
    if let (Some(size), Some(alive)) = (size, alive) {
        if alive > size {
            return Err(DomainError::Validation(format!(
                "Litter alive ({}) cannot exceed litter size ({})",
                alive, size
            ))
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::test_support::{manager, worker};
    use chrono::TimeZone;
    use shared::BreedingStatus;

    fn service() -> BreedingService {
        let store = FarmStore::in_memory();
        BreedingService::new(store.clone(), ActivityService::new(store))
    }

    fn request(male: &str, female: &str) -> CreateBreedingRecordRequest {
        CreateBreedingRecordRequest {
            male_id: male.to_string(),
            female_id: female.to_string(),
            mating_date: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            expected_birth_date: Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()),
            actual_birth_date: None,
            status: BreedingStatus::Pending,
            litter_size: None,
            litter_alive: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_record_litter() {
        let service = service();
        let record = service.create_breeding_record(&manager(), request("B-1", "D-1")).await.unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.status, BreedingStatus::Pending);

        let updated = service
            .update_breeding_record(
                &manager(),
                record.id,
                UpdateBreedingRecordRequest {
                    status: Some(BreedingStatus::Success),
                    litter_size: Some(8),
                    litter_alive: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, BreedingStatus::Success);
        assert_eq!(updated.litter_alive, Some(7));
        assert_eq!(updated.male_id, "B-1");
    }

    #[tokio::test]
    async fn test_litter_alive_cannot_exceed_size() {
        let service = service();
        let mut bad = request("B-1", "D-1");
        bad.litter_size = Some(3);
        bad.litter_alive = Some(4);
        let err = service.create_breeding_record(&manager(), bad).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));

        let record = service.create_breeding_record(&manager(), request("B-1", "D-1")).await.unwrap();
        service
            .update_breeding_record(
                &manager(),
                record.id,
                UpdateBreedingRecordRequest {
                    litter_size: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let result = service
            .update_breeding_record(
                &manager(),
                record.id,
                UpdateBreedingRecordRequest {
                    litter_alive: Some(6),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_worker_needs_both_parents_assigned() {
        let service = service();
        let hand = worker(4, &["B-1", "D-1"]);

        service.create_breeding_record(&hand, request("B-1", "D-1")).await.unwrap();
        let err = service
            .create_breeding_record(&hand, request("B-1", "D-9"))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Forbidden(_))));

        service.create_breeding_record(&manager(), request("B-7", "D-9")).await.unwrap();
        service.create_breeding_record(&manager(), request("B-1", "D-9")).await.unwrap();

        // Either parent assigned is enough to see the record
        let visible = service.list_breeding_records(&hand).await.unwrap();
        assert_eq!(visible.len(), 2);
        assert_eq!(service.list_breeding_records(&manager()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejects_self_breeding() {
        let service = service();
        assert!(service.create_breeding_record(&manager(), request("R-1", "R-1")).await.is_err());
    }
}
