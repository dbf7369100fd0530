use anyhow::Result;
use chrono::Utc;
use log::info;

use crate::backend::domain::access;
use crate::backend::domain::activity_service::ActivityService;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::rabbit_service::RabbitService;
use crate::backend::storage::{CollectionRepository, FarmStore};
use shared::{ActivityType, CreateHealthRecordRequest, EntityType, HealthRecord, UpdateHealthRecordRequest, User};

/// Service for rabbit health records
#[derive(Clone)]
pub struct HealthService {
    store: FarmStore,
    records: CollectionRepository<HealthRecord>,
    rabbits: RabbitService,
    activities: ActivityService,
}

impl HealthService {
    pub fn new(store: FarmStore, rabbits: RabbitService, activities: ActivityService) -> Self {
        Self {
            records: store.repository(),
            store,
            rabbits,
            activities,
        }
    }

    pub async fn list_health_records(&self, actor: &User) -> Result<Vec<HealthRecord>> {
        info!("Listing health records for user {}", actor.id);
        let actor = actor.clone();
        self.records.filter(move |r| access::can_see_health(&actor, r)).await
    }

    /// Health history of one rabbit, newest first
    pub async fn list_for_rabbit(&self, actor: &User, tag_id: &str) -> Result<Vec<HealthRecord>> {
        info!("Listing health records for rabbit {}", tag_id);
        if self.rabbits.get_by_tag(tag_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Rabbit not found: {}", tag_id)).into());
        }
        access::ensure(
            access::can_see_rabbit_tag(actor, tag_id),
            "You can only view rabbits assigned to you",
        )?;

        let tag = tag_id.to_string();
        let mut records = self.records.filter(move |r| r.rabbit_id == tag).await?;
        records.sort_by(|a, b| b.record_date.cmp(&a.record_date));
        Ok(records)
    }

    pub async fn create_health_record(&self, actor: &User, request: CreateHealthRecordRequest) -> Result<HealthRecord> {
        info!("Creating {:?} record for rabbit {}", request.record_type, request.rabbit_id);
        let rabbit_id = request.rabbit_id.trim().to_string();
        if rabbit_id.is_empty() {
            return Err(DomainError::Validation("Rabbit id cannot be empty".to_string()).into());
        }
        access::ensure(
            access::can_see_rabbit_tag(actor, &rabbit_id),
            "You can only add health records for rabbits assigned to you",
        )?;

        let created_by = actor.id;
        let record = self
            .records
            .insert(move |id| {
                Ok(HealthRecord {
                    id,
                    rabbit_id,
                    record_date: request.record_date,
                    record_type: request.record_type,
                    diagnosis: request.diagnosis,
                    treatment: request.treatment,
                    notes: request.notes,
                    created_by,
                    created_at: Some(Utc::now()),
                })
            })
            .await?;

        info!("Created health record with ID: {}", record.id);
        self.activities
            .record(
                actor.id,
                ActivityType::Create,
                format!("Added health record for rabbit {}", record.rabbit_id),
                Some((EntityType::Health, record.id)),
            )
            .await?;
        Ok(record)
    }

    pub async fn update_health_record(
        &self,
        actor: &User,
        id: i64,
        request: UpdateHealthRecordRequest,
    ) -> Result<HealthRecord> {
        info!("Updating health record: {}", id);

        let guard = self.store.write().await;
        let existing = self
            .records
            .load_locked(&guard)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("Health record not found: {}", id)))?;
        access::ensure(
            access::can_see_health(actor, &existing),
            "You can only update health records of rabbits assigned to you",
        )?;

        let record = self
            .records
            .update_locked(&guard, id, |record| {
                if let Some(record_date) = request.record_date {
                    record.record_date = record_date;
                }
                if let Some(record_type) = request.record_type {
                    record.record_type = record_type;
                }
                if request.diagnosis.is_some() {
                    record.diagnosis = request.diagnosis;
                }
                if request.treatment.is_some() {
                    record.treatment = request.treatment;
                }
                if request.notes.is_some() {
                    record.notes = request.notes;
                }
                Ok(())
            })
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Health record not found: {}", id)))?;
        drop(guard);

        self.activities
            .record(
                actor.id,
                ActivityType::Update,
                format!("Updated health record for rabbit {}", record.rabbit_id),
                Some((EntityType::Health, record.id)),
            )
            .await?;
        Ok(record)
    }
}
