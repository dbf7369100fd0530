use anyhow::Result;
use chrono::Utc;
use log::{info, warn};

use crate::backend::domain::access;
use crate::backend::domain::activity_service::ActivityService;
use crate::backend::domain::errors::DomainError;
use crate::backend::storage::{CollectionRepository, FarmStore, WriteGuard};
use shared::{ActivityType, CreateRabbitRequest, EntityType, Rabbit, UpdateRabbitRequest, User};

/// Service for the rabbit inventory
#[derive(Clone)]
pub struct RabbitService {
    store: FarmStore,
    rabbits: CollectionRepository<Rabbit>,
    activities: ActivityService,
}

impl RabbitService {
    pub fn new(store: FarmStore, activities: ActivityService) -> Self {
        Self {
            rabbits: store.repository(),
            store,
            activities,
        }
    }

    /// Rabbits visible to the actor
    pub async fn list_rabbits(&self, actor: &User) -> Result<Vec<Rabbit>> {
        info!("Listing rabbits for user {}", actor.id);
        let actor = actor.clone();
        let rabbits = self.rabbits.filter(move |r| access::can_see_rabbit(&actor, r)).await?;
        info!("Found {} rabbits", rabbits.len());
        Ok(rabbits)
    }

    pub async fn get_by_tag(&self, tag_id: &str) -> Result<Option<Rabbit>> {
        let tag_id = tag_id.to_string();
        self.rabbits.find(move |r| r.tag_id == tag_id).await
    }

    pub async fn create_rabbit(&self, actor: &User, request: CreateRabbitRequest) -> Result<Rabbit> {
        info!("Creating rabbit: tag={}, breed={}", request.tag_id, request.breed);
        self.validate_create_request(&request)?;

        let tag_id = request.tag_id.trim().to_string();
        let guard = self.store.write().await;
        self.ensure_unique_tag(&guard, &tag_id, None).await?;

        let created_by = actor.id;
        let rabbit = self
            .rabbits
            .insert_locked(&guard, |id| {
                Ok(Rabbit {
                    id,
                    tag_id,
                    breed: request.breed.trim().to_string(),
                    gender: request.gender,
                    birth_date: request.birth_date,
                    acquired_date: request.acquired_date,
                    status: request.status,
                    weight: request.weight,
                    cage_number: request.cage_number,
                    parent_male_id: request.parent_male_id,
                    parent_female_id: request.parent_female_id,
                    notes: request.notes,
                    created_by,
                    health_status: request.health_status,
                    created_at: Some(Utc::now()),
                })
            })
            .await?;
        drop(guard);

        info!("Created rabbit {} with ID: {}", rabbit.tag_id, rabbit.id);
        self.activities
            .record(
                actor.id,
                ActivityType::Create,
                format!("Added rabbit {}", rabbit.tag_id),
                Some((EntityType::Rabbit, rabbit.id)),
            )
            .await?;
        Ok(rabbit)
    }

    pub async fn update_rabbit(&self, actor: &User, id: i64, request: UpdateRabbitRequest) -> Result<Rabbit> {
        info!("Updating rabbit: {}", id);
        if matches!(&request.tag_id, Some(t) if t.trim().is_empty()) {
            return Err(DomainError::Validation("Tag id cannot be empty".to_string()).into());
        }

        let guard = self.store.write().await;
        let existing = self
            .rabbits
            .load_locked(&guard)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("Rabbit not found: {}", id)))?;
        access::ensure(
            access::can_see_rabbit(actor, &existing),
            "You can only update rabbits assigned to you",
        )?;
        if let Some(tag_id) = request.tag_id.as_deref() {
            self.ensure_unique_tag(&guard, tag_id.trim(), Some(id)).await?;
        }

        let rabbit = self
            .rabbits
            .update_locked(&guard, id, |rabbit| {
                apply_update(rabbit, request);
                Ok(())
            })
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Rabbit not found: {}", id)))?;
        drop(guard);

        info!("Updated rabbit {} with ID: {}", rabbit.tag_id, rabbit.id);
        self.activities
            .record(
                actor.id,
                ActivityType::Update,
                format!("Updated rabbit {}", rabbit.tag_id),
                Some((EntityType::Rabbit, rabbit.id)),
            )
            .await?;
        Ok(rabbit)
    }

    async fn ensure_unique_tag(
        &self,
        guard: &WriteGuard<'_>,
        tag_id: &str,
        except: Option<i64>,
    ) -> Result<()> {
        let taken = self
            .rabbits
            .load_locked(guard)
            .await?
            .iter()
            .any(|r| r.tag_id == tag_id && Some(r.id) != except);
        if taken {
            warn!("Tag id already in use: {}", tag_id);
            return Err(DomainError::Conflict(format!("Tag id already exists: {}", tag_id)).into());
        }
        Ok(())
    }

    fn validate_create_request(&self, request: &CreateRabbitRequest) -> Result<()> {
        if request.tag_id.trim().is_empty() {
            return Err(DomainError::Validation("Tag id cannot be empty".to_string()).into());
        }
        if request.breed.trim().is_empty() {
            return Err(DomainError::Validation("Breed cannot be empty".to_string()).into());
        }
        Ok(())
    }
}

fn apply_update(rabbit: &mut Rabbit, request: UpdateRabbitRequest) {
    if let Some(tag_id) = request.tag_id {
        rabbit.tag_id = tag_id.trim().to_string();
    }
    if let Some(breed) = request.breed {
        rabbit.breed = breed.trim().to_string();
    }
    if let Some(gender) = request.gender {
        rabbit.gender = gender;
    }
    if request.birth_date.is_some() {
        rabbit.birth_date = request.birth_date;
    }
    if let Some(acquired_date) = request.acquired_date {
        rabbit.acquired_date = acquired_date;
    }
    if let Some(status) = request.status {
        rabbit.status = status;
    }
    if request.weight.is_some() {
        rabbit.weight = request.weight;
    }
    if request.cage_number.is_some() {
        rabbit.cage_number = request.cage_number;
    }
    if request.parent_male_id.is_some() {
        rabbit.parent_male_id = request.parent_male_id;
    }
    if request.parent_female_id.is_some() {
        rabbit.parent_female_id = request.parent_female_id;
    }
    if request.notes.is_some() {
        rabbit.notes = request.notes;
    }
    if let Some(health_status) = request.health_status {
        rabbit.health_status = health_status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::test_support::{manager, rabbit_request, worker};
    use shared::RabbitStatus;

    fn service() -> RabbitService {
        let store = FarmStore::in_memory();
        RabbitService::new(store.clone(), ActivityService::new(store))
    }

    #[tokio::test]
    async fn test_create_rabbit_assigns_id_and_creator() {
        let service = service();
        let rabbit = service.create_rabbit(&manager(), rabbit_request("R-1")).await.unwrap();

        assert_eq!(rabbit.id, 1);
        assert_eq!(rabbit.created_by, manager().id);
        assert!(rabbit.created_at.is_some());
        assert_eq!(service.get_by_tag("R-1").await.unwrap().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_duplicate_tag_conflicts() {
        let service = service();
        service.create_rabbit(&manager(), rabbit_request("R-1")).await.unwrap();

        let err = service.create_rabbit(&manager(), rabbit_request("R-1")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Conflict(_))));

        let second = service.create_rabbit(&manager(), rabbit_request("R-2")).await.unwrap();
        let result = service
            .update_rabbit(
                &manager(),
                second.id,
                UpdateRabbitRequest {
                    tag_id: Some("R-1".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_marks_deceased_without_deleting() {
        let service = service();
        let rabbit = service.create_rabbit(&manager(), rabbit_request("R-1")).await.unwrap();

        let updated = service
            .update_rabbit(
                &manager(),
                rabbit.id,
                UpdateRabbitRequest {
                    status: Some(RabbitStatus::Deceased),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RabbitStatus::Deceased);
        assert_eq!(updated.breed, rabbit.breed);
        assert_eq!(updated.weight, rabbit.weight);
        assert_eq!(service.list_rabbits(&manager()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_worker_sees_and_updates_only_assigned() {
        let service = service();
        service.create_rabbit(&manager(), rabbit_request("R-1")).await.unwrap();
        let other = service.create_rabbit(&manager(), rabbit_request("R-2")).await.unwrap();

        let hand = worker(9, &["R-1"]);
        let visible = service.list_rabbits(&hand).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].tag_id, "R-1");

        let err = service
            .update_rabbit(&hand, other.id, UpdateRabbitRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_missing_rabbit() {
        let service = service();
        let err = service
            .update_rabbit(&manager(), 42, UpdateRabbitRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
    }
}
