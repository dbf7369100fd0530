//! Feed inventory and consumption.
//!
//! Recording a consumption draws the quantity from the matching inventory
//! item. Both writes happen under one write lock, so stock can never be drawn
//! twice by concurrent requests.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};

use crate::backend::domain::access;
use crate::backend::domain::activity_service::ActivityService;
use crate::backend::domain::errors::DomainError;
use crate::backend::storage::{CollectionRepository, FarmStore};
use shared::{
    ActivityType, CreateFeedConsumptionRequest, CreateFeedInventoryRequest, EntityType, FeedConsumption,
    FeedInventory, UpdateFeedInventoryRequest, User,
};

#[derive(Clone)]
pub struct FeedService {
    store: FarmStore,
    inventory: CollectionRepository<FeedInventory>,
    consumption: CollectionRepository<FeedConsumption>,
    activities: ActivityService,
}

impl FeedService {
    pub fn new(store: FarmStore, activities: ActivityService) -> Self {
        Self {
            inventory: store.repository(),
            consumption: store.repository(),
            store,
            activities,
        }
    }

    pub async fn list_inventory(&self) -> Result<Vec<FeedInventory>> {
        info!("Listing feed inventory");
        self.inventory.list().await
    }

    pub async fn create_inventory_item(&self, actor: &User, request: CreateFeedInventoryRequest) -> Result<FeedInventory> {
        access::ensure(
            access::can_manage_feed_inventory(actor),
            "Only admins and managers can manage feed inventory",
        )?;
        info!("Adding feed: type={}, quantity={}", request.feed_type, request.quantity);
        if request.feed_type.trim().is_empty() {
            return Err(DomainError::Validation("Feed type cannot be empty".to_string()).into());
        }

        let created_by = actor.id;
        let item = self
            .inventory
            .insert(move |id| {
                Ok(FeedInventory {
                    id,
                    feed_type: request.feed_type.trim().to_string(),
                    quantity: request.quantity,
                    acquired: request.acquired,
                    expiration_date: request.expiration_date,
                    supplier_info: request.supplier_info,
                    cost: request.cost,
                    created_by,
                    created_at: Some(Utc::now()),
                })
            })
            .await?;

        self.activities
            .record(
                actor.id,
                ActivityType::Create,
                format!("Added {} of {}", item.quantity, item.feed_type),
                Some((EntityType::Feed, item.id)),
            )
            .await?;
        Ok(item)
    }

    pub async fn update_inventory_item(
        &self,
        actor: &User,
        id: i64,
        request: UpdateFeedInventoryRequest,
    ) -> Result<FeedInventory> {
        access::ensure(
            access::can_manage_feed_inventory(actor),
            "Only admins and managers can manage feed inventory",
        )?;
        info!("Updating feed inventory item: {}", id);
        if matches!(&request.feed_type, Some(t) if t.trim().is_empty()) {
            return Err(DomainError::Validation("Feed type cannot be empty".to_string()).into());
        }

        let item = self
            .inventory
            .update(id, |item| {
                if let Some(feed_type) = request.feed_type {
                    item.feed_type = feed_type.trim().to_string();
                }
                if let Some(quantity) = request.quantity {
                    item.quantity = quantity;
                }
                if let Some(acquired) = request.acquired {
                    item.acquired = acquired;
                }
                if request.expiration_date.is_some() {
                    item.expiration_date = request.expiration_date;
                }
                if request.supplier_info.is_some() {
                    item.supplier_info = request.supplier_info;
                }
                if request.cost.is_some() {
                    item.cost = request.cost;
                }
                Ok(())
            })
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Feed item not found: {}", id)))?;

        self.activities
            .record(
                actor.id,
                ActivityType::Update,
                format!("Updated feed {}", item.feed_type),
                Some((EntityType::Feed, item.id)),
            )
            .await?;
        Ok(item)
    }

    pub async fn list_consumption(&self) -> Result<Vec<FeedConsumption>> {
        info!("Listing feed consumption");
        self.consumption.list().await
    }

    /// Record feed used and draw it from stock
    pub async fn record_consumption(
        &self,
        actor: &User,
        request: CreateFeedConsumptionRequest,
    ) -> Result<FeedConsumption> {
        info!("Recording consumption of {} from feed {}", request.quantity, request.feed_id);
        if request.quantity == 0 {
            return Err(DomainError::Validation("Quantity must be greater than zero".to_string()).into());
        }

        let guard = self.store.write().await;
        let item = self
            .inventory
            .load_locked(&guard)
            .await?
            .into_iter()
            .find(|i| i.id == request.feed_id)
            .ok_or_else(|| DomainError::NotFound(format!("Feed item not found: {}", request.feed_id)))?;

        if item.quantity < request.quantity {
            warn!(
                "Insufficient stock of {}: {} requested, {} available",
                item.feed_type, request.quantity, item.quantity
            );
            return Err(DomainError::Validation(format!(
                "Insufficient quantity of {}: {} available",
                item.feed_type, item.quantity
            ))
            .into());
        }

        let drawn = request.quantity;
        self.inventory
            .update_locked(&guard, item.id, |item| {
                item.quantity -= drawn;
                Ok(())
            })
            .await?;

        let created_by = actor.id;
        let consumption = self
            .consumption
            .insert_locked(&guard, move |id| {
                Ok(FeedConsumption {
                    id,
                    feed_id: request.feed_id,
                    quantity: request.quantity,
                    consumption_date: request.consumption_date,
                    group_id: request.group_id,
                    notes: request.notes,
                    created_by,
                    created_at: Some(Utc::now()),
                })
            })
            .await?;
        drop(guard);

        self.activities
            .record(
                actor.id,
                ActivityType::Create,
                format!("Used {} of {}", consumption.quantity, item.feed_type),
                Some((EntityType::Feed, item.id)),
            )
            .await?;
        Ok(consumption)
    }
}
