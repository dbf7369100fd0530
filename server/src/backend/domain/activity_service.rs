use anyhow::Result;
use chrono::Utc;
use log::{debug, info};

use crate::backend::domain::access;
use crate::backend::storage::{CollectionRepository, FarmStore};
use shared::{Activity, ActivityType, EntityType, User};

/// Default number of activities returned by the recent-activity feed
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

/// Service for the farm activity log
#[derive(Clone)]
pub struct ActivityService {
    activities: CollectionRepository<Activity>,
}

impl ActivityService {
    pub fn new(store: FarmStore) -> Self {
        Self {
            activities: store.repository(),
        }
    }

    /// Append an entry to the activity log
    pub async fn record(
        &self,
        user_id: i64,
        activity_type: ActivityType,
        description: impl Into<String>,
        related: Option<(EntityType, i64)>,
    ) -> Result<Activity> {
        let description = description.into();
        debug!("Recording activity for user {}: {}", user_id, description);

        self.activities
            .insert(move |id| {
                Ok(Activity {
                    id,
                    user_id,
                    activity_type,
                    description,
                    timestamp: Utc::now(),
                    related_entity_type: related.map(|(entity, _)| entity),
                    related_entity_id: related.map(|(_, entity_id)| entity_id.to_string()),
                })
            })
            .await
    }

    /// Most recent activities first
    pub async fn recent_activities(&self, actor: &User, limit: Option<usize>) -> Result<Vec<Activity>> {
        access::ensure(access::can_view_activities(actor), "Workers cannot view the activity log")?;
        let limit = limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
        info!("Listing {} most recent activities", limit);

        let mut activities = self.activities.list().await?;
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        activities.truncate(limit);
        Ok(activities)
    }
}
