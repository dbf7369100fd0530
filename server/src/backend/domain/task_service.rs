use anyhow::Result;
use chrono::Utc;
use log::info;

use crate::backend::domain::access;
use crate::backend::domain::activity_service::ActivityService;
use crate::backend::domain::errors::DomainError;
use crate::backend::storage::{CollectionRepository, FarmStore};
use shared::{ActivityType, CreateTaskRequest, EntityType, Task, TaskStatus, UpdateTaskRequest, User};

/// Service for farm tasks
#[derive(Clone)]
pub struct TaskService {
    store: FarmStore,
    tasks: CollectionRepository<Task>,
    activities: ActivityService,
}

impl TaskService {
    pub fn new(store: FarmStore, activities: ActivityService) -> Self {
        Self {
            tasks: store.repository(),
            store,
            activities,
        }
    }

    /// Tasks visible to the actor, optionally narrowed to one assignee
    pub async fn list_tasks(&self, actor: &User, assigned_to: Option<i64>) -> Result<Vec<Task>> {
        info!("Listing tasks for user {} (assignee filter: {:?})", actor.id, assigned_to);
        let actor = actor.clone();
        self.tasks
            .filter(move |t| {
                access::can_see_task(&actor, t) && assigned_to.map_or(true, |user_id| t.assigned_to == Some(user_id))
            })
            .await
    }

    pub async fn create_task(&self, actor: &User, request: CreateTaskRequest) -> Result<Task> {
        access::ensure(access::can_create_tasks(actor), "Only admins and managers can create tasks")?;
        info!("Creating task: {}", request.title);
        if request.title.trim().is_empty() {
            return Err(DomainError::Validation("Task title cannot be empty".to_string()).into());
        }

        let created_by = actor.id;
        let task = self
            .tasks
            .insert(move |id| {
                let now = Utc::now();
                Ok(Task {
                    id,
                    title: request.title.trim().to_string(),
                    description: request.description,
                    due_date: request.due_date,
                    status: request.status,
                    assigned_to: request.assigned_to,
                    created_by,
                    created_at: Some(now),
                    completed_at: (request.status == TaskStatus::Completed).then_some(now),
                })
            })
            .await?;

        info!("Created task {} with ID: {}", task.title, task.id);
        self.activities
            .record(
                actor.id,
                ActivityType::Create,
                format!("Created task {}", task.title),
                Some((EntityType::Task, task.id)),
            )
            .await?;
        Ok(task)
    }

    pub async fn update_task(&self, actor: &User, id: i64, request: UpdateTaskRequest) -> Result<Task> {
        info!("Updating task: {}", id);
        if matches!(&request.title, Some(t) if t.trim().is_empty()) {
            return Err(DomainError::Validation("Task title cannot be empty".to_string()).into());
        }

        let guard = self.store.write().await;
        let existing = self
            .tasks
            .load_locked(&guard)
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("Task not found: {}", id)))?;

        if access::is_restricted(actor) {
            access::ensure(access::can_see_task(actor, &existing), "You can only update your own tasks")?;
            let status_only = request.title.is_none()
                && request.description.is_none()
                && request.due_date.is_none()
                && request.assigned_to.is_none();
            access::ensure(status_only, "You can only change the status of your tasks")?;
        }

        let task = self
            .tasks
            .update_locked(&guard, id, |task| {
                if let Some(title) = request.title {
                    task.title = title.trim().to_string();
                }
                if request.description.is_some() {
                    task.description = request.description;
                }
                if request.due_date.is_some() {
                    task.due_date = request.due_date;
                }
                if request.assigned_to.is_some() {
                    task.assigned_to = request.assigned_to;
                }
                if let Some(status) = request.status {
                    if status == TaskStatus::Completed && task.status != TaskStatus::Completed {
                        task.completed_at = Some(Utc::now());
                    }
                    task.status = status;
                }
                Ok(())
            })
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Task not found: {}", id)))?;
        drop(guard);

        self.activities
            .record(
                actor.id,
                ActivityType::Update,
                format!("Updated task {} ({})", task.title, task.status),
                Some((EntityType::Task, task.id)),
            )
            .await?;
        Ok(task)
    }
}
