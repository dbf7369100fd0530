use anyhow::Result;
use chrono::Utc;
use log::{info, warn};

use crate::backend::config::AdminSeed;
use crate::backend::domain::access;
use crate::backend::domain::activity_service::ActivityService;
use crate::backend::domain::errors::DomainError;
use crate::backend::storage::{CollectionRepository, FarmStore};
use shared::{ActivityType, CreateUserRequest, EntityType, UpdateUserRequest, User, UserRole};

/// Service for farm user accounts
#[derive(Clone)]
pub struct UserService {
    store: FarmStore,
    users: CollectionRepository<User>,
    activities: ActivityService,
}

impl UserService {
    pub fn new(store: FarmStore, activities: ActivityService) -> Self {
        Self {
            users: store.repository(),
            store,
            activities,
        }
    }

    /// Create the default administrator when there are no users at all
    pub async fn ensure_default_admin(&self, seed: &AdminSeed) -> Result<Option<User>> {
        let guard = self.store.write().await;
        if !self.users.load_locked(&guard).await?.is_empty() {
            return Ok(None);
        }

        info!("No users found, creating default admin '{}'", seed.username);
        let admin = self
            .users
            .insert_locked(&guard, |id| {
                Ok(User {
                    id,
                    username: seed.username.clone(),
                    password: Some(seed.password.clone()),
                    full_name: seed.full_name.clone(),
                    role: UserRole::Admin,
                    is_active: true,
                    created_at: Some(Utc::now()),
                    last_login: None,
                    assigned_rabbits: Vec::new(),
                })
            })
            .await?;
        Ok(Some(admin.without_credentials()))
    }

    /// List all users with credentials removed
    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>> {
        access::ensure(access::can_manage_users(actor), "Only admins can manage users")?;
        info!("Listing all users");

        let users: Vec<User> = self
            .users
            .list()
            .await?
            .into_iter()
            .map(User::without_credentials)
            .collect();
        info!("Found {} users", users.len());
        Ok(users)
    }

    /// Look up a user by username, including the stored password
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.trim().to_string();
        self.users.find(move |u| u.username == username).await
    }

    /// Look up a user by id, including the stored password
    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.users.get(id).await
    }

    pub async fn create_user(&self, actor: &User, request: CreateUserRequest) -> Result<User> {
        access::ensure(access::can_manage_users(actor), "Only admins can manage users")?;
        info!("Creating user: username={}, role={}", request.username, request.role);
        self.validate_create_request(&request)?;

        let username = request.username.trim().to_string();
        let guard = self.store.write().await;
        if self
            .users
            .load_locked(&guard)
            .await?
            .iter()
            .any(|u| u.username == username)
        {
            warn!("Username already taken: {}", username);
            return Err(DomainError::Conflict(format!("Username already exists: {}", username)).into());
        }

        let user = self
            .users
            .insert_locked(&guard, |id| {
                Ok(User {
                    id,
                    username,
                    password: Some(request.password),
                    full_name: request.full_name.trim().to_string(),
                    role: request.role,
                    is_active: request.is_active,
                    created_at: Some(Utc::now()),
                    last_login: None,
                    assigned_rabbits: request.assigned_rabbits,
                })
            })
            .await?;
        drop(guard);

        info!("Created user: {} with ID: {}", user.username, user.id);
        self.activities
            .record(
                actor.id,
                ActivityType::Create,
                format!("Created user {}", user.username),
                Some((EntityType::User, user.id)),
            )
            .await?;

        Ok(user.without_credentials())
    }

    pub async fn update_user(&self, actor: &User, id: i64, request: UpdateUserRequest) -> Result<User> {
        access::ensure(access::can_manage_users(actor), "Only admins can manage users")?;
        info!("Updating user: {}", id);
        self.validate_update_request(&request)?;

        let guard = self.store.write().await;
        if let Some(username) = request.username.as_deref().map(str::trim) {
            let taken = self
                .users
                .load_locked(&guard)
                .await?
                .iter()
                .any(|u| u.username == username && u.id != id);
            if taken {
                return Err(DomainError::Conflict(format!("Username already exists: {}", username)).into());
            }
        }

        let user = self
            .users
            .update_locked(&guard, id, |user| {
                if let Some(username) = request.username {
                    user.username = username.trim().to_string();
                }
                if let Some(password) = request.password {
                    user.password = Some(password);
                }
                if let Some(full_name) = request.full_name {
                    user.full_name = full_name.trim().to_string();
                }
                if let Some(role) = request.role {
                    user.role = role;
                }
                if let Some(is_active) = request.is_active {
                    user.is_active = is_active;
                }
                if let Some(assigned) = request.assigned_rabbits {
                    user.assigned_rabbits = assigned;
                }
                Ok(())
            })
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User not found: {}", id)))?;
        drop(guard);

        info!("Updated user: {} with ID: {}", user.username, user.id);
        self.activities
            .record(
                actor.id,
                ActivityType::Update,
                format!("Updated user {}", user.username),
                Some((EntityType::User, user.id)),
            )
            .await?;

        Ok(user.without_credentials())
    }

    /// Stamp the last login time of a user
    pub async fn touch_last_login(&self, id: i64) -> Result<Option<User>> {
        self.users
            .update(id, |user| {
                user.last_login = Some(Utc::now());
                Ok(())
            })
            .await
    }

    fn validate_create_request(&self, request: &CreateUserRequest) -> Result<()> {
        if request.username.trim().is_empty() {
            return Err(DomainError::Validation("Username cannot be empty".to_string()).into());
        }
        if request.password.is_empty() {
            return Err(DomainError::Validation("Password cannot be empty".to_string()).into());
        }
        if request.full_name.trim().is_empty() {
            return Err(DomainError::Validation("Full name cannot be empty".to_string()).into());
        }
        Ok(())
    }

    fn validate_update_request(&self, request: &UpdateUserRequest) -> Result<()> {
        if matches!(&request.username, Some(u) if u.trim().is_empty()) {
            return Err(DomainError::Validation("Username cannot be empty".to_string()).into());
        }
        if matches!(&request.password, Some(p) if p.is_empty()) {
            return Err(DomainError::Validation("Password cannot be empty".to_string()).into());
        }
        if matches!(&request.full_name, Some(n) if n.trim().is_empty()) {
            return Err(DomainError::Validation("Full name cannot be empty".to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::test_support::{admin, manager};

    fn service() -> UserService {
        let store = FarmStore::in_memory();
        UserService::new(store.clone(), ActivityService::new(store))
    }

    fn create_request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "secret".to_string(),
            full_name: "Farm Hand".to_string(),
            role: UserRole::Worker,
            is_active: true,
            assigned_rabbits: vec!["R-1".to_string()],
        }
    }

    #[tokio::test]
    async fn test_default_admin_seeded_once() {
        let service = service();
        let seeded = service.ensure_default_admin(&AdminSeed::default()).await.unwrap().unwrap();
        assert_eq!(seeded.username, "admin");
        assert_eq!(seeded.role, UserRole::Admin);
        assert!(seeded.password.is_none());

        assert!(service.ensure_default_admin(&AdminSeed::default()).await.unwrap().is_none());

        let stored = service.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(stored.password.as_deref(), Some("admin123"));
    }

    #[tokio::test]
    async fn test_create_user_strips_password_and_rejects_duplicates() {
        let service = service();
        let user = service.create_user(&admin(), create_request("hand")).await.unwrap();
        assert_eq!(user.id, 1);
        assert!(user.password.is_none());
        assert!(user.created_at.is_some());

        let err = service.create_user(&admin(), create_request(" hand ")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Conflict(_))));

        let listed = service.list_users(&admin()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].password.is_none());
    }

    #[tokio::test]
    async fn test_only_admin_manages_users() {
        let service = service();
        let err = service.create_user(&manager(), create_request("hand")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Forbidden(_))));
        assert!(service.list_users(&manager()).await.is_err());
    }

    #[tokio::test]
    async fn test_update_user_partial() {
        let service = service();
        let user = service.create_user(&admin(), create_request("hand")).await.unwrap();

        let updated = service
            .update_user(
                &admin(),
                user.id,
                UpdateUserRequest {
                    is_active: Some(false),
                    assigned_rabbits: Some(vec!["R-2".to_string(), "R-3".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.assigned_rabbits, vec!["R-2", "R-3"]);
        assert_eq!(updated.username, "hand");

        let stored = service.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password.as_deref(), Some("secret"));

        let err = service
            .update_user(&admin(), 99, UpdateUserRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username() {
        let service = service();
        service.create_user(&admin(), create_request("first")).await.unwrap();
        let second = service.create_user(&admin(), create_request("second")).await.unwrap();

        let result = service
            .update_user(
                &admin(),
                second.id,
                UpdateUserRequest {
                    username: Some("first".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
    }
}
