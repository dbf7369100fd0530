//! Login and session handling.
//!
//! Passwords are compared as stored. Sessions are opaque UUID tokens kept in
//! process memory, so a restart logs everyone out. A session expires
//! [`SESSION_TTL_HOURS`] after login; expired sessions are pruned whenever
//! someone logs in.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::domain::activity_service::ActivityService;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::user_service::UserService;
use shared::{ActivityType, EntityType, LoginRequest, LoginResponse, User};

pub const SESSION_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    activities: ActivityService,
    /// token -> session
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(users: UserService, activities: ActivityService) -> Self {
        Self {
            users,
            activities,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl: Duration::hours(SESSION_TTL_HOURS),
        }
    }

    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        info!("Login attempt for user: {}", request.username);

        let user = match self.users.find_by_username(&request.username).await? {
            Some(user) if user.password.as_deref() == Some(request.password.as_str()) => user,
            _ => {
                warn!("Invalid credentials for user: {}", request.username);
                return Err(DomainError::Unauthenticated("Invalid username or password".to_string()).into());
            }
        };

        if !user.is_active {
            warn!("Inactive user tried to log in: {}", user.username);
            return Err(DomainError::Forbidden("Account is inactive".to_string()).into());
        }

        let user = self.users.touch_last_login(user.id).await?.unwrap_or(user);
        self.activities
            .record(
                user.id,
                ActivityType::Login,
                format!("{} logged in", user.full_name),
                Some((EntityType::User, user.id)),
            )
            .await?;

        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        if sessions.len() < before {
            debug!("Pruned {} expired sessions", before - sessions.len());
        }
        sessions.insert(
            token.clone(),
            Session {
                user_id: user.id,
                expires_at: now + self.session_ttl,
            },
        );
        drop(sessions);
        info!("User {} logged in", user.username);

        Ok(LoginResponse {
            token,
            user: user.profile(),
        })
    }

    /// Resolve a bearer token to the current state of its user
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let session = self
            .sessions
            .read()
            .await
            .get(token)
            .copied()
            .ok_or_else(|| DomainError::Unauthenticated("Invalid or expired session".to_string()))?;
        if session.expires_at <= Utc::now() {
            self.sessions.write().await.remove(token);
            return Err(DomainError::Unauthenticated("Invalid or expired session".to_string()).into());
        }
        let user_id = session.user_id;

        let user = match self.users.get_user(user_id).await? {
            Some(user) => user,
            None => {
                self.sessions.write().await.remove(token);
                return Err(DomainError::Unauthenticated("Invalid or expired session".to_string()).into());
            }
        };

        if !user.is_active {
            return Err(DomainError::Forbidden("Account is inactive".to_string()).into());
        }
        Ok(user.without_credentials())
    }

    /// End a session. Returns false if the token was unknown
    pub async fn logout(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token).is_some();
        if removed {
            info!("Session ended");
        }
        removed
    }
}
