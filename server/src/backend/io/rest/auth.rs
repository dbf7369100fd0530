//! # REST API for Sessions
//!
//! Login, logout and the [`AuthUser`] extractor that every protected handler
//! takes as an argument.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use log::info;

use crate::backend::io::rest::errors::{error_response, message_response};
use crate::backend::AppState;
use shared::{LoginRequest, User};

/// The authenticated caller, without credentials
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| message_response(StatusCode::UNAUTHORIZED, "Authentication required"))?;

        state
            .auth_service
            .authenticate(token)
            .await
            .map(AuthUser)
            .map_err(|e| error_response("authenticate", e))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> impl IntoResponse {
    info!("POST /api/login - user: {}", request.username);

    match state.auth_service.login(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("log in", e),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    info!("POST /api/logout");

    match bearer_token(&headers) {
        Some(token) if state.auth_service.logout(token).await => StatusCode::NO_CONTENT.into_response(),
        _ => message_response(StatusCode::UNAUTHORIZED, "Not logged in"),
    }
}
