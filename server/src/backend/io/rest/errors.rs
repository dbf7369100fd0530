//! Translation of domain failures into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, warn};

use crate::backend::domain::{DataExchangeError, DomainError};
use shared::ErrorResponse;

/// Status code for an error raised by a domain service
pub fn status_for(err: &anyhow::Error) -> StatusCode {
    if let Some(domain) = err.downcast_ref::<DomainError>() {
        return match domain {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) | DomainError::Conflict(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        };
    }

    match err.downcast_ref::<DataExchangeError>() {
        Some(DataExchangeError::EmptyCollection(_)) => StatusCode::NOT_FOUND,
        Some(exchange) if exchange.is_rejection() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build an error body for a failed operation.
///
/// Server-side failures are logged with their full chain and answered with
/// a generic message naming the operation.
pub fn error_response(operation: &str, err: anyhow::Error) -> Response {
    let status = status_for(&err);
    let message = if status.is_server_error() {
        error!("Failed to {}: {:#}", operation, err);
        format!("Failed to {}", operation)
    } else {
        warn!("Refused to {}: {}", operation, err);
        err.to_string()
    };
    message_response(status, message)
}

pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Collection;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Conflict("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err.into()), expected);
        }
    }

    #[test]
    fn test_exchange_errors_map_to_statuses() {
        assert_eq!(
            status_for(&DataExchangeError::NoValidData.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&DataExchangeError::EmptyCollection(Collection::Tasks).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&DataExchangeError::Storage(anyhow::anyhow!("disk full")).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&anyhow::anyhow!("unexpected")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = error_response("list rabbits", anyhow::anyhow!("secret path /var/db"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
