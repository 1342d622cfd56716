//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server faults to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body is `{"success": false, "error": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, CatalogError, OrderError, ReviewError};

/// Message shown for every 5xx response.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        let internal = || (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string());

        match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => internal(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
                }
                AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "User not found".to_string()),
                AuthError::UserAlreadyExists => {
                    (StatusCode::CONFLICT, "User already exists".to_string())
                }
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
                }
                AuthError::Validation(_) | AuthError::SamePassword | AuthError::IncorrectPassword => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                AuthError::Repository(_) | AuthError::PasswordHash => internal(),
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity(_) | CartError::LineLimitExceeded => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                CartError::ProductNotFound | CartError::CartNotFound => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                CartError::Repository(_) => internal(),
            },
            Self::Order(err) => match err {
                OrderError::EmptyCart => (StatusCode::BAD_REQUEST, err.to_string()),
                OrderError::Repository(_) => internal(),
            },
            Self::Review(err) => match err {
                // Soft failure: the request was understood, the review already exists.
                ReviewError::DuplicateReview => (StatusCode::OK, err.to_string()),
                ReviewError::Validation(_) | ReviewError::NotPurchased => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                ReviewError::Repository(_) => internal(),
            },
            Self::Catalog(err) => match err {
                CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                CatalogError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                CatalogError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
                CatalogError::Repository(_) => internal(),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let body = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_error_status_codes() {
        assert_eq!(
            get_status(OrderError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CartError::CartNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::LineLimitExceeded.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ReviewError::DuplicateReview.into()),
            StatusCode::OK
        );
        assert_eq!(
            get_status(CatalogError::Conflict("history".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CartError::Repository(RepositoryError::NotFound).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_json(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_duplicate_review_is_soft_failure() {
        let body = body_json(ReviewError::DuplicateReview.into()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "You have already reviewed this product");
    }
}
