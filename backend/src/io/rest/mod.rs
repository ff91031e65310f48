//! # REST API Interface Layer
//!
//! HTTP endpoints for the check-in service. This layer handles:
//! - Request/response serialization
//! - Bearer-token authentication via the [`crate::io::auth::AuthUser`] extractor
//! - Error translation from domain to HTTP status codes
//!
//! The auth endpoints keep a coarse status mapping for client compatibility
//! (500 with a message body for register/logout failures, 401 for login).
//! The resource endpoints use the conventional finer mapping below.

pub mod auth_apis;
pub mod child_apis;
pub mod guest_apis;
pub mod history_apis;

use axum::http::StatusCode;

use crate::domain::ServiceError;

/// Conventional status mapping for the resource endpoints.
pub(crate) fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ServiceError::Duplicate(_) => StatusCode::CONFLICT,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
