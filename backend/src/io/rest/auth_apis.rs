//! # REST API for Authentication and Profile
//!
//! Register, login, logout, connection test, current-user data and profile
//! updates. This surface keeps a deliberately coarse status mapping for
//! client compatibility: 500 with a message body on failure, 401 for failed
//! logins.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use tracing::{error, info};

use crate::io::auth::AuthUser;
use crate::io::rest::status_for;
use crate::AppState;
use shared::{
    LoginRequest, MessageResponse, ProfileResponse, RegisterRequest, UpdateProfileRequest,
    UserDataResponse,
};

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/register - email: {}", request.email);

    match state.account_service.register(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to register user: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Error creating user", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/login - email: {}", request.email);

    match state.account_service.login(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed login attempt: {}", e);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid credentials", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Invalidate the caller's session token
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("POST /api/auth/logout - user: {}", auth.user_id);

    match state.account_service.logout(&auth.token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Logged out successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to log out: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Error logging out", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Write and read back the diagnostics document, proving the store answers
pub async fn test_connection(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/test");

    match state.db.ping().await {
        Ok(doc) => (
            StatusCode::OK,
            Json(json!({ "message": "Store connection successful", "data": doc })),
        )
            .into_response(),
        Err(e) => {
            error!("Store connection failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Store connection failed", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Return the authenticated user's profile document
pub async fn user_data(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/user-data - user: {}", auth.user_id);

    match state.account_service.current_user(&auth.user_id).await {
        Ok(user) => (
            StatusCode::OK,
            Json(UserDataResponse {
                message: "User data retrieved".to_string(),
                user,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch user data: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Error fetching user data", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Partially update the authenticated user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    info!("PUT /api/profile - user: {}", auth.user_id);

    match state
        .account_service
        .update_profile(&auth.user_id, request)
        .await
    {
        Ok(user) => (
            StatusCode::OK,
            Json(ProfileResponse {
                user,
                success_message: "Profile updated successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update profile: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}
