//! # REST API for Guest Management and Presence
//!
//! Guests live under a child; the status endpoint drives the check-in/
//! check-out state machine.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::io::auth::AuthUser;
use crate::io::rest::status_for;
use crate::AppState;
use shared::{AddGuestRequest, GuestListResponse, GuestResponse, SetPresenceRequest};

/// List all guests under a child
pub async fn list_guests(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/guests - user: {}", child_id, auth.user_id);

    match state
        .presence_service
        .list_guests(&auth.user_id, &child_id)
        .await
    {
        Ok(guests) => (StatusCode::OK, Json(GuestListResponse { guests })).into_response(),
        Err(e) => {
            error!("Failed to list guests: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// Register a new guest under a child
pub async fn add_guest(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(child_id): Path<String>,
    Json(request): Json<AddGuestRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/guests - user: {}", child_id, auth.user_id);

    match state
        .presence_service
        .add_guest(&auth.user_id, &child_id, request)
        .await
    {
        Ok(guest) => (
            StatusCode::CREATED,
            Json(GuestResponse {
                guest,
                success_message: "Guest added successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to add guest: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// Check a guest in or out. A target status in the body sets that status;
/// no target flips the current one.
pub async fn set_guest_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((child_id, guest_id)): Path<(String, String)>,
    Json(request): Json<SetPresenceRequest>,
) -> impl IntoResponse {
    info!(
        "PUT /api/children/{}/guests/{}/status - user: {}, target: {:?}",
        child_id, guest_id, auth.user_id, request.status
    );

    match state
        .presence_service
        .set_status(&auth.user_id, &child_id, &guest_id, request.status)
        .await
    {
        Ok(guest) => {
            let success_message = format!("Guest is now checked {}", guest.status);
            (
                StatusCode::OK,
                Json(GuestResponse {
                    guest,
                    success_message,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to update guest status: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}
