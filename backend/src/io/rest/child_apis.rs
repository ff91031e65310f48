//! # REST API for Child Management
//!
//! Endpoints for creating, retrieving, updating, and deleting children.
//! Every operation is scoped to the authenticated caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::io::auth::AuthUser;
use crate::io::rest::status_for;
use crate::AppState;
use shared::{ChildListResponse, ChildResponse, CreateChildRequest, UpdateChildRequest};

/// Create a new child
pub async fn create_child(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/children - user: {}", auth.user_id);

    match state
        .presence_service
        .create_child(&auth.user_id, request)
        .await
    {
        Ok(child) => (
            StatusCode::CREATED,
            Json(ChildResponse {
                child,
                success_message: "Child created successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to create child: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// List the caller's children
pub async fn list_children(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/children - user: {}", auth.user_id);

    match state.presence_service.list_children(&auth.user_id).await {
        Ok(children) => (StatusCode::OK, Json(ChildListResponse { children })).into_response(),
        Err(e) => {
            error!("Failed to list children: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// Get a single child
pub async fn get_child(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{} - user: {}", child_id, auth.user_id);

    match state
        .presence_service
        .get_child(&auth.user_id, &child_id)
        .await
    {
        Ok(child) => (StatusCode::OK, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to get child: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// Update a child
pub async fn update_child(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(child_id): Path<String>,
    Json(request): Json<UpdateChildRequest>,
) -> impl IntoResponse {
    info!("PUT /api/children/{} - user: {}", child_id, auth.user_id);

    match state
        .presence_service
        .update_child(&auth.user_id, &child_id, request)
        .await
    {
        Ok(child) => (
            StatusCode::OK,
            Json(ChildResponse {
                child,
                success_message: "Child updated successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update child: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// Delete a child
pub async fn delete_child(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/children/{} - user: {}", child_id, auth.user_id);

    match state
        .presence_service
        .delete_child(&auth.user_id, &child_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to delete child: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}
