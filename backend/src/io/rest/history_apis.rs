//! # REST API for the History View
//!
//! Read-only, filterable timeline of presence transitions across all of the
//! caller's children.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::{error, info};

use crate::domain::HistoryFilter;
use crate::io::auth::AuthUser;
use crate::io::rest::status_for;
use crate::AppState;
use shared::HistoryListResponse;

/// Query parameters for the history endpoint
#[derive(Deserialize, Debug)]
pub struct HistoryQuery {
    /// Child name to match, case-insensitively
    pub child: Option<String>,
    /// Calendar day (YYYY-MM-DD) to match
    pub date: Option<String>,
}

/// Build the filtered history for the caller
pub async fn get_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    info!("GET /api/history - user: {}, query: {:?}", auth.user_id, query);

    let filter = HistoryFilter {
        child: query.child,
        date: query.date,
    };

    match state
        .history_service
        .build_history(&auth.user_id, filter)
        .await
    {
        Ok(records) => (StatusCode::OK, Json(HistoryListResponse { records })).into_response(),
        Err(e) => {
            error!("Failed to build history: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}
