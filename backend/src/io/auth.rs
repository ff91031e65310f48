use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::AppState;

/// Authenticated caller, resolved from the `Authorization: Bearer <token>`
/// header against the identity provider. Handlers receive the user id and
/// thread it explicitly into every service call.
pub struct AuthUser {
    pub user_id: String,
    /// The raw bearer token, kept for logout
    pub token: String,
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Authentication required" })),
    )
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;

        let user_id = state
            .identity
            .verify_token(token)
            .await
            .map_err(|_| unauthorized())?;

        Ok(AuthUser {
            user_id,
            token: token.to_string(),
        })
    }
}
