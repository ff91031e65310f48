//! # Domuus Backend
//!
//! Backend for the Domuus childcare check-in service. The crate is layered:
//!
//! ```text
//! IO Layer (REST API, bearer auth)
//!     ↓
//! Domain Layer (account, presence, history services)
//!     ↓
//! Identity Provider / Storage Layer (accounts & sessions, document store)
//! ```
//!
//! [`initialize_backend`] wires the layers together and [`create_router`]
//! exposes them over HTTP.

pub mod config;
pub mod domain;
pub mod identity;
pub mod io;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use crate::config::Config;
use crate::domain::{
    AccountService, HistoryService, LogNotifier, NotificationQueue, PresenceService,
};
use crate::identity::{IdentityProvider, LocalIdentityProvider};
use crate::storage::{
    ChildRepository, DbConnection, GuestRepository, TransitionRepository, UserRepository,
};

/// Upper bound on any single operation against the external collaborators.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub presence_service: PresenceService,
    pub history_service: HistoryService,
    pub identity: Arc<dyn IdentityProvider>,
    pub db: DbConnection,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> anyhow::Result<AppState> {
    info!("Setting up document store");
    let db = DbConnection::new(&config.database_url).await?;

    info!("Setting up identity provider");
    let identity: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(
        db.clone(),
        config.session_ttl_hours,
    ));

    info!("Setting up domain services");
    let notifications = NotificationQueue::start(Arc::new(LogNotifier));
    let transitions = TransitionRepository::new(db.clone());

    let account_service = AccountService::new(identity.clone(), UserRepository::new(db.clone()));
    let presence_service = PresenceService::new(
        ChildRepository::new(db.clone()),
        GuestRepository::new(db.clone()),
        transitions.clone(),
        notifications,
    );
    let history_service = HistoryService::new(transitions);

    Ok(AppState {
        account_service,
        presence_service,
        history_service,
        identity,
        db,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    // CORS setup to allow the SPA to make requests
    let allowed_origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173"));
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/auth/register", post(io::rest::auth_apis::register))
        .route("/auth/login", post(io::rest::auth_apis::login))
        .route("/auth/logout", post(io::rest::auth_apis::logout))
        .route("/test", get(io::rest::auth_apis::test_connection))
        .route("/user-data", get(io::rest::auth_apis::user_data))
        .route("/profile", put(io::rest::auth_apis::update_profile))
        .route(
            "/children",
            get(io::rest::child_apis::list_children).post(io::rest::child_apis::create_child),
        )
        .route(
            "/children/:child_id",
            get(io::rest::child_apis::get_child)
                .put(io::rest::child_apis::update_child)
                .delete(io::rest::child_apis::delete_child),
        )
        .route(
            "/children/:child_id/guests",
            get(io::rest::guest_apis::list_guests).post(io::rest::guest_apis::add_guest),
        )
        .route(
            "/children/:child_id/guests/:guest_id/status",
            put(io::rest::guest_apis::set_guest_status),
        )
        .route("/history", get(io::rest::history_apis::get_history));

    Router::new()
        .nest("/api", api_routes)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn test_router() -> Router {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentityProvider::new(db.clone(), 24));
        let notifications = NotificationQueue::start(Arc::new(LogNotifier));
        let transitions = TransitionRepository::new(db.clone());

        let state = AppState {
            account_service: AccountService::new(
                identity.clone(),
                UserRepository::new(db.clone()),
            ),
            presence_service: PresenceService::new(
                ChildRepository::new(db.clone()),
                GuestRepository::new(db.clone()),
                transitions.clone(),
                notifications,
            ),
            history_service: HistoryService::new(transitions),
            identity,
            db,
        };

        create_router(state, &Config::default())
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
            .body(Body::from(serde_json::to_vec(&body).expect("Failed to encode body")))
            .expect("Failed to build request")
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).expect("Failed to build request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    }

    async fn register(app: &Router, email: &str, username: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({ "email": email, "password": "secret1", "username": username }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        body["token"].as_str().expect("Missing token").to_string()
    }

    #[tokio::test]
    async fn test_register_login_and_user_data() {
        let app = test_router().await;

        let token = register(&app, "ann@example.com", "ann").await;
        assert!(!token.is_empty());

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({ "email": "ann@example.com", "password": "secret1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["username"], "ann");

        let response = app
            .clone()
            .oneshot(get_request("/api/user-data", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["email"], "ann@example.com");
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials_is_401() {
        let app = test_router().await;
        register(&app, "ann@example.com", "ann").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({ "email": "ann@example.com", "password": "wrong1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_500_with_message() {
        let app = test_router().await;
        register(&app, "a@x.com", "ann").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({ "email": "a@x.com", "password": "secret2", "username": "bob" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Error creating user");
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer_token() {
        let app = test_router().await;

        for uri in ["/api/children", "/api/user-data", "/api/history"] {
            let response = app.clone().oneshot(get_request(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} should be protected", uri);
        }

        let response = app
            .clone()
            .oneshot(get_request("/api/children", Some("not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_check_in_flow_shows_up_in_history() {
        let app = test_router().await;
        let token = register(&app, "ann@example.com", "ann").await;

        // Create child Emma
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/children",
                Some(&token),
                json!({ "name": "Emma", "birthdate": "2015-06-15" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let child_id = body["child"]["id"].as_str().unwrap().to_string();

        // Add guest Lucas, initially out
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/children/{}/guests", child_id),
                Some(&token),
                json!({ "name": "Lucas", "contact": { "kind": "phone", "value": "+46701234567" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["guest"]["status"], "out");
        let guest_id = body["guest"]["id"].as_str().unwrap().to_string();

        // Check Lucas in
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/children/{}/guests/{}/status", child_id, guest_id),
                Some(&token),
                json!({ "status": "in" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["guest"]["status"], "in");

        // History shows the transition
        let response = app
            .clone()
            .oneshot(get_request("/api/history", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let records = body["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["child_name"], "Emma");
        assert_eq!(records[0]["guest_name"], "Lucas");
        assert_eq!(records[0]["status"], "in");

        // Filtered by a child name that does not exist: empty
        let response = app
            .clone()
            .oneshot(get_request("/api/history?child=Nils", Some(&token)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["records"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_guest_status_on_foreign_child_is_404() {
        let app = test_router().await;
        let ann = register(&app, "ann@example.com", "ann").await;
        let bob = register(&app, "bob@example.com", "bob").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/children",
                Some(&ann),
                json!({ "name": "Emma", "birthdate": "2015-06-15" }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let child_id = body["child"]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/children/{}/guests", child_id), Some(&bob)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_revokes_the_token() {
        let app = test_router().await;
        let token = register(&app, "ann@example.com", "ann").await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/logout", Some(&token), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_request("/api/user-data", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_store_connection_check() {
        let app = test_router().await;

        let response = app.clone().oneshot(get_request("/api/test", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["status"], "connected");
    }
}
