use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::errors::ServiceError;
use crate::identity::IdentityProvider;
use crate::storage::UserRepository;
use shared::{
    AuthResponse, AuthUserSummary, LoginRequest, RegisterRequest, Role, UpdateProfileRequest,
    UserProfile,
};

const DEFAULT_LANGUAGE: &str = "sv";
const MAX_PROFILE_FIELD_LEN: usize = 100;

/// Service mediating registration, login, logout and profile updates.
///
/// Credential verification is delegated entirely to the identity provider;
/// this service owns the profile document and the duplicate checks around it.
#[derive(Clone)]
pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
    users: UserRepository,
}

impl AccountService {
    pub fn new(identity: Arc<dyn IdentityProvider>, users: UserRepository) -> Self {
        Self { identity, users }
    }

    /// Register a new account: validate, check duplicates, create the
    /// identity, then write the profile document. If the profile write fails
    /// the just-created identity is deleted before the error is re-raised.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        let email = request.email.trim().to_string();
        let username = request.username.trim().to_string();

        self.validate_registration(&email, &username)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Duplicate(
                "An account with this email already exists".to_string(),
            ));
        }
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(ServiceError::Duplicate(
                "This username is already taken".to_string(),
            ));
        }

        let identity_id = self.identity.create_account(&email, &request.password).await?;

        let user = UserProfile {
            id: identity_id.clone(),
            email,
            username,
            role: Role::User,
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            notifications: true,
            created_at: Utc::now().to_rfc3339(),
        };

        if let Err(e) = self.users.store_user(&user).await {
            // Compensating action: do not leave an identity without a profile
            if let Err(cleanup) = self.identity.delete_account(&identity_id).await {
                error!("Failed to roll back identity {}: {}", identity_id, cleanup);
            }
            return Err(e.into());
        }

        let token = self.identity.issue_token(&user.id).await?;

        info!("Registered user {} ({})", user.username, user.id);

        Ok(AuthResponse {
            message: "User created successfully".to_string(),
            token,
            user: AuthUserSummary::from(user),
        })
    }

    /// Authenticate and issue a session token.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let identity_id = self
            .identity
            .authenticate(request.email.trim(), &request.password)
            .await?;

        // A missing profile is reported exactly like bad credentials
        let user = self
            .users
            .get_user(&identity_id)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let token = self.identity.issue_token(&user.id).await?;

        info!("User {} logged in", user.id);

        Ok(AuthResponse {
            message: "Login successful".to_string(),
            token,
            user: AuthUserSummary::from(user),
        })
    }

    /// Invalidate a session token. Idempotent.
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.identity.revoke_token(token).await?;
        Ok(())
    }

    /// Load the profile for an authenticated user.
    pub async fn current_user(&self, user_id: &str) -> Result<UserProfile, ServiceError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User not found: {}", user_id)))
    }

    /// Partial update of the mutable profile fields. Email and username are
    /// immutable through this path.
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, ServiceError> {
        let mut user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User not found: {}", user_id)))?;

        if let Some(first_name) = request.first_name {
            Self::validate_field_len("First name", &first_name)?;
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            Self::validate_field_len("Last name", &last_name)?;
            user.last_name = last_name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            Self::validate_field_len("Phone", &phone)?;
            user.phone = phone.trim().to_string();
        }
        if let Some(language) = request.language {
            if language.trim().is_empty() {
                return Err(ServiceError::Validation(
                    "Language cannot be empty".to_string(),
                ));
            }
            user.language = language.trim().to_string();
        }
        if let Some(notifications) = request.notifications {
            user.notifications = notifications;
        }

        self.users.update_user(&user).await?;

        info!("Updated profile for user {}", user.id);

        Ok(user)
    }

    fn validate_registration(&self, email: &str, username: &str) -> Result<(), ServiceError> {
        if username.len() < 3 {
            return Err(ServiceError::Validation(
                "Username must be at least 3 characters long".to_string(),
            ));
        }
        if username.len() > MAX_PROFILE_FIELD_LEN {
            return Err(ServiceError::Validation(
                "Username cannot exceed 100 characters".to_string(),
            ));
        }

        // Minimal shape check; the provider owns anything stricter
        let mut parts = email.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(ServiceError::Validation(
                "Please enter a valid email".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_field_len(field: &str, value: &str) -> Result<(), ServiceError> {
        if value.len() > MAX_PROFILE_FIELD_LEN {
            return Err(ServiceError::Validation(format!(
                "{} cannot exceed 100 characters",
                field
            )));
        }
        Ok(())
    }
}
