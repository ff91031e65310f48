//! # Identity Provider
//!
//! Account lifecycle and bearer-token sessions live behind the
//! [`IdentityProvider`] trait. The rest of the application never sees
//! credentials; it hands them to the provider and gets back opaque identity
//! ids and tokens. [`local::LocalIdentityProvider`] is the shipped
//! implementation, backed by the same document store as everything else.

pub mod local;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalIdentityProvider;

/// Errors reported by the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Password should be at least 6 characters")]
    WeakPassword,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired session token")]
    InvalidToken,
    #[error("Identity provider unavailable")]
    Unavailable(#[from] sqlx::Error),
}

/// External collaborator owning accounts and session tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a new account, returning the assigned identity id.
    async fn create_account(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    /// Verify credentials, returning the identity id on success. Any
    /// mismatch reports the same `InvalidCredentials` error.
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    /// Delete an account and revoke all of its sessions. Used as the
    /// compensating action when registration fails after account creation.
    async fn delete_account(&self, identity_id: &str) -> Result<(), IdentityError>;

    /// Issue a fresh bearer token for an identity.
    async fn issue_token(&self, identity_id: &str) -> Result<String, IdentityError>;

    /// Resolve a bearer token to its identity id, rejecting unknown or
    /// expired tokens.
    async fn verify_token(&self, token: &str) -> Result<String, IdentityError>;

    /// Revoke a bearer token. Revoking an unknown token is not an error.
    async fn revoke_token(&self, token: &str) -> Result<(), IdentityError>;
}
