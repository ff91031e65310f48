use thiserror::Error;

use crate::identity::IdentityError;

/// Error taxonomy shared by every domain service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    NotAuthenticated,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Service temporarily unavailable")]
    Unavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken => ServiceError::Duplicate(err.to_string()),
            IdentityError::WeakPassword => ServiceError::Validation(err.to_string()),
            IdentityError::InvalidCredentials => ServiceError::InvalidCredentials,
            IdentityError::InvalidToken => ServiceError::NotAuthenticated,
            IdentityError::Unavailable(_) => ServiceError::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_errors_map_to_service_errors() {
        assert!(matches!(
            ServiceError::from(IdentityError::EmailTaken),
            ServiceError::Duplicate(_)
        ));
        assert!(matches!(
            ServiceError::from(IdentityError::WeakPassword),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            ServiceError::from(IdentityError::InvalidCredentials),
            ServiceError::InvalidCredentials
        ));
        assert!(matches!(
            ServiceError::from(IdentityError::InvalidToken),
            ServiceError::NotAuthenticated
        ));
    }

    #[test]
    fn test_invalid_credentials_message_does_not_name_a_field() {
        let message = ServiceError::InvalidCredentials.to_string();
        assert_eq!(message, "Invalid email or password");
    }
}
