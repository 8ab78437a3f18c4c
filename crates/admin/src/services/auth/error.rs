//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin sign-in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] coza_core::EmailError),

    /// Wrong password, unknown email, or an account without a password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Valid credentials for an account that lacks the admin role.
    #[error("not an admin")]
    NotAdmin,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message shown on the login form.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) | Self::InvalidCredentials => "Invalid email or password.",
            Self::NotAdmin => "This account does not have admin access.",
            Self::Repository(_) | Self::PasswordHash => "Something went wrong. Please try again.",
        }
    }

    /// Whether this error is a server-side failure.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::PasswordHash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.user_message(),
            "Invalid email or password."
        );
        assert_eq!(
            AuthError::NotAdmin.user_message(),
            "This account does not have admin access."
        );
        assert!(AuthError::PasswordHash.is_internal());
        assert!(!AuthError::NotAdmin.is_internal());
    }
}
