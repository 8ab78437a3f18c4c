//! Authentication error types.

use thiserror::Error;

use coza_core::password::PasswordError;
use coza_core::profile::ProfileError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] coza_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Email already registered to another account.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password rejected by the password rules.
    #[error("password validation failed: {0}")]
    Password(#[from] PasswordError),

    /// Profile form rejected.
    #[error("profile validation failed: {0}")]
    Profile(#[from] ProfileError),

    /// The current password given for a sensitive change was wrong.
    #[error("current password is incorrect")]
    WrongCurrentPassword,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message shown inline on the form that caused the error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::InvalidCredentials | Self::UserNotFound => {
                "Invalid email or password.".to_string()
            }
            Self::UserAlreadyExists => "This email is already in use.".to_string(),
            Self::Password(e) => e.to_string(),
            Self::Profile(e) => e.to_string(),
            Self::WrongCurrentPassword => "Your current password is incorrect.".to_string(),
            Self::Repository(_) | Self::PasswordHash => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Whether this error reflects a server fault rather than bad input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::PasswordHash)
    }
}
