//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Promote someone who already has a storefront account (recommended)
//! coza-cli admin promote -e ops@example.com
//!
//! # Create a new admin directly, with a temporary password
//! coza-cli admin create -e ops@example.com -n "Ops Team"
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

use coza_admin::db::{self, RepositoryError, UserRepository};
use coza_admin::services::{AuthError, hash_password};
use coza_core::{Email, EmailError, UserRole};

/// Length of generated temporary passwords.
const TEMP_PASSWORD_LENGTH: usize = 16;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: ADMIN_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Display name is blank.
    #[error("Name is required")]
    MissingName,

    /// No user has the email.
    #[error("No user found with email: {0}")]
    UserNotFound(String),

    /// User already exists.
    #[error("A user already exists with email: {0}")]
    UserExists(String),

    /// Password hashing failed.
    #[error("Could not hash password: {0}")]
    PasswordHash(#[from] AuthError),

    /// Other repository error.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Generate a random alphanumeric temporary password.
fn temporary_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Give an existing user the admin role.
///
/// # Errors
///
/// Returns an error if the email is invalid, nobody has it, or the database
/// is unreachable.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let user = UserRepository::new(&pool)
        .set_role_by_email(&email, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "User promoted to admin. ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}

/// Create a new admin user with a generated temporary password.
///
/// The password is logged once; it is not stored anywhere else.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or a
/// database operation fails.
pub async fn create_user(email: &str, name: &str) -> Result<i32, AdminError> {
    let email = Email::parse(email)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::MissingName);
    }

    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Creating admin user: {}", email);

    let password = temporary_password();
    let hash = hash_password(&password)?;

    let user = UserRepository::new(&pool)
        .create_with_password(&email, name, UserRole::Admin, &hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    tracing::info!("Temporary password: {}", password);
    tracing::warn!("Share it privately and change it from the storefront account page.");

    Ok(user.id.as_i32())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_password_shape() {
        let password = temporary_password();
        assert_eq!(password.len(), TEMP_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, temporary_password());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input_before_connecting() {
        assert!(matches!(
            create_user("not-an-email", "Ops").await,
            Err(AdminError::InvalidEmail(_))
        ));
        assert!(matches!(
            create_user("ops@coza.test", "   ").await,
            Err(AdminError::MissingName)
        ));
    }

    #[tokio::test]
    async fn test_promote_rejects_bad_email() {
        assert!(matches!(
            promote("nobody").await,
            Err(AdminError::InvalidEmail(_))
        ));
    }
}
