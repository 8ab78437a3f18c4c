//! Admin authentication service.
//!
//! Admins sign in with the same email and password they use on the
//! storefront; only the role decides whether they get in.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use coza_core::{Email, UserProfile};

use crate::db::UserRepository;

/// Admin authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Check an email and password and require the admin role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email, a wrong
    /// password, or an account with no password.
    /// Returns `AuthError::NotAdmin` if the credentials are right but the
    /// account is a customer.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;

        let (user, hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;
        ensure_admin(user)
    }
}

fn ensure_admin(user: UserProfile) -> Result<UserProfile, AuthError> {
    if user.is_admin() {
        Ok(user)
    } else {
        tracing::warn!(user_id = %user.id, "Non-admin attempted admin sign-in");
        Err(AuthError::NotAdmin)
    }
}

/// Hash a password using Argon2.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use coza_core::{UserId, UserRole};

    fn user(role: UserRole) -> UserProfile {
        UserProfile {
            id: UserId::new(9),
            email: Email::parse("ops@coza.test").unwrap(),
            display_name: "Ops".to_string(),
            role,
            address: None,
            phone: None,
            bio: None,
            photo_url: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cure-Admin").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cure-Admin", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_only_admins_pass() {
        assert!(ensure_admin(user(UserRole::Admin)).is_ok());
        assert!(matches!(
            ensure_admin(user(UserRole::Customer)),
            Err(AuthError::NotAdmin)
        ));
    }
}
