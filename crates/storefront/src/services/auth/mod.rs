//! Authentication service.
//!
//! Password registration and login, plus the account changes that need a
//! credential check (email and password).

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use coza_core::password::{validate_new_password, validate_password_change};
use coza_core::profile::ProfileForm;
use coza_core::{Email, UserId, UserProfile};

use crate::db::{RepositoryError, UserRepository};

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Password` if the passwords differ or the password is
    /// too short or too weak.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
        confirm: &str,
    ) -> Result<UserProfile, AuthError> {
        validate_new_password(password, confirm)?;
        let email = Email::parse(email)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&email, display_name.trim(), &password_hash)
            .await
            .map_err(conflict_to_exists)?;

        tracing::info!(user_id = %user.id, "registered new customer");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Load a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<UserProfile, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Validate and save the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Profile` if the form is invalid.
    #[instrument(skip(self, form), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        form: &ProfileForm,
    ) -> Result<UserProfile, AuthError> {
        let update = form.validate()?;
        self.users
            .update_profile(user_id, &update)
            .await
            .map_err(not_found_to_user)
    }

    /// Change the sign-in email.
    ///
    /// Accounts with a password must confirm it; accounts created through the
    /// identity provider have none to confirm.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongCurrentPassword` if the password check fails.
    /// Returns `AuthError::UserAlreadyExists` if another account has the email.
    #[instrument(skip(self, new_email, current_password), fields(user_id = %user_id))]
    pub async fn change_email(
        &self,
        user_id: UserId,
        new_email: &str,
        current_password: &str,
    ) -> Result<UserProfile, AuthError> {
        let email = Email::parse(new_email)?;
        self.confirm_current_password(user_id, current_password)
            .await?;

        self.users
            .update_email(user_id, &email)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => not_found_to_user(other),
            })
    }

    /// Change (or, for provider-only accounts, set) the password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Password` if the new password is rejected.
    /// Returns `AuthError::WrongCurrentPassword` if the password check fails.
    #[instrument(skip(self, current_password, new_password, confirm), fields(user_id = %user_id))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        validate_password_change(new_password, confirm)?;
        self.confirm_current_password(user_id, current_password)
            .await?;

        let password_hash = hash_password(new_password)?;
        self.users.set_password_hash(user_id, &password_hash).await?;

        tracing::info!("password changed");
        Ok(())
    }

    /// Whether the account has a password at all.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn has_password(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.users.get_password_hash_by_id(user_id).await?.is_some())
    }

    async fn confirm_current_password(
        &self,
        user_id: UserId,
        current_password: &str,
    ) -> Result<(), AuthError> {
        match self.users.get_password_hash_by_id(user_id).await? {
            Some(hash) => verify_password(current_password, &hash)
                .map_err(|_| AuthError::WrongCurrentPassword),
            None => Ok(()),
        }
    }
}

fn conflict_to_exists(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
        other => AuthError::Repository(other),
    }
}

fn not_found_to_user(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::NotFound => AuthError::UserNotFound,
        other => AuthError::Repository(other),
    }
}

/// Hash a password using Argon2.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
