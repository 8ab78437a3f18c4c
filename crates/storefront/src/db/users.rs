//! User repository for database operations.
//!
//! Profiles live in `users`; password hashes live in `user_passwords` so that
//! profile reads never touch credential material.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use coza_core::profile::ProfileUpdate;
use coza_core::{Email, UserId, UserProfile, UserRole};

use super::{RepositoryError, conflict_on_unique};

const USER_COLUMNS: &str =
    "id, email, display_name, role, address, phone, bio, photo_url, created_at, updated_at";

/// Raw `users` row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i32,
    email: String,
    display_name: String,
    role: UserRole,
    address: Option<String>,
    phone: Option<String>,
    bio: Option<String>,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            display_name: row.display_name,
            role: row.role,
            address: row.address,
            phone: row.phone,
            bio: row.bio,
            photo_url: row.photo_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `users` row joined with its optional password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        row.map(UserProfile::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, email))]
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;

        row.map(UserProfile::try_from).transpose()
    }

    /// Create a customer with a password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, email, password_hash))]
    pub async fn create_with_password(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
    ) -> Result<UserProfile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (email, display_name, role) VALUES ($1, $2, 'customer') \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(display_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        sqlx::query("INSERT INTO user_passwords (user_id, password_hash) VALUES ($1, $2)")
            .bind(row.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        UserProfile::try_from(row)
    }

    /// Find the user for an identity provider email, creating a customer if
    /// none exists. An existing profile keeps its name; a missing photo is
    /// filled in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, email, display_name, photo_url))]
    pub async fn upsert_from_provider(
        &self,
        email: &Email,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> Result<UserProfile, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (email, display_name, photo_url, role) \
             VALUES ($1, $2, $3, 'customer') \
             ON CONFLICT (email) DO UPDATE \
               SET photo_url = COALESCE(users.photo_url, EXCLUDED.photo_url), \
                   display_name = CASE WHEN users.display_name = '' \
                                       THEN EXCLUDED.display_name \
                                       ELSE users.display_name END, \
                   updated_at = now() \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(display_name)
        .bind(photo_url)
        .fetch_one(self.pool)
        .await?;

        UserProfile::try_from(row)
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, email))]
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(UserProfile, String)>, RepositoryError> {
        let row: Option<UserWithPasswordRow> = sqlx::query_as(
            "SELECT u.id, u.email, u.display_name, u.role, u.address, u.phone, u.bio, \
                    u.photo_url, u.created_at, u.updated_at, p.password_hash \
             FROM users u \
             LEFT JOIN user_passwords p ON u.id = p.user_id \
             WHERE u.email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Some(password_hash) = row.password_hash else {
            return Ok(None);
        };

        Ok(Some((UserProfile::try_from(row.user)?, password_hash)))
    }

    /// Get the password hash for a user id, if one is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM user_passwords WHERE user_id = $1")
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        Ok(hash)
    }

    /// Replace (or set) a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, password_hash), fields(user_id = %id))]
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_passwords (user_id, password_hash) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE \
               SET password_hash = EXCLUDED.password_hash, updated_at = now()",
        )
        .bind(id.as_i32())
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Apply profile changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self, update), fields(user_id = %id))]
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users \
             SET display_name = $2, address = $3, phone = $4, bio = $5, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(&update.display_name)
        .bind(update.address.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.bio.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(UserProfile::try_from)
    }

    /// Change a user's email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another user has the email.
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self, email), fields(user_id = %id))]
    pub async fn update_email(
        &self,
        id: UserId,
        email: &Email,
    ) -> Result<UserProfile, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET email = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(UserProfile::try_from)
    }
}
