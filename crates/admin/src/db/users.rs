//! User repository for the admin panel and CLI.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use coza_core::{Email, UserId, UserProfile, UserRole};

use super::{RepositoryError, conflict_on_unique};

const USER_COLUMNS: &str =
    "id, email, display_name, role, address, phone, bio, photo_url, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
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

#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Fields an admin may change on another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub display_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(UserProfile::try_from).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        row.map(UserProfile::try_from).transpose()
    }

    /// A user and their password hash, if they have one.
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

        match row {
            Some(UserWithPasswordRow {
                user,
                password_hash: Some(hash),
            }) => Ok(Some((UserProfile::try_from(user)?, hash))),
            _ => Ok(None),
        }
    }

    /// Total number of users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?)
    }

    /// Number of users with the admin role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_admins(&self) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Apply admin edits to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self, update), fields(user_id = %id, role = %update.role))]
    pub async fn update(
        &self,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<UserProfile, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users \
             SET display_name = $2, phone = $3, address = $4, role = $5, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(&update.display_name)
        .bind(update.phone.as_deref())
        .bind(update.address.as_deref())
        .bind(update.role)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(UserProfile::try_from)
    }

    /// Delete a user. Their password hash goes with them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Change the role of the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nobody has the email.
    #[instrument(skip(self, email), fields(role = %role))]
    pub async fn set_role_by_email(
        &self,
        email: &Email,
        role: UserRole,
    ) -> Result<UserProfile, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE email = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(role)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(UserProfile::try_from)
    }

    /// Create a user with a password and the given role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    #[instrument(skip(self, email, password_hash), fields(role = %role))]
    pub async fn create_with_password(
        &self,
        email: &Email,
        display_name: &str,
        role: UserRole,
        password_hash: &str,
    ) -> Result<UserProfile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (email, display_name, role) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(display_name)
        .bind(role)
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
}
