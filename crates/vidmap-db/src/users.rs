//! Database operations for the `users` table.
//!
//! Emails are compared case-insensitively (`lower(email)` carries the
//! unique index) and stored as given.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub display_name: String,
    pub email: String,
    /// Argon2 PHC string; `None` for accounts that only sign in via Google.
    pub password_hash: Option<String>,
    pub google_sub: Option<String>,
    /// Base64 image payload or data URL.
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    #[must_use]
    pub fn is_oauth_only(&self) -> bool {
        self.password_hash.is_none()
    }
}

/// Identity claims taken from a verified Google credential.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    pub display_name: String,
    pub picture: Option<String>,
}

const USER_COLUMNS: &str =
    "id, display_name, email, password_hash, google_sub, photo, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a password account.
///
/// # Errors
///
/// Returns [`DbError::DuplicateEmail`] if the email is taken, or
/// [`DbError::Sqlx`] on any other failure.
pub async fn create_user(
    pool: &PgPool,
    display_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (display_name, email, password_hash) \
         VALUES ($1, $2, $3) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(display_name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(DbError::from_insert)
}

/// Returns a user by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns a user by email (case-insensitive), or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Replaces a user's password hash.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no user has `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn update_password_hash(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(password_hash)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Sets or clears (`None`) a user's profile photo and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no user has `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn update_photo(
    pool: &PgPool,
    id: i64,
    photo: Option<&str>,
) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET photo = $1, updated_at = NOW() WHERE id = $2 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(photo)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Finds or creates the account for a Google identity.
///
/// Lookup order: `google_sub`, then email (linking the Google identity to
/// an existing account that has none yet), then insert. Runs in one
/// transaction.
///
/// # Errors
///
/// Returns [`DbError::GoogleAccountConflict`] if the email belongs to an
/// account linked to a different Google identity, [`DbError::Sqlx`] if any
/// query fails, or [`DbError::DuplicateEmail`] if a concurrent insert won
/// the race.
pub async fn upsert_google_user(pool: &PgPool, profile: &GoogleProfile) -> Result<UserRow, DbError> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE google_sub = $1"
    ))
    .bind(&profile.sub)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(user) = existing {
        tx.commit().await?;
        return Ok(user);
    }

    let linked = sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users \
         SET google_sub = $1, photo = COALESCE(photo, $2), updated_at = NOW() \
         WHERE lower(email) = lower($3) AND google_sub IS NULL \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&profile.sub)
    .bind(profile.picture.as_deref())
    .bind(&profile.email)
    .fetch_optional(&mut *tx)
    .await?;

    if linked.is_none() {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1))",
        )
        .bind(&profile.email)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(DbError::GoogleAccountConflict);
        }
    }

    let user = match linked {
        Some(user) => user,
        None => sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (display_name, email, google_sub, photo) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&profile.display_name)
        .bind(&profile.email)
        .bind(&profile.sub)
        .bind(profile.picture.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from_insert)?,
    };

    tx.commit().await?;
    Ok(user)
}
