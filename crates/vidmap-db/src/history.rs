//! Database operations for the `watch_history` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `watch_history` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub video_id: String,
    pub title: String,
    pub place_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub watched_at: DateTime<Utc>,
}

/// Input for [`insert_history_entry`].
#[derive(Debug, Clone, Copy)]
pub struct NewHistoryEntry<'a> {
    pub video_id: &'a str,
    pub title: &'a str,
    pub place_name: Option<&'a str>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Records that `user_id` opened a video.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including an unknown
/// `user_id` or out-of-range coordinates).
pub async fn insert_history_entry(
    pool: &PgPool,
    user_id: i64,
    entry: &NewHistoryEntry<'_>,
) -> Result<HistoryRow, DbError> {
    let row = sqlx::query_as::<_, HistoryRow>(
        "INSERT INTO watch_history (user_id, video_id, title, place_name, latitude, longitude) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, user_id, video_id, title, place_name, latitude, longitude, watched_at",
    )
    .bind(user_id)
    .bind(entry.video_id)
    .bind(entry.title)
    .bind(entry.place_name)
    .bind(entry.latitude)
    .bind(entry.longitude)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns a user's history, most recent first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_history(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<HistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, user_id, video_id, title, place_name, latitude, longitude, watched_at \
         FROM watch_history \
         WHERE user_id = $1 \
         ORDER BY watched_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Deletes every history row for a user. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn clear_history(pool: &PgPool, user_id: i64) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM watch_history WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
