use crate::db::models::{timestamp, Snippet};
use crate::db::{ModelError, ModelResult};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

/// How many snippets the home page lists
pub const LATEST_LIMIT: i64 = 10;

/// Store a new snippet that stays visible for `expires_days` days
///
/// Returns the id of the new row.
pub async fn insert(
    pool: &SqlitePool,
    title: &str,
    content: &str,
    expires_days: i64,
) -> ModelResult<i64> {
    let now = Utc::now();
    let expires = now + Duration::days(expires_days);

    let result = sqlx::query(
        "INSERT INTO snippets (title, content, created, expires)
         VALUES (?, ?, ?, ?)",
    )
    .bind(title)
    .bind(content)
    .bind(timestamp(now))
    .bind(timestamp(expires))
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Fetch one unexpired snippet
pub async fn get(pool: &SqlitePool, id: i64) -> ModelResult<Snippet> {
    sqlx::query_as::<_, Snippet>(
        "SELECT id, title, content, created, expires FROM snippets
         WHERE expires > ? AND id = ?",
    )
    .bind(timestamp(Utc::now()))
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => ModelError::NoRecord,
        _ => ModelError::Database(e),
    })
}

/// The most recently created unexpired snippets, newest first
pub async fn latest(pool: &SqlitePool) -> ModelResult<Vec<Snippet>> {
    let snippets = sqlx::query_as::<_, Snippet>(
        "SELECT id, title, content, created, expires FROM snippets
         WHERE expires > ?
         ORDER BY id DESC
         LIMIT ?",
    )
    .bind(timestamp(Utc::now()))
    .bind(LATEST_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(snippets)
}
