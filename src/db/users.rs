use crate::db::models::{timestamp, User};
use crate::db::{ModelError, ModelResult};
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::task;

/// bcrypt work factor for new password hashes
pub const PASSWORD_COST: u32 = 12;

/// Create a user account
///
/// The password is hashed before it reaches the database. An email address
/// that is already registered gives [`ModelError::DuplicateEmail`].
pub async fn insert(pool: &SqlitePool, name: &str, email: &str, password: &str) -> ModelResult<i64> {
    // bcrypt is CPU-bound; keep it off the async workers
    let password = password.to_owned();
    let hashed = task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_COST)).await??;

    let result = sqlx::query(
        "INSERT INTO users (name, email, hashed_password, created)
         VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(&hashed)
    .bind(timestamp(Utc::now()))
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => ModelError::DuplicateEmail,
        _ => ModelError::Database(e),
    })?;

    Ok(result.last_insert_rowid())
}

/// Check an email/password pair, returning the user's id
///
/// Unknown email and wrong password give the same
/// [`ModelError::InvalidCredentials`] so callers can't tell them apart.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> ModelResult<i64> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, hashed_password, created FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or(ModelError::InvalidCredentials)?;

    let password = password.to_owned();
    let hashed = user.hashed_password;
    let matched = task::spawn_blocking(move || bcrypt::verify(password, &hashed)).await??;

    if matched {
        Ok(user.id)
    } else {
        Err(ModelError::InvalidCredentials)
    }
}

pub async fn exists(pool: &SqlitePool, id: i64) -> ModelResult<bool> {
    let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(found != 0)
}
