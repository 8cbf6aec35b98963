//! # Database Module
//!
//! This module organizes all database-related code into submodules:
//! - `models`: Data structures (Snippet, User)
//! - `snippets`: Insert, fetch and list snippets
//! - `users`: Signup, credential checks, existence checks
//!
//! Every function takes the pool explicitly, so the same code runs against
//! the on-disk database in production and an in-memory one in tests.

pub mod models;
pub mod snippets;
pub mod users;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;

/// Errors from the snippet and user models
#[derive(Error, Debug)]
pub enum ModelError {
    /// No matching (unexpired) row
    #[error("no matching record found")]
    NoRecord,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// The blocking task doing the hashing panicked or was cancelled
    #[error("password hashing task failed: {0}")]
    HashTask(#[from] tokio::task::JoinError),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Open the pool and bring the schema up to date
///
/// Migrations are embedded from `./migrations` at compile time and tracked,
/// so running them on every start is safe.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Fresh in-memory database with the schema applied
///
/// One connection only: every connection to `sqlite::memory:` is its own
/// database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:", 1).await.unwrap()
}
