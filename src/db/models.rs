//! # Database Models
//!
//! Data structures that map to rows of the `snippets` and `users` tables.
//!
//! ## Why Strings for dates?
//! SQLite has no native timestamp type, so timestamps are stored as RFC 3339
//! text in UTC with second precision (`2024-01-15T10:30:00Z`). Values in that
//! exact format sort lexically in time order, which lets queries compare them
//! as plain strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// A snippet of text shared by a user
///
/// ## Derive Macros
/// - `Serialize`: the snippet is handed to templates as part of the page data
/// - `sqlx::FromRow`: maps a `SELECT` row onto the struct by column name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Snippet {
    /// Positive integer assigned by SQLite
    pub id: i64,

    pub title: String,

    pub content: String,

    /// When the snippet was created (RFC3339 timestamp)
    pub created: String,

    /// After this moment the snippet is no longer shown (RFC3339 timestamp)
    pub expires: String,
}

/// A registered user
///
/// Never serialized: the password hash must not end up in a page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// bcrypt hash of the password
    pub hashed_password: String,
    pub created: String,
}

/// Format a timestamp the way every table stores it
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
