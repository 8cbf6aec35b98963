//! # Configuration Management
//!
//! This module handles loading configuration from environment variables.
//! It uses the "12-factor app" methodology where configuration comes from the environment.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 4000)
//! - `DATABASE_URL`: SQLite database connection string
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
//! - `TEMPLATE_DIR`: Root of the HTML templates (default: ./ui/html)
//! - `STATIC_DIR`: Files served under /static/ (default: ./ui/static)
//! - `SESSION_LIFETIME_HOURS`: Fixed session lifetime (default: 12)
//! - `SESSION_COOKIE_SECURE`: Only send the session cookie over HTTPS (default: true)

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration
///
/// All fields are public for easy access from other modules.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// SQLite database connection URL
    /// Format: "sqlite:filename.db?mode=rwc"
    /// The "mode=rwc" means: read, write, create if not exists
    pub database_url: String,

    /// Upper bound on pooled database connections
    /// Must be 1 for `sqlite::memory:`, where every connection is a separate database
    pub database_max_connections: u32,

    /// Directory holding base.html, partials/ and pages/
    pub template_dir: PathBuf,

    pub static_dir: PathBuf,

    /// Sessions expire this many hours after they were created
    pub session_lifetime_hours: i64,

    /// Mark the session cookie `Secure`
    /// Leave this on unless the server is only reachable over plain HTTP
    /// during local development
    pub session_cookie_secure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            database_url: "sqlite:snippetbox.db?mode=rwc".to_string(),
            database_max_connections: 5,
            template_dir: PathBuf::from("./ui/html"),
            static_dir: PathBuf::from("./ui/static"),
            session_lifetime_hours: 12,
            session_cookie_secure: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads variables from .env file (if present) using dotenvy
    /// 2. Reads each configuration value from environment
    /// 3. Falls back to the defaults above if variables aren't set
    /// 4. Returns an error if a value is set but can't be parsed
    ///
    /// ## Example .env file
    /// ```text
    /// HOST=0.0.0.0
    /// PORT=4000
    /// DATABASE_URL=sqlite:snippetbox.db?mode=rwc
    /// SESSION_COOKIE_SECURE=false
    /// ```
    pub fn from_env() -> Result<Self> {
        // dotenvy doesn't error if the file is missing
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            template_dir: env::var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            session_lifetime_hours: parse_var(
                "SESSION_LIFETIME_HOURS",
                defaults.session_lifetime_hours,
            )?,
            session_cookie_secure: parse_var(
                "SESSION_COOKIE_SECURE",
                defaults.session_cookie_secure,
            )?,
        })
    }

    /// Get the socket address to bind the server to
    ///
    /// Example: "127.0.0.1:4000"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_lifetime(&self) -> time::Duration {
        time::Duration::hours(self.session_lifetime_hours)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
