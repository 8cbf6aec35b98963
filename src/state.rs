//! # Application State
//!
//! The shared state every handler and middleware can reach.
//!
//! ## The State Pattern
//! Resources are created once at startup, stored in `AppState`, and cloned
//! into each request. Nothing here is a global: tests build their own
//! `AppState` over an in-memory database and hand it to the router.

use crate::config::Config;
use crate::db;
use crate::error::AppResult;
use crate::session::SessionState;
use crate::templates::{TemplateCache, TemplateData};
use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state
///
/// ## Why Clone?
/// Each request gets a clone of the state. This is cheap:
/// - `SqlitePool` is a handle to a shared pool of connections
/// - `Arc<TemplateCache>` only clones a pointer; the cache itself is
///   immutable after startup, so readers never need a lock
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (snippets, users and session records)
    pub db: SqlitePool,

    /// Compiled pages, keyed by file name
    pub templates: Arc<TemplateCache>,

    pub static_dir: PathBuf,

    /// Fixed lifetime of a session from its first write
    pub session_lifetime: time::Duration,

    pub secure_cookies: bool,
}

impl AppState {
    /// Initialize application state
    ///
    /// This function:
    /// 1. Connects to the SQLite database and runs migrations
    /// 2. Compiles every page template
    ///
    /// # Errors
    /// Returns an error if the database can't be opened or migrated, or if
    /// any template fails to compile. Both are fatal at startup.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::connect(&config.database_url, config.database_max_connections)
            .await
            .context("opening database")?;

        let templates = TemplateCache::new(&config.template_dir).context("building template cache")?;

        Ok(AppState {
            db,
            templates: Arc::new(templates),
            static_dir: config.static_dir.clone(),
            session_lifetime: config.session_lifetime(),
            secure_cookies: config.session_cookie_secure,
        })
    }

    /// Page data every template expects
    ///
    /// Pops the flash message, so it is shown on exactly one page.
    pub async fn new_template_data(&self, session: &SessionState) -> AppResult<TemplateData> {
        let flash = session.pop_string(crate::session::FLASH).await?;
        let is_authenticated = session.is_authenticated().await?;
        Ok(TemplateData::new(flash, is_authenticated))
    }
}
