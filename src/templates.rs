//! # Template Rendering
//!
//! Pages are compiled once at startup into a [`TemplateCache`] and rendered
//! from there for the rest of the process lifetime.
//!
//! ## Directory layout
//! ```text
//! ui/html/
//! ├── base.html          layout every page extends
//! ├── partials/*.html    shared fragments (nav, ...)
//! └── pages/*.html       one file per page, keyed by file name
//! ```
//!
//! Each page gets its own `tera::Tera` holding exactly the base layout, the
//! partials and that page. A syntax error or a missing parent anywhere fails
//! [`TemplateCache::new`], so a broken template stops the server at startup
//! instead of surfacing on the first request.

use crate::db::models::Snippet;
use crate::error::{AppError, AppResult};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::Datelike;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read template directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template {path} has a non UTF-8 file name")]
    FileName { path: PathBuf },

    #[error("failed to compile page {page}: {source}")]
    Compile {
        page: String,
        #[source]
        source: tera::Error,
    },
}

/// Data handed to every page
///
/// Built fresh for each request by `AppState::new_template_data`, then the
/// handler fills in whatever its page needs.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    /// One-shot message left by the previous request
    pub flash: Option<String>,
    pub is_authenticated: bool,
    /// The submitted form (values and errors) for re-rendering
    pub form: Option<serde_json::Value>,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
}

impl TemplateData {
    pub fn new(flash: Option<String>, is_authenticated: bool) -> Self {
        Self {
            current_year: chrono::Utc::now().year(),
            flash,
            is_authenticated,
            ..Self::default()
        }
    }

    /// Attach a form for echoing back into the page
    pub fn with_form<F: Serialize>(mut self, form: &F) -> AppResult<Self> {
        let value = serde_json::to_value(form)
            .map_err(|e| AppError::Internal(format!("cannot serialize form: {e}")))?;
        self.form = Some(value);
        Ok(self)
    }
}

/// Immutable map from page name (e.g. `home.html`) to its compiled set
#[derive(Debug)]
pub struct TemplateCache {
    pages: HashMap<String, Tera>,
}

impl TemplateCache {
    /// Compile every page under `dir`
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        let base = dir.join("base.html");
        let partials = html_files(&dir.join("partials"))?;
        let pages = html_files(&dir.join("pages"))?;

        let mut cache = HashMap::with_capacity(pages.len());
        for page_path in pages {
            let name = file_name(&page_path)?;

            let mut files: Vec<(PathBuf, Option<String>)> = vec![(base.clone(), Some("base.html".into()))];
            for partial in &partials {
                let partial_name = format!("partials/{}", file_name(partial)?);
                files.push((partial.clone(), Some(partial_name)));
            }
            files.push((page_path.clone(), Some(name.clone())));

            let mut tera = Tera::default();
            tera.add_template_files(files)
                .map_err(|source| TemplateError::Compile {
                    page: name.clone(),
                    source,
                })?;

            tracing::debug!(page = %name, "compiled template set");
            cache.insert(name, tera);
        }

        Ok(Self { pages: cache })
    }

    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains_key(page)
    }

    /// Render `page` and build a response with `status`
    ///
    /// The page is rendered into memory first. If anything fails the caller
    /// gets an error and no part of the page is sent, so a template bug never
    /// turns into a 200 with half a page.
    pub fn render(&self, status: StatusCode, page: &str, data: &TemplateData) -> AppResult<Response> {
        let tera = self
            .pages
            .get(page)
            .ok_or_else(|| AppError::TemplateNotFound(page.to_string()))?;

        let context = Context::from_serialize(data)?;
        let buffer = tera.render(page, &context)?;

        Ok((status, Html(buffer)).into_response())
    }
}

fn html_files(dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let io = |source| TemplateError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io)? {
        let path = entry.map_err(io)?.path();
        if path.extension().is_some_and(|ext| ext == "html") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> Result<String, TemplateError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| TemplateError::FileName {
            path: path.to_path_buf(),
        })
}
