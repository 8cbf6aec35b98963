//! # Error Handling
//!
//! This module defines the application error type and the helpers that turn
//! failures into HTTP responses.
//!
//! ## Who writes error responses?
//! Lower layers (database, sessions, templates, form decoding) never build
//! responses themselves. They return an error, the handler decides what to do
//! with it, and anything the handler does not handle ends up here in
//! [`AppError::into_response`]. The only other place that writes an error
//! response is the panic recovery middleware.
//!
//! ## Error classes
//! - **Client errors** (400, 404): no logging beyond the access log
//! - **Server errors** (500): logged with a backtrace, generic body to the user
//! - **Defects**: bugs in our own code (e.g. a broken form mapping). These
//!   produce a 500 tagged with [`Defect`]; the recovery middleware logs it and
//!   closes the connection, the same way it handles a panic.

use crate::db::ModelError;
use crate::forms::FormError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::backtrace::Backtrace;
use std::sync::Arc;
use thiserror::Error;

/// Application-wide error type
///
/// Handlers return `AppResult<T>`; the `?` operator converts collaborator
/// errors through the `#[from]` conversions below.
#[derive(Error, Debug)]
pub enum AppError {
    /// Snippet/user storage failures (and "no record", which maps to 404)
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The session store could not be read or written
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A template failed to render
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// A page name that was never loaded into the template cache
    #[error("The template {0} does not exist")]
    TemplateNotFound(String),

    /// Resource not found (404)
    #[error("Not found")]
    NotFound,

    /// The request could not be understood (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A programming error in this application, never caused by the client
    #[error("Defect: {0}")]
    Defect(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::InvalidTarget(_) => AppError::Defect(err.to_string()),
            FormError::Decode { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

/// Marker attached to responses produced from [`AppError::Defect`]
///
/// The recovery middleware looks for it and replaces the response with its
/// own, exactly as if the handler had panicked. The backtrace is captured
/// where the defect is turned into a response, inside the failing request.
#[derive(Debug, Clone)]
pub struct Defect {
    pub message: String,
    pub backtrace: Arc<Backtrace>,
}

impl Defect {
    pub fn capture(message: String) -> Self {
        Self {
            message,
            backtrace: Arc::new(Backtrace::force_capture()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound | AppError::Model(ModelError::NoRecord) => not_found(),
            AppError::BadRequest(reason) => {
                tracing::debug!(%reason, "rejecting malformed request");
                client_error(StatusCode::BAD_REQUEST)
            }
            AppError::Defect(message) => {
                let mut response = client_error(StatusCode::INTERNAL_SERVER_ERROR);
                response.extensions_mut().insert(Defect::capture(message));
                response
            }
            other => server_error(&other),
        }
    }
}

/// Log the error together with a backtrace, then send a generic 500
///
/// The body never includes the error text so internal details don't leak.
pub fn server_error(err: &dyn std::error::Error) -> Response {
    let trace = Backtrace::force_capture();
    tracing::error!(error = %err, "{trace}");
    client_error(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Plain-text response containing the status code's reason phrase
pub fn client_error(status: StatusCode) -> Response {
    let text = status.canonical_reason().unwrap_or("Unknown Status");
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{text}\n"),
    )
        .into_response()
}

pub fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_uses_reason_phrase() {
        let response = client_error(StatusCode::BAD_REQUEST);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_no_record_maps_to_404() {
        let response = AppError::Model(ModelError::NoRecord).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_defect_is_tagged() {
        let response = AppError::Defect("broken mapping".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let defect = response.extensions().get::<Defect>().unwrap();
        assert_eq!(defect.message, "broken mapping");
        assert!(!defect.backtrace.to_string().is_empty());
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = AppError::Internal("secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<Defect>().is_none());
    }

    #[test]
    fn test_form_errors_split_by_class() {
        let defect: AppError = FormError::InvalidTarget("duplicate field `title`".into()).into();
        assert!(matches!(defect, AppError::Defect(_)));

        let decode: AppError = FormError::Decode {
            field: "expires".into(),
            value: "soon".into(),
        }
        .into();
        assert!(matches!(decode, AppError::BadRequest(_)));
    }
}
