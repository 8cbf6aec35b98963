//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (collect matching patterns, most specific first)
//!     → pattern.rs (segment-by-segment match, capture parameters)
//!     → matched service | 405 + Allow | not-found service
//!
//! Route Registration (at startup):
//!     Router::handle(method, pattern, service)
//!     → parse pattern
//!     → reject duplicates and conflicting shapes
//!     → freeze as the service handed to the server
//! ```

pub mod pattern;
pub mod router;

pub use router::{Params, Router};

use axum::http::Method;
use thiserror::Error;

/// Route table configuration mistakes, reported at startup
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route {method} {pattern} registered twice")]
    Duplicate { method: Method, pattern: String },

    #[error("route pattern {pattern:?} conflicts with {existing:?}")]
    Conflict { pattern: String, existing: String },
}
