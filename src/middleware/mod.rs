//! # Middleware Module
//!
//! Middleware intercepts HTTP requests and responses.
//! Used for cross-cutting concerns: panic recovery, security headers, access
//! logging, sessions and authentication.
//!
//! ## Order
//! Every request passes through the standard chain, outermost first:
//! 1. `recover::recover_panic`
//! 2. `headers::secure_headers`
//! 3. `logging::log_request`
//!
//! Page routes then add the dynamic chain (session load/save and
//! `auth::authenticate`), and protected pages add `auth::require_authentication`
//! last. See `routes.rs` for where the chains are assembled.
//!
//! The order matters: recovery has to wrap everything so a panic in any other
//! stage is caught, and the authentication gate needs the session loaded.

pub mod auth;
pub mod headers;
pub mod logging;
pub mod recover;
