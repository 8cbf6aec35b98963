//! # Session State
//!
//! A small typed API over the per-request `tower_sessions::Session`.
//!
//! ## Load and save
//! Loading and saving is split across two middleware stages:
//! 1. `SessionManagerLayer` (from tower-sessions) reads the session cookie,
//!    loads the record lazily from the store, and after the handler returns
//!    persists any changes and (re)issues the cookie.
//! 2. [`load_session`] wraps the session in a [`SessionState`] and attaches
//!    it to the request extensions where handlers and later middleware pick
//!    it up. It never touches the session itself.
//!
//! ## Lifetime
//! Sessions expire a fixed time after they were created, not after the last
//! request. The deadline is stored inside the session on its first write and
//! re-applied on every later write, so the store always expires the record at
//! the original deadline. Requests that only read leave the record and the
//! cookie alone.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::{de::DeserializeOwned, Serialize};
use time::{Duration, OffsetDateTime};
use tower_sessions::{session, Expiry, Session};

/// Key holding the authenticated user's id
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";

/// Key holding the one-shot flash message
pub const FLASH: &str = "flash";

/// Unix timestamp at which the session expires
const DEADLINE: &str = "_deadline";

/// Session access for one request
///
/// Cheap to clone: it shares the underlying session with every other clone
/// made during the same request.
#[derive(Clone, Debug)]
pub struct SessionState {
    session: Session,
    lifetime: Duration,
}

impl SessionState {
    pub fn new(session: Session, lifetime: Duration) -> Self {
        Self { session, lifetime }
    }

    /// Store a value, creating the session if this is its first write
    pub async fn put<T: Serialize>(&self, key: &str, value: T) -> Result<(), session::Error> {
        self.session.insert(key, value).await?;
        self.apply_deadline().await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, session::Error> {
        self.session.get(key).await
    }

    /// Read a string and remove it in the same step
    ///
    /// Used for flash messages, which should be shown exactly once. When the
    /// key is absent the session is left untouched.
    pub async fn pop_string(&self, key: &str) -> Result<Option<String>, session::Error> {
        if !self.exists(key).await? {
            return Ok(None);
        }
        let value = self.session.remove::<String>(key).await?;
        self.apply_deadline().await?;
        Ok(value)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, session::Error> {
        Ok(self.session.get_value(key).await?.is_some())
    }

    pub async fn remove(&self, key: &str) -> Result<(), session::Error> {
        if self.exists(key).await? {
            self.session.remove_value(key).await?;
            self.apply_deadline().await?;
        }
        Ok(())
    }

    /// Give the session a new token, keeping its data
    ///
    /// Called whenever the privilege level changes (login, logout) so a token
    /// captured before the change is useless afterwards.
    pub async fn renew_token(&self) -> Result<(), session::Error> {
        self.session.cycle_id().await?;
        self.apply_deadline().await
    }

    /// Whether a user is logged in on this session
    pub async fn is_authenticated(&self) -> Result<bool, session::Error> {
        self.exists(AUTHENTICATED_USER_ID).await
    }

    /// Pin the record's expiry to the session's fixed deadline
    ///
    /// Call only from writes. Setting the expiry marks the session modified,
    /// and a read-only request must not save the record.
    async fn apply_deadline(&self) -> Result<(), session::Error> {
        let stored = self.session.get::<i64>(DEADLINE).await?;
        let deadline = match stored.and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok()) {
            Some(deadline) => deadline,
            None => {
                let deadline = OffsetDateTime::now_utc() + self.lifetime;
                self.session.insert(DEADLINE, deadline.unix_timestamp()).await?;
                deadline
            }
        };
        self.session.set_expiry(Some(Expiry::AtDateTime(deadline)));
        Ok(())
    }
}

impl<S> FromRequestParts<S> for SessionState
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionState>().cloned().ok_or_else(|| {
            AppError::Defect("session state requested on a route without the session stage".into())
        })
    }
}

/// Middleware: attach [`SessionState`] to the request
///
/// Must run inside `SessionManagerLayer`.
pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Defect("session manager layer is missing".into()))?;

    request
        .extensions_mut()
        .insert(SessionState::new(session, state.session_lifetime));

    Ok(next.run(request).await)
}
