//! # Authentication Middleware
//!
//! Two stages:
//! - [`authenticate`] runs on every page route. It drops an authenticated
//!   user id from the session when that user no longer exists.
//! - [`require_authentication`] guards protected routes. Anonymous requests
//!   are redirected to the login page and the handler never runs.
//!
//! Both expect `session::load_session` to have run first.

use crate::db::users;
use crate::error::AppResult;
use crate::session::{SessionState, AUTHENTICATED_USER_ID};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

pub async fn authenticate(
    State(state): State<AppState>,
    session: SessionState,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    if let Some(user_id) = session.get::<i64>(AUTHENTICATED_USER_ID).await? {
        if !users::exists(&state.db, user_id).await? {
            tracing::info!(user_id, "dropping session login for a deleted user");
            session.remove(AUTHENTICATED_USER_ID).await?;
        }
    }

    Ok(next.run(request).await)
}

/// Gate for pages that need a logged-in user
///
/// Responses from protected pages are never cached, so a shared browser
/// can't show them again after logout.
pub async fn require_authentication(
    session: SessionState,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let mut response = if session.is_authenticated().await? {
        next.run(request).await
    } else {
        Redirect::to("/user/login").into_response()
    };

    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
