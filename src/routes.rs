//! # Route Table
//!
//! Wires every (method, path) pair to its handler and wraps each handler in
//! the middleware chain it needs:
//!
//! ```text
//! standard   recover_panic → secure_headers → log_request → router
//! dynamic    + session load/save → authenticate → handler
//! protected  + session load/save → authenticate → require_authentication → handler
//! ```
//!
//! Static files only get the standard chain, so fetching a stylesheet never
//! touches the session store.

use crate::handlers::{snippets, static_files, users};
use crate::middleware::{
    auth::{authenticate, require_authentication},
    headers::secure_headers,
    logging::log_request,
    recover::recover_panic,
};
use crate::routing::{RouteError, Router};
use crate::session::load_session;
use crate::state::AppState;
use axum::{
    extract::Request,
    handler::Handler,
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    response::Response,
};
use std::convert::Infallible;
use tower::{util::BoxCloneSyncService, ServiceBuilder};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

/// The complete application as a single service
pub type App = BoxCloneSyncService<Request, Response, Infallible>;

type Endpoint = BoxCloneSyncService<Request, Response, Infallible>;

const SESSION_COOKIE: &str = "session";

/// Build the application on top of `state`, keeping sessions in `store`
///
/// `store` must already be migrated.
pub fn routes(state: AppState, store: SqliteStore) -> Result<App, RouteError> {
    let chains = Chains::new(state.clone(), store);

    let router = Router::new()
        .handle(Method::GET, "/static/*filepath", static_files::serve_static.with_state(state))?
        .handle(Method::GET, "/", chains.dynamic(snippets::home))?
        .handle(Method::GET, "/snippet/view/:id", chains.dynamic(snippets::snippet_view))?
        .handle(Method::GET, "/snippet/create", chains.protected(snippets::snippet_create))?
        .handle(Method::POST, "/snippet/create", chains.protected(snippets::snippet_create_post))?
        .handle(Method::GET, "/user/signup", chains.dynamic(users::user_signup))?
        .handle(Method::POST, "/user/signup", chains.dynamic(users::user_signup_post))?
        .handle(Method::GET, "/user/login", chains.dynamic(users::user_login))?
        .handle(Method::POST, "/user/login", chains.dynamic(users::user_login_post))?
        .handle(Method::POST, "/user/logout", chains.protected(users::user_logout_post))?;

    Ok(standard(router))
}

/// Wrap a router in the stages every request goes through
pub fn standard(router: Router) -> App {
    BoxCloneSyncService::new(
        ServiceBuilder::new()
            .layer(from_fn(recover_panic))
            .layer(from_fn(secure_headers))
            .layer(from_fn(log_request))
            .service(router),
    )
}

struct Chains {
    state: AppState,
    sessions: SessionManagerLayer<SqliteStore>,
}

impl Chains {
    fn new(state: AppState, store: SqliteStore) -> Self {
        // Inactivity expiry only applies until the first write; from then on
        // the session's own fixed deadline takes over.
        let sessions = SessionManagerLayer::new(store)
            .with_name(SESSION_COOKIE)
            .with_http_only(true)
            .with_same_site(SameSite::Lax)
            .with_secure(state.secure_cookies)
            .with_expiry(Expiry::OnInactivity(state.session_lifetime));

        Self { state, sessions }
    }

    fn dynamic<H, T>(&self, handler: H) -> Endpoint
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        BoxCloneSyncService::new(
            ServiceBuilder::new()
                .layer(self.sessions.clone())
                .layer(from_fn_with_state(self.state.clone(), load_session))
                .layer(from_fn_with_state(self.state.clone(), authenticate))
                .service(handler.with_state(self.state.clone())),
        )
    }

    fn protected<H, T>(&self, handler: H) -> Endpoint
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        BoxCloneSyncService::new(
            ServiceBuilder::new()
                .layer(self.sessions.clone())
                .layer(from_fn_with_state(self.state.clone(), load_session))
                .layer(from_fn_with_state(self.state.clone(), authenticate))
                .layer(from_fn(require_authentication))
                .service(handler.with_state(self.state.clone())),
        )
    }
}
