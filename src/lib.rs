//! Snippetbox: a small server-rendered web application for sharing text
//! snippets, with user accounts and cookie sessions.

pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod routing;
pub mod session;
pub mod state;
pub mod templates;
pub mod validator;

pub use config::Config;
pub use routes::{routes, App};
pub use state::AppState;
