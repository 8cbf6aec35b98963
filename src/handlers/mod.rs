//! # HTTP Request Handlers
//!
//! Each handler serves one (method, path) pair from `routes.rs`.
//!
//! ## Submodules
//! - `snippets`: home page, snippet view and create
//! - `users`: signup, login and logout
//! - `static_files`: CSS, JS and images under `/static/`
//!
//! ## Handler Pattern
//! Handlers are async functions that:
//! 1. Extract what they need (state, session, path params, the posted form)
//! 2. Validate and call into `db`
//! 3. Render a page, or redirect with a flash message
//!
//! ```ignore
//! pub async fn my_page(
//!     State(state): State<AppState>,
//!     session: SessionState,
//! ) -> AppResult<Response> {
//!     let data = state.new_template_data(&session).await?;
//!     state.templates.render(StatusCode::OK, "my_page.html", &data)
//! }
//! ```
//!
//! Failures are returned as `AppError` and turned into responses in one
//! place (`error.rs`).

pub mod snippets;
pub mod static_files;
pub mod users;
