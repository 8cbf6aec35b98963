//! Static assets under `/static/`.

use crate::routing::Params;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::Uri,
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// GET /static/*filepath
///
/// Serves `filepath` relative to the configured static directory. `ServeDir`
/// rejects paths that climb out of it.
pub async fn serve_static(State(state): State<AppState>, params: Params, mut request: Request) -> Response {
    let path = format!("/{}", params.get("filepath").unwrap_or_default());
    match path.parse::<Uri>() {
        Ok(uri) => *request.uri_mut() = uri,
        Err(_) => return crate::error::not_found(),
    }

    let served = ServeDir::new(&state.static_dir).oneshot(request).await;
    match served {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
