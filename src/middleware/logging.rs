use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

/// Log every request before it is handled
///
/// Logged up front so a request that hangs or panics still shows up.
pub async fn log_request(request: Request, next: Next) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::info!(
        %remote_addr,
        proto = ?request.version(),
        method = %request.method(),
        uri = %request.uri(),
        "request"
    );

    next.run(request).await
}
