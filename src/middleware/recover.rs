//! Panic recovery.
//!
//! The outermost stage. Turns a panic anywhere below it, or a response
//! tagged as a [`Defect`], into a single generic 500 and asks the server to
//! close the connection. The process keeps serving other requests.

use crate::error::{client_error, Defect};
use crate::observability::{panic_message, take_panic_trace};
use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;

pub async fn recover_panic(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => {
            if let Some(defect) = response.extensions().get::<Defect>() {
                tracing::error!(%method, %uri, defect = %defect.message, "{}", defect.backtrace);
                return internal_error();
            }
            response
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(%method, %uri, panic = %message, "{}", take_panic_trace());
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    let mut response = client_error(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
