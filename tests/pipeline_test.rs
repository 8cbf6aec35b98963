//! Routing and middleware behaviour seen from outside.

use axum::extract::Request;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::handler::Handler;
use snippetbox::forms::{Bindable, FieldMapping, PostForm};
use snippetbox::routes::standard;
use snippetbox::routing::Router;
use std::convert::Infallible;
use tower::{service_fn, ServiceExt};

mod common;
use common::TestApp;

#[tokio::test]
async fn test_wrong_method_lists_allowed_ones() {
    let mut app = TestApp::new().await;

    let response = app.get("/user/logout").await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.header("allow"), Some("POST"));
    assert_eq!(response.body, "Method Not Allowed\n");

    let response = app.post_form("/", &[]).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.header("allow"), Some("GET"));
}

#[tokio::test]
async fn test_unknown_path() {
    let mut app = TestApp::new().await;
    let response = app.get("/no/such/page").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, "Not Found\n");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let mut app = TestApp::new().await;

    for path in ["/", "/no/such/page", "/static/css/main.css"] {
        let response = app.get(path).await;
        assert_eq!(
            response.header("content-security-policy"),
            Some("default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com"),
            "{path}"
        );
        assert_eq!(response.header("referrer-policy"), Some("origin-when-cross-origin"));
        assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(response.header("x-frame-options"), Some("deny"));
        assert_eq!(response.header("x-xss-protection"), Some("0"));
    }
}

#[tokio::test]
async fn test_static_files_skip_sessions() {
    let mut app = TestApp::new().await;
    let response = app.get("/static/css/main.css").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header("content-type").unwrap().starts_with("text/css"));
    assert!(response.headers.get(header::SET_COOKIE).is_none());

    let response = app.get("/static/css/missing.css").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

async fn explode(_request: Request) -> Result<Response, Infallible> {
    panic!("deliberate failure");
}

async fn fine(_request: Request) -> Result<Response, Infallible> {
    Ok("fine".into_response())
}

#[tokio::test]
async fn test_panic_is_contained() {
    let router = Router::new()
        .handle(Method::GET, "/panic", service_fn(explode))
        .unwrap()
        .handle(Method::GET, "/fine", service_fn(fine))
        .unwrap();
    let app = standard(router);

    let request = Request::builder().uri("/panic").body(axum::body::Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONNECTION], "close");

    let request = Request::builder().uri("/fine").body(axum::body::Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[derive(Debug, Default)]
struct MisconfiguredForm {
    title: String,
}

impl Bindable for MisconfiguredForm {
    const FIELDS: &'static [FieldMapping<Self>] = &[
        FieldMapping::text("title", |f: &mut Self, v| f.title = v),
        FieldMapping::text("title", |f: &mut Self, v| f.title = v),
    ];
}

async fn bind_misconfigured(PostForm(form): PostForm<MisconfiguredForm>) -> String {
    form.title
}

#[tokio::test]
async fn test_broken_form_mapping_closes_connection() {
    let router = Router::new()
        .handle(Method::POST, "/bind", bind_misconfigured.with_state(()))
        .unwrap();
    let app = standard(router);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/bind")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(axum::body::Body::from("title=hello"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONNECTION], "close");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Internal Server Error\n");
}
