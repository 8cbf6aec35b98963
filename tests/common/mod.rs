//! Shared harness for the end-to-end tests.
//!
//! Builds the full application over an in-memory database and drives it
//! in-process. The client keeps the session cookie between requests the way
//! a browser would.

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, HeaderMap, StatusCode};
use snippetbox::{routes, App, AppState, Config};
use std::path::Path;
use tower::ServiceExt;
use tower_sessions_sqlx_store::SqliteStore;
use url::form_urlencoded;

pub struct TestApp {
    app: App,
    pub state: AppState,
    cookie: Option<String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn test_config() -> Config {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    Config {
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        template_dir: root.join("ui/html"),
        static_dir: root.join("ui/static"),
        ..Config::default()
    }
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let state = AppState::new(&test_config()).await.unwrap();
        let store = SqliteStore::new(state.db.clone());
        store.migrate().await.unwrap();

        let app = routes(state.clone(), store).unwrap();
        Self {
            app,
            state,
            cookie: None,
        }
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> TestResponse {
        self.post_form(
            "/user/signup",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/user/login", &[("email", email), ("password", password)])
            .await
    }

    /// Sign up a fresh account and log in with it
    pub async fn logged_in() -> Self {
        let mut app = Self::new().await;
        let response = app.signup("Alice", "alice@example.com", "pa55word!").await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        let response = app.login("alice@example.com", "pa55word!").await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        app
    }

    /// Send `method path` with an explicit cookie, leaving the jar alone
    ///
    /// Takes `&self`, so several of these can run at once.
    pub async fn send_with_cookie(&self, method: &str, path: &str, cookie: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.dispatch(request).await
    }

    async fn send(&mut self, mut request: Request) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.dispatch(request).await;

        for set_cookie in response.headers.get_all(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap().trim().to_string();
            if set_cookie.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = Some(pair);
            }
        }

        response
    }

    async fn dispatch(&self, request: Request) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}
