//! Route table and dispatch.
//!
//! # Responsibilities
//! - Store (method, pattern) → service entries
//! - Pick the most specific pattern matching the request path
//! - Answer 405 with an `Allow` header when the path is known but the method isn't
//! - Hand everything else to the not-found service
//!
//! # Design Decisions
//! - Built once at startup; registration mistakes are `RouteError`s
//! - O(n) scan over patterns (fine for the handful of routes we have)
//! - Patterns with the same shape share one entry, so `Allow` is exact

use super::pattern::Pattern;
use super::RouteError;
use crate::error::{client_error, not_found};
use axum::extract::{FromRequestParts, Request};
use axum::http::{header, request::Parts, HeaderValue, Method, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use std::convert::Infallible;
use std::task::{Context, Poll};
use tower::util::BoxCloneSyncService;
use tower::{service_fn, Service, ServiceExt};

type BoxedHandler = BoxCloneSyncService<Request, Response, Infallible>;

/// Named path parameters captured by the matched pattern
///
/// Inserted into the request extensions before the handler runs, and
/// available to handlers as an extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl<S> FromRequestParts<S> for Params
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Params>().cloned().unwrap_or_default())
    }
}

#[derive(Clone)]
struct Endpoint {
    pattern: Pattern,
    methods: Vec<(Method, BoxedHandler)>,
}

enum Lookup {
    Found(BoxedHandler, Params),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// The application's router
///
/// ```ignore
/// let router = Router::new()
///     .handle(Method::GET, "/", home)?
///     .handle(Method::GET, "/snippet/view/:id", view)?
///     .not_found(custom_404);
/// ```
#[derive(Clone)]
pub struct Router {
    endpoints: Vec<Endpoint>,
    not_found: BoxedHandler,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            not_found: BoxCloneSyncService::new(service_fn(|_req: Request| async {
                Ok::<_, Infallible>(not_found())
            })),
        }
    }

    /// Register `service` for `method` requests matching `pattern`
    ///
    /// # Errors
    /// - the pattern is malformed
    /// - the same (method, pattern) pair was already registered
    /// - another pattern matches exactly the same paths under different
    ///   parameter names
    pub fn handle<S>(mut self, method: Method, pattern: &str, service: S) -> Result<Self, RouteError>
    where
        S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
    {
        let pattern = Pattern::parse(pattern)?;
        let shape = pattern.shape();
        let handler = BoxCloneSyncService::new(service);

        match self
            .endpoints
            .iter()
            .position(|e| e.pattern.shape() == shape)
        {
            Some(index) => {
                let endpoint = &mut self.endpoints[index];
                if endpoint.pattern.as_str() != pattern.as_str() {
                    return Err(RouteError::Conflict {
                        pattern: pattern.as_str().to_string(),
                        existing: endpoint.pattern.as_str().to_string(),
                    });
                }
                if endpoint.methods.iter().any(|(m, _)| *m == method) {
                    return Err(RouteError::Duplicate {
                        method,
                        pattern: pattern.as_str().to_string(),
                    });
                }
                endpoint.methods.push((method, handler));
            }
            None => self.endpoints.push(Endpoint {
                pattern,
                methods: vec![(method, handler)],
            }),
        }

        Ok(self)
    }

    /// Replace the default plain-text 404
    pub fn not_found<S>(mut self, service: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
    {
        self.not_found = BoxCloneSyncService::new(service);
        self
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let mut matched: Vec<(&Endpoint, Vec<(String, String)>)> = self
            .endpoints
            .iter()
            .filter_map(|e| e.pattern.matches(path).map(|params| (e, params)))
            .collect();

        if matched.is_empty() {
            return Lookup::NotFound;
        }

        // Stable sort: equally specific patterns keep registration order
        matched.sort_by_key(|(e, _)| e.pattern.rank());

        for (endpoint, params) in &matched {
            if let Some((_, handler)) = endpoint.methods.iter().find(|(m, _)| m == method) {
                return Lookup::Found(handler.clone(), Params(params.clone()));
            }
        }

        let mut allowed: Vec<Method> = Vec::new();
        for (endpoint, _) in &matched {
            for (m, _) in &endpoint.methods {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
        }
        Lookup::MethodNotAllowed(allowed)
    }
}

fn method_not_allowed(allowed: &[Method]) -> Response {
    let mut response = client_error(StatusCode::METHOD_NOT_ALLOWED);
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

impl Service<Request> for Router {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let handler = match self.lookup(req.method(), req.uri().path()) {
            Lookup::Found(handler, params) => {
                req.extensions_mut().insert(params);
                handler
            }
            Lookup::MethodNotAllowed(allowed) => {
                let response = method_not_allowed(&allowed);
                return Box::pin(async move { Ok(response) });
            }
            Lookup::NotFound => self.not_found.clone(),
        };
        Box::pin(handler.oneshot(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::handler::Handler;
    use axum::response::IntoResponse;

    fn text(body: &'static str) -> BoxedHandler {
        BoxCloneSyncService::new(service_fn(move |_req: Request| async move {
            Ok::<_, Infallible>(body.into_response())
        }))
    }

    fn request(method: Method, uri: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatches_by_method_and_path() {
        let router = Router::new()
            .handle(Method::GET, "/", text("home"))
            .unwrap()
            .handle(Method::POST, "/snippet/create", text("created"))
            .unwrap();

        let response = router.clone().oneshot(request(Method::GET, "/")).await.unwrap();
        assert_eq!(body_string(response).await, "home");

        let response = router
            .oneshot(request(Method::POST, "/snippet/create"))
            .await
            .unwrap();
        assert_eq!(body_string(response).await, "created");
    }

    #[tokio::test]
    async fn test_wrong_method_is_405_with_exact_allow() {
        let router = Router::new()
            .handle(Method::GET, "/snippet/create", text("form"))
            .unwrap()
            .handle(Method::POST, "/snippet/create", text("created"))
            .unwrap()
            .handle(Method::POST, "/user/logout", text("bye"))
            .unwrap();

        let response = router
            .clone()
            .oneshot(request(Method::DELETE, "/snippet/create"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");

        let response = router
            .oneshot(request(Method::GET, "/user/logout"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_unknown_path_uses_default_not_found() {
        let router = Router::new().handle(Method::GET, "/", text("home")).unwrap();
        let response = router.oneshot(request(Method::GET, "/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "Not Found\n");
    }

    #[tokio::test]
    async fn test_unknown_path_uses_configured_not_found() {
        let router = Router::new()
            .handle(Method::GET, "/", text("home"))
            .unwrap()
            .not_found(service_fn(|_req: Request| async {
                Ok::<_, Infallible>((StatusCode::NOT_FOUND, "nothing here").into_response())
            }));

        let response = router.oneshot(request(Method::GET, "/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "nothing here");
    }

    #[tokio::test]
    async fn test_literal_beats_param_beats_wildcard() {
        let router = Router::new()
            .handle(Method::GET, "/files/*path", text("wildcard"))
            .unwrap()
            .handle(Method::GET, "/files/:name", text("param"))
            .unwrap()
            .handle(Method::GET, "/files/special", text("literal"))
            .unwrap();

        let cases = [
            ("/files/special", "literal"),
            ("/files/other", "param"),
            ("/files/a/b", "wildcard"),
        ];
        for (path, expected) in cases {
            let response = router.clone().oneshot(request(Method::GET, path)).await.unwrap();
            assert_eq!(body_string(response).await, expected, "path {path}");
        }
    }

    #[tokio::test]
    async fn test_params_reach_the_handler() {
        async fn show(params: Params) -> String {
            format!("id={}", params.get("id").unwrap_or("none"))
        }

        let router = Router::new()
            .handle(Method::GET, "/snippet/view/:id", show.with_state(()))
            .unwrap();
        let response = router
            .oneshot(request(Method::GET, "/snippet/view/17"))
            .await
            .unwrap();
        assert_eq!(body_string(response).await, "id=17");
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let result = Router::new()
            .handle(Method::GET, "/", text("a"))
            .unwrap()
            .handle(Method::GET, "/", text("b"));
        assert!(matches!(result, Err(RouteError::Duplicate { .. })));
    }

    #[test]
    fn test_conflicting_parameter_names_are_an_error() {
        let result = Router::new()
            .handle(Method::GET, "/snippet/:id", text("a"))
            .unwrap()
            .handle(Method::POST, "/snippet/:slug", text("b"));
        assert!(matches!(result, Err(RouteError::Conflict { .. })));
    }
}
