//! Route table and request dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Resolve a (method, path) pair to a route and its captures
//! - Run the handler, time it, and account the time to the route's stats
//! - Produce 404 / 405 responses for unrouted requests
//!
//! # Design Decisions
//! - Immutable after construction; shared via `Arc` without locks
//! - First path match with the right method wins; later routes are not consulted
//! - Stats accounting is spawned so it never delays the response
//! - Patterns see the percent-decoded path, so `/hash/%31` is `/hash/1`

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use super::matcher::{PathMatch, PathPattern};
use super::stats::RouteStats;
use super::{join_methods, DispatchError, Handler, RequestContext, RouteError};
use crate::http::request::RequestIdExt;
use crate::observability::metrics;

/// A registered route.
pub struct Route {
    name: String,
    method: Method,
    pattern: PathPattern,
    handler: Arc<dyn Handler>,
    stats: Arc<RouteStats>,
}

impl Route {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn stats(&self) -> &RouteStats {
        &self.stats
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// A successful dispatch: the selected route and the captures of its pattern.
#[derive(Debug)]
pub struct Dispatch<'a> {
    pub route: &'a Route,
    pub params: PathMatch,
}

/// Ordered list of routes. Registration order is match precedence.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and append a route with zeroed stats.
    pub fn register<H: Handler>(
        &mut self,
        name: impl Into<String>,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&Route, RouteError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(RouteError::DuplicateName(name));
        }
        let pattern = PathPattern::new(pattern).map_err(|source| RouteError::InvalidPattern {
            name: name.clone(),
            pattern: pattern.to_string(),
            source,
        })?;

        let index = self.routes.len();
        self.routes.push(Route {
            name,
            method,
            pattern,
            handler: Arc::new(handler),
            stats: Arc::new(RouteStats::new()),
        });

        let route = &self.routes[index];
        tracing::debug!(
            route = route.name(),
            method = %route.method(),
            pattern = route.pattern().as_str(),
            "Route registered"
        );
        Ok(route)
    }

    /// Resolve a request to a route.
    ///
    /// Routes are scanned in order. A route whose pattern matches but whose method
    /// differs contributes its method to the allowed list and the scan continues.
    pub fn dispatch(&self, method: &Method, path: &str) -> Result<Dispatch<'_>, DispatchError> {
        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = route.pattern.captures(path) else {
                continue;
            };
            if route.method == *method {
                return Ok(Dispatch { route, params });
            }
            allowed.push(route.method.clone());
        }

        if allowed.is_empty() {
            Err(DispatchError::NotFound)
        } else {
            Err(DispatchError::MethodNotAllowed { allowed })
        }
    }

    /// Look up a route by name.
    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Dispatches requests against a frozen route table.
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RouteTable>,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Route `request`, run its handler and account the handler time.
    pub async fn serve(&self, request: Request<Body>) -> Response {
        let method = request.method().clone();
        let path = percent_decode_str(request.uri().path())
            .decode_utf8_lossy()
            .into_owned();
        let request_id = request.request_id().to_string();
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let Dispatch { route, params } = match self.table.dispatch(&method, &path) {
            Ok(dispatch) => dispatch,
            Err(err) => {
                tracing::debug!(request_id = %request_id, method = %method, path = %path, error = %err, "Request not routed");
                return unrouted_response(err);
            }
        };

        let ctx = RequestContext::new(request, params, Arc::clone(&self.table));
        let start = Instant::now();
        let response = route.handler.handle(ctx).await;
        let elapsed = start.elapsed();

        let status = response.status();
        tracing::info!(
            request_id = %request_id,
            route = route.name(),
            method = %method,
            path = %path,
            peer = %peer,
            status = %status,
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "Handled request"
        );
        metrics::record_dispatch(route.name(), status.as_u16(), elapsed);

        let stats = Arc::clone(&route.stats);
        tokio::spawn(async move {
            stats.record(elapsed);
        });

        response
    }
}

fn unrouted_response(err: DispatchError) -> Response {
    match err {
        DispatchError::NotFound => {
            metrics::record_unrouted(StatusCode::NOT_FOUND.as_u16());
            (StatusCode::NOT_FOUND, "404 page not found").into_response()
        }
        DispatchError::MethodNotAllowed { allowed } => {
            metrics::record_unrouted(StatusCode::METHOD_NOT_ALLOWED.as_u16());
            let mut response = (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
            if let Ok(value) = HeaderValue::from_str(&join_methods(&allowed)) {
                response.headers_mut().insert(header::ALLOW, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn table_with(routes: &[(&str, Method, &str, &'static str)]) -> RouteTable {
        let mut table = RouteTable::new();
        for (name, method, pattern, body) in routes {
            let body = *body;
            table
                .register(*name, method.clone(), pattern, move |_ctx: RequestContext| async move { body })
                .unwrap();
        }
        table
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn wait_for_requests(stats: &RouteStats, expected: u64) -> crate::routing::StatsSnapshot {
        for _ in 0..100 {
            let snapshot = stats.snapshot();
            if snapshot.total_requests >= expected {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        stats.snapshot()
    }

    #[test]
    fn test_precedence_follows_registration_order() {
        let numeric_first = table_with(&[
            ("numeric", Method::GET, "/a/([0-9]+)", ""),
            ("literal", Method::GET, "/a/b", ""),
        ]);
        assert_eq!(numeric_first.dispatch(&Method::GET, "/a/b").unwrap().route.name(), "literal");

        let catch_all_first = table_with(&[
            ("any", Method::GET, "/a/(.+)", ""),
            ("literal", Method::GET, "/a/b", ""),
        ]);
        let dispatch = catch_all_first.dispatch(&Method::GET, "/a/b").unwrap();
        assert_eq!(dispatch.route.name(), "any");
        assert_eq!(dispatch.params.param(0), "b");

        let literal_first = table_with(&[
            ("literal", Method::GET, "/a/b", ""),
            ("any", Method::GET, "/a/(.+)", ""),
        ]);
        assert_eq!(literal_first.dispatch(&Method::GET, "/a/b").unwrap().route.name(), "literal");
    }

    #[test]
    fn test_method_mismatch_keeps_scanning() {
        let table = table_with(&[
            ("post", Method::POST, "/hash", ""),
            ("get", Method::GET, "/hash", ""),
        ]);
        assert_eq!(table.dispatch(&Method::GET, "/hash").unwrap().route.name(), "get");
        assert_eq!(table.dispatch(&Method::POST, "/hash").unwrap().route.name(), "post");
    }

    #[test]
    fn test_method_not_allowed_lists_methods_in_scan_order() {
        let table = table_with(&[
            ("put", Method::PUT, "/item/([0-9]+)", ""),
            ("other", Method::GET, "/other", ""),
            ("post", Method::POST, "/item/(.*)", ""),
        ]);
        let err = table.dispatch(&Method::DELETE, "/item/5").unwrap_err();
        assert_eq!(
            err,
            DispatchError::MethodNotAllowed {
                allowed: vec![Method::PUT, Method::POST]
            }
        );
    }

    #[test]
    fn test_not_found() {
        let table = table_with(&[("post", Method::POST, "/hash", "")]);
        assert_eq!(table.dispatch(&Method::GET, "/nope").unwrap_err(), DispatchError::NotFound);
        assert_eq!(table.dispatch(&Method::POST, "/hash/").unwrap_err(), DispatchError::NotFound);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut table = table_with(&[("a", Method::GET, "/a", "")]);
        let err = table
            .register("a", Method::POST, "/b", |_ctx: RequestContext| async { "" })
            .unwrap_err();
        assert!(matches!(err, RouteError::DuplicateName(name) if name == "a"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut table = RouteTable::new();
        let err = table
            .register("bad", Method::GET, "/hash/([0-9]+", |_ctx: RequestContext| async { "" })
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { ref name, .. } if name == "bad"));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_serve_runs_handler_with_params() {
        let mut table = RouteTable::new();
        table
            .register("home", Method::GET, "/", |_ctx: RequestContext| async { "getHome" })
            .unwrap();
        table
            .register("upload", Method::POST, "/profilePicture", |_ctx: RequestContext| async {
                "postProfilePictureUpload"
            })
            .unwrap();
        table
            .register("profile", Method::GET, "/profile/([0-9]+)", |ctx: RequestContext| async move {
                format!("userid={}", ctx.param(0))
            })
            .unwrap();
        let router = Router::new(table);

        let response = router.serve(request(Method::GET, "/")).await;
        assert_eq!(body_string(response).await, "getHome");

        let response = router.serve(request(Method::POST, "/profilePicture")).await;
        assert_eq!(body_string(response).await, "postProfilePictureUpload");

        let response = router.serve(request(Method::GET, "/profile/12345")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "userid=12345");
    }

    #[tokio::test]
    async fn test_serve_allow_header_joins_methods_in_scan_order() {
        let router = Router::new(table_with(&[
            ("put", Method::PUT, "/item/([0-9]+)", ""),
            ("other", Method::GET, "/other", ""),
            ("post", Method::POST, "/item/(.*)", ""),
        ]));

        let response = router.serve(request(Method::DELETE, "/item/5")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "PUT, POST");
    }

    #[tokio::test]
    async fn test_serve_matches_decoded_path() {
        let mut table = table_with(&[("stats", Method::GET, "/stats", "stats")]);
        table
            .register("hash", Method::GET, "/hash/([0-9]+)", |ctx: RequestContext| async move {
                format!("key={}", ctx.param(0))
            })
            .unwrap();
        let router = Router::new(table);

        let response = router.serve(request(Method::GET, "/hash/%31")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "key=1");

        let response = router.serve(request(Method::GET, "/st%61ts")).await;
        assert_eq!(body_string(response).await, "stats");

        let response = router.serve(request(Method::GET, "/hash/%41")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_unrouted_responses() {
        let router = Router::new(table_with(&[("post", Method::POST, "/hash", "")]));

        let response = router.serve(request(Method::GET, "/hash")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");

        let response = router.serve(request(Method::GET, "/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::ALLOW).is_none());
    }

    #[tokio::test]
    async fn test_serve_records_stats_for_dispatched_route_only() {
        let mut table = RouteTable::new();
        table
            .register("slow", Method::GET, "/slow", |_ctx: RequestContext| async {
                tokio::time::sleep(Duration::from_millis(2)).await;
                "done"
            })
            .unwrap();
        table
            .register("fast", Method::GET, "/fast", |_ctx: RequestContext| async { "done" })
            .unwrap();
        let router = Router::new(table);

        for _ in 0..3 {
            router.serve(request(Method::GET, "/slow")).await;
        }
        router.serve(request(Method::POST, "/slow")).await;
        router.serve(request(Method::GET, "/nowhere")).await;

        let slow = router.table().get("slow").unwrap();
        let snapshot = wait_for_requests(slow.stats(), 3).await;
        assert_eq!(snapshot.total_requests, 3);
        assert!(snapshot.total_time_micros >= 6_000);
        assert!(snapshot.average_micros() >= 2_000);
        assert_eq!(snapshot.average_micros(), snapshot.total_time_micros / 3);

        let fast = router.table().get("fast").unwrap();
        assert_eq!(fast.stats().snapshot().total_requests, 0);
    }

    #[tokio::test]
    async fn test_handlers_see_route_table() {
        let mut table = RouteTable::new();
        table
            .register("count", Method::GET, "/count", |ctx: RequestContext| async move {
                ctx.routes().len().to_string()
            })
            .unwrap();
        table
            .register("other", Method::GET, "/other", |_ctx: RequestContext| async { "" })
            .unwrap();
        let router = Router::new(table);

        let response = router.serve(request(Method::GET, "/count")).await;
        assert_eq!(body_string(response).await, "2");
    }
}
