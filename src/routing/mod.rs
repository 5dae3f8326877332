//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     (name, method, pattern, handler)
//!     → matcher.rs (compile anchored pattern)
//!     → stats.rs (zeroed stats cell)
//!     → router.rs (append to ordered RouteTable)
//!
//! Incoming Request (method, path)
//!     → router.rs (ordered scan, first path match decides)
//!     → matcher.rs (extract captures into PathMatch)
//!     → Handler::handle(RequestContext)
//!     → stats.rs (elapsed time recorded off the response path)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime (only stats mutate)
//! - Registration order is precedence: more specific routes go first
//! - A path match with the wrong method falls through, so 405 and 404 stay distinct
//! - O(n) scan per request (route tables are small and static)

pub mod matcher;
pub mod router;
pub mod stats;

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

pub use matcher::{PathMatch, PathPattern};
pub use router::{Dispatch, Route, RouteTable, Router};
pub use stats::{RouteStats, StatsSnapshot};

/// Errors raised while building a route table. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route `{name}` has an invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("route `{0}` is registered more than once")]
    DuplicateName(String),
}

/// Outcome of a dispatch that found no handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("no route matches the request path")]
    NotFound,

    /// The path matched at least one route, but none with the request's method.
    /// Methods are listed in scan order.
    #[error("method not allowed (allowed: {})", join_methods(.allowed))]
    MethodNotAllowed { allowed: Vec<Method> },
}

pub(crate) fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything a handler gets to see about the request it was dispatched for.
pub struct RequestContext {
    request: Request<Body>,
    params: PathMatch,
    routes: Arc<RouteTable>,
}

impl RequestContext {
    pub fn new(request: Request<Body>, params: PathMatch, routes: Arc<RouteTable>) -> Self {
        Self {
            request,
            params,
            routes,
        }
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    /// Take ownership of the request, e.g. to consume its body.
    pub fn into_request(self) -> Request<Body> {
        self.request
    }

    pub fn params(&self) -> &PathMatch {
        &self.params
    }

    /// Returns the `index`-th path capture.
    ///
    /// # Panics
    /// If the matched pattern has fewer capture groups. That is a bug in the
    /// handler's registration, not a client error.
    pub fn param(&self, index: usize) -> &str {
        self.params.param(index)
    }

    /// The table this request was dispatched from.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

/// A request handler registered in the route table.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, ctx: RequestContext) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn handle(&self, ctx: RequestContext) -> BoxFuture<'static, Response> {
        let fut = self(ctx);
        Box::pin(async move { fut.await.into_response() })
    }
}
