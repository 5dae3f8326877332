//! Digest service: the routes served by the HTTP layer.
//!
//! # Routes
//! ```text
//! POST /hash              → key of the scheduled digest
//! GET  /hash/([0-9]+)     → base64 digest, once committed
//! GET  /stats             → {"total": n, "average": µs} for POST /hash
//! GET  /shutdown          → graceful termination
//! ```
//!
//! Handlers receive the shared `AppState` through their registration closures and
//! the route table through the request context.

pub mod digest;
pub mod error;
pub mod form;
pub mod handlers;

use std::sync::Arc;

use axum::http::Method;

use crate::lifecycle::Shutdown;
use crate::routing::{RequestContext, RouteError, RouteTable};
use crate::store::DelayedStore;

pub use digest::{Digest, Sha512Transform, Transform, DIGEST_LEN};
pub use error::ServiceError;

/// Form field carrying the secret.
pub const PASSWORD_FIELD: &str = "password";

/// Route names, in registration order.
pub const POST_HASH_ROUTE: &str = "POST:hash";
pub const GET_HASH_ROUTE: &str = "GET:hash";
pub const GET_STATS_ROUTE: &str = "GET:stats";
pub const GET_SHUTDOWN_ROUTE: &str = "GET:shutdown";

/// Store of committed digests keyed by handle.
pub type DigestStore = DelayedStore<Digest>;

/// State shared by all handlers.
pub struct AppState {
    pub store: DigestStore,
    pub transform: Box<dyn Transform>,
    pub shutdown: Shutdown,
    pub max_body_size: usize,
}

impl AppState {
    pub fn new(store: DigestStore, shutdown: Shutdown, max_body_size: usize) -> Self {
        Self {
            store,
            transform: Box::new(Sha512Transform),
            shutdown,
            max_body_size,
        }
    }

    /// Replace the default SHA-512 transform.
    pub fn with_transform(mut self, transform: impl Transform) -> Self {
        self.transform = Box::new(transform);
        self
    }
}

/// Build the service's route table.
pub fn build_routes(state: Arc<AppState>) -> Result<RouteTable, RouteError> {
    let mut table = RouteTable::new();

    let s = Arc::clone(&state);
    table.register(POST_HASH_ROUTE, Method::POST, "/hash", move |ctx: RequestContext| {
        handlers::post_hash(Arc::clone(&s), ctx)
    })?;

    let s = Arc::clone(&state);
    table.register(GET_HASH_ROUTE, Method::GET, "/hash/([0-9]+)", move |ctx: RequestContext| {
        handlers::get_hash(Arc::clone(&s), ctx)
    })?;

    table.register(GET_STATS_ROUTE, Method::GET, "/stats", handlers::get_stats)?;

    let s = state;
    table.register(GET_SHUTDOWN_ROUTE, Method::GET, "/shutdown", move |ctx: RequestContext| {
        handlers::shutdown(Arc::clone(&s), ctx)
    })?;

    Ok(table)
}
