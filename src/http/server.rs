//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the digest service state and route table
//! - Wire up middleware (request ID, tracing, timeout)
//! - Hand every request to the routing engine
//! - Serve until shutdown, drain in-flight requests, settle pending commits

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{validate_config, ConfigError, ServiceConfig};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::routing::{RouteError, RouteTable, Router as DigestRouter};
use crate::service::{build_routes, AppState, DigestStore};
use crate::store::DrainPolicy;

/// Errors that prevent the server from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the digest service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    state: Arc<AppState>,
    routes: Arc<RouteTable>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// `shutdown` is triggered by the `/shutdown` route and ends [`run`](Self::run).
    pub fn new(config: ServiceConfig, shutdown: Shutdown) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let store = DigestStore::new(config.store.commit_delay());
        let state = Arc::new(AppState::new(store, shutdown, config.limits.max_body_size));
        Self::with_state(config, state)
    }

    /// Create a server around prebuilt state, e.g. with a custom transform.
    pub fn with_state(config: ServiceConfig, state: Arc<AppState>) -> Result<Self, ServerError> {
        let dispatcher = DigestRouter::new(build_routes(Arc::clone(&state))?);
        let routes = Arc::clone(dispatcher.table());
        let router = Self::build_router(&config, dispatcher);

        Ok(Self {
            router,
            config,
            state,
            routes,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, dispatcher: DigestRouter) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(dispatcher)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener until the
    /// shutdown coordinator fires.
    pub async fn run(self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            commit_delay_ms = self.config.store.commit_delay_ms,
            routes = self.routes.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown: stop accepting, let in-flight requests finish.
        axum::serve(listener, app)
            .with_graceful_shutdown(self.state.shutdown.triggered())
            .await?;
        tracing::info!("HTTP server stopped accepting connections");

        let policy = DrainPolicy::from_await(self.config.store.drain_pending_commits);
        self.state.store.close(policy).await;

        tracing::info!("HTTP server terminated successfully");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// The route table requests are dispatched against.
    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }
}

/// Every request goes through the digest router.
async fn dispatch_handler(State(dispatcher): State<DigestRouter>, request: Request<Body>) -> Response {
    dispatcher.serve(request).await
}
