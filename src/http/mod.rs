//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum/hyper transport, middleware stack)
//!     → request.rs (request ID assigned and propagated)
//!     → routing::Router (route table dispatch, stats)
//!     → Send response to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
