//! Delayed digest service library.
//!
//! Accepts secrets over HTTP, schedules their SHA-512 digest to become readable
//! after a fixed delay, and serves the result by handle.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod service;
pub mod store;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::DelayedStore;
