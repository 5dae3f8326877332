//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Trigger (signal or /shutdown) → Stop accepting → Drain in-flight requests
//!     → Settle pending store commits → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - One coordinator per server instance, cloned into every party that can trigger it
//! - Triggering is idempotent; late subscribers still observe an earlier trigger
//! - Pending store commits are abandoned unless configured otherwise

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
