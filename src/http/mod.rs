//! HTTP transport for dispatchers.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, request id, tracing, timeout, panic recovery)
//!     → Dispatch::dispatch (Router or Cascade)
//!     → handler, e.g. static_files.rs
//!     → response back through the tower layers
//! ```

pub mod server;
pub mod static_files;

pub use server::{HttpServer, PANIC_BODY, X_REQUEST_ID};
pub use static_files::StaticFiles;
