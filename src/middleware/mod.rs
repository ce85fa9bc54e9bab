//! Ready-made middlewares for the routing chain.
//!
//! # Data Flow
//! ```text
//! Router::serve
//!     → logging.rs (start timer)
//!     → cors.rs (answer preflight or tag response)
//!     → no_cache.rs (tag response)
//!     → route handler
//! ```
//!
//! # Design Decisions
//! - Each decorator is a plain `Middleware` value added with
//!   `RouterBuilder::use_middleware`; order is the caller's choice
//! - Headers are only filled in when the handler left them unset

pub mod cors;
pub mod logging;
pub mod no_cache;

pub use cors::Cors;
pub use logging::RequestLogging;
pub use no_cache::NoCache;
