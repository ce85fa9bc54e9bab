//! Pantofola-Rest: a small path-based HTTP dispatch engine.
//!
//! Routes live in per-method path tries with static and `:param` segments,
//! parameters come from a bounded pool, every router runs a global
//! middleware chain, and cascades compose independent routers under path
//! prefixes. The `http` module serves any of them with axum.

pub mod config;
pub mod http;
pub mod middleware;
pub mod routing;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use routing::{Cascade, Dispatch, Params, RouteError, Router};
