//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → cascade.rs (strip own prefix, pick target by leading segment)
//!     → router.rs (run global middleware chain)
//!     → chain.rs (middlewares in order, terminal dispatch step)
//!     → tree.rs (per-method trie lookup, capture parameters)
//!     → params.rs (pooled parameter list, returned on drop)
//!     → Handler | fallback (404) | not allowed (405) | index (`/`)
//!
//! Route Registration (before serving):
//!     RouterBuilder::handle(method, pattern, handler)
//!     → tree.rs (insert segments, reject conflicting parameter names)
//!     → params.rs (resize pool when max parameter count grows)
//!     → build() freezes everything into an immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Static segments win over parameters, no backtracking
//! - Registration errors are returned before the first request is served
//! - The parameter pool is the only structure mutated while serving

pub mod cascade;
pub mod chain;
pub mod defaults;
pub mod error;
pub mod handler;
pub mod params;
pub mod router;
pub mod tree;

pub use cascade::{Cascade, CascadeBuilder};
pub use chain::{from_fn, wrap, Endpoint, Middleware, MiddlewareChain, Next, Wrapped};
pub use error::RouteError;
pub use handler::{BoxedHandler, Dispatch, Handler, Request, Response};
pub use params::{ParameterList, ParameterPool, Params};
pub use router::{Router, RouterBuilder};
pub use tree::{Lookup, Method, PathTree};
