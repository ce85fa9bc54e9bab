//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Register handlers per method and pattern
//! - Keep the parameter pool sized for the largest route
//! - Run the global middleware chain around route resolution
//! - Answer `/`, misses and unsupported methods with configurable handlers
//!
//! # Design Decisions
//! - `RouterBuilder` owns every registration operation; `build()` freezes
//!   it into an immutable `Router` that is cheap to clone and share
//! - `/` always goes to the index handler, bypassing the trees
//! - "Method not allowed" means no route was ever registered for the
//!   method on this router, not per-resource negotiation
//! - The absolute prefix from enclosing cascades is stripped at segment
//!   boundaries before lookup; the request itself is never rewritten

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::routing::chain::{Endpoint, Middleware, MiddlewareChain};
use crate::routing::defaults;
use crate::routing::error::RouteError;
use crate::routing::handler::{BoxedHandler, Dispatch, Handler, Request, Response};
use crate::routing::params::{ParameterPool, Params};
use crate::routing::tree::{Lookup, Method, PathTree};

pub const DEFAULT_POOL_INITIAL_SIZE: usize = 16;
pub const DEFAULT_POOL_MAX_SIZE: usize = 256;

/// Registration phase of a [`Router`].
pub struct RouterBuilder {
    tree: PathTree<BoxedHandler>,
    pool: ParameterPool,
    pool_initial: usize,
    pool_max: usize,
    middlewares: Vec<Arc<dyn Middleware>>,
    index: BoxedHandler,
    fallback: BoxedHandler,
    not_allowed: BoxedHandler,
}

impl RouterBuilder {
    /// Empty router with the default index, fallback and not-allowed pages.
    pub fn new() -> Self {
        Self {
            tree: PathTree::new(),
            pool: ParameterPool::new(0, DEFAULT_POOL_INITIAL_SIZE, DEFAULT_POOL_MAX_SIZE),
            pool_initial: DEFAULT_POOL_INITIAL_SIZE,
            pool_max: DEFAULT_POOL_MAX_SIZE,
            middlewares: Vec::new(),
            index: Arc::new(defaults::index),
            fallback: Arc::new(defaults::not_found),
            not_allowed: Arc::new(defaults::method_not_allowed),
        }
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// The pattern `/` sets the index handler for every method.
    pub fn handle(mut self, method: &str, pattern: &str, handler: impl Handler) -> Result<Self, RouteError> {
        let parsed = Method::parse(method).ok_or_else(|| RouteError::UnsupportedMethod {
            method: method.to_owned(),
            pattern: pattern.to_owned(),
        })?;

        if pattern == "/" {
            self.index = Arc::new(handler);
            return Ok(self);
        }

        self.tree.insert(parsed, pattern, Arc::new(handler))?;
        tracing::debug!(method = %parsed, pattern, "Route registered");

        let max_params = self.tree.max_params();
        if max_params > self.pool.max_params() {
            tracing::debug!(max_params, "Resizing parameter pool");
            self.pool.init(max_params, self.pool_initial, self.pool_max);
        }
        Ok(self)
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Result<Self, RouteError> {
        self.handle("GET", pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Result<Self, RouteError> {
        self.handle("POST", pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Result<Self, RouteError> {
        self.handle("PUT", pattern, handler)
    }

    pub fn patch(self, pattern: &str, handler: impl Handler) -> Result<Self, RouteError> {
        self.handle("PATCH", pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Result<Self, RouteError> {
        self.handle("DELETE", pattern, handler)
    }

    /// Append a global middleware. Middlewares run in the order they are added.
    pub fn use_middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Handler for the `/` path.
    pub fn index(mut self, handler: impl Handler) -> Self {
        self.index = Arc::new(handler);
        self
    }

    /// Handler for paths that do not resolve.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Arc::new(handler);
        self
    }

    /// Handler for unsupported methods and methods without routes.
    pub fn not_allowed(mut self, handler: impl Handler) -> Self {
        self.not_allowed = Arc::new(handler);
        self
    }

    /// Preallocated and maximum retained parameter lists.
    ///
    /// Preallocation is capped at `max`.
    pub fn pool_size(mut self, initial: usize, max: usize) -> Self {
        self.pool_initial = initial;
        self.pool_max = max;
        self.pool.init(self.tree.max_params(), initial, max);
        self
    }

    /// Freeze the registered routes.
    pub fn build(self) -> Router {
        tracing::debug!(
            routes = ?self.tree,
            middlewares = self.middlewares.len(),
            "Router built"
        );

        let table = Arc::new(RouteTable {
            tree: self.tree,
            pool: Arc::new(self.pool),
            index: self.index,
            fallback: self.fallback,
            not_allowed: self.not_allowed,
        });
        let endpoint = Arc::new(RouteEndpoint {
            table: Arc::clone(&table),
            prefix: String::new(),
        });

        Router {
            chain: MiddlewareChain::new(self.middlewares, endpoint),
            table,
            prefix: String::new(),
        }
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct RouteTable {
    tree: PathTree<BoxedHandler>,
    pool: Arc<ParameterPool>,
    index: BoxedHandler,
    fallback: BoxedHandler,
    not_allowed: BoxedHandler,
}

/// Terminal step of the router chain: resolve the path and call a handler.
struct RouteEndpoint {
    table: Arc<RouteTable>,
    prefix: String,
}

impl Endpoint for RouteEndpoint {
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        let table = &self.table;

        let Some(method) = Method::parse(req.method().as_str()) else {
            tracing::debug!(method = %req.method(), "Unsupported method");
            return table.not_allowed.call(req, Params::empty());
        };

        let path = strip_prefix(req.uri().path(), &self.prefix);
        if path.is_empty() || path == "/" {
            return table.index.call(req, Params::empty());
        }

        match table.tree.lookup(method, path, &table.pool) {
            Lookup::Found(handler, params) => handler.call(req, params),
            Lookup::NotFound => {
                tracing::debug!(%method, path = %req.uri().path(), "No route matched");
                table.fallback.call(req, Params::empty())
            }
            Lookup::MethodNotAllowed => {
                tracing::debug!(%method, "No routes registered for method");
                table.not_allowed.call(req, Params::empty())
            }
        }
    }
}

/// Remove `prefix` from `path` when it ends on a segment boundary.
fn strip_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// An immutable, shareable request router.
///
/// ```no_run
/// # use pantofola_rest::routing::{Params, Request, Router};
/// async fn user(_: Request, params: Params) -> String {
///     format!("user {}", params.get("user").unwrap_or_default())
/// }
///
/// # fn main() -> Result<(), pantofola_rest::routing::RouteError> {
/// let router = Router::builder()
///     .get("/users/:user", user)?
///     .build();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Router {
    chain: MiddlewareChain,
    table: Arc<RouteTable>,
    prefix: String,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Serve one request through the middleware chain.
    pub fn serve(&self, req: Request) -> BoxFuture<'static, Response> {
        self.chain.run(req)
    }

    /// Pool the router draws parameter lists from.
    pub fn parameter_pool(&self) -> &ParameterPool {
        &self.table.pool
    }

    /// Largest number of parameters in any registered route.
    pub fn max_params(&self) -> usize {
        self.table.tree.max_params()
    }
}

impl Default for Router {
    fn default() -> Self {
        RouterBuilder::new().build()
    }
}

impl Dispatch for Router {
    fn dispatch(&self, req: Request) -> BoxFuture<'static, Response> {
        self.serve(req)
    }

    fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_owned();
        self.chain = self.chain.with_endpoint(Arc::new(RouteEndpoint {
            table: Arc::clone(&self.table),
            prefix: self.prefix.clone(),
        }));
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("tree", &self.table.tree)
            .field("pool", &self.table.pool)
            .field("chain", &self.chain)
            .finish()
    }
}
