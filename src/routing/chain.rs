//! Middleware execution chain.
//!
//! # Responsibilities
//! - Hold an ordered list of middlewares ending in one terminal endpoint
//! - Let every middleware decide whether and when the rest of the chain runs
//!
//! # Design Decisions
//! - The chain is a shared slice plus a cursor; forwarding advances the
//!   cursor, so no per-request state is allocated for the links
//! - Code before `next.run` executes in registration order, code after it
//!   in reverse order
//! - A middleware that never calls `next.run` ends the chain; this is a
//!   normal outcome (auth rejection, preflight answers), not an error
//! - The same middlewares can guard a single route through [`wrap`]; the
//!   route's captured parameters ride along to the handler

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use axum::response::IntoResponse;
use futures_util::future::BoxFuture;

use crate::routing::handler::{BoxedHandler, Handler, Request, Response};
use crate::routing::params::Params;

/// An interceptor around the rest of the chain.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<'static, Response>;
}

/// The terminal step of a chain.
pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<'static, Response>;
}

impl<F, Fut, R> Endpoint for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        let fut = (self)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Middleware built from an async closure, see [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

/// Wrap an async closure taking `(Request, Next)` as a [`Middleware`].
pub fn from_fn<F, Fut, R>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    FromFn { f }
}

impl<F, Fut, R> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture<'static, Response> {
        let fut = (self.f)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Middlewares in registration order followed by the endpoint.
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<[Arc<dyn Middleware>]>,
    endpoint: Arc<dyn Endpoint>,
}

impl MiddlewareChain {
    /// Build a chain. With no middlewares it simply calls `endpoint`.
    pub fn new(middlewares: impl Into<Arc<[Arc<dyn Middleware>]>>, endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            middlewares: middlewares.into(),
            endpoint,
        }
    }

    /// Same middlewares, different terminal step.
    pub fn with_endpoint(&self, endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            middlewares: Arc::clone(&self.middlewares),
            endpoint,
        }
    }

    /// Run the whole chain for one request.
    pub fn run(&self, req: Request) -> BoxFuture<'static, Response> {
        Next {
            chain: self.clone(),
            cursor: 0,
        }
        .run(req)
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

/// The remainder of a chain, handed to each middleware.
pub struct Next {
    chain: MiddlewareChain,
    cursor: usize,
}

impl Next {
    /// Run the next middleware, or the endpoint once all have run.
    pub fn run(mut self, req: Request) -> BoxFuture<'static, Response> {
        match self.chain.middlewares.get(self.cursor).cloned() {
            Some(middleware) => {
                self.cursor += 1;
                middleware.handle(req, self)
            }
            None => self.chain.endpoint.call(req),
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &(self.chain.middlewares.len() - self.cursor))
            .finish()
    }
}

/// A route handler with its own middlewares, see [`wrap`].
#[derive(Clone)]
pub struct Wrapped {
    middlewares: Arc<[Arc<dyn Middleware>]>,
    handler: BoxedHandler,
}

/// Run `middleware` around `handler` for one route only.
///
/// ```
/// # use pantofola_rest::middleware::NoCache;
/// # use pantofola_rest::routing::{wrap, Params, Request, Router};
/// # fn main() -> Result<(), pantofola_rest::routing::RouteError> {
/// let router = Router::builder()
///     .get("/live", wrap(NoCache, |_: Request, _: Params| async { "fresh" }))?
///     .build();
/// # Ok(())
/// # }
/// ```
pub fn wrap(middleware: impl Middleware, handler: impl Handler) -> Wrapped {
    Wrapped {
        middlewares: Arc::new([Arc::new(middleware) as Arc<dyn Middleware>]),
        handler: Arc::new(handler),
    }
}

impl Wrapped {
    /// Add another middleware, run after the ones already added.
    pub fn wrap(self, middleware: impl Middleware) -> Self {
        let mut middlewares = self.middlewares.to_vec();
        middlewares.push(Arc::new(middleware));
        Self {
            middlewares: middlewares.into(),
            handler: self.handler,
        }
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl Handler for Wrapped {
    fn call(&self, req: Request, params: Params) -> BoxFuture<'static, Response> {
        let endpoint = Arc::new(RouteHandler {
            handler: Arc::clone(&self.handler),
            params: Mutex::new(Some(params)),
        });
        MiddlewareChain::new(Arc::clone(&self.middlewares), endpoint).run(req)
    }
}

impl fmt::Debug for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

/// Endpoint handing one request's parameters to a route handler.
///
/// Unused parameters go back to their pool when the chain is dropped.
struct RouteHandler {
    handler: BoxedHandler,
    params: Mutex<Option<Params>>,
}

impl Endpoint for RouteHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        let params = self
            .params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        self.handler.call(req, params)
    }
}
