//! Handler and dispatcher contracts.

use std::future::Future;
use std::sync::Arc;

use axum::response::IntoResponse;
use futures_util::future::BoxFuture;

use crate::routing::params::Params;

/// Request type seen by every handler and middleware.
pub type Request = axum::extract::Request;

/// Response type produced by every handler and middleware.
pub type Response = axum::response::Response;

/// A route handler: receives the request and the parameters captured for it.
///
/// Implemented for any `Fn(Request, Params) -> impl Future<Output = impl IntoResponse>`,
/// so plain `async fn`s can be registered directly.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request, params: Params) -> BoxFuture<'static, Response>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request, params: Params) -> BoxFuture<'static, Response> {
        let fut = (self)(req, params);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Shared, type-erased handler as stored in the route tree.
pub type BoxedHandler = Arc<dyn Handler>;

/// Anything a cascade can delegate to.
///
/// Both [`Router`](crate::routing::Router) and
/// [`Cascade`](crate::routing::Cascade) implement it, which is what lets
/// cascades nest.
pub trait Dispatch: Send + Sync + 'static {
    /// Serve one request.
    fn dispatch(&self, req: Request) -> BoxFuture<'static, Response>;

    /// Set the absolute path prefix already consumed by enclosing cascades.
    fn set_prefix(&mut self, prefix: &str);

    /// The absolute prefix this dispatcher strips before routing.
    fn prefix(&self) -> &str;
}

impl<D: Dispatch + ?Sized> Dispatch for Box<D> {
    fn dispatch(&self, req: Request) -> BoxFuture<'static, Response> {
        (**self).dispatch(req)
    }

    fn set_prefix(&mut self, prefix: &str) {
        (**self).set_prefix(prefix)
    }

    fn prefix(&self) -> &str {
        (**self).prefix()
    }
}
