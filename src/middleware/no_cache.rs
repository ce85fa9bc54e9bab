//! `Cache-Control: no-cache` on every response.

use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use futures_util::future::BoxFuture;

use crate::routing::{Middleware, Next, Request, Response};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Middleware for NoCache {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let mut res = next.run(req).await;
            res.headers_mut()
                .entry(CACHE_CONTROL)
                .or_insert(HeaderValue::from_static("no-cache"));
            res
        })
    }
}
