//! One log line per request.

use std::time::Instant;

use futures_util::future::BoxFuture;

use crate::routing::{Middleware, Next, Request, Response};

/// Logs method, URI, status and elapsed time after each request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogging;

impl Middleware for RequestLogging {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<'static, Response> {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let start = Instant::now();

        Box::pin(async move {
            let res = next.run(req).await;
            let elapsed = start.elapsed();
            tracing::info!(
                method = %method,
                uri = %uri,
                status = res.status().as_u16(),
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "Request served"
            );
            res
        })
    }
}
