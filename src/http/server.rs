//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap any `Dispatch` implementation in an axum service
//! - Wire up tower-http layers (request id, tracing, timeout, panic recovery)
//! - Bind to a listener and serve until shutdown

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::routing::{Dispatch, Request, Response};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Body sent when a handler panics.
pub const PANIC_BODY: &str = "Something went wrong with your request";

/// HTTP server for a dispatcher.
pub struct HttpServer {
    router: axum::Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `dispatcher`.
    pub fn new(config: ServerConfig, dispatcher: impl Dispatch) -> Self {
        let router = Self::build_router(&config, Arc::new(dispatcher));
        Self { router, config }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, dispatcher: Arc<dyn Dispatch>) -> axum::Router {
        axum::Router::new()
            .fallback(move |req: Request| {
                let dispatcher = Arc::clone(&dispatcher);
                async move { dispatcher.dispatch(req).await }
            })
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered axum router, for embedding or in-process tests.
    pub fn into_router(self) -> axum::Router {
        self.router
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` completes, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "Handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, PANIC_BODY).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Params, Router};
    use axum::body::{to_bytes, Body};
    use tower::ServiceExt;

    async fn boom(_: Request, _: Params) -> &'static str {
        panic!("handler exploded")
    }

    fn server() -> axum::Router {
        let router = Router::builder()
            .get("/hello/:name", |_: Request, params: Params| async move {
                format!("hello {}", params.get("name").unwrap_or_default())
            })
            .unwrap()
            .get("/boom", boom)
            .unwrap()
            .build();
        HttpServer::new(ServerConfig::default(), router).into_router()
    }

    fn get(path: &str) -> Request {
        axum::http::Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatches_to_router() {
        let res = server().oneshot(get("/hello/ada")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(X_REQUEST_ID));
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello ada");
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let res = server().oneshot(get("/boom")).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], PANIC_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_kept() {
        let req = axum::http::Request::builder()
            .uri("/missing")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let res = server().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[X_REQUEST_ID], "abc-123");
    }
}
