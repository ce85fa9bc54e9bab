//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::StatusCode;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use pantofola_rest::config::ServerConfig;
use pantofola_rest::routing::{Dispatch, Params, Request};
use pantofola_rest::HttpServer;

/// Run one request through `dispatcher` in-process.
pub async fn send(dispatcher: &impl Dispatch, method: &str, path: &str) -> (StatusCode, String) {
    let req = axum::http::Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    let res = dispatcher.dispatch(req).await;
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Assert status and body for one request.
pub async fn expect(dispatcher: &impl Dispatch, method: &str, path: &str, status: u16, body: &str) {
    let (got_status, got_body) = send(dispatcher, method, path).await;
    assert_eq!(got_status.as_u16(), status, "status of {method} {path}");
    assert_eq!(got_body, body, "body of {method} {path}");
}

/// Handler replying with a label and the full request path.
pub fn labelled(label: &'static str) -> impl Fn(Request, Params) -> std::future::Ready<String> + Clone {
    move |req: Request, _: Params| std::future::ready(format!("{label} {}", req.uri().path()))
}

/// Serve `dispatcher` on an ephemeral port until the returned sender fires.
pub async fn start_server(dispatcher: impl Dispatch) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let mut config = ServerConfig::default();
    config.listener.bind_address = addr.to_string();
    let server = HttpServer::new(config, dispatcher);

    tokio::spawn(async move {
        let _ = server
            .run_until(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    (addr, tx)
}

/// Client that never reuses connections, so shutdown is not held up.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
