//! Router behaviour through the public API.

use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::IntoResponse;
use pantofola_rest::middleware::{Cors, NoCache};
use pantofola_rest::routing::{from_fn, wrap, Next, Params, Request, RouteError, Router};

mod common;
use common::{expect, send};

async fn user_activity(_: Request, params: Params) -> String {
    let pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.join("&")
}

#[tokio::test]
async fn test_rest_style_routes() {
    let router = Router::builder()
        .get("/users", |_: Request, _: Params| async { "list" })
        .unwrap()
        .post("/users", |_: Request, _: Params| async { (StatusCode::CREATED, "created") })
        .unwrap()
        .get("/users/:user", user_activity)
        .unwrap()
        .put("/users/:user", user_activity)
        .unwrap()
        .patch("/users/:user", user_activity)
        .unwrap()
        .delete("/users/:user", user_activity)
        .unwrap()
        .get("/users/:user/activity/:activity", user_activity)
        .unwrap()
        .get("/users/me", |_: Request, _: Params| async { "me" })
        .unwrap()
        .build();

    expect(&router, "GET", "/users", 200, "list").await;
    expect(&router, "POST", "/users", 201, "created").await;
    expect(&router, "GET", "/users/42", 200, "user=42").await;
    expect(&router, "DELETE", "/users/42", 200, "user=42").await;
    expect(&router, "GET", "/users/me", 200, "me").await;
    expect(&router, "GET", "/users/7/activity/run", 200, "user=7&activity=run").await;

    // static wins and there is no backtracking into the parameter
    expect(&router, "GET", "/users/me/activity/run", 404, "Not Found").await;
    // trailing slash is a different, empty segment
    expect(&router, "GET", "/users/", 404, "Not Found").await;
    // values are not decoded
    expect(&router, "GET", "/users/a%20b", 200, "user=a%20b").await;
}

#[tokio::test]
async fn test_method_not_allowed_is_router_wide() {
    let router = Router::builder()
        .get("/only-get", |_: Request, _: Params| async { "ok" })
        .unwrap()
        .build();

    expect(&router, "POST", "/only-get", 405, "Method Not Allowed").await;
    expect(&router, "HEAD", "/only-get", 405, "Method Not Allowed").await;
    expect(&router, "GET", "/other", 404, "Not Found").await;
}

#[tokio::test]
async fn test_middleware_order_and_short_circuit() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let record = |name: &'static str| {
        let log = Arc::clone(&log);
        from_fn(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name} before"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{name} after"));
                res
            }
        })
    };
    let guard = from_fn(|req: Request, next: Next| async move {
        if req.headers().contains_key("x-token") {
            next.run(req).await
        } else {
            (StatusCode::UNAUTHORIZED, "denied").into_response()
        }
    });

    let router = Router::builder()
        .get("/secret", |_: Request, _: Params| async { "secret" })
        .unwrap()
        .use_middleware(record("A"))
        .use_middleware(guard)
        .use_middleware(record("B"))
        .build();

    expect(&router, "GET", "/secret", 401, "denied").await;
    assert_eq!(*log.lock().unwrap(), vec!["A before", "A after"]);

    log.lock().unwrap().clear();
    let req = axum::http::Request::builder()
        .uri("/secret")
        .header("x-token", "1")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = router.serve(req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["A before", "B before", "B after", "A after"]
    );
}

#[tokio::test]
async fn test_decorators_compose() {
    let router = Router::builder()
        .get("/data", |_: Request, _: Params| async { "data" })
        .unwrap()
        .use_middleware(Cors::with_preflight(&["GET"], &["Authorization"]))
        .use_middleware(NoCache)
        .build();

    let req = axum::http::Request::builder()
        .uri("/data")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = router.serve(req).await;
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["cache-control"], "no-cache");

    // preflight is answered before later middlewares run
    let req = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/data")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = router.serve(req).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.headers().get("cache-control").is_none());
}

#[tokio::test]
async fn test_decorators_on_single_route() {
    let router = Router::builder()
        .get(
            "/live/:id",
            wrap(Cors::new(), |_: Request, params: Params| async move {
                format!("live {}", params.get("id").unwrap_or_default())
            })
            .wrap(NoCache),
        )
        .unwrap()
        .get("/plain", |_: Request, _: Params| async { "plain" })
        .unwrap()
        .build();

    let req = axum::http::Request::builder()
        .uri("/live/5")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = router.serve(req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["cache-control"], "no-cache");
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"live 5");

    let req = axum::http::Request::builder()
        .uri("/plain")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = router.serve(req).await;
    assert!(res.headers().get("access-control-allow-origin").is_none());
    assert!(res.headers().get("cache-control").is_none());
}

#[tokio::test]
async fn test_concurrent_requests_share_pool() {
    let router = Router::builder()
        .pool_size(4, 8)
        .get("/n/:a/:b", user_activity)
        .unwrap()
        .build();

    let mut tasks = Vec::new();
    for i in 0..64 {
        let router = router.clone();
        tasks.push(tokio::spawn(async move {
            let path = format!("/n/{i}/{}", i * 2);
            let (status, body) = send(&router, "GET", &path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, format!("a={i}&b={}", i * 2));
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert!(router.parameter_pool().len() <= 8);
    assert_eq!(router.max_params(), 2);
}

fn register_err(method: &str, pattern: &str) -> RouteError {
    Router::builder()
        .handle(method, pattern, |_: Request, _: Params| async { "" })
        .err()
        .unwrap_or_else(|| panic!("{method} {pattern} should fail"))
}

#[test]
fn test_registration_errors() {
    assert!(matches!(register_err("TRACE", "/a"), RouteError::UnsupportedMethod { .. }));
    assert!(matches!(register_err("get", "/a"), RouteError::UnsupportedMethod { .. }));
    assert!(matches!(register_err("GET", "a/b"), RouteError::InvalidPattern { .. }));
    assert!(matches!(register_err("GET", "/a/:"), RouteError::InvalidPattern { .. }));

    let err = Router::builder()
        .get("/u/:id", |_: Request, _: Params| async { "" })
        .unwrap()
        .get("/u/:name/posts", |_: Request, _: Params| async { "" })
        .err()
        .unwrap();
    assert_eq!(
        err,
        RouteError::ParameterNameConflict {
            pattern: "/u/:name/posts".into(),
            existing: "id".into(),
            requested: "name".into(),
        }
    );
}
