//! Cross-origin resource sharing headers and preflight answers.
//!
//! # Responsibilities
//! - Allow any origin on every response
//! - Optionally answer `OPTIONS` preflight requests without reaching a route
//!
//! # Design Decisions
//! - Preflight values are rendered into header values once, at construction
//! - A preflight answer is `204 No Content` with an empty body

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;

use crate::routing::{Middleware, Next, Request, Response};

/// How long browsers may cache a preflight answer, in seconds.
pub const DEFAULT_MAX_AGE_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
struct Preflight {
    methods: HeaderValue,
    headers: HeaderValue,
    max_age: HeaderValue,
}

/// CORS middleware.
///
/// `Access-Control-Allow-Origin: *` is only added when the handler did not
/// set the header itself; a handler-chosen origin is kept.
///
/// ```
/// # use pantofola_rest::middleware::Cors;
/// # use pantofola_rest::routing::Router;
/// let router = Router::builder()
///     .use_middleware(Cors::with_preflight(&["GET", "POST"], &["Content-Type"]))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cors {
    preflight: Option<Preflight>,
}

impl Cors {
    /// Allow any origin, leave `OPTIONS` to the router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow any origin and answer preflight requests with the given
    /// methods and headers.
    pub fn with_preflight(methods: &[&str], headers: &[&str]) -> Self {
        Self::new().preflight(methods, headers, DEFAULT_MAX_AGE_SECS)
    }

    /// Enable preflight answers with an explicit max age.
    ///
    /// Entries that are not valid header text are skipped.
    pub fn preflight(mut self, methods: &[&str], headers: &[&str], max_age_secs: u64) -> Self {
        self.preflight = Some(Preflight {
            methods: join_header(methods),
            headers: join_header(headers),
            max_age: HeaderValue::from(max_age_secs),
        });
        self
    }

    pub fn handles_preflight(&self) -> bool {
        self.preflight.is_some()
    }
}

fn join_header(values: &[&str]) -> HeaderValue {
    let joined = values
        .iter()
        .filter(|v| HeaderValue::from_str(v).is_ok())
        .copied()
        .collect::<Vec<_>>()
        .join(",");
    HeaderValue::from_str(&joined).unwrap_or_else(|_| HeaderValue::from_static(""))
}

impl Middleware for Cors {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<'static, Response> {
        if let Some(preflight) = self.preflight.as_ref().filter(|_| req.method() == Method::OPTIONS) {
            let mut res = StatusCode::NO_CONTENT.into_response();
            let headers = res.headers_mut();
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, preflight.methods.clone());
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, preflight.headers.clone());
            headers.insert(ACCESS_CONTROL_MAX_AGE, preflight.max_age.clone());
            tracing::debug!(path = %req.uri().path(), "Answered CORS preflight");
            return Box::pin(async move { res });
        }

        Box::pin(async move {
            let mut res = next.run(req).await;
            res.headers_mut()
                .entry(ACCESS_CONTROL_ALLOW_ORIGIN)
                .or_insert(HeaderValue::from_static("*"));
            res
        })
    }
}
