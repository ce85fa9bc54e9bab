//! Responses used when a router has no custom index, fallback or
//! not-allowed handler.

use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::routing::handler::{Request, Response};
use crate::routing::params::Params;

pub const NOT_FOUND_BODY: &str = "Not Found";
pub const METHOD_NOT_ALLOWED_BODY: &str = "Method Not Allowed";
pub const WELCOME_BODY: &str = "Welcome to Pantofola-Rest!";

pub async fn not_found(_: Request, _: Params) -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

pub async fn method_not_allowed(_: Request, _: Params) -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_BODY).into_response()
}

pub async fn index(_: Request, _: Params) -> Response {
    (StatusCode::OK, WELCOME_BODY).into_response()
}
