//! Registration errors.
//!
//! Every variant is a configuration mistake caught while routes are being
//! registered. None of them can occur while serving.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unsupported method `{method}` for route {pattern}")]
    UnsupportedMethod { method: String, pattern: String },

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("parameter name mismatch for route {pattern}: `:{existing}` already registered at this position, got `:{requested}`")]
    ParameterNameConflict {
        pattern: String,
        existing: String,
        requested: String,
    },

    #[error("invalid cascade prefix `{0}`: use a single top level segment like /prefix")]
    CascadePrefixInvalid(String),
}
