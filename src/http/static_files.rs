//! File serving handler.
//!
//! # Responsibilities
//! - Map the `*` route parameter onto a file below a root directory
//! - Delegate to a not-found handler when there is no such file
//!
//! # Design Decisions
//! - The parameter is cleaned lexically; `..` can never climb above `root`
//! - Without a `*` parameter the handler serves `index.html`
//! - Content type, conditional requests and ranges are left to `ServeFile`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::routing::{Handler, Params, Request, Response};

/// Route parameter holding the requested file.
pub const FILE_PARAM: &str = "*";

const INDEX_FILE: &str = "index.html";

/// Serves files from a directory, see [`serve`].
#[derive(Clone)]
pub struct StaticFiles {
    root: Arc<PathBuf>,
    not_found: Arc<dyn Handler>,
}

/// Handler serving files below `root`, answering misses with `not_found`.
///
/// Register it on a pattern whose last segment is the `*` parameter:
///
/// ```no_run
/// # use pantofola_rest::http::static_files;
/// # use pantofola_rest::routing::{defaults, Router};
/// # fn main() -> Result<(), pantofola_rest::routing::RouteError> {
/// let router = Router::builder()
///     .get("/:*", static_files::serve("./public", defaults::not_found))?
///     .index(static_files::serve("./public", defaults::not_found))
///     .build();
/// # Ok(())
/// # }
/// ```
pub fn serve(root: impl Into<PathBuf>, not_found: impl Handler) -> StaticFiles {
    StaticFiles {
        root: Arc::new(root.into()),
        not_found: Arc::new(not_found),
    }
}

impl StaticFiles {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that would be served for the `*` parameter `requested`.
    pub fn resolve(&self, requested: Option<&str>) -> PathBuf {
        let relative = requested.map(clean).unwrap_or_default();
        if relative.as_os_str().is_empty() {
            self.root.join(INDEX_FILE)
        } else {
            self.root.join(relative)
        }
    }
}

/// Resolve `.` and `..` without touching the filesystem, dropping any
/// component that would leave the root.
fn clean(requested: &str) -> PathBuf {
    let mut parts: Vec<&str> = Vec::new();
    for part in requested.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    parts.iter().collect()
}

impl Handler for StaticFiles {
    fn call(&self, req: Request, params: Params) -> BoxFuture<'static, Response> {
        let path = self.resolve(params.get(FILE_PARAM));
        drop(params);
        let not_found = Arc::clone(&self.not_found);

        Box::pin(async move {
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => match ServeFile::new(&path).oneshot(req).await {
                    Ok(res) => res.into_response(),
                    Err(never) => match never {},
                },
                _ => {
                    tracing::debug!(path = %path.display(), "Static file not found");
                    not_found.call(req, Params::empty()).await
                }
            }
        })
    }
}
