//! Prefix-based composition of dispatchers.
//!
//! # Responsibilities
//! - Map single-segment prefixes (`/api`) to independent dispatchers
//! - Fall back to a main dispatcher when no prefix matches
//! - Tell every child the absolute prefix it lives under, recursively
//!
//! # Design Decisions
//! - Prefixes must match `^/[A-Za-z0-9]+$`; deeper mounts are built by
//!   nesting cascades rather than claiming multi-segment prefixes
//! - The request path is never rewritten; each child strips its own
//!   absolute prefix
//! - A cascade without an explicit main dispatcher gets an empty `Router`

use std::collections::HashMap;
use std::fmt;

use futures_util::future::BoxFuture;

use crate::routing::error::RouteError;
use crate::routing::handler::{Dispatch, Request, Response};
use crate::routing::router::Router;

/// Whether `prefix` is a valid cascade mount point like `/api`.
pub fn is_valid_prefix(prefix: &str) -> bool {
    match prefix.strip_prefix('/') {
        Some(name) => !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric()),
        None => false,
    }
}

/// Leading segment of `path`, including its slash: `/api/x` → `/api`.
fn leading_segment(path: &str) -> &str {
    let end = path
        .get(1..)
        .and_then(|tail| tail.find('/'))
        .map_or(path.len(), |i| i + 1);
    &path[..end]
}

/// Registration phase of a [`Cascade`].
#[derive(Default)]
pub struct CascadeBuilder {
    main: Option<Box<dyn Dispatch>>,
    children: HashMap<String, Box<dyn Dispatch>>,
}

impl CascadeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `target` under `prefix`. An empty prefix sets the main target.
    pub fn set(mut self, prefix: &str, target: impl Dispatch) -> Result<Self, RouteError> {
        if prefix.is_empty() {
            self.main = Some(Box::new(target));
            return Ok(self);
        }
        if !is_valid_prefix(prefix) {
            return Err(RouteError::CascadePrefixInvalid(prefix.to_owned()));
        }

        let mut target: Box<dyn Dispatch> = Box::new(target);
        target.set_prefix(prefix);
        if self.children.insert(prefix.to_owned(), target).is_some() {
            tracing::warn!(prefix, "Cascade prefix mounted twice, replacing previous target");
        }
        tracing::debug!(prefix, "Cascade target mounted");
        Ok(self)
    }

    pub fn build(self) -> Cascade {
        Cascade {
            main: self.main.unwrap_or_else(|| Box::new(Router::default())),
            children: self.children,
            prefix: String::new(),
        }
    }
}

/// Dispatches on the first path segment after the cascade's own prefix.
pub struct Cascade {
    main: Box<dyn Dispatch>,
    children: HashMap<String, Box<dyn Dispatch>>,
    prefix: String,
}

impl Cascade {
    pub fn builder() -> CascadeBuilder {
        CascadeBuilder::new()
    }

    /// Dispatcher that would serve `path`.
    fn target(&self, path: &str) -> &dyn Dispatch {
        let relative = path.strip_prefix(self.prefix.as_str()).unwrap_or(path);
        self.children
            .get(leading_segment(relative))
            .map_or(&*self.main, |child| &**child)
    }

    /// Mounted prefixes, relative to this cascade.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }
}

impl Dispatch for Cascade {
    fn dispatch(&self, req: Request) -> BoxFuture<'static, Response> {
        let target = self.target(req.uri().path());
        target.dispatch(req)
    }

    fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_owned();
        self.main.set_prefix(prefix);
        for (segment, child) in self.children.iter_mut() {
            child.set_prefix(&format!("{prefix}{segment}"));
        }
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Debug for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefixes: Vec<_> = self.prefixes().collect();
        prefixes.sort_unstable();
        f.debug_struct("Cascade")
            .field("prefix", &self.prefix)
            .field("children", &prefixes)
            .finish()
    }
}
