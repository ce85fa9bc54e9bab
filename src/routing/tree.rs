//! Per-method path tries.
//!
//! # Responsibilities
//! - Parse registration patterns into `/`-delimited segments
//! - Store static children bucketed by byte length, sorted inside a bucket
//! - Store at most one named parameter child per position
//! - Resolve a request path to a handler plus captured parameters
//!
//! # Design Decisions
//! - Static match takes precedence over a parameter, no backtracking
//! - Segments keep their leading `/`, so `/a` and `a` never collide
//! - A parameter never captures an empty segment
//! - A method without any registered route has no tree at all, which is
//!   reported separately from a path miss

use std::fmt;
use std::sync::Arc;

use crate::routing::error::RouteError;
use crate::routing::params::{ParameterPool, Params};

/// HTTP methods a tree can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    /// Parse an exact, upper-case method name.
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Iterator over the segments of a path, each including its leading `/`.
///
/// `/a/b` yields `/a`, `/b`; a trailing slash yields a final `/`.
struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    fn new(path: &'a str) -> Self {
        Self { rest: path }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .get(1..)
            .and_then(|tail| tail.find('/'))
            .map_or(self.rest.len(), |i| i + 1);
        let (segment, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(segment)
    }
}

/// Parameter name of a `/:name` segment.
fn parameter_name(segment: &str) -> Option<&str> {
    segment.strip_prefix("/:")
}

struct Bucket<T> {
    len: usize,
    nodes: Vec<(Box<str>, PathNode<T>)>,
}

/// Static children grouped by segment length.
///
/// Buckets are sorted by length and entries inside a bucket by segment, so
/// a lookup is two binary searches with only same-length comparisons.
struct StaticChildren<T> {
    buckets: Vec<Bucket<T>>,
}

impl<T> StaticChildren<T> {
    fn new() -> Self {
        Self {
            buckets: Vec::new(),
        }
    }

    fn find(&self, segment: &str) -> Option<&PathNode<T>> {
        let b = self
            .buckets
            .binary_search_by_key(&segment.len(), |b| b.len)
            .ok()?;
        let bucket = &self.buckets[b];
        let n = bucket
            .nodes
            .binary_search_by(|(key, _)| key.as_ref().cmp(segment))
            .ok()?;
        Some(&bucket.nodes[n].1)
    }

    fn get_or_insert(&mut self, segment: &str) -> &mut PathNode<T> {
        let b = match self
            .buckets
            .binary_search_by_key(&segment.len(), |b| b.len)
        {
            Ok(b) => b,
            Err(b) => {
                self.buckets.insert(
                    b,
                    Bucket {
                        len: segment.len(),
                        nodes: Vec::new(),
                    },
                );
                b
            }
        };
        let nodes = &mut self.buckets[b].nodes;
        let n = match nodes.binary_search_by(|(key, _)| key.as_ref().cmp(segment)) {
            Ok(n) => n,
            Err(n) => {
                nodes.insert(n, (segment.into(), PathNode::new()));
                n
            }
        };
        &mut nodes[n].1
    }

    fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.nodes.len()).sum()
    }
}

struct ParamChild<T> {
    name: Arc<str>,
    node: PathNode<T>,
}

struct PathNode<T> {
    statics: StaticChildren<T>,
    param: Option<Box<ParamChild<T>>>,
    handler: Option<T>,
}

impl<T> PathNode<T> {
    fn new() -> Self {
        Self {
            statics: StaticChildren::new(),
            param: None,
            handler: None,
        }
    }

    fn count(&self) -> usize {
        let statics: usize = self
            .statics
            .buckets
            .iter()
            .flat_map(|b| b.nodes.iter())
            .map(|(_, n)| n.count())
            .sum();
        let param = self.param.as_ref().map_or(0, |p| p.node.count());
        1 + statics + param
    }
}

/// Outcome of [`PathTree::lookup`].
pub enum Lookup<'a, T> {
    /// Path resolved to a bound handler.
    Found(&'a T, Params),
    /// The method has a tree but the path does not resolve in it.
    NotFound,
    /// Nothing was ever registered for the method.
    MethodNotAllowed,
}

impl<T> fmt::Debug for Lookup<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Found(_, params) => f.debug_tuple("Found").field(params).finish(),
            Lookup::NotFound => f.write_str("NotFound"),
            Lookup::MethodNotAllowed => f.write_str("MethodNotAllowed"),
        }
    }
}

/// One trie per [`Method`].
pub struct PathTree<T> {
    roots: [Option<PathNode<T>>; 5],
    max_params: usize,
}

impl<T> PathTree<T> {
    pub fn new() -> Self {
        Self {
            roots: std::array::from_fn(|_| None),
            max_params: 0,
        }
    }

    /// Bind `handler` to `pattern` under `method`.
    ///
    /// Registering the same pattern twice replaces the handler.
    pub fn insert(&mut self, method: Method, pattern: &str, handler: T) -> Result<(), RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: "must start with '/'",
            });
        }

        let mut node = self.roots[method.index()].get_or_insert_with(PathNode::new);
        let mut param_count = 0;

        for segment in Segments::new(pattern) {
            node = match parameter_name(segment) {
                Some("") => {
                    return Err(RouteError::InvalidPattern {
                        pattern: pattern.to_owned(),
                        reason: "empty parameter name",
                    });
                }
                Some(name) => {
                    if let Some(existing) = &node.param {
                        if existing.name.as_ref() != name {
                            return Err(RouteError::ParameterNameConflict {
                                pattern: pattern.to_owned(),
                                existing: existing.name.to_string(),
                                requested: name.to_owned(),
                            });
                        }
                    }
                    param_count += 1;
                    let child = node.param.get_or_insert_with(|| {
                        Box::new(ParamChild {
                            name: name.into(),
                            node: PathNode::new(),
                        })
                    });
                    &mut child.node
                }
                None => node.statics.get_or_insert(segment),
            };
        }

        node.handler = Some(handler);
        self.max_params = self.max_params.max(param_count);
        Ok(())
    }

    /// Resolve `path` under `method`, capturing parameters into lists
    /// taken from `pool`.
    pub fn lookup<'a>(&'a self, method: Method, path: &str, pool: &Arc<ParameterPool>) -> Lookup<'a, T> {
        let Some(mut node) = self.roots[method.index()].as_ref() else {
            return Lookup::MethodNotAllowed;
        };
        if !path.is_empty() && !path.starts_with('/') {
            return Lookup::NotFound;
        }
        let mut params = Params::empty();

        for segment in Segments::new(path) {
            if let Some(child) = node.statics.find(segment) {
                node = child;
                continue;
            }
            match node.param.as_deref() {
                Some(param) if segment.len() > 1 => {
                    params.capture(pool, &param.name, &segment[1..]);
                    node = &param.node;
                }
                _ => return Lookup::NotFound,
            }
        }

        match &node.handler {
            Some(handler) => Lookup::Found(handler, params),
            None => Lookup::NotFound,
        }
    }

    /// Largest number of parameters in any registered pattern.
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Whether any route was registered under `method`.
    pub fn has_method(&self, method: Method) -> bool {
        self.roots[method.index()].is_some()
    }

    /// Total number of nodes across all methods, roots included.
    pub fn node_count(&self) -> usize {
        self.roots.iter().flatten().map(PathNode::count).sum()
    }
}

impl<T> Default for PathTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PathTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<_> = Method::ALL
            .into_iter()
            .filter(|m| self.has_method(*m))
            .collect();
        f.debug_struct("PathTree")
            .field("methods", &methods)
            .field("nodes", &self.node_count())
            .field("max_params", &self.max_params)
            .finish()
    }
}
