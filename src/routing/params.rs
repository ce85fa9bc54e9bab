//! Captured route parameters and their allocation pool.
//!
//! # Responsibilities
//! - Store `(name, value)` captures in insertion order
//! - Recycle capture buffers between requests
//! - Return buffers to the pool once a handler is done with them
//!
//! # Design Decisions
//! - Parameter names are shared `Arc<str>` taken from the tree, never copied
//! - Value buffers keep their allocation across requests
//! - The pool is a bounded stack behind one mutex; the lock covers only
//!   the push/pop, never request handling
//! - Lists pushed beyond `max_size` are dropped, not retained

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct Parameter {
    name: Arc<str>,
    value: String,
}

/// Ordered list of captured parameters.
///
/// Slots past `len` keep their value buffers so a recycled list can be
/// refilled without allocating. The capacity a list is created with is a
/// sizing hint, not a limit: `set` grows the list past it. Routers keep
/// pooled lists sized for their largest route, so growth only happens for
/// lists built by hand.
#[derive(Debug, Clone, Default)]
pub struct ParameterList {
    entries: Vec<Parameter>,
    len: usize,
}

impl ParameterList {
    /// Create an empty list sized for `capacity` parameters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Append a capture.
    pub fn set(&mut self, name: Arc<str>, value: &str) {
        match self.entries.get_mut(self.len) {
            Some(slot) => {
                slot.name = name;
                slot.value.clear();
                slot.value.push_str(value);
            }
            None => self.entries.push(Parameter {
                name,
                value: value.to_owned(),
            }),
        }
        self.len += 1;
    }

    /// Value of the first parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Captures in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries[..self.len]
            .iter()
            .map(|p| (p.name.as_ref(), p.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forget all captures while keeping the buffers.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}

struct PoolState {
    stack: Vec<ParameterList>,
    max_size: usize,
    max_params: usize,
}

/// Bounded free-list of [`ParameterList`]s.
pub struct ParameterPool {
    state: Mutex<PoolState>,
}

impl ParameterPool {
    /// Create a pool holding `initial_size` lists of `max_params` capacity,
    /// retaining at most `max_size` lists. Preallocation never exceeds
    /// `max_size`.
    pub fn new(max_params: usize, initial_size: usize, max_size: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                stack: preallocate(max_params, initial_size.min(max_size)),
                max_size,
                max_params,
            }),
        }
    }

    /// Drop every pooled list and start over with new sizing.
    ///
    /// Needed whenever the largest parameter count of the owning router
    /// grows, since existing lists were sized for the old maximum.
    pub fn init(&self, max_params: usize, initial_size: usize, max_size: usize) {
        let mut state = self.lock();
        state.stack = preallocate(max_params, initial_size.min(max_size));
        state.max_size = max_size;
        state.max_params = max_params;
    }

    /// Take a cleared list from the pool, or allocate one if it is empty.
    pub fn get(&self) -> ParameterList {
        let mut state = self.lock();
        match state.stack.pop() {
            Some(mut list) => {
                list.clear();
                list
            }
            None => ParameterList::with_capacity(state.max_params),
        }
    }

    /// Give a list back. Silently dropped when the pool is full.
    pub fn push(&self, list: ParameterList) {
        let mut state = self.lock();
        if state.stack.len() < state.max_size {
            state.stack.push(list);
        }
    }

    /// Number of lists currently retained.
    pub fn len(&self) -> usize {
        self.lock().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.lock().max_size
    }

    pub fn max_params(&self) -> usize {
        self.lock().max_params
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // Pool state is valid after any panic: push/pop never leave it half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ParameterPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ParameterPool")
            .field("pooled", &state.stack.len())
            .field("max_size", &state.max_size)
            .field("max_params", &state.max_params)
            .finish()
    }
}

fn preallocate(max_params: usize, size: usize) -> Vec<ParameterList> {
    (0..size)
        .map(|_| ParameterList::with_capacity(max_params))
        .collect()
}

struct Pooled {
    list: ParameterList,
    pool: Arc<ParameterPool>,
}

impl Drop for Pooled {
    fn drop(&mut self) {
        self.pool.push(std::mem::take(&mut self.list));
    }
}

/// Parameters captured for one request.
///
/// Holds a pooled [`ParameterList`] only when the route actually captured
/// something. The list goes back to its pool when this value is dropped,
/// which for a handler means once its response future has completed.
#[derive(Default)]
pub struct Params {
    inner: Option<Pooled>,
}

impl Params {
    /// Parameters for a route without captures.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record a capture, taking a list from `pool` on first use.
    pub(crate) fn capture(&mut self, pool: &Arc<ParameterPool>, name: &Arc<str>, value: &str) {
        let pooled = self.inner.get_or_insert_with(|| Pooled {
            list: pool.get(),
            pool: Arc::clone(pool),
        });
        pooled.list.set(Arc::clone(name), value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.as_ref().and_then(|p| p.list.get(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().flat_map(|p| p.list.iter())
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |p| p.list.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
