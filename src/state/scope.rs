//! Downward-published handles for descendants
//!
//! Each store or interceptor hands its descendants an explicit
//! [`DataScope`] (`{data, update}`) and, where it tracks errors, an
//! [`ErrorScope`]. Descendants keep the handle they were given; there is no
//! ambient context to look things up in.

use super::value::{ErrorMap, FormState, UpdateRequest};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Host sink invoked after a level republishes, with the published data and
/// errors. This is the core's only outward call besides parent notification.
pub type RenderHook = Box<dyn Fn(&FormState, &ErrorMap) + Send + Sync>;

/// External sink invoked with the new authoritative state after each commit.
pub type ChangeHook = Box<dyn Fn(&FormState) + Send + Sync>;

pub(crate) trait DataSource: Send + Sync {
    fn data(&self) -> FormState;
    fn update(&self, request: UpdateRequest);
}

pub(crate) trait ErrorSource: Send + Sync {
    fn errors(&self) -> ErrorMap;
}

/// The `{data, update}` pair one level publishes to everything below it.
///
/// `data` reads live through whatever publishes it, so a scope captured at
/// construction time never goes stale. `update` is the only sanctioned write
/// path; descendants never mutate state directly.
#[derive(Clone)]
pub struct DataScope {
    source: Arc<dyn DataSource>,
}

impl DataScope {
    pub(crate) fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Current published state at this level.
    pub fn data(&self) -> FormState {
        self.source.data()
    }

    /// Convenience single-field read; an absent key is `None`, not an error.
    pub fn value(&self, field: &str) -> Option<Value> {
        self.data().get(field).cloned()
    }

    /// Send a partial update into this level's update path.
    pub fn update(&self, request: UpdateRequest) {
        self.source.update(request);
    }
}

impl fmt::Debug for DataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataScope").finish_non_exhaustive()
    }
}

/// The `{errors}` half of what an interceptor publishes downward.
#[derive(Clone)]
pub struct ErrorScope {
    source: Arc<dyn ErrorSource>,
}

impl ErrorScope {
    pub(crate) fn new(source: Arc<dyn ErrorSource>) -> Self {
        Self { source }
    }

    /// Current error map at this level.
    pub fn errors(&self) -> ErrorMap {
        self.source.errors()
    }

    /// Convenience single-field read.
    pub fn error(&self, field: &str) -> Option<Value> {
        self.errors().get(field).cloned()
    }
}

impl fmt::Debug for ErrorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorScope").finish_non_exhaustive()
    }
}
