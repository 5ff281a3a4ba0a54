//! Ordered interceptor composition
//!
//! Stacks interceptors over a base scope as an explicit list instead of
//! hand-nested wrapping. Layers are added from the store outward: the last
//! layer added is the first one a leaf edit hits, and each layer's `accept`
//! becomes the partial delivered to the layer below it.

use super::interceptor::{Interceptor, Policy};
use crate::state::{DataScope, ErrorScope};
use std::sync::Arc;

/// An ordered stack of [`Interceptor`]s over a base `{data, update}` scope.
pub struct Pipeline {
    scope: DataScope,
    error_scope: Option<ErrorScope>,
    layers: Vec<Interceptor>,
}

impl Pipeline {
    /// Start from the scope updates should ultimately reach.
    pub fn new(base: DataScope) -> Self {
        Self {
            scope: base,
            error_scope: None,
            layers: Vec::new(),
        }
    }

    /// Wrap the current outermost scope in one more interceptor.
    pub fn layer(mut self, policy: Arc<dyn Policy>) -> Self {
        let interceptor = Interceptor::new(self.scope.clone(), policy);
        self.scope = interceptor.scope();
        self.error_scope = Some(interceptor.error_scope());
        self.layers.push(interceptor);
        self
    }

    /// The outermost `{data, update}` handle; leaf bindings attach here.
    pub fn scope(&self) -> DataScope {
        self.scope.clone()
    }

    /// The outermost `{errors}` handle, once at least one layer exists.
    pub fn error_scope(&self) -> Option<ErrorScope> {
        self.error_scope.clone()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
