//! Per-level authoritative state container

use super::scope::{ChangeHook, DataScope, DataSource, RenderHook};
use super::value::{ErrorMap, FormState, UpdateRequest};
use crate::error::FormError;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

/// Recognized configuration for a [`StateStore`].
#[derive(Default)]
pub struct StoreOptions {
    /// Seed state; missing means start empty.
    pub initial_data: Option<FormState>,
    /// External sink notified with the full new state after each commit.
    pub on_change: Option<ChangeHook>,
    /// Field name this store binds to inside its parent. Required for
    /// nested stores, ignored for the root.
    pub field: Option<String>,
    /// Host render sink, fired after each commit.
    pub on_render: Option<RenderHook>,
}

/// Owner of one nesting level's authoritative [`FormState`].
///
/// Children never touch the map directly; every change arrives as an
/// [`UpdateRequest`] through the store's published [`DataScope`], is
/// shallow-merged, and is then re-broadcast: the parent store (if any) gets
/// the full new state as the value of this store's field, the configured
/// `on_change` sink fires, and descendants observe the new state through the
/// scope.
pub struct StateStore {
    shared: Arc<StoreShared>,
}

struct ParentLink {
    scope: DataScope,
    field: String,
}

struct StoreShared {
    data: Mutex<FormState>,
    parent: Option<ParentLink>,
    on_change: Option<ChangeHook>,
    on_render: Option<RenderHook>,
}

struct StoreSource(Arc<StoreShared>);

impl DataSource for StoreSource {
    fn data(&self) -> FormState {
        self.0.snapshot()
    }

    fn update(&self, request: UpdateRequest) {
        self.0.commit(request);
    }
}

impl StoreShared {
    fn snapshot(&self) -> FormState {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn commit(&self, request: UpdateRequest) {
        let next = {
            let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
            data.apply(&request);
            data.clone()
        };
        tracing::debug!(
            fields = ?request.fields().collect::<Vec<_>>(),
            "merged update into form state"
        );

        if let Some(parent) = &self.parent {
            // Keep the whole tree in sync: the parent sees this level as one
            // field whose value is the full new state.
            parent
                .scope
                .update(UpdateRequest::set(parent.field.clone(), next.clone()));
        }
        if let Some(on_change) = &self.on_change {
            on_change(&next);
        }
        if let Some(on_render) = &self.on_render {
            on_render(&next, &ErrorMap::new());
        }
    }
}

impl StateStore {
    /// Create a top-level store. `on_change` is optional here; there is no
    /// parent to notify.
    pub fn root(options: StoreOptions) -> Self {
        let shared = Arc::new(StoreShared {
            data: Mutex::new(options.initial_data.unwrap_or_default()),
            parent: None,
            on_change: options.on_change,
            on_render: options.on_render,
        });
        Self { shared }
    }

    /// Create a store bound to one field of a parent's state.
    ///
    /// Fails fast with [`FormError::NestedWithoutField`] when `options.field`
    /// is missing, and with [`FormError::NotAnObject`] when the parent
    /// already holds a non-object value under that field. Seeds from the
    /// parent's current value for the field when present, falling back to
    /// `initial_data`.
    pub fn nested(parent: &DataScope, options: StoreOptions) -> Result<Self, FormError> {
        let field = options.field.ok_or(FormError::NestedWithoutField)?;

        let initial = match parent.value(&field) {
            Some(value) => FormState::from_value(value)?,
            None => options.initial_data.unwrap_or_default(),
        };

        let shared = Arc::new(StoreShared {
            data: Mutex::new(initial),
            parent: Some(ParentLink {
                scope: parent.clone(),
                field,
            }),
            on_change: options.on_change,
            on_render: options.on_render,
        });
        Ok(Self { shared })
    }

    /// The `{data, update}` handle this store publishes to descendants.
    pub fn scope(&self) -> DataScope {
        DataScope::new(Arc::new(StoreSource(Arc::clone(&self.shared))))
    }

    /// Current authoritative state.
    pub fn data(&self) -> FormState {
        self.shared.snapshot()
    }

    /// Single-field read of the authoritative state.
    pub fn value(&self, field: &str) -> Option<Value> {
        self.data().get(field).cloned()
    }

    /// Merge a partial update and re-broadcast.
    pub fn update(&self, request: UpdateRequest) {
        self.shared.commit(request);
    }
}
