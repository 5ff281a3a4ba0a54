//! Read-only binding to the nearest error map

use crate::state::{ErrorMap, ErrorScope};
use serde_json::Value;

/// What an error display should render right now.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorView {
    /// Bound mode: one field's error, `None` when the field is clean (only
    /// produced under a `show` override).
    Field {
        field: String,
        error: Option<Value>,
    },
    /// Unbound mode: the whole error map.
    All(ErrorMap),
}

/// Read-only consumer of the nearest [`ErrorScope`].
pub struct ErrorBinding {
    scope: ErrorScope,
    field: Option<String>,
    show: bool,
}

impl ErrorBinding {
    /// Bound to one field: yields only that field's error.
    pub fn bound(scope: ErrorScope, field: impl Into<String>) -> Self {
        Self {
            scope,
            field: Some(field.into()),
            show: false,
        }
    }

    /// Unbound: yields the whole error map when non-empty.
    pub fn unbound(scope: ErrorScope) -> Self {
        Self {
            scope,
            field: None,
            show: false,
        }
    }

    /// Force a view even with no matching error, for displays that want to
    /// know the field is clean.
    pub fn with_show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }

    /// What to render now; `None` means render nothing.
    pub fn current(&self) -> Option<ErrorView> {
        let errors = self.scope.errors();
        match &self.field {
            Some(field) => {
                let error = errors.get(field).cloned();
                if error.is_some() || self.show {
                    Some(ErrorView::Field {
                        field: field.clone(),
                        error,
                    })
                } else {
                    None
                }
            }
            None => {
                if !errors.is_empty() || self.show {
                    Some(ErrorView::All(errors))
                } else {
                    None
                }
            }
        }
    }
}
