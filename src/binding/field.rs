//! Read/write binding for a single field

use crate::state::{DataScope, UpdateRequest};
use serde_json::Value;

/// Pure mapping from the raw UI value to the stored value, applied before
/// the update request is built.
pub type Transform = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// Connects one scalar field to a leaf editor.
///
/// Reads go through the nearest published `{data, update}` scope, writes are
/// turned into single-field [`UpdateRequest`]s — the binding never mutates
/// state directly.
pub struct FieldBinding {
    scope: DataScope,
    field: String,
    transform: Option<Transform>,
}

impl FieldBinding {
    pub fn new(scope: DataScope, field: impl Into<String>) -> Self {
        Self {
            scope,
            field: field.into(),
            transform: None,
        }
    }

    /// Attach a raw-value transform (e.g. trimming, parsing).
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Current value for the field; an absent key is `None`, not an error.
    pub fn value(&self) -> Option<Value> {
        self.scope.value(&self.field)
    }

    /// Handle a user edit: transform the raw value and send it up the
    /// update path.
    pub fn set(&self, raw: impl Into<Value>) {
        let value = match &self.transform {
            Some(transform) => transform(raw.into()),
            None => raw.into(),
        };
        self.scope.update(UpdateRequest::set(self.field.clone(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FormState, StateStore, StoreOptions};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn seeded(value: serde_json::Value) -> StateStore {
        StateStore::root(StoreOptions {
            initial_data: Some(FormState::from_value(value).unwrap()),
            ..Default::default()
        })
    }

    #[test]
    fn test_reads_current_value() {
        let store = seeded(json!({"test": "foo"}));
        let binding = FieldBinding::new(store.scope(), "test");

        assert_eq!(binding.value(), Some(json!("foo")));
    }

    #[test]
    fn test_absent_field_reads_none() {
        let store = StateStore::root(StoreOptions::default());
        let binding = FieldBinding::new(store.scope(), "missing");

        assert_eq!(binding.value(), None);
    }

    #[test]
    fn test_set_goes_through_update_path() {
        let store = seeded(json!({"test": "foo"}));
        let binding = FieldBinding::new(store.scope(), "test");

        binding.set("bar");

        assert_eq!(binding.value(), Some(json!("bar")));
        assert_eq!(store.value("test"), Some(json!("bar")));
    }

    #[test]
    fn test_transform_applies_before_store() {
        let store = StateStore::root(StoreOptions::default());
        let binding = FieldBinding::new(store.scope(), "test").with_transform(Box::new(|raw| {
            match raw {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other,
            }
        }));

        binding.set("  padded  ");

        assert_eq!(store.value("test"), Some(json!("padded")));
    }
}
