//! Form state values and partial-update requests

use crate::error::FormError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-field validation errors, keyed by field name. Error values are opaque
/// to the core; a key being present means the field's current draft value has
/// not been forwarded upward since the error was set.
pub type ErrorMap = Map<String, Value>;

/// One nesting level's key-value snapshot of form field values.
///
/// Values are arbitrary JSON; a nested object is how a child form appears as
/// a single field of its parent. Merging is shallow: a changed top-level key
/// replaces the old value wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(Map<String, Value>);

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from a JSON value; anything but an object is a seeding
    /// error.
    pub fn from_value(value: Value) -> Result<Self, FormError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(FormError::NotAnObject(json_type(&other))),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Shallow-merge a partial update: each key in the request overwrites the
    /// corresponding top-level key here, untouched keys survive.
    pub fn apply(&mut self, request: &UpdateRequest) {
        self.overlay(request.state());
    }

    /// Shallow-merge another state on top of this one (the other side wins on
    /// shared keys).
    pub fn overlay(&mut self, other: &FormState) {
        for (field, value) in other.entries() {
            self.0.insert(field.clone(), value.clone());
        }
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for FormState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<FormState> for Value {
    fn from(state: FormState) -> Self {
        Value::Object(state.0)
    }
}

impl FromIterator<(String, Value)> for FormState {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A partial update describing only changed keys, never a full-state
/// replacement. Created by a leaf binding on user edit, possibly transformed
/// by interceptors on the way up, terminally merged into a store's
/// [`FormState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest(FormState);

impl UpdateRequest {
    /// A single-field update, the shape every leaf edit starts as.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut state = FormState::new();
        state.set(field, value);
        Self(state)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.fields()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.entries()
    }

    pub fn state(&self) -> &FormState {
        &self.0
    }

    pub fn into_state(self) -> FormState {
        self.0
    }
}

impl From<FormState> for UpdateRequest {
    fn from(state: FormState) -> Self {
        Self(state)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
