//! Validating interceptor
//!
//! Wraps the update path with an asynchronous per-field validator. Edits are
//! shown optimistically (the typed value lands in the draft and is published
//! before validation completes); only changes the validator passes continue
//! upward. Superseded validations are not cancelled: whichever completion
//! lands last wins the draft/error state. An out-of-order completion is
//! flagged at `warn!` level when it happens rather than corrected.

use super::interceptor::{
    Decision, InterceptorErrors, InterceptorOptions, InterceptorShared, Policy,
};
use crate::state::{
    DataScope, DataSource, ErrorMap, ErrorScope, FormState, RenderHook, UpdateRequest,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome of validating one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_valid: bool,
    pub errors: ErrorMap,
}

impl Verdict {
    /// Clean pass, no errors.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: ErrorMap::new(),
        }
    }

    pub fn invalid(errors: ErrorMap) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }

    /// Single-field failure shorthand.
    pub fn fail(field: impl Into<String>, error: impl Into<Value>) -> Self {
        let mut errors = ErrorMap::new();
        errors.insert(field.into(), error.into());
        Self::invalid(errors)
    }
}

/// Per-field asynchronous validation, supplied by the host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, field: &str, value: &Value) -> Verdict;
}

/// Recognized configuration for a [`ValidationGuard`].
#[derive(Default)]
pub struct ValidationOptions {
    /// Validator to run per changed field; absent means always valid.
    pub on_validate: Option<Arc<dyn Validator>>,
    /// Host render sink, fired on every republish.
    pub on_render: Option<RenderHook>,
}

struct ValidatePolicy {
    validator: Option<Arc<dyn Validator>>,
}

#[async_trait]
impl Policy for ValidatePolicy {
    async fn apply(&self, request: UpdateRequest, _draft: FormState, decision: Decision) {
        let Some(validator) = &self.validator else {
            // Degenerate pass-through.
            decision.accept(request);
            return;
        };

        let mut errors = ErrorMap::new();
        let mut is_valid = true;
        for (field, value) in request.entries() {
            let verdict = validator.validate(field, value).await;
            if !verdict.is_valid {
                is_valid = false;
            }
            errors.extend(verdict.errors);
        }

        if is_valid {
            // The validator may return advisory errors alongside a pass;
            // record them either way, then forward.
            decision.report(errors);
            decision.accept(request);
        } else {
            tracing::debug!(
                fields = ?request.fields().collect::<Vec<_>>(),
                "validation failed, keeping update local"
            );
            decision.reject(errors);
        }
    }
}

/// Interceptor specialization that forwards only validated changes.
///
/// Publishes the unsaved edit overlay on top of the last-seen authoritative
/// state: when the state above changes it is folded in underneath the
/// overlay, so an in-flight edit is never clobbered, and a value-equal
/// republish from above leaves everything untouched.
pub struct ValidationGuard {
    shared: Arc<InterceptorShared>,
    seen: Arc<Mutex<FormState>>,
}

struct GuardSource {
    shared: Arc<InterceptorShared>,
    seen: Arc<Mutex<FormState>>,
}

/// The guard's published data: last-seen authoritative state underneath the
/// edit overlay. The equality check keeps a value-equal upstream republish
/// from counting as a resync.
fn published(shared: &InterceptorShared, seen: &Mutex<FormState>) -> FormState {
    let upstream = shared.upstream.data();
    let mut seen = seen.lock().unwrap_or_else(PoisonError::into_inner);
    if *seen != upstream {
        *seen = upstream;
        tracing::trace!("resynchronized with new authoritative state");
    }
    let mut data = seen.clone();
    drop(seen);
    data.overlay(&shared.draft());
    data
}

impl DataSource for GuardSource {
    fn data(&self) -> FormState {
        published(&self.shared, &self.seen)
    }

    fn update(&self, request: UpdateRequest) {
        self.shared.intercept(request);
    }
}

impl ValidationGuard {
    /// Guard with no validator: always valid, no errors.
    pub fn new(upstream: DataScope) -> Self {
        Self::with_options(upstream, ValidationOptions::default())
    }

    pub fn with_validator(upstream: DataScope, validator: Arc<dyn Validator>) -> Self {
        Self::with_options(
            upstream,
            ValidationOptions {
                on_validate: Some(validator),
                ..Default::default()
            },
        )
    }

    /// Must be called within a tokio runtime; validations run as spawned
    /// tasks.
    pub fn with_options(upstream: DataScope, options: ValidationOptions) -> Self {
        let policy = Arc::new(ValidatePolicy {
            validator: options.on_validate,
        });
        let shared = InterceptorShared::new(
            upstream,
            policy,
            InterceptorOptions {
                on_render: options.on_render,
            },
        );
        Self {
            shared,
            seen: Arc::new(Mutex::new(FormState::new())),
        }
    }

    /// Feed a partial update into the guard directly.
    pub fn intercept(&self, request: UpdateRequest) {
        self.shared.intercept(request);
    }

    /// The `{data, update}` handle descendants should use.
    pub fn scope(&self) -> DataScope {
        DataScope::new(Arc::new(GuardSource {
            shared: Arc::clone(&self.shared),
            seen: Arc::clone(&self.seen),
        }))
    }

    /// The `{errors}` handle for error-display descendants.
    pub fn error_scope(&self) -> ErrorScope {
        ErrorScope::new(Arc::new(InterceptorErrors(Arc::clone(&self.shared))))
    }

    /// Published data: last-seen authoritative state under the edit overlay.
    pub fn draft(&self) -> FormState {
        published(&self.shared, &self.seen)
    }

    /// Current error map.
    pub fn errors(&self) -> ErrorMap {
        self.shared.errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{StateStore, StoreOptions};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state(value: serde_json::Value) -> FormState {
        FormState::from_value(value).unwrap()
    }

    fn seeded(value: serde_json::Value) -> StateStore {
        StateStore::root(StoreOptions {
            initial_data: Some(state(value)),
            ..Default::default()
        })
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    /// Validator requiring the `test` field to equal `"two"`.
    struct MustBeTwo;

    #[async_trait]
    impl Validator for MustBeTwo {
        async fn validate(&self, field: &str, value: &Value) -> Verdict {
            if field == "test" && value != &json!("two") {
                Verdict::fail("test", "must be two")
            } else {
                Verdict::valid()
            }
        }
    }

    mod validation {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_invalid_value_is_kept_local_with_errors() {
            let store = seeded(json!({"test": "foo"}));
            let guard = ValidationGuard::with_validator(store.scope(), Arc::new(MustBeTwo));

            guard.intercept(UpdateRequest::set("test", "something"));
            settle().await;

            assert_eq!(guard.errors().get("test"), Some(&json!("must be two")));
            // Not forwarded: the store keeps the old value.
            assert_eq!(store.value("test"), Some(json!("foo")));
            // Optimistic UI: the invalid value still shows in the draft.
            assert_eq!(guard.draft().get("test"), Some(&json!("something")));
        }

        #[tokio::test]
        async fn test_valid_value_is_forwarded_once() {
            let forwards = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&forwards);
            let store = StateStore::root(StoreOptions {
                initial_data: Some(state(json!({"test": "foo"}))),
                on_change: Some(Box::new(move |data| {
                    sink.lock().unwrap().push(data.clone());
                })),
                ..Default::default()
            });
            let guard = ValidationGuard::with_validator(store.scope(), Arc::new(MustBeTwo));

            guard.intercept(UpdateRequest::set("test", "two"));
            settle().await;

            let forwards = forwards.lock().unwrap();
            assert_eq!(forwards.len(), 1);
            assert_eq!(forwards[0], state(json!({"test": "two"})));
            assert!(guard.errors().is_empty());
        }

        #[tokio::test]
        async fn test_missing_validator_passes_everything() {
            let store = StateStore::root(StoreOptions::default());
            let guard = ValidationGuard::new(store.scope());

            guard.intercept(UpdateRequest::set("test", "anything"));
            settle().await;

            assert_eq!(store.value("test"), Some(json!("anything")));
            assert!(guard.errors().is_empty());
        }

        #[tokio::test]
        async fn test_next_edit_clears_previous_error_optimistically() {
            let store = seeded(json!({"test": "foo"}));
            let guard = ValidationGuard::with_validator(store.scope(), Arc::new(MustBeTwo));

            guard.intercept(UpdateRequest::set("test", "something"));
            settle().await;
            assert!(guard.errors().contains_key("test"));

            // Cleared synchronously on the next edit, before the validator
            // gets a say on the new value.
            guard.intercept(UpdateRequest::set("test", "still wrong"));
            assert!(!guard.errors().contains_key("test"));
        }

        #[tokio::test]
        async fn test_mock_validator_sees_field_and_value() {
            let mut mock = MockValidator::new();
            mock.expect_validate()
                .withf(|field, value| field == "test" && value == &json!("bar"))
                .times(1)
                .returning(|_, _| Verdict::valid());

            let store = StateStore::root(StoreOptions::default());
            let guard = ValidationGuard::with_validator(store.scope(), Arc::new(mock));

            guard.intercept(UpdateRequest::set("test", "bar"));
            settle().await;

            assert_eq!(store.value("test"), Some(json!("bar")));
        }
    }

    mod resync {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_draft_follows_authoritative_state() {
            let store = seeded(json!({"test": "foo"}));
            let guard = ValidationGuard::new(store.scope());

            assert_eq!(guard.draft(), state(json!({"test": "foo"})));

            store.update(UpdateRequest::set("test", "bar"));
            assert_eq!(guard.draft(), state(json!({"test": "bar"})));
        }

        #[tokio::test]
        async fn test_authoritative_change_keeps_unsaved_overlay() {
            let store = seeded(json!({"one": "hello", "test": "foo"}));
            let guard = ValidationGuard::with_validator(store.scope(), Arc::new(MustBeTwo));

            // Unsaved (invalid) edit sits in the overlay.
            guard.intercept(UpdateRequest::set("test", "draft edit"));
            settle().await;

            // Some other path changes a different field upstream.
            store.update(UpdateRequest::set("one", "changed"));

            let draft = guard.draft();
            assert_eq!(draft.get("one"), Some(&json!("changed")));
            assert_eq!(draft.get("test"), Some(&json!("draft edit")));
        }

        #[tokio::test]
        async fn test_identical_republish_does_not_touch_draft() {
            let store = seeded(json!({"test": "foo"}));
            let guard = ValidationGuard::with_validator(store.scope(), Arc::new(MustBeTwo));

            guard.intercept(UpdateRequest::set("test", "draft edit"));
            settle().await;
            let before = guard.draft();

            // Re-commit a value-equal state upstream.
            store.update(UpdateRequest::set("test", "foo"));

            assert_eq!(guard.draft(), before);
        }
    }
}
