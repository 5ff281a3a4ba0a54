//! Formwork - hierarchical form state with composable update interceptors
//!
//! A headless form-state engine: every nesting level owns an authoritative
//! key-value map ([`StateStore`]), leaf editors read and write through
//! [`FieldBinding`]s, and any number of [`Interceptor`]s can sit between a
//! leaf edit and the store above it, buffering, validating, delaying or
//! rejecting the change before it commits.
//!
//! Data flows bottom-up (binding → interceptors → store → parent store) as
//! [`UpdateRequest`]s; authoritative state and validation errors flow back
//! down through explicit [`DataScope`] / [`ErrorScope`] handles that each
//! level publishes to its descendants.
//!
//! Interceptor policies run as spawned tasks, so anything that constructs an
//! [`Interceptor`] (or one of its specializations) must live inside a tokio
//! runtime.

mod binding;
mod error;
mod middleware;
mod state;

pub use binding::{ErrorBinding, ErrorView, FieldBinding, Transform};
pub use error::FormError;
pub use middleware::{
    DebounceGuard, DebounceOptions, Decision, Forward, Interceptor, InterceptorOptions, Pipeline,
    Policy, ValidationGuard, ValidationOptions, Validator, Verdict,
};
pub use state::{
    ChangeHook, DataScope, ErrorMap, ErrorScope, FormState, RenderHook, StateStore, StoreOptions,
    UpdateRequest,
};
