//! Generic update interceptor
//!
//! An [`Interceptor`] wraps the update path of whatever sits above it. It
//! keeps a draft of everything its descendants changed plus a per-field
//! error map, and delegates the forward/reject decision to a [`Policy`].
//! The draft and errors are republished synchronously on every intercepted
//! edit, strictly before the policy resolves, so downstream readers never
//! lag behind the latest keystroke.

use crate::state::{DataScope, DataSource, ErrorMap, ErrorScope, ErrorSource, FormState, RenderHook, UpdateRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Decision logic driving an [`Interceptor`].
///
/// `apply` receives the partial update that triggered it, a snapshot of the
/// draft after that update was merged in, and a [`Decision`] handle. It may
/// resolve immediately or hold the decision across awaits; several calls can
/// be in flight at once, in which case whichever completes last wins on
/// draft/error state.
#[async_trait]
pub trait Policy: Send + Sync {
    async fn apply(&self, request: UpdateRequest, draft: FormState, decision: Decision);
}

/// The degenerate always-accept policy.
pub struct Forward;

#[async_trait]
impl Policy for Forward {
    async fn apply(&self, request: UpdateRequest, _draft: FormState, decision: Decision) {
        decision.accept(request);
    }
}

/// Recognized configuration for an [`Interceptor`].
#[derive(Default)]
pub struct InterceptorOptions {
    /// Host render sink, fired on every republish.
    pub on_render: Option<RenderHook>,
}

#[derive(Default)]
pub(crate) struct DraftState {
    pub(crate) draft: FormState,
    pub(crate) errors: ErrorMap,
}

pub(crate) struct InterceptorShared {
    pub(crate) upstream: DataScope,
    policy: Arc<dyn Policy>,
    state: Mutex<DraftState>,
    on_render: Option<RenderHook>,
    // Bumped per intercept; lets a slow policy's completion be flagged as
    // out of order.
    generation: AtomicU64,
}

impl InterceptorShared {
    pub(crate) fn new(
        upstream: DataScope,
        policy: Arc<dyn Policy>,
        options: InterceptorOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            upstream,
            policy,
            state: Mutex::new(DraftState::default()),
            on_render: options.on_render,
            generation: AtomicU64::new(0),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DraftState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn draft(&self) -> FormState {
        self.lock().draft.clone()
    }

    pub(crate) fn errors(&self) -> ErrorMap {
        self.lock().errors.clone()
    }

    /// Published data: live upstream state with the local draft overlaid.
    pub(crate) fn merged(&self) -> FormState {
        let mut data = self.upstream.data();
        data.overlay(&self.lock().draft);
        data
    }

    pub(crate) fn republish(&self) {
        if let Some(on_render) = &self.on_render {
            let errors = self.errors();
            on_render(&self.merged(), &errors);
        }
        tracing::trace!("republished draft and errors");
    }

    /// The intercept sequence: merge the partial into the draft, clear stale
    /// errors for the edited keys (a new edit invalidates them regardless of
    /// whether the new value is itself valid), republish, then hand the
    /// decision to the policy on a spawned task.
    pub(crate) fn intercept(self: &Arc<Self>, request: UpdateRequest) {
        let draft = {
            let mut state = self.lock();
            state.draft.apply(&request);
            for field in request.fields() {
                state.errors.remove(field);
            }
            state.draft.clone()
        };
        tracing::debug!(
            fields = ?request.fields().collect::<Vec<_>>(),
            "intercepted update"
        );
        self.republish();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let policy = Arc::clone(&self.policy);
        let decision = Decision {
            shared: Arc::clone(self),
            generation,
        };
        tokio::spawn(async move {
            policy.apply(request, draft, decision).await;
        });
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

pub(crate) struct InterceptorSource(pub(crate) Arc<InterceptorShared>);

impl DataSource for InterceptorSource {
    fn data(&self) -> FormState {
        self.0.merged()
    }

    fn update(&self, request: UpdateRequest) {
        self.0.intercept(request);
    }
}

pub(crate) struct InterceptorErrors(pub(crate) Arc<InterceptorShared>);

impl ErrorSource for InterceptorErrors {
    fn errors(&self) -> ErrorMap {
        self.0.errors()
    }
}

/// One-shot resolution handle given to a [`Policy`].
///
/// Consuming `accept`/`reject` methods make double resolution unrepresentable;
/// dropping the handle without resolving leaves the edit parked in the draft,
/// which only the debounce policy is sanctioned to do (on cancellation).
pub struct Decision {
    shared: Arc<InterceptorShared>,
    generation: u64,
}

impl Decision {
    /// Forward data (full or partial state) to the level above.
    pub fn accept(self, data: impl Into<UpdateRequest>) {
        let request = data.into();
        if self.shared.is_stale(self.generation) {
            // Known race: a newer edit has been intercepted since this policy
            // started. Its result still applies, completion order wins.
            tracing::warn!("out-of-order policy completion forwarding upward");
        }
        tracing::debug!(
            fields = ?request.fields().collect::<Vec<_>>(),
            "accepted update, forwarding upstream"
        );
        self.shared.upstream.update(request);
    }

    /// Replace the error map and republish; nothing moves upward.
    pub fn reject(self, errors: ErrorMap) {
        tracing::debug!(fields = ?errors.keys().collect::<Vec<_>>(), "rejected update");
        self.report(errors);
    }

    /// Replace the error map without resolving the decision. Lets a policy
    /// record validator output before accepting.
    pub fn report(&self, errors: ErrorMap) {
        if self.shared.is_stale(self.generation) {
            tracing::warn!("out-of-order policy completion updating errors");
        }
        self.shared.lock().errors = errors;
        self.shared.republish();
    }
}

/// Middleware stage between descendants and the level above.
///
/// Descendants write through [`Interceptor::scope`] exactly as they would
/// write to a store; the interceptor's policy decides whether, when, and in
/// what shape the change continues upward. Stages compose: hand one
/// interceptor's scope to the next as its upstream (or use
/// [`Pipeline`](crate::Pipeline) for an ordered list).
pub struct Interceptor {
    shared: Arc<InterceptorShared>,
}

impl Interceptor {
    /// Must be called within a tokio runtime; policies run as spawned tasks.
    pub fn new(upstream: DataScope, policy: Arc<dyn Policy>) -> Self {
        Self::with_options(upstream, policy, InterceptorOptions::default())
    }

    pub fn with_options(
        upstream: DataScope,
        policy: Arc<dyn Policy>,
        options: InterceptorOptions,
    ) -> Self {
        Self {
            shared: InterceptorShared::new(upstream, policy, options),
        }
    }

    /// Feed a partial update into this stage directly.
    pub fn intercept(&self, request: UpdateRequest) {
        self.shared.intercept(request);
    }

    /// The `{data, update}` handle descendants should use; `data` is live
    /// upstream state with the draft overlaid, `update` feeds this stage.
    pub fn scope(&self) -> DataScope {
        DataScope::new(Arc::new(InterceptorSource(Arc::clone(&self.shared))))
    }

    /// The `{errors}` handle for error-display descendants.
    pub fn error_scope(&self) -> ErrorScope {
        ErrorScope::new(Arc::new(InterceptorErrors(Arc::clone(&self.shared))))
    }

    /// Current draft overlay.
    pub fn draft(&self) -> FormState {
        self.shared.draft()
    }

    /// Current error map.
    pub fn errors(&self) -> ErrorMap {
        self.shared.errors()
    }
}
