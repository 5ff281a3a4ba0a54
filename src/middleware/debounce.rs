//! Debouncing interceptor
//!
//! Coalesces rapid successive updates into one forwarded call after a quiet
//! interval (trailing edge). The pending timer is owned by the guard that
//! created it: rescheduling aborts it, and dropping the guard aborts it, so
//! a torn-down guard can never fire into a dead tree.

use super::interceptor::{
    Decision, InterceptorOptions, InterceptorShared, InterceptorSource, Policy,
};
use crate::state::{DataScope, FormState, RenderHook, UpdateRequest};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Recognized configuration for a [`DebounceGuard`].
pub struct DebounceOptions {
    /// Quiet interval before the latest draft is forwarded.
    pub wait: Duration,
    /// Host render sink, fired on every republish.
    pub on_render: Option<RenderHook>,
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(1),
            on_render: None,
        }
    }
}

struct DebouncePolicy {
    wait: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncePolicy {
    fn cancel(&self) {
        let handle = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::trace!("cancelled pending debounced forward");
        }
    }
}

#[async_trait]
impl Policy for DebouncePolicy {
    async fn apply(&self, _request: UpdateRequest, draft: FormState, decision: Decision) {
        let wait = self.wait;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            decision.accept(draft);
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(handle) {
            // Trailing edge: the newer draft supersedes the scheduled one.
            previous.abort();
        }
    }
}

impl Drop for DebouncePolicy {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Interceptor specialization that forwards the full draft once edits go
/// quiet for the configured interval.
pub struct DebounceGuard {
    shared: Arc<InterceptorShared>,
    policy: Arc<DebouncePolicy>,
}

impl DebounceGuard {
    /// Guard with the default 1 ms quiet interval.
    pub fn new(upstream: DataScope) -> Self {
        Self::with_options(upstream, DebounceOptions::default())
    }

    /// Must be called within a tokio runtime; timers are spawned tasks.
    pub fn with_options(upstream: DataScope, options: DebounceOptions) -> Self {
        let policy = Arc::new(DebouncePolicy {
            wait: options.wait,
            pending: Mutex::new(None),
        });
        let shared = InterceptorShared::new(
            upstream,
            Arc::clone(&policy) as Arc<dyn Policy>,
            InterceptorOptions {
                on_render: options.on_render,
            },
        );
        Self { shared, policy }
    }

    /// Feed a partial update into the guard directly.
    pub fn intercept(&self, request: UpdateRequest) {
        self.shared.intercept(request);
    }

    /// The `{data, update}` handle descendants should use.
    pub fn scope(&self) -> DataScope {
        DataScope::new(Arc::new(InterceptorSource(Arc::clone(&self.shared))))
    }

    /// Current draft overlay (latest edits, forwarded or not).
    pub fn draft(&self) -> FormState {
        self.shared.draft()
    }

    /// Drop any pending scheduled forward without waiting for teardown.
    pub fn cancel(&self) {
        self.policy.cancel();
    }
}

impl Drop for DebounceGuard {
    fn drop(&mut self) {
        self.policy.cancel();
    }
}
