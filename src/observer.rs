//! Observation hooks for resolution events.
//!
//! Observers see every node-level resolution: start, success with elapsed
//! time, and failure. They run synchronously inside the resolver, so
//! implementations should stay lightweight.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::ServiceKey;

/// Observer of container resolution events.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
/// use wirebox::{Resolver, ResolveObserver, ServiceCollection, ServiceKey};
///
/// #[derive(Default)]
/// struct Counter(AtomicU64);
///
/// impl ResolveObserver for Counter {
///     fn resolved(&self, _key: &ServiceKey, _elapsed: Duration) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let counter = Arc::new(Counter::default());
/// let mut services = ServiceCollection::new();
/// services.add_long(7u32);
/// services.add_observer(counter.clone());
///
/// let provider = services.build().unwrap();
/// let _ = provider.get_required::<u32>();
/// assert_eq!(counter.0.load(Ordering::Relaxed), 1);
/// ```
pub trait ResolveObserver: Send + Sync {
    /// A node resolution is starting.
    fn resolving(&self, _key: &ServiceKey) {}

    /// A node resolved successfully.
    fn resolved(&self, _key: &ServiceKey, _elapsed: Duration) {}

    /// A node resolution failed.
    fn failed(&self, _key: &ServiceKey, _error: &DiError) {}
}

/// Observer that emits `tracing` events for every resolution.
pub struct TracingObserver;

impl TracingObserver {
    /// Creates the observer.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveObserver for TracingObserver {
    fn resolving(&self, key: &ServiceKey) {
        tracing::trace!(target: "wirebox", %key, "resolving");
    }

    fn resolved(&self, key: &ServiceKey, elapsed: Duration) {
        tracing::debug!(target: "wirebox", %key, ?elapsed, "resolved");
    }

    fn failed(&self, key: &ServiceKey, error: &DiError) {
        tracing::warn!(target: "wirebox", %key, %error, "resolution failed");
    }
}

/// Adapter turning plain callbacks into an observer. Used by the build
/// options' `on_resolved` / `on_error` hooks.
pub(crate) struct FnObserver {
    pub on_resolved: Option<Box<dyn Fn(&ServiceKey, Duration) + Send + Sync>>,
    pub on_error: Option<Box<dyn Fn(&ServiceKey, &DiError) + Send + Sync>>,
}

impl ResolveObserver for FnObserver {
    fn resolved(&self, key: &ServiceKey, elapsed: Duration) {
        if let Some(f) = &self.on_resolved {
            f(key, elapsed);
        }
    }

    fn failed(&self, key: &ServiceKey, error: &DiError) {
        if let Some(f) = &self.on_error {
            f(key, error);
        }
    }
}

/// Fan-out over every registered observer.
pub(crate) struct Observers {
    list: Vec<Arc<dyn ResolveObserver>>,
}

impl Observers {
    pub(crate) fn new(list: Vec<Arc<dyn ResolveObserver>>) -> Self {
        Self { list }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub(crate) fn resolving(&self, key: &ServiceKey) {
        for obs in &self.list {
            obs.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &ServiceKey, elapsed: Duration) {
        for obs in &self.list {
            obs.resolved(key, elapsed);
        }
    }

    pub(crate) fn failed(&self, key: &ServiceKey, error: &DiError) {
        for obs in &self.list {
            obs.failed(key, error);
        }
    }
}
