//! Build-time configuration of the container.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::ServiceKey;
use crate::observer::{FnObserver, ResolveObserver};

/// Default bound on resolution recursion depth.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 1024;

/// Options recognized by `build_with`.
///
/// Options affect when work happens, never what a resolution means: a graph
/// that validates eagerly resolves exactly like one validated lazily.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use wirebox::{BuildOptions, ServiceCollection};
///
/// let mut services = ServiceCollection::new();
/// services.add_long(1u8);
///
/// let provider = services
///     .build_with(
///         BuildOptions::default()
///             .eager_init(true)
///             .panic_recovery(true)
///             .resolution_deadline(Duration::from_secs(5)),
///     )
///     .unwrap();
/// ```
pub struct BuildOptions {
    pub(crate) defer_validation: bool,
    pub(crate) eager_init: bool,
    pub(crate) resolution_deadline: Option<Duration>,
    pub(crate) panic_recovery: bool,
    pub(crate) max_resolution_depth: usize,
    pub(crate) observers: Vec<Arc<dyn ResolveObserver>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            defer_validation: false,
            eager_init: false,
            resolution_deadline: None,
            panic_recovery: false,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            observers: Vec::new(),
        }
    }
}

impl BuildOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Postpones the cycle and lifetime passes from build to the first
    /// resolution of each node. Reachability and decorator coherence always
    /// run at build.
    pub fn defer_validation(mut self, defer: bool) -> Self {
        self.defer_validation = defer;
        self
    }

    /// Constructs every long-lived service during build, in topological
    /// order, instead of lazily on first resolve.
    pub fn eager_init(mut self, eager: bool) -> Self {
        self.eager_init = eager;
        self
    }

    /// Bounds the total wall-clock time of one top-level resolve.
    pub fn resolution_deadline(mut self, deadline: Duration) -> Self {
        self.resolution_deadline = Some(deadline);
        self
    }

    /// Catches constructor panics and surfaces them as constructor errors
    /// instead of unwinding through the caller.
    pub fn panic_recovery(mut self, recover: bool) -> Self {
        self.panic_recovery = recover;
        self
    }

    /// Bounds resolution recursion depth.
    pub fn max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// Registers an observer of resolution events.
    pub fn observer(mut self, observer: Arc<dyn ResolveObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Invokes `f` after every successful node resolution.
    pub fn on_resolved<F>(mut self, f: F) -> Self
    where
        F: Fn(&ServiceKey, Duration) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(FnObserver {
            on_resolved: Some(Box::new(f)),
            on_error: None,
        }));
        self
    }

    /// Invokes `f` after every failed node resolution.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&ServiceKey, &DiError) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(FnObserver {
            on_resolved: None,
            on_error: Some(Box::new(f)),
        }));
        self
    }
}
