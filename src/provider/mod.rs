//! Service provider: the root of the scope tree.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::cache::InstanceCache;
use crate::context::ScopeContext;
use crate::descriptor::AnyArc;
use crate::error::{BoxError, BuildError, DiResult, DisposalError};
use crate::graph::DependencyGraph;
use crate::key::ServiceKey;
use crate::observer::Observers;
use crate::options::BuildOptions;
use crate::registry::FrozenRegistry;
use crate::traits::ResolverCore;

pub mod context;
pub(crate) mod resolve;
pub mod scope;

pub use context::ResolverContext;
pub use scope::Scope;

pub(crate) struct RuntimeOptions {
    pub max_depth: usize,
    pub resolution_deadline: Option<Duration>,
    pub panic_recovery: bool,
    pub observers: Observers,
}

pub(crate) struct ProviderShared {
    pub registry: FrozenRegistry,
    pub options: RuntimeOptions,
    pub root_cells: InstanceCache,
    pub root: OnceCell<Weak<scope::ScopeCore>>,
    closed: AtomicBool,
}

impl ProviderShared {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// The built container: the root scope plus build/close orchestration.
///
/// Produced by [`ServiceCollection::build`](crate::ServiceCollection::build).
/// The provider is the top of the scope tree: it holds the long-lived
/// instance cache, resolves directly (scoped bindings resolved on it are
/// cached per the root's own scope cache), creates request scopes, and
/// closes the whole tree. After [`close`](Self::close) every operation
/// fails; the state machine is unbuilt -> ready -> closed, with no way
/// back.
///
/// Cloning is cheap; all clones denote the same container.
///
/// # Examples
///
/// ```rust
/// use wirebox::{Resolver, ScopeContext, ServiceCollection};
///
/// let mut services = ServiceCollection::new();
/// services.add_long(3u16);
///
/// let provider = services.build().unwrap();
/// let scope = provider.create_scope(ScopeContext::background()).unwrap();
/// assert_eq!(*scope.get_required::<u16>(), 3);
///
/// scope.close().unwrap();
/// provider.close().unwrap();
/// assert!(provider.get::<u16>().is_err());
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    root: Arc<scope::ScopeCore>,
}

impl ServiceProvider {
    /// Freezes the registry, validates the graph, and stands up the root
    /// scope. Called by `ServiceCollection::build_with`.
    pub(crate) fn build_from(
        registry: FrozenRegistry,
        options: BuildOptions,
    ) -> Result<Self, BuildError> {
        let graph = DependencyGraph::build(&registry)?;
        if !options.defer_validation {
            graph.validate()?;
        }
        let eager = if options.eager_init {
            graph.eager_order(&registry)
        } else {
            Vec::new()
        };

        let long_count = registry.long_count;
        let shared = Arc::new(ProviderShared {
            registry,
            options: RuntimeOptions {
                max_depth: options.max_resolution_depth,
                resolution_deadline: options.resolution_deadline,
                panic_recovery: options.panic_recovery,
                observers: Observers::new(options.observers),
            },
            root_cells: InstanceCache::with_slots(long_count),
            root: OnceCell::new(),
            closed: AtomicBool::new(false),
        });

        let root = scope::ScopeCore::create(shared.clone(), None, ScopeContext::background());
        shared
            .root
            .set(Arc::downgrade(&root))
            .unwrap_or_else(|_| unreachable!("root attached once"));

        let provider = Self { root };
        for key in eager {
            if let Err(source) = resolve::resolve_required(&provider.root, &key) {
                return Err(BuildError::EagerInit {
                    key,
                    source: Box::new(source),
                });
            }
        }
        tracing::debug!(target: "wirebox", "provider ready");
        Ok(provider)
    }

    /// The root scope as an ordinary [`Scope`] handle.
    pub fn root_scope(&self) -> Scope {
        Scope::from_core(self.root.clone())
    }

    /// Creates a request scope under the root, capturing `context`.
    pub fn create_scope(&self, context: ScopeContext) -> DiResult<Scope> {
        self.root_scope().create_scope(context)
    }

    /// Whether the provider has been closed.
    pub fn is_closed(&self) -> bool {
        self.root.shared.is_closed()
    }

    /// Closes the whole scope tree: descendants first, then the root's own
    /// disposables in reverse construction order. Terminal and idempotent;
    /// disposer failures are collected, never skipped.
    pub fn close(&self) -> Result<(), DisposalError> {
        self.root.shared.closed.store(true, Ordering::Release);
        self.root.close()
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_key(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        resolve::resolve_required(&self.root, key)
    }

    fn resolve_key_optional(&self, key: &ServiceKey) -> DiResult<Option<AnyArc>> {
        resolve::resolve(&self.root, key)
    }

    fn resolve_group_key(
        &self,
        group: &'static str,
        type_name: &'static str,
    ) -> DiResult<Vec<AnyArc>> {
        resolve::resolve_group(&self.root, group, type_name)
    }

    fn push_disposer(
        &self,
        type_name: &'static str,
        hook: Box<dyn FnOnce(&ScopeContext) -> Result<(), BoxError> + Send>,
    ) {
        self.root_scope().push_disposer(type_name, hook);
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("closed", &self.is_closed())
            .field("bindings", &self.root.shared.registry.bindings.len())
            .finish()
    }
}
