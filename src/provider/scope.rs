//! The scope tree: nested request scopes, their caches, and ordered
//! teardown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::cache::InstanceCache;
use crate::context::ScopeContext;
use crate::descriptor::AnyArc;
use crate::error::{BoxError, DiError, DiResult, DisposalError};
use crate::internal::dispose_bag::{Disposable, DisposeBag, DisposeEntry};
use crate::key::ServiceKey;
use crate::provider::resolve;
use crate::provider::ProviderShared;
use crate::traits::ResolverCore;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(0);

/// A node in the scope tree.
///
/// A scope delimits the lifetime of `Scoped` instances: the first resolve of
/// a scoped binding inside a scope caches it there, and closing the scope
/// releases everything it constructed, newest first, after closing its child
/// scopes. Scopes are cheap handles over shared state and may be cloned
/// freely; all clones denote the same scope.
///
/// # Examples
///
/// ```rust
/// use wirebox::{Resolver, ScopeContext, ServiceCollection};
///
/// struct Session { user: &'static str }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_factory::<Session, _>(|_| Session { user: "anna" });
///
/// let provider = services.build().unwrap();
/// let outer = provider.create_scope(ScopeContext::background()).unwrap();
/// let inner = outer.create_scope(outer.context().clone()).unwrap();
///
/// assert!(!outer.is_root());
/// assert_eq!(inner.parent().unwrap().id(), outer.id());
///
/// // Each scope caches its own instance.
/// let a = outer.get_required::<Session>();
/// let b = inner.get_required::<Session>();
/// assert!(!std::sync::Arc::ptr_eq(&a, &b));
///
/// outer.close().unwrap(); // closes inner first
/// ```
#[derive(Clone)]
pub struct Scope {
    pub(crate) core: Arc<ScopeCore>,
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope").field("id", &self.core.id).finish()
    }
}

pub(crate) struct ScopeCore {
    pub id: u64,
    pub shared: Arc<ProviderShared>,
    pub parent: Option<Weak<ScopeCore>>,
    pub context: ScopeContext,
    pub cells: InstanceCache,
    pub state: Mutex<ScopeState>,
}

#[derive(Default)]
pub(crate) struct ScopeState {
    pub closed: bool,
    pub children: Vec<Arc<ScopeCore>>,
    pub disposables: DisposeBag,
}

impl ScopeCore {
    pub(crate) fn create(
        shared: Arc<ProviderShared>,
        parent: Option<Weak<ScopeCore>>,
        base_context: ScopeContext,
    ) -> Arc<Self> {
        let scoped_count = shared.registry.scoped_count;
        Arc::new_cyclic(|weak: &Weak<ScopeCore>| ScopeCore {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            shared,
            parent,
            context: base_context.with_scope(weak.clone()),
            cells: InstanceCache::with_slots(scoped_count),
            state: Mutex::new(ScopeState::default()),
        })
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Records a disposable in construction order. If the scope already
    /// finished closing, the instance is released immediately.
    pub(crate) fn push_disposable(&self, disposable: Disposable) {
        let late = {
            let mut state = self.state.lock();
            if state.closed {
                Some(disposable)
            } else {
                state.disposables.push(disposable);
                None
            }
        };
        if let Some(disposable) = late {
            let type_name = disposable.type_name;
            if let Err(error) = disposable.run(&self.context) {
                tracing::warn!(
                    target: "wirebox",
                    scope_id = self.id,
                    type_name,
                    %error,
                    "late disposable failed"
                );
            }
        }
    }

    /// Closes children first, then runs this scope's disposables in reverse
    /// construction order. Idempotent; concurrent calls collapse to one
    /// effective close.
    pub(crate) fn close(self: &Arc<Self>) -> Result<(), DisposalError> {
        let (children, mut bag) = {
            let mut state = self.state.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            (
                std::mem::take(&mut state.children),
                std::mem::take(&mut state.disposables),
            )
        };
        tracing::trace!(target: "wirebox", scope_id = self.id, "closing scope");

        let mut failures = Vec::new();
        for child in children.into_iter().rev() {
            if let Err(e) = child.close() {
                failures.extend(e.failures);
            }
        }
        failures.extend(bag.run_reverse(self.id, &self.context));

        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
            parent
                .state
                .lock()
                .children
                .retain(|c| !Arc::ptr_eq(c, self));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!(
                target: "wirebox",
                scope_id = self.id,
                count = failures.len(),
                "disposal failures collected"
            );
            Err(DisposalError { failures })
        }
    }
}

impl Drop for ScopeCore {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.closed && !state.disposables.is_empty() {
            tracing::warn!(
                target: "wirebox",
                scope_id = self.id,
                "scope dropped with undisposed instances; call close() first"
            );
        }
    }
}

impl Scope {
    pub(crate) fn from_core(core: Arc<ScopeCore>) -> Self {
        Self { core }
    }

    /// This scope's immutable identifier.
    pub fn id(&self) -> u64 {
        self.core.id
    }

    /// The parent scope; `None` for the root.
    pub fn parent(&self) -> Option<Scope> {
        self.core
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Scope::from_core)
    }

    /// Whether this is the root scope.
    pub fn is_root(&self) -> bool {
        self.core.parent.is_none()
    }

    /// The context captured at creation, carrying a reference back to this
    /// scope for [`from_context`](crate::from_context).
    pub fn context(&self) -> &ScopeContext {
        &self.core.context
    }

    /// Whether this scope has been closed.
    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    /// Creates a child scope capturing `context`.
    pub fn create_scope(&self, context: ScopeContext) -> DiResult<Scope> {
        if self.core.shared.is_closed() {
            return Err(DiError::ProviderClosed);
        }
        let child = {
            let mut state = self.core.state.lock();
            if state.closed {
                return Err(DiError::ScopeClosed {
                    scope_id: self.core.id,
                });
            }
            let child = ScopeCore::create(
                self.core.shared.clone(),
                Some(Arc::downgrade(&self.core)),
                context,
            );
            state.children.push(child.clone());
            child
        };
        Ok(Scope::from_core(child))
    }

    /// Closes this scope: children first, then disposables in reverse
    /// construction order. New resolutions fail immediately; in-flight ones
    /// complete. Idempotent.
    pub fn close(&self) -> Result<(), DisposalError> {
        self.core.close()
    }
}

impl ResolverCore for Scope {
    fn resolve_key(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        resolve::resolve_required(&self.core, key)
    }

    fn resolve_key_optional(&self, key: &ServiceKey) -> DiResult<Option<AnyArc>> {
        resolve::resolve(&self.core, key)
    }

    fn resolve_group_key(
        &self,
        group: &'static str,
        type_name: &'static str,
    ) -> DiResult<Vec<AnyArc>> {
        resolve::resolve_group(&self.core, group, type_name)
    }

    fn push_disposer(
        &self,
        type_name: &'static str,
        hook: Box<dyn FnOnce(&ScopeContext) -> Result<(), BoxError> + Send>,
    ) {
        self.core.push_disposable(Disposable {
            entry: DisposeEntry::Hook(hook),
            type_name,
        });
    }
}
