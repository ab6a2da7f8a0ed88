//! Propagated scope context and the context bridge.
//!
//! A [`ScopeContext`] is the container's analog of a propagated request
//! context: an immutable chain of typed values, an optional
//! [`CancellationToken`], and, once a scope has been created from it, a
//! reference to that scope. External adapters (for example a per-request
//! middleware) create a scope, pass the scope's context along with the
//! request, and recover the scope later with [`from_context`].

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::cancellation::CancellationToken;
use crate::error::{DiError, DiResult};
use crate::provider::scope::ScopeCore;
use crate::provider::Scope;

/// Immutable, cheaply cloneable context propagated alongside a request.
///
/// Contexts form a chain: each `with_*` call returns a new context layered
/// over the previous one, and lookups walk the chain outward, so values set
/// on an outer context remain visible from the inner ones.
///
/// # Examples
///
/// ```rust
/// use wirebox::ScopeContext;
///
/// let ctx = ScopeContext::background()
///     .with_value("tenant", "acme".to_string())
///     .with_value("attempt", 2u32);
///
/// assert_eq!(*ctx.value::<String>("tenant").unwrap(), "acme");
/// assert_eq!(*ctx.value::<u32>("attempt").unwrap(), 2);
/// assert!(ctx.value::<String>("missing").is_none());
/// ```
#[derive(Clone)]
pub struct ScopeContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    parent: Option<ScopeContext>,
    entry: ContextEntry,
}

enum ContextEntry {
    Root,
    Value {
        name: &'static str,
        value: Arc<dyn Any + Send + Sync>,
    },
    Cancellation(CancellationToken),
    Scope(Weak<ScopeCore>),
}

impl ScopeContext {
    /// The empty root context.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                parent: None,
                entry: ContextEntry::Root,
            }),
        }
    }

    fn child(&self, entry: ContextEntry) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                parent: Some(self.clone()),
                entry,
            }),
        }
    }

    /// Returns a context carrying `value` under `name`.
    pub fn with_value<T: Send + Sync + 'static>(&self, name: &'static str, value: T) -> Self {
        self.child(ContextEntry::Value {
            name,
            value: Arc::new(value),
        })
    }

    /// Looks up the nearest value stored under `name` with type `T`.
    pub fn value<T: Send + Sync + 'static>(&self, name: &'static str) -> Option<Arc<T>> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let ContextEntry::Value { name: n, value } = &ctx.inner.entry {
                if *n == name {
                    if let Ok(typed) = value.clone().downcast::<T>() {
                        return Some(typed);
                    }
                }
            }
            current = ctx.inner.parent.as_ref();
        }
        None
    }

    /// Returns a context carrying a cancellation token.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        self.child(ContextEntry::Cancellation(token))
    }

    /// The nearest cancellation token in the chain, if any.
    pub fn cancellation(&self) -> Option<CancellationToken> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let ContextEntry::Cancellation(token) = &ctx.inner.entry {
                return Some(token.clone());
            }
            current = ctx.inner.parent.as_ref();
        }
        None
    }

    /// Whether the nearest cancellation token has tripped.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation().is_some_and(|t| t.is_cancelled())
    }

    /// Layers a scope reference onto the chain. Called by scope creation.
    pub(crate) fn with_scope(&self, scope: Weak<ScopeCore>) -> Self {
        self.child(ContextEntry::Scope(scope))
    }

    /// The nearest live scope attached to the chain.
    pub(crate) fn attached_scope(&self) -> Option<Arc<ScopeCore>> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let ContextEntry::Scope(weak) = &ctx.inner.entry {
                if let Some(core) = weak.upgrade() {
                    return Some(core);
                }
            }
            current = ctx.inner.parent.as_ref();
        }
        None
    }
}

impl Default for ScopeContext {
    fn default() -> Self {
        Self::background()
    }
}

impl std::fmt::Debug for ScopeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeContext")
            .field("cancelled", &self.is_cancelled())
            .field("has_scope", &self.attached_scope().is_some())
            .finish()
    }
}

/// Extracts the scope previously attached by scope creation.
///
/// This is the collaborator-facing half of the context bridge: a middleware
/// creates a scope per request, forwards the scope's context, and downstream
/// code recovers the scope here instead of threading it explicitly.
///
/// # Examples
///
/// ```rust
/// use wirebox::{from_context, ScopeContext, ServiceCollection};
///
/// let provider = ServiceCollection::new().build().unwrap();
/// let scope = provider.create_scope(ScopeContext::background()).unwrap();
///
/// let recovered = from_context(scope.context()).unwrap();
/// assert_eq!(recovered.id(), scope.id());
/// ```
pub fn from_context(ctx: &ScopeContext) -> DiResult<Scope> {
    ctx.attached_scope()
        .map(Scope::from_core)
        .ok_or(DiError::NoScopeInContext)
}
