//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior.
///
/// Only two lifetimes exist. `Long` instances are shared by every scope
/// descended from the same root and are released when the root closes.
/// `Scoped` instances live in the cache of the scope that first resolved
/// them and are released when that scope closes.
///
/// Per-call uniqueness ("transient" behavior in other containers) is
/// expressed by opening a fresh short-lived scope around the call site; a
/// third lifetime would punch a hole in the captive-dependency rule, so
/// there is none.
///
/// # Examples
///
/// ```rust
/// use wirebox::{ServiceCollection, ScopeContext, Resolver};
///
/// struct Database { url: String }
/// struct RequestState { trace: String }
///
/// let mut services = ServiceCollection::new();
/// services.add_long(Database { url: "postgres://localhost".to_string() });
/// services.add_scoped_factory::<RequestState, _>(|_| RequestState {
///     trace: "req".to_string(),
/// });
///
/// let provider = services.build().unwrap();
/// let scope = provider.create_scope(ScopeContext::background()).unwrap();
///
/// // Long: same instance in every scope
/// let db_root = provider.get_required::<Database>();
/// let db_scoped = scope.get_required::<Database>();
/// assert!(std::sync::Arc::ptr_eq(&db_root, &db_scoped));
///
/// // Scoped: one instance per scope
/// let s1 = scope.get_required::<RequestState>();
/// let s2 = scope.get_required::<RequestState>();
/// assert!(std::sync::Arc::ptr_eq(&s1, &s2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per root, shared across the whole scope tree.
    ///
    /// Constructed lazily on first resolve, or during build when eager
    /// construction is requested. A `Long` service may only depend on
    /// other `Long` services.
    Long,
    /// One instance per scope, cached for the scope's lifetime.
    ///
    /// Different scopes get different instances; within one scope repeated
    /// resolves return the same instance. Scoped services may depend on
    /// both `Scoped` and `Long` services.
    Scoped,
}

impl Lifetime {
    /// Whether a service of this lifetime may depend on one of `other`.
    pub fn may_depend_on(self, other: Lifetime) -> bool {
        !(self == Lifetime::Long && other == Lifetime::Scoped)
    }
}
