//! Parameter and result aggregates.
//!
//! A [`DependencySet`] is a struct whose fields are dependencies: the
//! structured-parameter form of a constructor. A [`ServiceBundle`] is the
//! mirror image: a struct whose fields are each published as an independent
//! binding. Both carry a manifest so the build-time validator sees the same
//! edges the resolver will walk.

use std::any::Any;
use std::sync::Arc;

use crate::descriptor::{DependencyRequest, PublishedBinding};
use crate::error::DiResult;
use crate::provider::context::ResolverContext;

/// A structured parameter aggregate: each field is one dependency.
///
/// Implementations list their fields in [`manifest`](Self::manifest)
/// (required, optional, keyed, or grouped) and materialize themselves in
/// [`resolve`](Self::resolve) using the matching resolver calls. A set with
/// zero fields is valid and resolves without touching the container.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wirebox::{
///     DependencyRequest, DependencySet, DiResult, Resolver, ResolverContext,
///     ServiceCollection,
/// };
///
/// struct Database;
/// struct Metrics;
///
/// struct HandlerDeps {
///     db: Arc<Database>,
///     metrics: Option<Arc<Metrics>>,
/// }
///
/// impl DependencySet for HandlerDeps {
///     fn manifest() -> Vec<DependencyRequest> {
///         vec![
///             DependencyRequest::on::<Database>(),
///             DependencyRequest::on::<Metrics>().optional(),
///         ]
///     }
///
///     fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
///         Ok(Self {
///             db: ctx.get::<Database>()?,
///             metrics: ctx.get_optional::<Metrics>()?,
///         })
///     }
/// }
///
/// struct Handler { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_long(Database);
/// services.add_long_with::<Handler, HandlerDeps, _>(|deps| Handler { db: deps.db });
///
/// let provider = services.build().unwrap();
/// let handler = provider.get_required::<Handler>();
/// ```
pub trait DependencySet: Sized {
    /// The declared dependency edges, one per field.
    fn manifest() -> Vec<DependencyRequest>;

    /// Resolves every field from the container.
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self>;
}

impl DependencySet for () {
    fn manifest() -> Vec<DependencyRequest> {
        Vec::new()
    }

    fn resolve(_ctx: &ResolverContext<'_>) -> DiResult<Self> {
        Ok(())
    }
}

/// A structured result aggregate: each field becomes an independent binding.
///
/// The constructor runs once per cache tier (by the bundle's lifetime); its
/// fields are then cached under their own keys or appended to their groups.
/// Resolving the bundle type itself yields the whole bundle.
///
/// [`publish`](Self::publish) must return one entry per
/// [`manifest`](Self::manifest) item, in the same order; the [`published`]
/// helper wraps a plain value into storage form.
///
/// # Examples
///
/// ```rust
/// use std::any::Any;
/// use std::sync::Arc;
/// use wirebox::{published, PublishedBinding, Resolver, ServiceBundle, ServiceCollection};
///
/// #[derive(Clone)]
/// struct ApiClient { base: &'static str }
/// #[derive(Clone)]
/// struct AdminClient { base: &'static str }
///
/// struct Clients {
///     api: ApiClient,
///     admin: AdminClient,
/// }
///
/// impl ServiceBundle for Clients {
///     fn manifest() -> Vec<PublishedBinding> {
///         vec![
///             PublishedBinding::of::<ApiClient>(),
///             PublishedBinding::keyed::<AdminClient>("admin"),
///         ]
///     }
///
///     fn publish(&self) -> Vec<Arc<dyn Any + Send + Sync>> {
///         vec![published(self.api.clone()), published(self.admin.clone())]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_long_bundle::<Clients, _>(|_| Clients {
///     api: ApiClient { base: "/v1" },
///     admin: AdminClient { base: "/admin" },
/// });
///
/// let provider = services.build().unwrap();
/// let api = provider.get_required::<ApiClient>();
/// let admin = provider.get_required_keyed::<AdminClient>("admin");
/// assert_eq!(api.base, "/v1");
/// assert_eq!(admin.base, "/admin");
/// ```
pub trait ServiceBundle: Send + Sync + 'static + Sized {
    /// The published bindings, one per field.
    fn manifest() -> Vec<PublishedBinding>;

    /// Splits the bundle into storage values, in manifest order.
    fn publish(&self) -> Vec<Arc<dyn Any + Send + Sync>>;
}

/// Wraps a field value into the storage form expected by
/// [`ServiceBundle::publish`].
pub fn published<T: Send + Sync + 'static>(value: T) -> Arc<dyn Any + Send + Sync> {
    Arc::new(value)
}
