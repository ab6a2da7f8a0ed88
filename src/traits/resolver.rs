//! Resolver traits: the object-safe core and the typed surface.

use std::any::Any;
use std::sync::Arc;

use crate::context::ScopeContext;
use crate::error::{BoxError, DiResult, ResolutionError};
use crate::key::ServiceKey;
use crate::traits::{ContextDispose, Dispose};

/// Object-safe resolution core.
///
/// Implemented by the provider, every scope, and the resolver context handed
/// to factories; the typed [`Resolver`] surface is built on top of it. Most
/// code never calls these methods directly.
pub trait ResolverCore: Send + Sync {
    /// Resolves one binding; fails when it is absent.
    fn resolve_key(&self, key: &ServiceKey) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Resolves one binding; an absent binding yields `None`, every other
    /// failure propagates.
    fn resolve_key_optional(&self, key: &ServiceKey)
        -> DiResult<Option<Arc<dyn Any + Send + Sync>>>;

    /// Resolves the ordered members of a group. An unregistered group is an
    /// empty sequence.
    fn resolve_group_key(
        &self,
        group: &'static str,
        type_name: &'static str,
    ) -> DiResult<Vec<Arc<dyn Any + Send + Sync>>>;

    /// Records a free-form disposal hook on the owning scope.
    fn push_disposer(
        &self,
        type_name: &'static str,
        hook: Box<dyn FnOnce(&ScopeContext) -> Result<(), BoxError> + Send>,
    );
}

fn downcast<T: Send + Sync + 'static>(any: Arc<dyn Any + Send + Sync>) -> DiResult<Arc<T>> {
    any.downcast::<T>().map_err(|_| {
        ResolutionError::TypeMismatch {
            type_name: std::any::type_name::<T>(),
        }
        .into()
    })
}

fn downcast_trait<T: ?Sized + Send + Sync + 'static>(
    any: Arc<dyn Any + Send + Sync>,
) -> DiResult<Arc<T>> {
    // Trait objects are stored double-wrapped as Arc<Arc<dyn Trait>>.
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| {
            ResolutionError::TypeMismatch {
                type_name: std::any::type_name::<T>(),
            }
            .into()
        })
}

/// Typed resolution surface shared by the provider, scopes, and factory
/// contexts.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wirebox::{Resolver, ServiceCollection};
///
/// trait Greeter: Send + Sync {
///     fn hello(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn hello(&self) -> String { "hello".to_string() }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_long(42u32);
/// services.add_long_trait::<dyn Greeter>(Arc::new(English));
///
/// let provider = services.build().unwrap();
/// assert_eq!(*provider.get::<u32>().unwrap(), 42);
/// assert_eq!(provider.get_trait::<dyn Greeter>().unwrap().hello(), "hello");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete type.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast::<T>(self.resolve_key(&ServiceKey::of::<T>())?)
    }

    /// Resolves a concrete type bound under a distinguishing key.
    fn get_keyed<T: Send + Sync + 'static>(&self, key: &'static str) -> DiResult<Arc<T>> {
        downcast::<T>(self.resolve_key(&ServiceKey::keyed::<T>(key))?)
    }

    /// Resolves a concrete type; `None` when no binding exists.
    fn get_optional<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        match self.resolve_key_optional(&ServiceKey::of::<T>())? {
            Some(any) => Ok(Some(downcast::<T>(any)?)),
            None => Ok(None),
        }
    }

    /// Resolves a keyed concrete type; `None` when no binding exists.
    fn get_keyed_optional<T: Send + Sync + 'static>(
        &self,
        key: &'static str,
    ) -> DiResult<Option<Arc<T>>> {
        match self.resolve_key_optional(&ServiceKey::keyed::<T>(key))? {
            Some(any) => Ok(Some(downcast::<T>(any)?)),
            None => Ok(None),
        }
    }

    /// Resolves the ordered members of a group of concrete types.
    fn get_group<T: Send + Sync + 'static>(&self, group: &'static str) -> DiResult<Vec<Arc<T>>> {
        let anys = self.resolve_group_key(group, std::any::type_name::<T>())?;
        anys.into_iter().map(downcast::<T>).collect()
    }

    /// Resolves a trait-object binding.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_key(&ServiceKey::of_trait::<T>())?)
    }

    /// Resolves a keyed trait-object binding.
    fn get_trait_keyed<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &'static str,
    ) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_key(&ServiceKey::trait_keyed::<T>(key))?)
    }

    /// Resolves a trait-object binding; `None` when no binding exists.
    fn get_trait_optional<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        match self.resolve_key_optional(&ServiceKey::of_trait::<T>())? {
            Some(any) => Ok(Some(downcast_trait::<T>(any)?)),
            None => Ok(None),
        }
    }

    /// Resolves the ordered members of a group of trait objects.
    fn get_trait_group<T: ?Sized + Send + Sync + 'static>(
        &self,
        group: &'static str,
    ) -> DiResult<Vec<Arc<T>>> {
        let anys = self.resolve_group_key(group, std::any::type_name::<T>())?;
        anys.into_iter().map(downcast_trait::<T>).collect()
    }

    /// Resolves a concrete type, panicking on failure.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>().unwrap_or_else(|e| {
            panic!("failed to resolve {}: {e}", std::any::type_name::<T>())
        })
    }

    /// Resolves a keyed concrete type, panicking on failure.
    fn get_required_keyed<T: Send + Sync + 'static>(&self, key: &'static str) -> Arc<T> {
        self.get_keyed::<T>(key).unwrap_or_else(|e| {
            panic!(
                "failed to resolve {}[{key}]: {e}",
                std::any::type_name::<T>()
            )
        })
    }

    /// Resolves a trait-object binding, panicking on failure.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_trait::<T>().unwrap_or_else(|e| {
            panic!("failed to resolve {}: {e}", std::any::type_name::<T>())
        })
    }

    /// Registers `service` for disposal when the owning scope closes.
    fn register_disposer<T: Dispose + 'static>(&self, service: Arc<T>) {
        self.push_disposer(
            std::any::type_name::<T>(),
            Box::new(move |_| service.dispose()),
        );
    }

    /// Registers `service` for context-aware disposal when the owning scope
    /// closes.
    fn register_context_disposer<T: ContextDispose + 'static>(&self, service: Arc<T>) {
        self.push_disposer(
            std::any::type_name::<T>(),
            Box::new(move |ctx| service.dispose(ctx)),
        );
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
