//! Service collection: where bindings are declared before build.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::aggregate::{DependencySet, ServiceBundle};
use crate::descriptor::{
    AnyArc, CastFn, ConstructorFn, DecoratorDescriptor, DependencyRequest, Descriptor,
    PublisherFn,
};
use crate::error::{BoxError, BuildError, DiError, DiResult, RegistrationError, ResolutionError};
use crate::internal::dispose_bag::DisposeEntry;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::observer::ResolveObserver;
use crate::options::BuildOptions;
use crate::provider::{ResolverContext, ServiceProvider};
use crate::traits::{ContextDispose, Dispose};

mod module;
pub use module::ServiceModule;
use module::MAX_MODULE_DEPTH;

/// Accumulates binding declarations and produces an immutable provider.
///
/// Registrations declare a constructor, a lifetime, and options (key, group,
/// satisfied interfaces, declared dependencies, disposal). `build` freezes
/// everything, validates the dependency graph, and hands back a
/// [`ServiceProvider`]; nothing can be registered afterwards.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wirebox::{Resolver, ScopeContext, ServiceCollection};
///
/// struct Config { url: String }
/// struct Database { url: String }
/// struct Handler { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_long(Config { url: "postgres://localhost".to_string() });
/// services
///     .add_long_factory::<Database, _>(|ctx| Database {
///         url: ctx.get_required::<Config>().url.clone(),
///     })
///     .depends_on::<Config>();
/// services
///     .add_scoped_factory::<Handler, _>(|ctx| Handler {
///         db: ctx.get_required::<Database>(),
///     })
///     .depends_on::<Database>();
///
/// let provider = services.build().unwrap();
/// let scope = provider.create_scope(ScopeContext::background()).unwrap();
/// assert_eq!(scope.get_required::<Handler>().db.url, "postgres://localhost");
/// ```
pub struct ServiceCollection {
    pending: Vec<Descriptor>,
    decorators: Vec<DecoratorDescriptor>,
    observers: Vec<Arc<dyn ResolveObserver>>,
    included_modules: HashSet<usize>,
    errors: Vec<RegistrationError>,
}

impl ServiceCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            decorators: Vec::new(),
            observers: Vec::new(),
            included_modules: HashSet::new(),
            errors: Vec::new(),
        }
    }

    fn binding<T>(&mut self, desc: Descriptor) -> Binding<'_, T> {
        self.pending.push(desc);
        let Self {
            pending, errors, ..
        } = self;
        Binding {
            desc: pending.last_mut().expect("descriptor just pushed"),
            errors,
            _marker: PhantomData,
        }
    }

    fn trait_binding<T: ?Sized>(&mut self, desc: Descriptor) -> TraitBinding<'_, T> {
        self.pending.push(desc);
        let Self {
            pending, errors, ..
        } = self;
        TraitBinding {
            desc: pending.last_mut().expect("descriptor just pushed"),
            errors,
            _marker: PhantomData,
        }
    }

    // ----- Concrete type registrations -----

    /// Registers an existing value as a long-lived instance.
    pub fn add_long<T: Send + Sync + 'static>(&mut self, value: T) -> Binding<'_, T> {
        let arc = Arc::new(value);
        let ctor: ConstructorFn =
            Arc::new(move |_: &ResolverContext<'_>| -> DiResult<AnyArc> { Ok(arc.clone()) });
        self.binding(Descriptor::new(
            ServiceKey::of::<T>(),
            Lifetime::Long,
            ctor,
            std::any::type_name::<T>(),
        ))
    }

    /// Registers a long-lived constructor, invoked once per root on first
    /// resolve (or during build under eager construction).
    pub fn add_long_factory<T, F>(&mut self, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Long, factory)
    }

    /// Registers a scoped constructor, invoked once per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Scoped, factory)
    }

    fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let ctor: ConstructorFn = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)))
        });
        self.binding(Descriptor::new(
            ServiceKey::of::<T>(),
            lifetime,
            ctor,
            std::any::type_name::<T>(),
        ))
    }

    /// Registers a fallible long-lived constructor; its error surfaces as a
    /// constructor failure and is never cached.
    pub fn add_long_try_factory<T, F>(&mut self, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.add_try_factory(Lifetime::Long, factory)
    }

    /// Registers a fallible scoped constructor.
    pub fn add_scoped_try_factory<T, F>(&mut self, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.add_try_factory(Lifetime::Scoped, factory)
    }

    fn add_try_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let ctor: ConstructorFn = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            match factory(ctx) {
                Ok(value) => Ok(Arc::new(value)),
                // Container errors propagated by the factory (`?` on a
                // dependency fetch) keep their kind; anything else is a
                // constructor failure.
                Err(source) => match source.downcast::<DiError>() {
                    Ok(inner) => Err(*inner),
                    Err(source) => Err(ResolutionError::Constructor {
                        key: ServiceKey::of::<T>(),
                        message: source.to_string(),
                        source: Some(source),
                    }
                    .into()),
                },
            }
        });
        self.binding(Descriptor::new(
            ServiceKey::of::<T>(),
            lifetime,
            ctor,
            std::any::type_name::<T>(),
        ))
    }

    // ----- Aggregate registrations -----

    /// Registers a long-lived constructor over a parameter aggregate; the
    /// aggregate's manifest becomes the declared dependency edges.
    pub fn add_long_with<T, D, F>(&mut self, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        D: DependencySet,
        F: Fn(D) -> T + Send + Sync + 'static,
    {
        self.add_with(Lifetime::Long, factory)
    }

    /// Registers a scoped constructor over a parameter aggregate.
    pub fn add_scoped_with<T, D, F>(&mut self, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        D: DependencySet,
        F: Fn(D) -> T + Send + Sync + 'static,
    {
        self.add_with(Lifetime::Scoped, factory)
    }

    fn add_with<T, D, F>(&mut self, lifetime: Lifetime, factory: F) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
        D: DependencySet,
        F: Fn(D) -> T + Send + Sync + 'static,
    {
        let ctor: ConstructorFn = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            let deps = D::resolve(ctx)?;
            Ok(Arc::new(factory(deps)))
        });
        let mut desc = Descriptor::new(
            ServiceKey::of::<T>(),
            lifetime,
            ctor,
            std::any::type_name::<T>(),
        );
        desc.dependencies = D::manifest();
        self.binding(desc)
    }

    /// Registers a long-lived result aggregate: the constructor runs once
    /// and each manifest field is published as an independent binding.
    pub fn add_long_bundle<B, F>(&mut self, factory: F) -> Binding<'_, B>
    where
        B: ServiceBundle,
        F: Fn(&ResolverContext<'_>) -> B + Send + Sync + 'static,
    {
        self.add_bundle(Lifetime::Long, factory)
    }

    /// Registers a scoped result aggregate, published per scope.
    pub fn add_scoped_bundle<B, F>(&mut self, factory: F) -> Binding<'_, B>
    where
        B: ServiceBundle,
        F: Fn(&ResolverContext<'_>) -> B + Send + Sync + 'static,
    {
        self.add_bundle(Lifetime::Scoped, factory)
    }

    fn add_bundle<B, F>(&mut self, lifetime: Lifetime, factory: F) -> Binding<'_, B>
    where
        B: ServiceBundle,
        F: Fn(&ResolverContext<'_>) -> B + Send + Sync + 'static,
    {
        let ctor: ConstructorFn = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)))
        });
        let publisher: PublisherFn = Arc::new(|any: &AnyArc| {
            let bundle = any.clone().downcast::<B>().map_err(|_| {
                ResolutionError::TypeMismatch {
                    type_name: std::any::type_name::<B>(),
                }
            })?;
            Ok(bundle.publish())
        });
        let mut desc = Descriptor::new(
            ServiceKey::of::<B>(),
            lifetime,
            ctor,
            std::any::type_name::<B>(),
        );
        desc.publishes = B::manifest();
        desc.publisher = Some(publisher);
        self.binding(desc)
    }

    // ----- Trait-object registrations -----

    /// Registers an existing trait object as a long-lived instance.
    pub fn add_long_trait<T>(&mut self, value: Arc<T>) -> TraitBinding<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        // Stored double-wrapped so the concrete implementor never leaks
        // into the key.
        let stored: AnyArc = Arc::new(value);
        let ctor: ConstructorFn =
            Arc::new(move |_: &ResolverContext<'_>| -> DiResult<AnyArc> { Ok(stored.clone()) });
        self.trait_binding(Descriptor::new(
            ServiceKey::of_trait::<T>(),
            Lifetime::Long,
            ctor,
            std::any::type_name::<T>(),
        ))
    }

    /// Registers a long-lived trait-object constructor.
    pub fn add_long_trait_factory<T, F>(&mut self, factory: F) -> TraitBinding<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Long, factory)
    }

    /// Registers a scoped trait-object constructor.
    pub fn add_scoped_trait_factory<T, F>(&mut self, factory: F) -> TraitBinding<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Scoped, factory)
    }

    fn add_trait_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> TraitBinding<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let ctor: ConstructorFn = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)))
        });
        self.trait_binding(Descriptor::new(
            ServiceKey::of_trait::<T>(),
            lifetime,
            ctor,
            std::any::type_name::<T>(),
        ))
    }

    // ----- Decorators -----

    /// Wraps an existing concrete binding. Decorators stack in registration
    /// order, each receiving the previous value.
    pub fn decorate<T, F>(&mut self, decorator: F) -> DecoratorBinding<'_>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.decorate_at(ServiceKey::of::<T>(), decorator)
    }

    /// Wraps a keyed concrete binding.
    pub fn decorate_keyed<T, F>(&mut self, key: &'static str, decorator: F) -> DecoratorBinding<'_>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.decorate_at(ServiceKey::keyed::<T>(key), decorator)
    }

    fn decorate_at<T, F>(&mut self, target: ServiceKey, decorator: F) -> DecoratorBinding<'_>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.decorators.push(DecoratorDescriptor {
            target,
            wrap: Arc::new(move |any: AnyArc, ctx: &ResolverContext<'_>| {
                let inner = any.downcast::<T>().map_err(|_| {
                    ResolutionError::TypeMismatch {
                        type_name: std::any::type_name::<T>(),
                    }
                })?;
                Ok(Arc::new(decorator(inner, ctx)))
            }),
            dependencies: Vec::new(),
        });
        DecoratorBinding {
            desc: self.decorators.last_mut().expect("decorator just pushed"),
        }
    }

    /// Wraps an existing concrete binding with a fallible decorator. A
    /// decorator error cancels the whole chain; the already-built value is
    /// released immediately if the binding declared a disposer.
    pub fn try_decorate<T, F>(&mut self, decorator: F) -> DecoratorBinding<'_>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &ResolverContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.decorators.push(DecoratorDescriptor {
            target: ServiceKey::of::<T>(),
            wrap: Arc::new(move |any: AnyArc, ctx: &ResolverContext<'_>| {
                let inner = any.downcast::<T>().map_err(|_| {
                    ResolutionError::TypeMismatch {
                        type_name: std::any::type_name::<T>(),
                    }
                })?;
                match decorator(inner, ctx) {
                    Ok(value) => Ok(Arc::new(value)),
                    Err(source) => match source.downcast::<DiError>() {
                        Ok(inner) => Err(*inner),
                        Err(source) => Err(ResolutionError::Constructor {
                            key: ServiceKey::of::<T>(),
                            message: source.to_string(),
                            source: Some(source),
                        }
                        .into()),
                    },
                }
            }),
            dependencies: Vec::new(),
        });
        DecoratorBinding {
            desc: self.decorators.last_mut().expect("decorator just pushed"),
        }
    }

    /// Wraps an existing trait-object binding.
    pub fn decorate_trait<T, F>(&mut self, decorator: F) -> DecoratorBinding<'_>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>, &ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        self.decorate_trait_at(ServiceKey::of_trait::<T>(), decorator)
    }

    /// Wraps a keyed trait-object binding.
    pub fn decorate_trait_keyed<T, F>(
        &mut self,
        key: &'static str,
        decorator: F,
    ) -> DecoratorBinding<'_>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>, &ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        self.decorate_trait_at(ServiceKey::trait_keyed::<T>(key), decorator)
    }

    fn decorate_trait_at<T, F>(&mut self, target: ServiceKey, decorator: F) -> DecoratorBinding<'_>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>, &ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        self.decorators.push(DecoratorDescriptor {
            target,
            wrap: Arc::new(move |any: AnyArc, ctx: &ResolverContext<'_>| {
                let inner = any.downcast::<Arc<T>>().map_err(|_| {
                    ResolutionError::TypeMismatch {
                        type_name: std::any::type_name::<T>(),
                    }
                })?;
                Ok(Arc::new(decorator((*inner).clone(), ctx)))
            }),
            dependencies: Vec::new(),
        });
        DecoratorBinding {
            desc: self.decorators.last_mut().expect("decorator just pushed"),
        }
    }

    // ----- Observers and modules -----

    /// Registers an observer of resolution events.
    pub fn add_observer(&mut self, observer: Arc<dyn ResolveObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Includes a module tree. Inclusion is transitive and deduplicated by
    /// module identity: re-including a module anywhere in the tree is a
    /// no-op, and the first inclusion defines declaration order.
    pub fn add_module(
        &mut self,
        module: &Arc<ServiceModule>,
    ) -> Result<&mut Self, RegistrationError> {
        self.install_module(module, 0)?;
        Ok(self)
    }

    fn install_module(
        &mut self,
        module: &Arc<ServiceModule>,
        depth: usize,
    ) -> Result<(), RegistrationError> {
        if depth >= MAX_MODULE_DEPTH {
            return Err(RegistrationError::ModuleDepthExceeded {
                module: module.name(),
                limit: MAX_MODULE_DEPTH,
            });
        }
        let identity = Arc::as_ptr(module) as usize;
        if !self.included_modules.insert(identity) {
            return Ok(());
        }
        tracing::trace!(target: "wirebox", module = module.name(), depth, "including module");
        for install in module.installers() {
            install(self);
        }
        for submodule in module.submodules() {
            self.install_module(submodule, depth + 1)?;
        }
        Ok(())
    }

    // ----- Build -----

    /// Builds the provider with default options.
    pub fn build(self) -> Result<ServiceProvider, BuildError> {
        self.build_with(BuildOptions::default())
    }

    /// Builds the provider: freezes the registry, validates the graph
    /// (unless deferred), and eagerly constructs long-lived services when
    /// requested. The collection is consumed; the provider is immutable.
    pub fn build_with(self, mut options: BuildOptions) -> Result<ServiceProvider, BuildError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(BuildError::Registration(error));
        }
        let registry = crate::registry::FrozenRegistry::freeze(self.pending, self.decorators)?;

        let mut observers = self.observers;
        observers.extend(options.observers);
        options.observers = observers;

        ServiceProvider::build_from(registry, options)
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

// ----- Binding builders -----

/// Fluent options for a concrete-type binding.
pub struct Binding<'c, T> {
    desc: &'c mut Descriptor,
    errors: &'c mut Vec<RegistrationError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Binding<'_, T> {
    /// Binds under a distinguishing key, letting several bindings of one
    /// type coexist.
    pub fn with_key(self, key: &'static str) -> Self {
        if self.desc.group.is_some() {
            self.errors.push(RegistrationError::ConflictingOptions {
                key: self.desc.key.clone(),
                reason: "group members cannot carry a distinguishing key",
            });
            return self;
        }
        self.desc.key = self.desc.key.clone().with_binding_key(key);
        self
    }

    /// Joins a group; the binding resolves as one member of the group's
    /// ordered sequence instead of as a standalone binding.
    pub fn in_group(self, group: &'static str) -> Self {
        if self.desc.key.binding_key().is_some() {
            self.errors.push(RegistrationError::ConflictingOptions {
                key: self.desc.key.clone(),
                reason: "keyed bindings cannot join a group",
            });
            return self;
        }
        self.desc.group = Some(group);
        self
    }

    /// Declares this binding additionally satisfies interface `I`; `cast`
    /// performs the upcast.
    pub fn as_trait<I: ?Sized + Send + Sync + 'static>(self, cast: fn(Arc<T>) -> Arc<I>) -> Self {
        let cast_fn: CastFn = Arc::new(move |any: &AnyArc| {
            any.clone()
                .downcast::<T>()
                .ok()
                .map(|arc| Arc::new(cast(arc)) as AnyArc)
        });
        self.desc.aliases.push((ServiceKey::of_trait::<I>(), cast_fn));
        self
    }

    /// Like [`as_trait`](Self::as_trait), binding the interface under a key.
    pub fn as_trait_keyed<I: ?Sized + Send + Sync + 'static>(
        self,
        key: &'static str,
        cast: fn(Arc<T>) -> Arc<I>,
    ) -> Self {
        let cast_fn: CastFn = Arc::new(move |any: &AnyArc| {
            any.clone()
                .downcast::<T>()
                .ok()
                .map(|arc| Arc::new(cast(arc)) as AnyArc)
        });
        self.desc
            .aliases
            .push((ServiceKey::trait_keyed::<I>(key), cast_fn));
        self
    }

    /// Declares a required dependency edge for the validator.
    pub fn depends_on<D: 'static>(self) -> Self {
        self.depends(DependencyRequest::on::<D>())
    }

    /// Declares a required dependency on a keyed binding.
    pub fn depends_on_keyed<D: 'static>(self, key: &'static str) -> Self {
        self.depends(DependencyRequest::on_keyed::<D>(key))
    }

    /// Declares an optional dependency edge.
    pub fn depends_on_optional<D: 'static>(self) -> Self {
        self.depends(DependencyRequest::on::<D>().optional())
    }

    /// Declares a required dependency on a trait-object binding.
    pub fn depends_on_trait<D: ?Sized + 'static>(self) -> Self {
        self.depends(DependencyRequest::on_trait::<D>())
    }

    /// Declares a dependency on a group's members.
    pub fn depends_on_group<D: ?Sized + 'static>(self, group: &'static str) -> Self {
        self.depends(DependencyRequest::on_group::<D>(group))
    }

    /// Declares an arbitrary dependency edge.
    pub fn depends(self, request: DependencyRequest) -> Self {
        self.desc.dependencies.push(request);
        self
    }

    /// Records constructed instances for release when their owning scope
    /// closes.
    pub fn disposable(self) -> Self
    where
        T: Dispose,
    {
        self.desc.dispose = Some(Arc::new(|any: &AnyArc| {
            any.clone()
                .downcast::<T>()
                .ok()
                .map(|arc| DisposeEntry::Plain(arc))
        }));
        self
    }

    /// Records constructed instances for context-aware release.
    pub fn context_disposable(self) -> Self
    where
        T: ContextDispose,
    {
        self.desc.dispose = Some(Arc::new(|any: &AnyArc| {
            any.clone()
                .downcast::<T>()
                .ok()
                .map(|arc| DisposeEntry::Contextual(arc))
        }));
        self
    }
}

/// Fluent options for a trait-object binding.
pub struct TraitBinding<'c, T: ?Sized> {
    desc: &'c mut Descriptor,
    errors: &'c mut Vec<RegistrationError>,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> TraitBinding<'_, T> {
    /// Binds under a distinguishing key.
    pub fn with_key(self, key: &'static str) -> Self {
        if self.desc.group.is_some() {
            self.errors.push(RegistrationError::ConflictingOptions {
                key: self.desc.key.clone(),
                reason: "group members cannot carry a distinguishing key",
            });
            return self;
        }
        self.desc.key = self.desc.key.clone().with_binding_key(key);
        self
    }

    /// Joins a group.
    pub fn in_group(self, group: &'static str) -> Self {
        if self.desc.key.binding_key().is_some() {
            self.errors.push(RegistrationError::ConflictingOptions {
                key: self.desc.key.clone(),
                reason: "keyed bindings cannot join a group",
            });
            return self;
        }
        self.desc.group = Some(group);
        self
    }

    /// Declares this binding additionally satisfies interface `I`.
    pub fn as_trait<I: ?Sized + Send + Sync + 'static>(self, cast: fn(Arc<T>) -> Arc<I>) -> Self {
        let cast_fn: CastFn = Arc::new(move |any: &AnyArc| {
            any.clone()
                .downcast::<Arc<T>>()
                .ok()
                .map(|arc| Arc::new(cast((*arc).clone())) as AnyArc)
        });
        self.desc.aliases.push((ServiceKey::of_trait::<I>(), cast_fn));
        self
    }

    /// Declares a required dependency edge for the validator.
    pub fn depends_on<D: 'static>(self) -> Self {
        self.depends(DependencyRequest::on::<D>())
    }

    /// Declares a required dependency on a keyed binding.
    pub fn depends_on_keyed<D: 'static>(self, key: &'static str) -> Self {
        self.depends(DependencyRequest::on_keyed::<D>(key))
    }

    /// Declares an optional dependency edge.
    pub fn depends_on_optional<D: 'static>(self) -> Self {
        self.depends(DependencyRequest::on::<D>().optional())
    }

    /// Declares a required dependency on a trait-object binding.
    pub fn depends_on_trait<D: ?Sized + 'static>(self) -> Self {
        self.depends(DependencyRequest::on_trait::<D>())
    }

    /// Declares a dependency on a group's members.
    pub fn depends_on_group<D: ?Sized + 'static>(self, group: &'static str) -> Self {
        self.depends(DependencyRequest::on_group::<D>(group))
    }

    /// Declares an arbitrary dependency edge.
    pub fn depends(self, request: DependencyRequest) -> Self {
        self.desc.dependencies.push(request);
        self
    }

    /// Records constructed instances for release at scope close; `bind`
    /// upcasts the trait object to its disposal contract.
    pub fn disposable_with(self, bind: fn(Arc<T>) -> Arc<dyn Dispose>) -> Self {
        self.desc.dispose = Some(Arc::new(move |any: &AnyArc| {
            any.clone()
                .downcast::<Arc<T>>()
                .ok()
                .map(|arc| DisposeEntry::Plain(bind((*arc).clone())))
        }));
        self
    }

    /// Records constructed instances for context-aware release.
    pub fn context_disposable_with(self, bind: fn(Arc<T>) -> Arc<dyn ContextDispose>) -> Self {
        self.desc.dispose = Some(Arc::new(move |any: &AnyArc| {
            any.clone()
                .downcast::<Arc<T>>()
                .ok()
                .map(|arc| DisposeEntry::Contextual(bind((*arc).clone())))
        }));
        self
    }
}

/// Fluent options for a decorator registration.
pub struct DecoratorBinding<'c> {
    desc: &'c mut DecoratorDescriptor,
}

impl DecoratorBinding<'_> {
    /// Declares a required dependency of the wrapper (beyond the wrapped
    /// value itself).
    pub fn depends_on<D: 'static>(self) -> Self {
        self.depends(DependencyRequest::on::<D>())
    }

    /// Declares a required dependency on a trait-object binding.
    pub fn depends_on_trait<D: ?Sized + 'static>(self) -> Self {
        self.depends(DependencyRequest::on_trait::<D>())
    }

    /// Declares an arbitrary dependency edge.
    pub fn depends(self, request: DependencyRequest) -> Self {
        self.desc.dependencies.push(request);
        self
    }
}
