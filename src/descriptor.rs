//! Binding descriptors: the owned constructor trampoline plus its declared
//! dependency manifest and options.
//!
//! Closures cannot be reflected, so every registration stores two things
//! side by side: a type-erased constructor over a
//! [`ResolverContext`](crate::ResolverContext), and a manifest describing
//! what the constructor will ask for. The resolver drives the trampoline;
//! the build-time validator reads the manifest.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::internal::dispose_bag::DisposeEntry;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::provider::context::ResolverContext;

/// Type-erased instance storage.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Type-erased constructor trampoline.
pub(crate) type ConstructorFn =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Type-erased decorator: wraps the current value, may resolve further deps.
pub(crate) type DecoratorFn =
    Arc<dyn for<'a> Fn(AnyArc, &ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Upcast applied when a binding also satisfies an interface; `None` when
/// the stored value is not of the expected concrete type.
pub(crate) type CastFn = Arc<dyn Fn(&AnyArc) -> Option<AnyArc> + Send + Sync>;

/// Captures an instance's disposal contract at registration time; `None`
/// when the constructed value is not of the expected concrete type.
pub(crate) type DisposeBinder = Arc<dyn Fn(&AnyArc) -> Option<DisposeEntry> + Send + Sync>;

/// Splits a result-aggregate value into its published fields, in manifest
/// order.
pub(crate) type PublisherFn = Arc<dyn Fn(&AnyArc) -> DiResult<Vec<AnyArc>> + Send + Sync>;

/// One declared dependency edge of a constructor.
///
/// Produced by the `depends_on*` binding options and by
/// [`DependencySet::manifest`](crate::DependencySet::manifest). Optional
/// edges are recorded for the graph but are not required to resolve.
#[derive(Clone, Debug)]
pub struct DependencyRequest {
    pub(crate) target: DependencyTarget,
    pub(crate) optional: bool,
}

#[derive(Clone, Debug)]
pub(crate) enum DependencyTarget {
    Binding(ServiceKey),
    Group(&'static str, &'static str),
}

impl DependencyRequest {
    /// Required dependency on a concrete type.
    pub fn on<T: 'static>() -> Self {
        Self {
            target: DependencyTarget::Binding(ServiceKey::of::<T>()),
            optional: false,
        }
    }

    /// Required dependency on a keyed concrete type.
    pub fn on_keyed<T: 'static>(key: &'static str) -> Self {
        Self {
            target: DependencyTarget::Binding(ServiceKey::keyed::<T>(key)),
            optional: false,
        }
    }

    /// Required dependency on a trait-object binding.
    pub fn on_trait<T: ?Sized + 'static>() -> Self {
        Self {
            target: DependencyTarget::Binding(ServiceKey::of_trait::<T>()),
            optional: false,
        }
    }

    /// Required dependency on a keyed trait-object binding.
    pub fn on_trait_keyed<T: ?Sized + 'static>(key: &'static str) -> Self {
        Self {
            target: DependencyTarget::Binding(ServiceKey::trait_keyed::<T>(key)),
            optional: false,
        }
    }

    /// Dependency on the ordered members of a group.
    pub fn on_group<T: ?Sized + 'static>(group: &'static str) -> Self {
        Self {
            target: DependencyTarget::Group(group, std::any::type_name::<T>()),
            optional: false,
        }
    }

    /// Marks this edge optional: absence resolves to the zero value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// One field published by a result-aggregate constructor.
#[derive(Clone, Debug)]
pub struct PublishedBinding {
    pub(crate) target: PublishTarget,
}

#[derive(Clone, Debug)]
pub(crate) enum PublishTarget {
    Binding(ServiceKey),
    Group(&'static str, &'static str),
}

impl PublishedBinding {
    /// Publishes a field as the binding for its concrete type.
    pub fn of<T: 'static>() -> Self {
        Self {
            target: PublishTarget::Binding(ServiceKey::of::<T>()),
        }
    }

    /// Publishes a field under a distinguishing key.
    pub fn keyed<T: 'static>(key: &'static str) -> Self {
        Self {
            target: PublishTarget::Binding(ServiceKey::keyed::<T>(key)),
        }
    }

    /// Publishes a field as a member of a group.
    pub fn grouped<T: 'static>(group: &'static str) -> Self {
        Self {
            target: PublishTarget::Group(group, std::any::type_name::<T>()),
        }
    }
}

/// The frozen record of one constructor registration.
pub(crate) struct Descriptor {
    /// Primary binding key. For group members this is rewritten to the
    /// indexed member key when the registry freezes.
    pub key: ServiceKey,
    /// Group label, when this binding joins a group.
    pub group: Option<&'static str>,
    pub lifetime: Lifetime,
    pub ctor: ConstructorFn,
    pub dependencies: Vec<DependencyRequest>,
    /// Interfaces this binding additionally satisfies.
    pub aliases: Vec<(ServiceKey, CastFn)>,
    /// Fields published by a result-aggregate constructor.
    pub publishes: Vec<PublishedBinding>,
    pub publisher: Option<PublisherFn>,
    pub dispose: Option<DisposeBinder>,
    pub type_name: &'static str,
}

impl Descriptor {
    pub(crate) fn new(
        key: ServiceKey,
        lifetime: Lifetime,
        ctor: ConstructorFn,
        type_name: &'static str,
    ) -> Self {
        Self {
            key,
            group: None,
            lifetime,
            ctor,
            dependencies: Vec::new(),
            aliases: Vec::new(),
            publishes: Vec::new(),
            publisher: None,
            dispose: None,
            type_name,
        }
    }
}

/// A decorator registration: wraps the value of an existing binding.
///
/// Decorators are not stateful objects; the chain for a key is walked at
/// resolution time in registration order, each wrapper receiving the
/// previous value as its first argument.
pub(crate) struct DecoratorDescriptor {
    /// The binding being wrapped.
    pub target: ServiceKey,
    pub wrap: DecoratorFn,
    /// Ordinary dependencies of the wrapper beyond the wrapped value.
    pub dependencies: Vec<DependencyRequest>,
}
