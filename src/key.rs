//! Binding keys for service storage and lookup.

use std::any::TypeId;
use std::fmt;

/// Key identifying one binding in the container.
///
/// A binding is identified by its produced type, an optional distinguishing
/// key (so several bindings of one type can coexist), and, for group
/// members, the group label plus the member's registration index.
///
/// Concrete types carry their `TypeId`; trait-object bindings are identified
/// by trait name, since the stored value is a double-wrapped
/// `Arc<Arc<dyn Trait>>` and the concrete implementor is unknown at the
/// registration site.
///
/// # Examples
///
/// ```rust
/// use wirebox::ServiceKey;
///
/// let plain = ServiceKey::of::<u32>();
/// let keyed = ServiceKey::keyed::<u32>("port");
/// assert_ne!(plain, keyed);
/// assert_eq!(keyed.binding_key(), Some("port"));
/// assert_eq!(format!("{keyed}"), "u32[port]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceKey {
    /// Concrete type binding.
    Type(TypeId, &'static str),
    /// Concrete type binding distinguished by key.
    Keyed(TypeId, &'static str, &'static str),
    /// Trait-object binding.
    Trait(&'static str),
    /// Trait-object binding distinguished by key.
    TraitKeyed(&'static str, &'static str),
    /// Member of a group: `(group, type name, registration index)`.
    GroupMember(&'static str, &'static str, usize),
}

impl ServiceKey {
    /// Key for a concrete type binding.
    pub fn of<T: 'static>() -> Self {
        ServiceKey::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Key for a concrete type binding under a distinguishing key.
    pub fn keyed<T: 'static>(key: &'static str) -> Self {
        ServiceKey::Keyed(TypeId::of::<T>(), std::any::type_name::<T>(), key)
    }

    /// Key for a trait-object binding.
    pub fn of_trait<T: ?Sized + 'static>() -> Self {
        ServiceKey::Trait(std::any::type_name::<T>())
    }

    /// Key for a trait-object binding under a distinguishing key.
    pub fn trait_keyed<T: ?Sized + 'static>(key: &'static str) -> Self {
        ServiceKey::TraitKeyed(std::any::type_name::<T>(), key)
    }

    /// Key for one member of a group.
    pub fn group_member<T: ?Sized + 'static>(group: &'static str, index: usize) -> Self {
        ServiceKey::GroupMember(group, std::any::type_name::<T>(), index)
    }

    /// The produced type's name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ServiceKey::Type(_, name)
            | ServiceKey::Keyed(_, name, _)
            | ServiceKey::Trait(name)
            | ServiceKey::TraitKeyed(name, _)
            | ServiceKey::GroupMember(_, name, _) => name,
        }
    }

    /// The distinguishing key, if this is a keyed binding.
    pub fn binding_key(&self) -> Option<&'static str> {
        match self {
            ServiceKey::Keyed(_, _, key) | ServiceKey::TraitKeyed(_, key) => Some(key),
            _ => None,
        }
    }

    /// The group label, if this is a group member.
    pub fn group(&self) -> Option<&'static str> {
        match self {
            ServiceKey::GroupMember(group, _, _) => Some(group),
            _ => None,
        }
    }

    /// Rewrites this key to carry a distinguishing key.
    pub(crate) fn with_binding_key(self, key: &'static str) -> Self {
        match self {
            ServiceKey::Type(id, name) | ServiceKey::Keyed(id, name, _) => {
                ServiceKey::Keyed(id, name, key)
            }
            ServiceKey::Trait(name) | ServiceKey::TraitKeyed(name, _) => {
                ServiceKey::TraitKeyed(name, key)
            }
            member @ ServiceKey::GroupMember(..) => member,
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKey::Type(_, name) | ServiceKey::Trait(name) => write!(f, "{name}"),
            ServiceKey::Keyed(_, name, key) | ServiceKey::TraitKeyed(name, key) => {
                write!(f, "{name}[{key}]")
            }
            ServiceKey::GroupMember(group, name, index) => {
                write!(f, "{name}#{index} in group \"{group}\"")
            }
        }
    }
}
