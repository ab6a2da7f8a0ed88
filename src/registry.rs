//! The frozen descriptor registry produced by `build`.
//!
//! Freezing turns the registration list into lookup tables: primary
//! bindings, group member counts, decorator chains, interface aliases,
//! published aggregate fields, and a cache slot for every resolvable key.
//! The registry is immutable afterwards and shared read-only by every
//! scope.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{
    CastFn, DecoratorDescriptor, Descriptor, PublishTarget,
};
use crate::error::RegistrationError;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;

/// An interface alias: resolving `key` resolves `target` and upcasts.
pub(crate) struct AliasEntry {
    pub target: ServiceKey,
    pub cast: CastFn,
    pub lifetime: Lifetime,
}

/// A field published by a result-aggregate constructor.
pub(crate) struct FieldEntry {
    pub owner: ServiceKey,
    pub lifetime: Lifetime,
}

/// Where a key resolves from.
pub(crate) enum Site<'a> {
    Descriptor(&'a Arc<Descriptor>),
    Alias(&'a AliasEntry),
    Field(&'a FieldEntry),
}

pub(crate) struct FrozenRegistry {
    pub bindings: HashMap<ServiceKey, Arc<Descriptor>>,
    /// Member count per `(group, type name)`.
    pub groups: HashMap<(&'static str, &'static str), usize>,
    pub decorators: HashMap<ServiceKey, Vec<Arc<DecoratorDescriptor>>>,
    pub aliases: HashMap<ServiceKey, AliasEntry>,
    pub fields: HashMap<ServiceKey, FieldEntry>,
    /// Aggregate owner key -> its field keys, in manifest order.
    pub published_keys: HashMap<ServiceKey, Vec<ServiceKey>>,
    pub long_slots: HashMap<ServiceKey, usize>,
    pub long_count: usize,
    pub scoped_slots: HashMap<ServiceKey, usize>,
    pub scoped_count: usize,
}

impl FrozenRegistry {
    /// Freezes the registration list, rejecting duplicate bindings.
    pub(crate) fn freeze(
        pending: Vec<Descriptor>,
        decorators: Vec<DecoratorDescriptor>,
    ) -> Result<Self, RegistrationError> {
        let mut reg = FrozenRegistry {
            bindings: HashMap::new(),
            groups: HashMap::new(),
            decorators: HashMap::new(),
            aliases: HashMap::new(),
            fields: HashMap::new(),
            published_keys: HashMap::new(),
            long_slots: HashMap::new(),
            long_count: 0,
            scoped_slots: HashMap::new(),
            scoped_count: 0,
        };

        for mut desc in pending {
            // Group members get their indexed key in registration order;
            // everything else keeps the key the binding options produced.
            if let Some(group) = desc.group {
                let count = reg.groups.entry((group, desc.type_name)).or_insert(0);
                desc.key = ServiceKey::GroupMember(group, desc.type_name, *count);
                *count += 1;
            } else if reg.occupied(&desc.key) {
                return Err(RegistrationError::DuplicateBinding {
                    key: desc.key.clone(),
                });
            }

            let aliases = std::mem::take(&mut desc.aliases);
            let publishes = std::mem::take(&mut desc.publishes);
            let desc = Arc::new(desc);

            for (alias_key, cast) in aliases {
                if reg.occupied(&alias_key) {
                    return Err(RegistrationError::DuplicateBinding { key: alias_key });
                }
                reg.aliases.insert(
                    alias_key,
                    AliasEntry {
                        target: desc.key.clone(),
                        cast,
                        lifetime: desc.lifetime,
                    },
                );
            }

            let mut field_keys = Vec::with_capacity(publishes.len());
            for published in publishes {
                let field_key = match published.target {
                    PublishTarget::Binding(key) => {
                        if reg.occupied(&key) {
                            return Err(RegistrationError::DuplicateBinding { key });
                        }
                        key
                    }
                    PublishTarget::Group(group, type_name) => {
                        let count = reg.groups.entry((group, type_name)).or_insert(0);
                        let key = ServiceKey::GroupMember(group, type_name, *count);
                        *count += 1;
                        key
                    }
                };
                reg.fields.insert(
                    field_key.clone(),
                    FieldEntry {
                        owner: desc.key.clone(),
                        lifetime: desc.lifetime,
                    },
                );
                field_keys.push(field_key);
            }
            if !field_keys.is_empty() {
                reg.published_keys.insert(desc.key.clone(), field_keys);
            }

            reg.bindings.insert(desc.key.clone(), desc);
        }

        for decorator in decorators {
            reg.decorators
                .entry(decorator.target.clone())
                .or_default()
                .push(Arc::new(decorator));
        }

        reg.assign_slots();
        tracing::debug!(
            target: "wirebox",
            bindings = reg.bindings.len(),
            groups = reg.groups.len(),
            aliases = reg.aliases.len(),
            fields = reg.fields.len(),
            "registry frozen"
        );
        Ok(reg)
    }

    fn occupied(&self, key: &ServiceKey) -> bool {
        self.bindings.contains_key(key)
            || self.aliases.contains_key(key)
            || self.fields.contains_key(key)
    }

    fn assign_slots(&mut self) {
        let keyed_lifetimes: Vec<(ServiceKey, Lifetime)> = self
            .bindings
            .iter()
            .map(|(k, d)| (k.clone(), d.lifetime))
            .chain(self.aliases.iter().map(|(k, a)| (k.clone(), a.lifetime)))
            .chain(self.fields.iter().map(|(k, f)| (k.clone(), f.lifetime)))
            .collect();

        for (key, lifetime) in keyed_lifetimes {
            match lifetime {
                Lifetime::Long => {
                    self.long_slots.insert(key, self.long_count);
                    self.long_count += 1;
                }
                Lifetime::Scoped => {
                    self.scoped_slots.insert(key, self.scoped_count);
                    self.scoped_count += 1;
                }
            }
        }
    }

    pub(crate) fn site(&self, key: &ServiceKey) -> Option<Site<'_>> {
        if let Some(desc) = self.bindings.get(key) {
            return Some(Site::Descriptor(desc));
        }
        if let Some(alias) = self.aliases.get(key) {
            return Some(Site::Alias(alias));
        }
        self.fields.get(key).map(Site::Field)
    }

    pub(crate) fn lifetime_of(&self, key: &ServiceKey) -> Option<Lifetime> {
        match self.site(key)? {
            Site::Descriptor(d) => Some(d.lifetime),
            Site::Alias(a) => Some(a.lifetime),
            Site::Field(f) => Some(f.lifetime),
        }
    }

    pub(crate) fn slot_of(&self, key: &ServiceKey, lifetime: Lifetime) -> usize {
        match lifetime {
            Lifetime::Long => self.long_slots[key],
            Lifetime::Scoped => self.scoped_slots[key],
        }
    }

    pub(crate) fn group_len(&self, group: &'static str, type_name: &'static str) -> usize {
        self.groups.get(&(group, type_name)).copied().unwrap_or(0)
    }

    pub(crate) fn decorators_for(&self, key: &ServiceKey) -> &[Arc<DecoratorDescriptor>] {
        self.decorators.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}
