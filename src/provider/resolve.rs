//! The resolver engine: recursive resolution over the frozen registry.
//!
//! Resolution of one key: closed and cancellation checks, a construction
//! stack frame (cycle, depth, deadline), cache lookup in the tier selected
//! by lifetime, then, on a miss, constructor invocation, decorator chain,
//! aggregate field publication, and disposal recording, all inside the cache
//! cell's once-initializer so racing first-resolves invoke the constructor
//! exactly once.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::InstanceCache;
use crate::descriptor::{AnyArc, Descriptor};
use crate::error::{DiError, DiResult, ResolutionError};
use crate::internal::circular;
use crate::internal::dispose_bag::Disposable;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::provider::context::ResolverContext;
use crate::provider::scope::ScopeCore;
use crate::registry::Site;

/// Resolves `key` on `core`; `Ok(None)` when no binding exists. Observer
/// callbacks wrap every node-level resolution, cache hits included.
pub(crate) fn resolve(core: &Arc<ScopeCore>, key: &ServiceKey) -> DiResult<Option<AnyArc>> {
    let observers = &core.shared.options.observers;
    if observers.is_empty() {
        return resolve_impl(core, key);
    }
    observers.resolving(key);
    let start = Instant::now();
    match resolve_impl(core, key) {
        Ok(Some(value)) => {
            observers.resolved(key, start.elapsed());
            Ok(Some(value))
        }
        Ok(None) => Ok(None),
        Err(error) => {
            observers.failed(key, &error);
            Err(error)
        }
    }
}

fn resolve_impl(core: &Arc<ScopeCore>, key: &ServiceKey) -> DiResult<Option<AnyArc>> {
    let shared = &core.shared;
    if shared.is_closed() {
        return Err(DiError::ProviderClosed);
    }
    if core.is_closed() {
        return Err(DiError::ScopeClosed { scope_id: core.id });
    }
    if core.context.is_cancelled() {
        return Err(ResolutionError::Cancelled { key: key.clone() }.into());
    }

    if shared.registry.site(key).is_none() {
        return Ok(None);
    }

    let _guard = circular::enter(
        key,
        shared.options.max_depth,
        shared.options.resolution_deadline,
    )?;

    // Re-fetch under the guard; the borrow must not outlive this frame.
    let value = match shared.registry.site(key) {
        Some(Site::Descriptor(desc)) => {
            let desc = desc.clone();
            resolve_descriptor(core, &desc, key)?
        }
        Some(Site::Alias(alias)) => {
            let target = alias.target.clone();
            let cast = alias.cast.clone();
            let lifetime = alias.lifetime;
            let (owner, cache) = tier(core, lifetime)?;
            let slot = shared.registry.slot_of(key, lifetime);
            cache_of(&owner, &cache).get_or_try_init(slot, || {
                let base = resolve_required(core, &target)?;
                cast(&base).ok_or_else(|| {
                    ResolutionError::TypeMismatch {
                        type_name: key.type_name(),
                    }
                    .into()
                })
            })?
        }
        Some(Site::Field(field)) => {
            let owner_key = field.owner.clone();
            let lifetime = field.lifetime;
            // Constructing the owning aggregate publishes every field.
            resolve_required(core, &owner_key)?;
            let (owner, cache) = tier(core, lifetime)?;
            let slot = shared.registry.slot_of(key, lifetime);
            match cache_of(&owner, &cache).get(slot) {
                Some(value) => value,
                None => {
                    return Err(ResolutionError::Constructor {
                        key: key.clone(),
                        message: "result aggregate did not publish this field".to_string(),
                        source: None,
                    }
                    .into());
                }
            }
        }
        None => return Ok(None),
    };
    Ok(Some(value))
}

/// Resolves `key` on `core`, failing when no binding exists.
pub(crate) fn resolve_required(core: &Arc<ScopeCore>, key: &ServiceKey) -> DiResult<AnyArc> {
    match resolve(core, key)? {
        Some(value) => Ok(value),
        None => {
            let error: DiError = ResolutionError::MissingDependency { key: key.clone() }.into();
            core.shared.options.observers.failed(key, &error);
            Err(error)
        }
    }
}

/// Resolves the ordered members of a group; an unregistered group is empty.
pub(crate) fn resolve_group(
    core: &Arc<ScopeCore>,
    group: &'static str,
    type_name: &'static str,
) -> DiResult<Vec<AnyArc>> {
    let len = core.shared.registry.group_len(group, type_name);
    let mut members = Vec::with_capacity(len);
    for i in 0..len {
        let key = ServiceKey::GroupMember(group, type_name, i);
        members.push(resolve_required(core, &key)?);
    }
    Ok(members)
}

enum CacheTier {
    Root,
    Scope,
}

/// Selects the scope that owns an instance of the given lifetime (and its
/// cache tier): the root for `Long`, the resolving scope for `Scoped`.
fn tier(core: &Arc<ScopeCore>, lifetime: Lifetime) -> DiResult<(Arc<ScopeCore>, CacheTier)> {
    match lifetime {
        Lifetime::Long => {
            let root = core
                .shared
                .root
                .get()
                .and_then(|weak| weak.upgrade())
                .ok_or(DiError::ProviderClosed)?;
            Ok((root, CacheTier::Root))
        }
        Lifetime::Scoped => Ok((core.clone(), CacheTier::Scope)),
    }
}

fn cache_of<'a>(owner: &'a Arc<ScopeCore>, tier: &CacheTier) -> &'a InstanceCache {
    match tier {
        CacheTier::Root => &owner.shared.root_cells,
        CacheTier::Scope => &owner.cells,
    }
}

fn resolve_descriptor(
    core: &Arc<ScopeCore>,
    desc: &Arc<Descriptor>,
    key: &ServiceKey,
) -> DiResult<AnyArc> {
    let (owner, cache_tier) = tier(core, desc.lifetime)?;
    let slot = core.shared.registry.slot_of(key, desc.lifetime);
    cache_of(&owner, &cache_tier)
        .get_or_try_init(slot, || construct(&owner, &cache_tier, desc, key))
}

/// Runs the constructor, the decorator chain, field publication, and
/// disposal recording for one cache miss.
fn construct(
    owner: &Arc<ScopeCore>,
    cache_tier: &CacheTier,
    desc: &Arc<Descriptor>,
    key: &ServiceKey,
) -> DiResult<AnyArc> {
    let shared = &owner.shared;
    let ctx = ResolverContext::new(owner, Some(desc.as_ref()));

    let base = invoke_ctor(desc, &ctx, key, shared.options.panic_recovery)?;

    // Decorator chain in registration order; a failing decorator cancels
    // the chain and releases the base value if it declared a disposer.
    let mut value = base;
    for decorator in shared.registry.decorators_for(&desc.key) {
        let wrapped = if shared.options.panic_recovery {
            match catch_unwind(AssertUnwindSafe(|| (decorator.wrap)(value.clone(), &ctx))) {
                Ok(result) => result,
                Err(payload) => Err(ResolutionError::Constructor {
                    key: key.clone(),
                    message: panic_message(payload.as_ref()),
                    source: None,
                }
                .into()),
            }
        } else {
            (decorator.wrap)(value.clone(), &ctx)
        };
        match wrapped {
            Ok(wrapped) => value = wrapped,
            Err(error) => {
                dispose_abandoned(owner, desc, &value);
                return Err(error);
            }
        }
    }

    if let Some(publisher) = &desc.publisher {
        let fields = publisher(&value)?;
        let field_keys = shared
            .registry
            .published_keys
            .get(&desc.key)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if fields.len() != field_keys.len() {
            return Err(ResolutionError::Constructor {
                key: key.clone(),
                message: format!(
                    "aggregate published {} field(s), manifest declares {}",
                    fields.len(),
                    field_keys.len()
                ),
                source: None,
            }
            .into());
        }
        let cache = cache_of(owner, cache_tier);
        for (field_key, field_value) in field_keys.iter().zip(fields) {
            let slot = shared.registry.slot_of(field_key, desc.lifetime);
            cache.publish(slot, field_value);
        }
    }

    if let Some(binder) = &desc.dispose {
        if let Some(entry) = binder(&value) {
            owner.push_disposable(Disposable {
                entry,
                type_name: desc.type_name,
            });
        }
    }

    Ok(value)
}

/// Releases a constructed value whose decoration failed.
fn dispose_abandoned(owner: &Arc<ScopeCore>, desc: &Descriptor, value: &AnyArc) {
    if let Some(binder) = &desc.dispose {
        if let Some(entry) = binder(value) {
            let disposable = Disposable {
                entry,
                type_name: desc.type_name,
            };
            if let Err(error) = disposable.run(&owner.context) {
                tracing::warn!(
                    target: "wirebox",
                    type_name = desc.type_name,
                    %error,
                    "disposing value abandoned by failed decorator"
                );
            }
        }
    }
}

fn invoke_ctor(
    desc: &Descriptor,
    ctx: &ResolverContext<'_>,
    key: &ServiceKey,
    recover: bool,
) -> DiResult<AnyArc> {
    if !recover {
        return (desc.ctor)(ctx);
    }
    match catch_unwind(AssertUnwindSafe(|| (desc.ctor)(ctx))) {
        Ok(result) => result,
        Err(payload) => Err(ResolutionError::Constructor {
            key: key.clone(),
            message: panic_message(payload.as_ref()),
            source: None,
        }
        .into()),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "constructor panicked".to_string()
    }
}
