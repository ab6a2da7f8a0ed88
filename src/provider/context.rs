//! Resolver context handed to constructors.

use std::sync::Arc;

use crate::context::ScopeContext;
use crate::descriptor::{AnyArc, Descriptor};
use crate::error::{BoxError, DiResult, ResolutionError};
use crate::internal::dispose_bag::{Disposable, DisposeEntry};
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::provider::resolve;
use crate::provider::scope::{Scope, ScopeCore};
use crate::traits::ResolverCore;

/// Context passed to constructor closures for resolving their dependencies.
///
/// Wraps the scope the instance under construction belongs to (the root for
/// long-lived bindings, the resolving scope otherwise) and exposes the full
/// [`Resolver`](crate::Resolver) surface. It also re-checks the lifetime
/// rule on every fetch, so a long-lived constructor reaching for a scoped
/// dependency fails even when graph validation was deferred.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wirebox::{Resolver, ServiceCollection};
///
/// struct Config { retries: u32 }
/// struct Client { config: Arc<Config> }
///
/// let mut services = ServiceCollection::new();
/// services.add_long(Config { retries: 3 });
/// services.add_long_factory::<Client, _>(|ctx| Client {
///     config: ctx.get_required::<Config>(),
/// });
///
/// let provider = services.build().unwrap();
/// assert_eq!(provider.get_required::<Client>().config.retries, 3);
/// ```
pub struct ResolverContext<'a> {
    core: &'a Arc<ScopeCore>,
    under: Option<&'a Descriptor>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(core: &'a Arc<ScopeCore>, under: Option<&'a Descriptor>) -> Self {
        Self { core, under }
    }

    /// The scope the instance under construction belongs to.
    pub fn scope(&self) -> Scope {
        Scope::from_core(self.core.clone())
    }

    /// The owning scope's context.
    pub fn context(&self) -> &ScopeContext {
        &self.core.context
    }

    /// Deferred-validation backstop for the captive-dependency rule.
    fn check_lifetime(&self, key: &ServiceKey) -> DiResult<()> {
        if let Some(under) = self.under {
            if under.lifetime == Lifetime::Long {
                if let Some(Lifetime::Scoped) = self.core.shared.registry.lifetime_of(key) {
                    return Err(ResolutionError::LifetimeConflict {
                        dependent: under.key.clone(),
                        dependency: key.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_key(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.check_lifetime(key)?;
        resolve::resolve_required(self.core, key)
    }

    fn resolve_key_optional(&self, key: &ServiceKey) -> DiResult<Option<AnyArc>> {
        self.check_lifetime(key)?;
        resolve::resolve(self.core, key)
    }

    fn resolve_group_key(
        &self,
        group: &'static str,
        type_name: &'static str,
    ) -> DiResult<Vec<AnyArc>> {
        if let Some(under) = self.under {
            if under.lifetime == Lifetime::Long {
                for i in 0..self.core.shared.registry.group_len(group, type_name) {
                    let member = ServiceKey::GroupMember(group, type_name, i);
                    self.check_lifetime(&member)?;
                }
            }
        }
        resolve::resolve_group(self.core, group, type_name)
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
