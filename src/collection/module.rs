//! Modular registration: reusable, deduplicated registration trees.

use std::sync::Arc;

use crate::collection::ServiceCollection;

/// Depth bound on nested module inclusion.
pub(crate) const MAX_MODULE_DEPTH: usize = 16;

/// A reusable tree of registrations.
///
/// A module carries an ordered list of registration steps and an ordered
/// list of submodules. Modules are shared as `Arc`s; the `Arc` identity is
/// what deduplicates them, so including the same module twice (directly or
/// through two different parents) registers its declarations exactly once,
/// at the position of its first inclusion.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wirebox::{Resolver, ServiceCollection, ServiceModule};
///
/// struct Pool { size: u32 }
/// struct Repo;
///
/// let storage = Arc::new(
///     ServiceModule::new("storage")
///         .register(|c| {
///             c.add_long(Pool { size: 8 });
///         }),
/// );
/// let app = Arc::new(
///     ServiceModule::new("app")
///         .register(|c| {
///             c.add_long_factory::<Repo, _>(|_| Repo);
///         })
///         .submodule(storage.clone()),
/// );
///
/// let mut services = ServiceCollection::new();
/// services.add_module(&app).unwrap();
/// services.add_module(&storage).unwrap(); // second inclusion: no-op
///
/// let provider = services.build().unwrap();
/// assert_eq!(provider.get_required::<Pool>().size, 8);
/// ```
pub struct ServiceModule {
    name: &'static str,
    installers: Vec<Box<dyn Fn(&mut ServiceCollection) + Send + Sync>>,
    submodules: Vec<Arc<ServiceModule>>,
}

impl ServiceModule {
    /// Creates an empty module.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            installers: Vec::new(),
            submodules: Vec::new(),
        }
    }

    /// Appends a registration step.
    pub fn register<F>(mut self, install: F) -> Self
    where
        F: Fn(&mut ServiceCollection) + Send + Sync + 'static,
    {
        self.installers.push(Box::new(install));
        self
    }

    /// Appends a submodule, included after this module's own steps.
    pub fn submodule(mut self, module: Arc<ServiceModule>) -> Self {
        self.submodules.push(module);
        self
    }

    /// The module's name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn installers(&self) -> &[Box<dyn Fn(&mut ServiceCollection) + Send + Sync>] {
        &self.installers
    }

    pub(crate) fn submodules(&self) -> &[Arc<ServiceModule>] {
        &self.submodules
    }
}
