//! Disposal contracts for resource cleanup.

use crate::context::ScopeContext;
use crate::error::BoxError;

/// Zero-argument release operation, run when the owning scope closes.
///
/// Instances declared disposable (via the binding's `.disposable()` option
/// or an imperative `register_disposer` call) are recorded in construction
/// order and released in reverse when their scope closes. Errors are
/// collected into the close's aggregate result and never stop the sweep.
///
/// # Examples
///
/// ```rust
/// use wirebox::{BoxError, Dispose, Resolver, ScopeContext, ServiceCollection};
///
/// struct Connection { name: &'static str }
///
/// impl Dispose for Connection {
///     fn dispose(&self) -> Result<(), BoxError> {
///         println!("closing {}", self.name);
///         Ok(())
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services
///     .add_scoped_factory::<Connection, _>(|_| Connection { name: "primary" })
///     .disposable();
///
/// let provider = services.build().unwrap();
/// let scope = provider.create_scope(ScopeContext::background()).unwrap();
/// let _conn = scope.get_required::<Connection>();
/// scope.close().unwrap(); // runs Connection::dispose
/// ```
pub trait Dispose: Send + Sync {
    /// Releases the instance's resources.
    fn dispose(&self) -> Result<(), BoxError>;
}

/// Release operation receiving the closing scope's context, so teardown can
/// observe cancellation or context values.
pub trait ContextDispose: Send + Sync {
    /// Releases the instance's resources.
    fn dispose(&self, ctx: &ScopeContext) -> Result<(), BoxError>;
}
