//! Error types for the dependency injection container.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::key::ServiceKey;

/// Boxed error type carried by constructors and disposers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for container operations.
pub type DiResult<T> = Result<T, DiError>;

/// Top-level error for resolution-surface operations.
///
/// Registration and build failures have their own types ([`RegistrationError`],
/// [`BuildError`]) since they happen before a provider exists; everything the
/// live container returns is a `DiError`.
#[derive(Error, Debug)]
pub enum DiError {
    /// A `Resolve*` operation failed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// The scope was closed before or during the operation.
    #[error("scope {scope_id} is closed")]
    ScopeClosed {
        /// Identifier of the closed scope.
        scope_id: u64,
    },
    /// The provider was closed; every operation on it is terminal.
    #[error("provider is closed")]
    ProviderClosed,
    /// `from_context` found no live scope attached to the context chain.
    #[error("no scope attached to this context")]
    NoScopeInContext,
    /// Disposal failures collected while closing a scope.
    #[error(transparent)]
    Disposal(#[from] DisposalError),
}

/// Errors raised while declaring bindings on a collection.
#[derive(Error, Debug, Clone)]
pub enum RegistrationError {
    /// A `(type, key)` pair was bound more than once as a non-group binding.
    #[error("duplicate binding for {key}")]
    DuplicateBinding {
        /// The key bound twice.
        key: ServiceKey,
    },
    /// Mutually exclusive options were combined on one binding.
    #[error("conflicting options for {key}: {reason}")]
    ConflictingOptions {
        /// The offending binding.
        key: ServiceKey,
        /// Which combination was rejected.
        reason: &'static str,
    },
    /// A module tree nested deeper than the configured bound.
    #[error("module tree deeper than {limit} levels at module \"{module}\"")]
    ModuleDepthExceeded {
        /// Name of the module at which the bound was hit.
        module: &'static str,
        /// The depth bound.
        limit: usize,
    },
}

/// Errors raised by `build` when the registry or graph is rejected.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A registration recorded earlier surfaced when the registry froze.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// A declared non-optional dependency terminates at no binding.
    #[error("missing dependency: {dependency} required by {dependent}")]
    MissingDependency {
        /// The node whose edge dangles.
        dependent: ServiceKey,
        /// The absent target.
        dependency: ServiceKey,
    },
    /// The non-optional dependency graph contains a cycle.
    #[error("circular dependency: {path}")]
    CircularDependency {
        /// The cycle, first node repeated at the end.
        path: DependencyPath,
    },
    /// A long-lived service depends on a scoped one.
    #[error("lifetime conflict: long-lived {dependent} depends on scoped {dependency}")]
    LifetimeConflict {
        /// The long-lived dependent.
        dependent: ServiceKey,
        /// The scoped dependency it would capture.
        dependency: ServiceKey,
    },
    /// A decorator was registered for a binding that does not exist.
    #[error("decorator for {key} has no underlying binding")]
    DecoratorCoherence {
        /// The decorated key lacking a base registration.
        key: ServiceKey,
    },
    /// Eager construction of a long-lived service failed.
    #[error("eager construction of {key} failed: {source}")]
    EagerInit {
        /// The service whose constructor failed.
        key: ServiceKey,
        /// The underlying failure.
        #[source]
        source: Box<DiError>,
    },
}

/// Errors raised during a `Resolve*` walk.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// No binding exists for a non-optional request.
    #[error("no binding for {key}")]
    MissingDependency {
        /// The absent binding.
        key: ServiceKey,
    },
    /// The current resolution re-entered a node already under construction.
    #[error("circular dependency: {path}")]
    CircularDependency {
        /// The construction path, the re-entered node repeated at the end.
        path: DependencyPath,
    },
    /// The recursion bound was exceeded.
    #[error("resolution depth limit of {limit} exceeded while resolving {key}")]
    MaxDepth {
        /// The node at which the bound was hit.
        key: ServiceKey,
        /// The configured bound.
        limit: usize,
    },
    /// The constructor returned an error, or panicked under panic recovery.
    #[error("constructor for {key} failed: {message}")]
    Constructor {
        /// The node whose constructor failed.
        key: ServiceKey,
        /// Human-readable failure description.
        message: String,
        /// The constructor's error value, when it returned one.
        #[source]
        source: Option<BoxError>,
    },
    /// The configured resolution deadline elapsed.
    #[error("resolution deadline of {deadline:?} exceeded while resolving {key}")]
    Timeout {
        /// The node being resolved when the deadline passed.
        key: ServiceKey,
        /// The configured deadline.
        deadline: Duration,
    },
    /// The scope's context was cancelled mid-resolution.
    #[error("resolution cancelled while resolving {key}")]
    Cancelled {
        /// The node being resolved when cancellation was observed.
        key: ServiceKey,
    },
    /// Deferred-validation backstop: a long-lived constructor requested a
    /// scoped dependency.
    #[error("lifetime conflict: long-lived {dependent} depends on scoped {dependency}")]
    LifetimeConflict {
        /// The long-lived dependent.
        dependent: ServiceKey,
        /// The scoped dependency it requested.
        dependency: ServiceKey,
    },
    /// A cached value failed to downcast to the requested type.
    #[error("stored value for {type_name} has unexpected type")]
    TypeMismatch {
        /// The requested type.
        type_name: &'static str,
    },
}

/// A dependency path through the graph, rendered `A -> B -> A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPath(pub Vec<ServiceKey>);

impl DependencyPath {
    /// Whether the path mentions the given type name.
    pub fn mentions(&self, type_name: &str) -> bool {
        self.0.iter().any(|k| k.type_name() == type_name)
    }
}

impl fmt::Display for DependencyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Aggregate of disposer failures collected while closing a scope tree.
///
/// Disposal never aborts early: every disposer runs, and whatever failed is
/// reported here together.
#[derive(Error, Debug)]
pub struct DisposalError {
    /// The individual failures, in the order they occurred.
    pub failures: Vec<DisposalFailure>,
}

impl fmt::Display for DisposalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} disposal failure(s):", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "{i}: {failure}")?;
        }
        Ok(())
    }
}

/// One disposer failure.
#[derive(Error, Debug)]
#[error("disposing {type_name} in scope {scope_id} failed: {source}")]
pub struct DisposalFailure {
    /// The scope whose close ran the disposer.
    pub scope_id: u64,
    /// Type of the instance being disposed.
    pub type_name: &'static str,
    /// The disposer's error.
    #[source]
    pub source: BoxError,
}
