//! # wirebox
//!
//! Runtime dependency injection for server-side Rust: a registry of service
//! constructors whose dependencies are resolved automatically, instances
//! cached by lifetime, and resources released in reverse-construction order
//! across a tree of nested scopes.
//!
//! ## Features
//!
//! - **Two lifetimes**: `Long` (one instance per root) and `Scoped` (one per
//!   scope); per-call uniqueness is a fresh short-lived scope
//! - **Graph validation at build**: cycle detection, captive-dependency
//!   rejection, reachability of declared edges
//! - **Keyed and grouped bindings**: several bindings of one type, ordered
//!   group sequences
//! - **Decorators**: wrap an existing binding's value, chained in
//!   registration order
//! - **Aggregates**: structured parameter sets and multi-binding result
//!   bundles
//! - **Scope tree with deterministic disposal**: children close before
//!   parents, instances release newest-first, failures are collected
//! - **Thread-safe**: concurrent first-resolves of one binding invoke its
//!   constructor exactly once
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox::{Resolver, ScopeContext, ServiceCollection};
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_long(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services
//!     .add_scoped_factory::<UserService, _>(|ctx| UserService {
//!         db: ctx.get_required::<Database>(),
//!     })
//!     .depends_on::<Database>();
//!
//! let provider = services.build().unwrap();
//!
//! // One scope per unit of work; scoped instances die with it.
//! let scope = provider.create_scope(ScopeContext::background()).unwrap();
//! let users = scope.get_required::<UserService>();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! scope.close().unwrap();
//! provider.close().unwrap();
//! ```
//!
//! ## Request scopes and the context bridge
//!
//! A per-request adapter creates a scope, forwards the scope's context with
//! the request, and anything downstream recovers the scope without threading
//! it explicitly:
//!
//! ```rust
//! use wirebox::{from_context, ScopeContext, ServiceCollection};
//!
//! let provider = ServiceCollection::new().build().unwrap();
//!
//! // Middleware side:
//! let scope = provider.create_scope(ScopeContext::background()).unwrap();
//! let ctx = scope.context().clone();
//!
//! // Handler side:
//! let recovered = from_context(&ctx).unwrap();
//! assert_eq!(recovered.id(), scope.id());
//!
//! // Request end:
//! scope.close().unwrap();
//! ```

pub mod aggregate;
pub mod cancellation;
pub mod collection;
pub mod context;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod options;
pub mod provider;
pub mod traits;

mod cache;
mod descriptor;
mod graph;
mod internal;
mod registry;

pub use aggregate::{published, DependencySet, ServiceBundle};
pub use cancellation::CancellationToken;
pub use collection::{
    Binding, DecoratorBinding, ServiceCollection, ServiceModule, TraitBinding,
};
pub use context::{from_context, ScopeContext};
pub use descriptor::{DependencyRequest, PublishedBinding};
pub use error::{
    BoxError, BuildError, DependencyPath, DiError, DiResult, DisposalError, DisposalFailure,
    RegistrationError, ResolutionError,
};
pub use key::ServiceKey;
pub use lifetime::Lifetime;
pub use observer::{ResolveObserver, TracingObserver};
pub use options::{BuildOptions, DEFAULT_MAX_RESOLUTION_DEPTH};
pub use provider::{ResolverContext, Scope, ServiceProvider};
pub use traits::{ContextDispose, Dispose, Resolver, ResolverCore};
