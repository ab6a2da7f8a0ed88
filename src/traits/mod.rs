//! Public traits: resolution surface and disposal contracts.

mod dispose;
mod resolver;

pub use dispose::{ContextDispose, Dispose};
pub use resolver::{Resolver, ResolverCore};
