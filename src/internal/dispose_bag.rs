//! Construction-ordered disposable list, drained in reverse at close.

use std::sync::Arc;

use crate::context::ScopeContext;
use crate::error::{BoxError, DisposalFailure};
use crate::traits::{ContextDispose, Dispose};

/// A recorded disposal obligation.
pub(crate) enum DisposeEntry {
    /// Zero-argument release operation.
    Plain(Arc<dyn Dispose>),
    /// Release operation receiving the closing scope's context.
    Contextual(Arc<dyn ContextDispose>),
    /// Free-form hook registered imperatively from a factory.
    Hook(Box<dyn FnOnce(&ScopeContext) -> Result<(), BoxError> + Send>),
}

pub(crate) struct Disposable {
    pub entry: DisposeEntry,
    pub type_name: &'static str,
}

impl Disposable {
    pub(crate) fn run(self, ctx: &ScopeContext) -> Result<(), BoxError> {
        match self.entry {
            DisposeEntry::Plain(d) => d.dispose(),
            DisposeEntry::Contextual(d) => d.dispose(ctx),
            DisposeEntry::Hook(f) => f(ctx),
        }
    }
}

/// Disposables in construction order; `run_reverse` drains newest-first.
#[derive(Default)]
pub(crate) struct DisposeBag {
    items: Vec<Disposable>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, disposable: Disposable) {
        self.items.push(disposable);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Runs every disposable in reverse construction order. Failures are
    /// collected, never aborting the sweep.
    pub(crate) fn run_reverse(&mut self, scope_id: u64, ctx: &ScopeContext) -> Vec<DisposalFailure> {
        let mut failures = Vec::new();
        while let Some(disposable) = self.items.pop() {
            let type_name = disposable.type_name;
            if let Err(source) = disposable.run(ctx) {
                failures.push(DisposalFailure {
                    scope_id,
                    type_name,
                    source,
                });
            }
        }
        failures
    }
}
