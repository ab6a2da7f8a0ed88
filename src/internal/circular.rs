//! Per-resolution state: construction stack, depth, deadline.
//!
//! Constructors are synchronous, so one top-level resolve owns one thread
//! for its whole walk; the construction set therefore lives in thread-local
//! storage, pushed and popped by an RAII guard. Concurrent resolutions on
//! other threads carry their own stacks; serialization happens at the
//! cache entries, not here.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use crate::error::{DependencyPath, ResolutionError};
use crate::key::ServiceKey;

thread_local! {
    static RESOLUTION_TLS: RefCell<ResolutionTls> = RefCell::new(ResolutionTls::default());
}

#[derive(Default)]
struct ResolutionTls {
    stack: Vec<ServiceKey>,
    depth: usize,
    deadline: Option<(Instant, Duration)>,
}

/// RAII frame for one node on the construction stack.
#[derive(Debug)]
pub(crate) struct ResolutionGuard {
    _private: (),
}

/// Enters a node: detects re-entry (a cycle), enforces the depth bound, and
/// at depth zero arms the per-resolve deadline.
pub(crate) fn enter(
    key: &ServiceKey,
    max_depth: usize,
    deadline: Option<Duration>,
) -> Result<ResolutionGuard, ResolutionError> {
    RESOLUTION_TLS.with(|tls| {
        let mut tls = tls.borrow_mut();

        if tls.stack.iter().any(|k| k == key) {
            let mut path = tls.stack.clone();
            path.push(key.clone());
            return Err(ResolutionError::CircularDependency {
                path: DependencyPath(path),
            });
        }

        if tls.depth >= max_depth {
            return Err(ResolutionError::MaxDepth {
                key: key.clone(),
                limit: max_depth,
            });
        }

        if tls.depth == 0 {
            tls.deadline = deadline.map(|d| (Instant::now() + d, d));
        } else if let Some((at, budget)) = tls.deadline {
            if Instant::now() >= at {
                return Err(ResolutionError::Timeout {
                    key: key.clone(),
                    deadline: budget,
                });
            }
        }

        tls.stack.push(key.clone());
        tls.depth += 1;
        Ok(ResolutionGuard { _private: () })
    })
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            tls.stack.pop();
            tls.depth = tls.depth.saturating_sub(1);
            if tls.depth == 0 {
                tls.deadline = None;
            }
        });
    }
}

/// The construction path currently on this thread, outermost first.
#[cfg(test)]
pub(crate) fn current_path() -> Vec<ServiceKey> {
    RESOLUTION_TLS.with(|tls| tls.borrow().stack.clone())
}
