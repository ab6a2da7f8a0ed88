//! Slot-based instance store with per-entry once semantics.
//!
//! Every binding gets a slot index when the registry freezes, so a cache is
//! just an array of cells: the root holds one for long-lived instances, each
//! scope holds one for its scoped instances. A cell initializes exactly once
//! even under concurrent first-resolves; a failed initialization leaves the
//! cell empty so a later resolve may retry the constructor.

use once_cell::sync::OnceCell;

use crate::descriptor::AnyArc;
use crate::error::DiResult;

pub(crate) struct InstanceCache {
    cells: Box<[OnceCell<AnyArc>]>,
}

impl InstanceCache {
    pub(crate) fn with_slots(count: usize) -> Self {
        let cells: Box<[OnceCell<AnyArc>]> =
            (0..count).map(|_| OnceCell::new()).collect::<Vec<_>>().into_boxed_slice();
        Self { cells }
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> Option<AnyArc> {
        self.cells[slot].get().cloned()
    }

    /// Returns the cached value, or runs `init` exactly once to produce it.
    /// Concurrent callers block until the winning initializer finishes.
    pub(crate) fn get_or_try_init<F>(&self, slot: usize, init: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        self.cells[slot].get_or_try_init(init).cloned()
    }

    /// Publishes a value into a cell. A no-op when the cell is already
    /// occupied (publication races are benign: the bundle constructor ran
    /// once, so both writers carry the same value).
    pub(crate) fn publish(&self, slot: usize, value: AnyArc) {
        let _ = self.cells[slot].set(value);
    }
}
