//! Mutable cells holding the machine's observable values.
//!
//! The engine needs nothing more than a slot with synchronous read and write
//! and no transactional guarantees. Reads clone the value out; writes
//! overwrite. There is no subscriber notification — observers poll.

use parking_lot::Mutex;
use std::fmt;

/// A mutable slot with synchronous `get`/`set` access.
///
/// Backs the machine's current-state, in-flight and rejection values. The
/// lock only protects the individual read or write; callers needing
/// atomicity across operations must provide it themselves (the machine's
/// in-flight flag serves that role at the protocol level).
pub struct Cell<T> {
    slot: Mutex<T>,
}

impl<T: Clone> Cell<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Cell {
            slot: Mutex::new(value),
        }
    }

    /// Read the current value out of the cell.
    pub fn get(&self) -> T {
        self.slot.lock().clone()
    }

    /// Overwrite the cell's value.
    pub fn set(&self, value: T) {
        *self.slot.lock() = value;
    }
}

impl<T: Clone + Default> Default for Cell<T> {
    fn default() -> Self {
        Cell::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cell").field(&*self.slot.lock()).finish()
    }
}
