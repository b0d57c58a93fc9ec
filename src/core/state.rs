//! Named states with lifecycle hooks.
//!
//! States are identified by name and carry caller-supplied `enter`/`leave`
//! behavior. The engine guarantees *when* the hooks fire (once per commit,
//! in leave-then-enter order) and nothing about what they do.

use super::event::Event;
use std::sync::Arc;

/// A state shared between the machine's registry and its callers.
pub type SharedState = Arc<dyn State>;

/// A named node in the state machine.
///
/// The name is the state's identity: it keys the machine's registry and is
/// what transition table entries refer to. `enter` and `leave` are lifecycle
/// hooks with no-op defaults; override them for business logic.
///
/// Hooks are called synchronously during a transition commit and their work
/// is not awaited — a hook that needs async behavior must spawn and manage it
/// itself. Hooks take `&self` because states are shared for the machine's
/// lifetime; stateful hooks use interior mutability.
///
/// # Example
///
/// ```rust
/// use machina::{Event, State};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct Counted {
///     name: String,
///     entered: AtomicUsize,
/// }
///
/// impl State for Counted {
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     fn enter(&self, _prev: &dyn State, _event: &Event) {
///         self.entered.fetch_add(1, Ordering::SeqCst);
///     }
/// }
/// ```
pub trait State: Send + Sync {
    /// The state's unique name, used as the registry key.
    fn name(&self) -> &str;

    /// Called exactly once per commit that makes this state current.
    ///
    /// `prev` is the state being left by the same commit.
    fn enter(&self, prev: &dyn State, event: &Event) {
        let _ = (prev, event);
    }

    /// Called exactly once per commit that moves away from this state.
    fn leave(&self, event: &Event) {
        let _ = event;
    }
}

/// A state with a name and no behavior.
///
/// This is what the machine materializes for a transition target that was
/// referenced by the table but never registered via
/// [`Machine::add_state`](crate::engine::Machine::add_state). It is also a
/// convenient concrete type when no lifecycle behavior is needed.
#[derive(Clone, Debug)]
pub struct PlainState {
    name: String,
}

impl PlainState {
    /// Create a behavior-free state with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        PlainState { name: name.into() }
    }
}

impl State for PlainState {
    fn name(&self) -> &str {
        &self.name
    }
}
