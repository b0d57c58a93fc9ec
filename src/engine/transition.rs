//! Transition table entries.

use super::middleware::Middleware;
use serde::{Deserialize, Serialize};

/// A rule mapping (source state, event kind) to a target state.
///
/// Entries are plain records and stay read-only once handed to a machine.
/// The `(from, event)` pair need not be unique across a table: when several
/// entries match, the machine picks the first one in declaration order. That
/// priority rule is deliberate and nothing validates tables for ambiguity.
///
/// `name` keys the machine's middleware registry, so it is only required for
/// transitions that carry (or will later receive) middleware. Attaching
/// middlewares to an unnamed transition leaves them unreachable; the builder
/// in [`crate::builder`] rejects that combination.
///
/// Tables are data: transitions serialize without their middlewares, which
/// are attached in code after loading.
///
/// # Example
///
/// ```rust
/// use machina::{Middleware, Transition};
///
/// let plain = Transition::new("idle", "start", "running");
/// let guarded = Transition::named("start-run", "idle", "start", "running")
///     .middleware(Middleware::predicate(|_| true));
/// # let _ = (plain, guarded);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transition {
    /// Registry key for this transition's middleware chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source state name.
    pub from: String,
    /// Event kind that triggers this transition.
    pub event: String,
    /// Target state name.
    pub to: String,
    /// Guards attached at construction, merged into the machine's registry.
    #[serde(skip)]
    pub middlewares: Vec<Middleware>,
}

impl Transition {
    /// Create an unnamed transition.
    pub fn new(from: impl Into<String>, event: impl Into<String>, to: impl Into<String>) -> Self {
        Transition {
            name: None,
            from: from.into(),
            event: event.into(),
            to: to.into(),
            middlewares: Vec::new(),
        }
    }

    /// Create a named transition, addressable by
    /// [`Machine::add_middleware`](crate::engine::Machine::add_middleware).
    pub fn named(
        name: impl Into<String>,
        from: impl Into<String>,
        event: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Transition {
            name: Some(name.into()),
            ..Transition::new(from, event, to)
        }
    }

    /// Attach a guard to run when this transition matches.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Whether this entry applies to the given state/event pair.
    pub fn matches(&self, state_name: &str, event_kind: &str) -> bool {
        self.from == state_name && self.event == event_kind
    }
}
