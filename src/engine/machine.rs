//! The machine: transition resolution and execution.
//!
//! [`Machine::receive`] is the sole mutation entry point. One call is one
//! transition attempt: match the event against the table, resolve the target,
//! run the matched transition's middleware chain, and either commit the state
//! change or record why it was rejected.

use super::middleware::{Chain, Middleware, Rejection};
use super::transition::Transition;
use crate::core::{Cell, Event, PlainState, SharedState};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Name → state registry. A key present with `None` marks a name referenced
/// by the table but not yet materialized.
type StateRegistry = HashMap<String, Option<SharedState>>;

/// An event-driven state machine.
///
/// A machine owns a read-only transition table, a registry of named states,
/// a per-transition-name middleware registry, and three observable values:
/// the current state, the in-flight flag and the last rejection.
///
/// Events are delivered with [`receive`](Machine::receive); everything else
/// is registration (`add_state`, `add_middleware`) or read access. Unmatched
/// events are absorbed silently — callers that care inspect
/// [`current_state`](Machine::current_state) and
/// [`rejection`](Machine::rejection) afterwards.
///
/// # Example
///
/// ```rust
/// use machina::{Event, Machine, PlainState, Transition};
/// use std::sync::Arc;
///
/// let machine = Machine::new(
///     "idle",
///     vec![
///         Transition::new("idle", "start", "running"),
///         Transition::new("running", "stop", "idle"),
///     ],
/// );
/// machine.add_state(Arc::new(PlainState::new("idle")));
/// machine.add_state(Arc::new(PlainState::new("running")));
///
/// futures::executor::block_on(machine.receive(Event::new("start")));
/// assert_eq!(machine.current_state().unwrap().name(), "running");
/// ```
pub struct Machine {
    initial: String,
    transitions: Vec<Transition>,
    states: RwLock<StateRegistry>,
    middlewares: RwLock<HashMap<String, Vec<Middleware>>>,
    current: Arc<Cell<Option<SharedState>>>,
    transitioning: Cell<bool>,
    rejection: Arc<Cell<Option<Rejection>>>,
}

impl Machine {
    /// Create a machine with the given initial-state name and transition
    /// table.
    ///
    /// Every state name the table references is seeded into the registry as a
    /// placeholder, to be filled by [`add_state`](Machine::add_state) or
    /// materialized lazily as a [`PlainState`] on first use. Middlewares
    /// attached to named transitions are merged into the middleware registry
    /// in table order.
    ///
    /// Nothing is validated here — duplicate `(from, event)` rows are legal
    /// (first match wins), and middlewares on an unnamed transition are
    /// unreachable (a warning is logged). Use
    /// [`MachineBuilder`](crate::builder::MachineBuilder) for a validating
    /// construction path.
    pub fn new(initial: impl Into<String>, transitions: Vec<Transition>) -> Self {
        let mut states = StateRegistry::new();
        let mut middlewares: HashMap<String, Vec<Middleware>> = HashMap::new();

        for transition in &transitions {
            states.entry(transition.from.clone()).or_insert(None);
            states.entry(transition.to.clone()).or_insert(None);

            if transition.middlewares.is_empty() {
                continue;
            }
            match &transition.name {
                Some(name) => middlewares
                    .entry(name.clone())
                    .or_default()
                    .extend(transition.middlewares.iter().cloned()),
                None => tracing::warn!(
                    from = %transition.from,
                    event = %transition.event,
                    "middlewares attached to an unnamed transition are unreachable"
                ),
            }
        }

        Machine {
            initial: initial.into(),
            transitions,
            states: RwLock::new(states),
            middlewares: RwLock::new(middlewares),
            current: Arc::new(Cell::new(None)),
            transitioning: Cell::new(false),
            rejection: Arc::new(Cell::new(None)),
        }
    }

    /// Create a machine and register `states` in one step.
    pub fn with_states(
        initial: impl Into<String>,
        transitions: Vec<Transition>,
        states: Vec<SharedState>,
    ) -> Self {
        let machine = Machine::new(initial, transitions);
        for state in states {
            machine.add_state(state);
        }
        machine
    }

    /// Register a state, replacing any previous entry with the same name.
    ///
    /// If no current state is set and the state's name matches the configured
    /// initial name, the state is adopted as current. Re-registering the
    /// current state's name does not retarget the current-state cell.
    pub fn add_state(&self, state: SharedState) {
        if self.current.get().is_none() && state.name() == self.initial {
            self.current.set(Some(Arc::clone(&state)));
        }
        self.states
            .write()
            .insert(state.name().to_string(), Some(state));
    }

    /// Append a guard to the named transition's chain.
    ///
    /// Append-only: earlier guards keep their position. The name does not
    /// have to exist in the table yet.
    pub fn add_middleware(&self, transition_name: impl Into<String>, middleware: Middleware) {
        self.middlewares
            .write()
            .entry(transition_name.into())
            .or_default()
            .push(middleware);
    }

    /// Append several guards to the named transition's chain, in order.
    pub fn add_middlewares(
        &self,
        transition_name: impl Into<String>,
        middlewares: impl IntoIterator<Item = Middleware>,
    ) {
        self.middlewares
            .write()
            .entry(transition_name.into())
            .or_default()
            .extend(middlewares);
    }

    /// The current state, or `None` until the initial state is registered.
    pub fn current_state(&self) -> Option<SharedState> {
        self.current.get()
    }

    /// Whether a transition attempt is in flight right now.
    pub fn transitioning(&self) -> bool {
        self.transitioning.get()
    }

    /// The last rejected attempt's outcome.
    ///
    /// Cleared at the start of every attempt that reaches its middleware
    /// chain (or direct commit), so a successful attempt leaves this `None`.
    pub fn rejection(&self) -> Option<Rejection> {
        self.rejection.get()
    }

    /// The configured initial-state name.
    pub fn initial(&self) -> &str {
        &self.initial
    }

    /// The transition table, in declaration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Deliver an event, attempting at most one transition.
    ///
    /// Resolves when the attempt has finished. Resolves immediately and
    /// without effect when another attempt is in flight (the event is
    /// dropped, not queued), when no table entry matches the current state
    /// and event kind, or when the target name is unknown to the registry.
    ///
    /// A matching attempt clears the rejection cell, raises the in-flight
    /// flag for the duration of the attempt, runs the transition's middleware
    /// chain (committing directly when there is none), and lowers the flag —
    /// also when a guard faults, so a failing guard cannot wedge the machine.
    pub async fn receive(&self, event: Event) {
        if self.transitioning.get() {
            tracing::debug!(kind = event.kind(), "event dropped: attempt in flight");
            return;
        }
        let Some(current) = self.current.get() else {
            tracing::trace!(kind = event.kind(), "event ignored: no current state");
            return;
        };
        let Some(transition) = self
            .transitions
            .iter()
            .find(|t| t.matches(current.name(), event.kind()))
        else {
            tracing::trace!(
                state = current.name(),
                kind = event.kind(),
                "no matching transition"
            );
            return;
        };
        let Some(target) = self.resolve_target(&transition.to) else {
            tracing::trace!(to = %transition.to, "target not referenced by the table");
            return;
        };

        self.rejection.set(None);
        self.transitioning.set(true);

        let guards = transition
            .name
            .as_deref()
            .and_then(|name| self.middlewares.read().get(name).cloned())
            .unwrap_or_default();

        let event = Arc::new(event);
        if guards.is_empty() {
            commit(&self.current, &current, &target, &event);
        } else {
            let chain = Chain::new(
                guards,
                Arc::clone(&event),
                Arc::clone(&current),
                Arc::clone(&target),
                self.completion_action(&current, &target, &event),
                self.rejection_action(),
            );
            if let Err(fault) = chain.run().await {
                tracing::debug!(%fault, "attempt abandoned by middleware fault");
            }
        }

        self.transitioning.set(false);
    }

    /// Three-way target lookup: live state, placeholder to materialize, or
    /// unknown name.
    fn resolve_target(&self, name: &str) -> Option<SharedState> {
        let mut states = self.states.write();
        match states.get_mut(name) {
            Some(Some(state)) => Some(Arc::clone(state)),
            Some(slot) => {
                let state: SharedState = Arc::new(PlainState::new(name));
                *slot = Some(Arc::clone(&state));
                tracing::debug!(name, "materialized placeholder state");
                Some(state)
            }
            None => None,
        }
    }

    /// The commit closure handed to a chain's terminal step.
    fn completion_action(
        &self,
        current: &SharedState,
        target: &SharedState,
        event: &Arc<Event>,
    ) -> Box<dyn Fn() + Send + Sync> {
        let cell = Arc::clone(&self.current);
        let from = Arc::clone(current);
        let to = Arc::clone(target);
        let event = Arc::clone(event);
        Box::new(move || commit(&cell, &from, &to, &event))
    }

    /// The rejection-recording closure handed to a chain. First write wins
    /// within one attempt, which keeps fault attribution at its origin.
    fn rejection_action(&self) -> Box<dyn Fn(Rejection) + Send + Sync> {
        let cell = Arc::clone(&self.rejection);
        Box::new(move |rejection| {
            if cell.get().is_none() {
                tracing::debug!(
                    middleware = ?rejection.middleware(),
                    veto = rejection.is_veto(),
                    "transition rejected"
                );
                cell.set(Some(rejection));
            }
        })
    }
}

/// Apply a commit: `leave` the outgoing state, swap the cell, `enter` the
/// incoming state with the outgoing one as `prev`.
fn commit(cell: &Cell<Option<SharedState>>, from: &SharedState, to: &SharedState, event: &Event) {
    from.leave(event);
    cell.set(Some(Arc::clone(to)));
    to.enter(from.as_ref(), event);
    tracing::debug!(
        from = from.name(),
        to = to.name(),
        kind = event.kind(),
        "transition committed"
    );
}
