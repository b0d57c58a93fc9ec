//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::SharedState;
use crate::engine::{Machine, Transition};

/// Builder for constructing machines with a fluent API.
///
/// The raw [`Machine::new`] constructor accepts anything; this builder
/// validates that an initial state name is set, that the table is non-empty,
/// and that no transition attaches middleware without a name.
pub struct MachineBuilder {
    initial: Option<String>,
    transitions: Vec<Transition>,
    states: Vec<SharedState>,
}

impl MachineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            transitions: Vec::new(),
            states: Vec::new(),
        }
    }

    /// Set the initial state name (required).
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(mut self, builder: TransitionBuilder) -> Result<Self, BuildError> {
        let transition = builder.build()?;
        self.transitions.push(transition);
        Ok(self)
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: impl IntoIterator<Item = Transition>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Register a state at build time.
    pub fn state(mut self, state: SharedState) -> Self {
        self.states.push(state);
        self
    }

    /// Register multiple states at once.
    pub fn states(mut self, states: impl IntoIterator<Item = SharedState>) -> Self {
        self.states.extend(states);
        self
    }

    /// Build the machine.
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<Machine, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        if self.transitions.is_empty() {
            return Err(BuildError::NoTransitions);
        }
        for transition in &self.transitions {
            if transition.name.is_none() && !transition.middlewares.is_empty() {
                return Err(BuildError::UnnamedMiddleware {
                    from: transition.from.clone(),
                    to: transition.to.clone(),
                });
            }
        }

        Ok(Machine::with_states(initial, self.transitions, self.states))
    }
}

impl Default for MachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
