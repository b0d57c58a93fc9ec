//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::engine::{Middleware, Transition};

/// Builder for constructing transitions with a fluent API.
///
/// Unlike [`Transition::new`], the builder validates: `from`, `on` and `to`
/// are required, and attaching middleware without a name is rejected rather
/// than left silently unreachable.
pub struct TransitionBuilder {
    name: Option<String>,
    from: Option<String>,
    event: Option<String>,
    to: Option<String>,
    middlewares: Vec<Middleware>,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            name: None,
            from: None,
            event: None,
            to: None,
            middlewares: Vec::new(),
        }
    }

    /// Name the transition (required when middleware is attached).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source state name (required).
    pub fn from(mut self, state: impl Into<String>) -> Self {
        self.from = Some(state.into());
        self
    }

    /// Set the triggering event kind (required).
    pub fn on(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Set the target state name (required).
    pub fn to(mut self, state: impl Into<String>) -> Self {
        self.to = Some(state.into());
        self
    }

    /// Attach a guard (optional, repeatable; order is preserved).
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Attach a guard from a synchronous predicate (optional, repeatable).
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&crate::core::Event) -> bool + Send + Sync + 'static,
    {
        self.middleware(Middleware::predicate(predicate))
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let event = self.event.ok_or(BuildError::MissingEvent)?;
        let to = self.to.ok_or(BuildError::MissingToState)?;

        if self.name.is_none() && !self.middlewares.is_empty() {
            return Err(BuildError::UnnamedMiddleware { from, to });
        }

        Ok(Transition {
            name: self.name,
            from,
            event,
            to,
            middlewares: self.middlewares,
        })
    }
}

impl Default for TransitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionBuilder::new().from("idle").build();
        assert!(matches!(result, Err(BuildError::MissingEvent)));

        let result = TransitionBuilder::new().from("idle").on("start").build();
        assert!(matches!(result, Err(BuildError::MissingToState)));

        let result = TransitionBuilder::new().on("start").to("running").build();
        assert!(matches!(result, Err(BuildError::MissingFromState)));
    }

    #[test]
    fn builder_rejects_unnamed_middleware() {
        let result = TransitionBuilder::new()
            .from("idle")
            .on("start")
            .to("running")
            .when(|_| true)
            .build();

        assert!(matches!(
            result,
            Err(BuildError::UnnamedMiddleware { .. })
        ));
    }

    #[test]
    fn fluent_api_builds_transition() {
        let transition = TransitionBuilder::new()
            .name("start-run")
            .from("idle")
            .on("start")
            .to("running")
            .when(|_| true)
            .build()
            .unwrap();

        assert_eq!(transition.name.as_deref(), Some("start-run"));
        assert!(transition.matches("idle", "start"));
        assert_eq!(transition.to, "running");
        assert_eq!(transition.middlewares.len(), 1);
    }

    #[test]
    fn unguarded_transitions_need_no_name() {
        let transition = TransitionBuilder::new()
            .from("idle")
            .on("start")
            .to("running")
            .build()
            .unwrap();

        assert!(transition.name.is_none());
        assert!(transition.middlewares.is_empty());
    }
}
