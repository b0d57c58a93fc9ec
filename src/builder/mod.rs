//! Builder API for ergonomic machine construction.
//!
//! This module provides fluent builders and macros for creating machines
//! with minimal boilerplate, plus the validation the raw constructors
//! deliberately skip.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use transition::TransitionBuilder;

use crate::core::Event;
use crate::engine::{Middleware, Transition};

/// Create a named transition guarded by a synchronous predicate.
///
/// # Example
///
/// ```
/// use machina::builder::guarded_transition;
///
/// let t = guarded_transition("start-run", "idle", "start", "running", |event| {
///     event.detail_field("allow").and_then(|v| v.as_bool()) == Some(true)
/// });
/// assert_eq!(t.name.as_deref(), Some("start-run"));
/// assert_eq!(t.middlewares.len(), 1);
/// ```
pub fn guarded_transition<F>(
    name: impl Into<String>,
    from: impl Into<String>,
    event: impl Into<String>,
    to: impl Into<String>,
    predicate: F,
) -> Transition
where
    F: Fn(&Event) -> bool + Send + Sync + 'static,
{
    Transition::named(name, from, event, to).middleware(Middleware::predicate(predicate))
}
