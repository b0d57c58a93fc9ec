//! The transition-resolution-and-execution engine.
//!
//! This is the imperative shell around the value types in [`crate::core`]:
//! - Transition table entries via [`Transition`]
//! - Guard chains via [`Middleware`], [`Next`] and the per-attempt executor
//! - The [`Machine`] driving the whole protocol from `receive`
//!
//! # Protocol
//!
//! One `receive` call is one attempt. An attempt that matches a table entry
//! clears the last rejection, raises the in-flight flag, runs the entry's
//! middleware chain, and lowers the flag again. Events arriving while the
//! flag is up are dropped, never queued. A chain that reaches its end commits
//! (leave, swap, enter); a chain that vetoes or faults records a [`Rejection`]
//! and leaves the state untouched.

mod machine;
mod middleware;
mod transition;

pub use machine::Machine;
pub use middleware::{GuardFault, Middleware, MiddlewareFuture, Next, Rejection};
pub use transition::Transition;
