//! Machina: an event-driven finite state machine engine.
//!
//! A machine is a set of named states plus a table of permitted transitions
//! keyed by (source state, event kind). Delivering an event resolves it to at
//! most one target state, optionally filtering the transition through an
//! ordered chain of synchronous or asynchronous guard middleware.
//!
//! # Core Concepts
//!
//! - **State**: a named node with `enter`/`leave` lifecycle hooks, via the
//!   [`State`] trait
//! - **Transition**: a table row mapping (state, event) to a target, first
//!   match in declaration order winning
//! - **Middleware**: guards composed into a continuation-passing chain with
//!   accept/veto semantics and "around" ordering
//! - **Machine**: the engine — one `receive` call is one serialized
//!   transition attempt; concurrent events are dropped, not queued
//!
//! # Example
//!
//! ```rust
//! use machina::{Event, Machine, Middleware, PlainState, Transition};
//! use std::sync::Arc;
//!
//! let machine = Machine::new(
//!     "idle",
//!     vec![
//!         Transition::named("start-run", "idle", "start", "running"),
//!         Transition::new("running", "stop", "idle"),
//!     ],
//! );
//! machine.add_state(Arc::new(PlainState::new("idle")));
//! machine.add_state(Arc::new(PlainState::new("running")));
//!
//! // Only let "start" through when the event detail allows it.
//! machine.add_middleware(
//!     "start-run",
//!     Middleware::predicate(|event| {
//!         event.detail_field("allow").and_then(|v| v.as_bool()) == Some(true)
//!     }),
//! );
//!
//! futures::executor::block_on(async {
//!     machine.receive(Event::new("start")).await;
//!     assert_eq!(machine.current_state().unwrap().name(), "idle");
//!     assert!(machine.rejection().is_some());
//!
//!     let allowed = Event::with_detail("start", serde_json::json!({ "allow": true }));
//!     machine.receive(allowed).await;
//!     assert_eq!(machine.current_state().unwrap().name(), "running");
//! });
//! ```

pub mod builder;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, TransitionBuilder};
pub use core::{Cell, Event, PlainState, SharedState, State};
pub use engine::{GuardFault, Machine, Middleware, MiddlewareFuture, Next, Rejection, Transition};
