//! Guard middleware and the continuation-passing chain executor.
//!
//! A transition's guards run as an ordered chain. Each guard receives a
//! consume-once [`Next`] continuation and decides whether the transition
//! proceeds. Because a guard awaits the continuation it gets "around"
//! semantics, not merely "before": code after the await runs only once the
//! entire downstream chain — and, on acceptance, the commit — has finished.

use crate::core::{Event, SharedState};
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The boxed future every middleware invocation resolves.
pub type MiddlewareFuture = BoxFuture<'static, Result<(), GuardFault>>;

type MiddlewareFn =
    dyn Fn(Next, Arc<Event>, SharedState, SharedState) -> MiddlewareFuture + Send + Sync;

/// An error escaping a middleware's own work.
///
/// Distinct from a veto: a veto is the middleware deciding "no", a fault is
/// the middleware failing to decide at all. The underlying error is shared so
/// the value stays cloneable once recorded in the machine's rejection cell.
#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct GuardFault(Arc<dyn std::error::Error + Send + Sync>);

impl GuardFault {
    /// Wrap any error as a guard fault.
    pub fn new(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        GuardFault(Arc::from(error.into()))
    }

    /// Build a fault from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        GuardFault::new(message.to_string())
    }

    /// Borrow the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

/// A guard in a transition's middleware chain.
///
/// A middleware is invoked with a [`Next`] continuation, the event under
/// evaluation, the current state and the candidate target state. It must
/// resolve the continuation to let the chain advance; see [`Next`] for the
/// accept/veto semantics.
///
/// The handle is cheap to clone and compares by identity: the machine's
/// rejection bookkeeping reports *which* middleware rejected, and
/// [`Middleware::ptr_eq`] answers whether two handles are the same guard.
///
/// # Example
///
/// ```rust
/// use machina::Middleware;
///
/// // A guard that lets events through only when the detail allows it.
/// let gate = Middleware::new(|next, event, _current, _target| {
///     let allow = event.detail_field("allow").and_then(|v| v.as_bool()) == Some(true);
///     next.resolve(allow, None)
/// });
///
/// // The same guard, written as a plain predicate.
/// let gate = Middleware::predicate(|event| {
///     event.detail_field("allow").and_then(|v| v.as_bool()) == Some(true)
/// });
/// # let _ = gate;
/// ```
#[derive(Clone)]
pub struct Middleware {
    func: Arc<MiddlewareFn>,
    name: Option<String>,
}

impl Middleware {
    /// Build a middleware from a function returning a [`MiddlewareFuture`].
    ///
    /// Asynchronous guards box their body:
    ///
    /// ```rust
    /// use machina::Middleware;
    ///
    /// let slow_gate = Middleware::new(|next, _event, _current, _target| {
    ///     Box::pin(async move {
    ///         // ... await arbitrary work here ...
    ///         next.proceed().await
    ///     })
    /// });
    /// # let _ = slow_gate;
    /// ```
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Next, Arc<Event>, SharedState, SharedState) -> MiddlewareFuture
            + Send
            + Sync
            + 'static,
    {
        Middleware {
            func: Arc::new(func),
            name: None,
        }
    }

    /// Build a labelled middleware; the label shows up in logs and `Debug`.
    pub fn named<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Next, Arc<Event>, SharedState, SharedState) -> MiddlewareFuture
            + Send
            + Sync
            + 'static,
    {
        Middleware {
            func: Arc::new(func),
            name: Some(name.into()),
        }
    }

    /// Build a middleware from a synchronous predicate over the event.
    ///
    /// `true` accepts, `false` vetoes with no detail.
    pub fn predicate<F>(pred: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        Middleware::new(move |next, event, _current, _target| next.resolve(pred(&event), None))
    }

    /// The label given at construction, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether two handles refer to the same middleware.
    pub fn ptr_eq(a: &Middleware, b: &Middleware) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&a.func) as *const (),
            Arc::as_ptr(&b.func) as *const (),
        )
    }

    fn call(
        &self,
        next: Next,
        event: Arc<Event>,
        current: SharedState,
        target: SharedState,
    ) -> MiddlewareFuture {
        (self.func)(next, event, current, target)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Middleware({name})"),
            None => f.write_str("Middleware"),
        }
    }
}

/// The recorded outcome of a rejected transition attempt.
#[derive(Clone, Debug)]
pub enum Rejection {
    /// A middleware vetoed the transition by resolving `false`.
    Veto {
        /// The guard that vetoed.
        middleware: Middleware,
        /// The opaque payload it attached, if any.
        detail: Option<Value>,
    },
    /// A middleware's own work failed; the attempt was abandoned.
    Fault {
        /// The guard whose future resolved to an error.
        middleware: Middleware,
        /// The error it produced.
        fault: GuardFault,
    },
}

impl Rejection {
    /// The guard responsible for the rejection.
    pub fn middleware(&self) -> &Middleware {
        match self {
            Rejection::Veto { middleware, .. } | Rejection::Fault { middleware, .. } => middleware,
        }
    }

    /// The veto detail payload, if this is a veto that carried one.
    pub fn detail(&self) -> Option<&Value> {
        match self {
            Rejection::Veto { detail, .. } => detail.as_ref(),
            Rejection::Fault { .. } => None,
        }
    }

    /// Whether a guard vetoed deliberately.
    pub fn is_veto(&self) -> bool {
        matches!(self, Rejection::Veto { .. })
    }

    /// Whether a guard failed rather than decided.
    pub fn is_fault(&self) -> bool {
        matches!(self, Rejection::Fault { .. })
    }
}

/// One transition attempt's guard chain.
///
/// Built fresh per attempt by the machine, which injects the completion and
/// rejection actions. The chain owns an immutable snapshot of the guard list,
/// so `add_middleware` during an in-flight attempt affects only later ones.
pub(crate) struct Chain {
    guards: Vec<Middleware>,
    event: Arc<Event>,
    current: SharedState,
    target: SharedState,
    complete: Box<dyn Fn() + Send + Sync>,
    report: Box<dyn Fn(Rejection) + Send + Sync>,
}

impl Chain {
    pub(crate) fn new(
        guards: Vec<Middleware>,
        event: Arc<Event>,
        current: SharedState,
        target: SharedState,
        complete: Box<dyn Fn() + Send + Sync>,
        report: Box<dyn Fn(Rejection) + Send + Sync>,
    ) -> Arc<Self> {
        Arc::new(Chain {
            guards,
            event,
            current,
            target,
            complete,
            report,
        })
    }

    /// Run the chain from its first guard.
    pub(crate) fn run(self: Arc<Self>) -> MiddlewareFuture {
        debug_assert!(!self.guards.is_empty(), "empty chains bypass the executor");
        Chain::invoke(&self, 0)
    }

    /// Invoke the guard at `index` and attribute any fault escaping it.
    ///
    /// This is the single point a guard's future is awaited, for the entry
    /// guard and for every `Next::resolve` step alike. Attribution relies on
    /// the report action being first-write-wins: the deepest invocation sees
    /// an error before the callers it propagates through.
    fn invoke(chain: &Arc<Chain>, index: usize) -> MiddlewareFuture {
        let chain = Arc::clone(chain);
        Box::pin(async move {
            let guard = chain.guards[index].clone();
            tracing::trace!(index, middleware = ?guard, "invoking middleware");
            let next = Next {
                chain: Arc::clone(&chain),
                index,
            };
            let outcome = guard
                .call(
                    next,
                    Arc::clone(&chain.event),
                    Arc::clone(&chain.current),
                    Arc::clone(&chain.target),
                )
                .await;
            if let Err(fault) = &outcome {
                (chain.report)(Rejection::Fault {
                    middleware: guard,
                    fault: fault.clone(),
                });
            }
            outcome
        })
    }
}

/// The continuation handed to each middleware.
///
/// A `Next` must be resolved exactly once; the methods consume it, so
/// resolving twice is impossible. Dropping it unresolved abandons the attempt
/// without committing or rejecting.
///
/// Resolving `true` passes control down the chain — to the following guard,
/// or to the commit when this guard is last. Resolving `false` vetoes: the
/// rejection action records this guard (and the optional `detail` payload),
/// no later guard runs, and the commit does not occur. Either way the
/// returned future finishes only after everything downstream has, which is
/// what gives guards their around-the-chain ordering.
pub struct Next {
    chain: Arc<Chain>,
    index: usize,
}

impl Next {
    /// Accept: equivalent to `resolve(true, None)`.
    pub fn proceed(self) -> MiddlewareFuture {
        self.resolve(true, None)
    }

    /// Veto with an optional detail payload.
    pub fn reject(self, detail: impl Into<Option<Value>>) -> MiddlewareFuture {
        self.resolve(false, detail.into())
    }

    /// Resolve this guard's verdict: `true` accepts, `false` vetoes.
    pub fn resolve(self, pass: bool, detail: Option<Value>) -> MiddlewareFuture {
        let Next { chain, index } = self;
        Box::pin(async move {
            if !pass {
                (chain.report)(Rejection::Veto {
                    middleware: chain.guards[index].clone(),
                    detail,
                });
                return Ok(());
            }
            if index + 1 < chain.guards.len() {
                Chain::invoke(&chain, index + 1).await
            } else {
                (chain.complete)();
                Ok(())
            }
        })
    }
}
