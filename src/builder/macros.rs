//! Macros for ergonomic transition table construction.

/// Build a `Vec<Transition>` from a compact table literal.
///
/// Each row is `from, event => to`. Rows are kept in declaration order,
/// which is also the machine's match priority. The macro covers plain
/// (unnamed, unguarded) rows only; named or guarded transitions use
/// [`Transition::named`](crate::Transition::named) or
/// [`TransitionBuilder`](crate::builder::TransitionBuilder).
///
/// # Example
///
/// ```
/// use machina::transitions;
///
/// let table = transitions! {
///     "idle", "start" => "running";
///     "running", "pause" => "paused";
///     "paused", "start" => "running";
///     "running", "stop" => "idle";
/// };
/// assert_eq!(table.len(), 4);
/// assert!(table[1].matches("running", "pause"));
/// ```
#[macro_export]
macro_rules! transitions {
    ($($from:literal, $event:literal => $to:literal);* $(;)?) => {
        ::std::vec![
            $($crate::Transition::new($from, $event, $to)),*
        ]
    };
}
