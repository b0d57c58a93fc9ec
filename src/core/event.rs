//! Events that drive state transitions.
//!
//! An event is an immutable `{kind, detail?}` value. The kind selects which
//! transitions can match; the detail is an opaque payload carried through the
//! middleware chain untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable event delivered to [`Machine::receive`].
///
/// Events are plain data: a `kind` string matched against the transition
/// table, and an optional JSON `detail` payload for guards to inspect. An
/// event is never mutated after construction; one instance is shared across
/// the entire middleware chain of a single transition attempt.
///
/// [`Machine::receive`]: crate::engine::Machine::receive
///
/// # Example
///
/// ```rust
/// use machina::Event;
/// use serde_json::json;
///
/// let plain = Event::new("door_opened");
/// assert_eq!(plain.kind(), "door_opened");
/// assert!(plain.detail().is_none());
///
/// let with_payload = Event::with_detail("door_opened", json!({ "badge": 42 }));
/// assert_eq!(with_payload.detail_field("badge"), Some(&json!(42)));
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Event {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<Value>,
}

impl Event {
    /// Create an event with no detail payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Event {
            kind: kind.into(),
            detail: None,
        }
    }

    /// Create an event carrying a detail payload.
    ///
    /// The payload is typically a JSON object, but any [`Value`] is accepted.
    pub fn with_detail(kind: impl Into<String>, detail: impl Into<Value>) -> Self {
        Event {
            kind: kind.into(),
            detail: Some(detail.into()),
        }
    }

    /// The event kind matched against transition table entries.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The detail payload, if any.
    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }

    /// Look up a single field inside an object-shaped detail payload.
    ///
    /// Returns `None` when there is no detail, or the detail is not an
    /// object, or the key is absent.
    pub fn detail_field(&self, key: &str) -> Option<&Value> {
        self.detail.as_ref().and_then(|detail| detail.get(key))
    }
}
