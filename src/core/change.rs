//! Change records: immutable snapshots of accepted transitions.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Event type of the synthetic change every machine starts with.
pub const INIT_EVENT: &str = "__initialize";

/// Record of a single accepted transition.
///
/// Built once per accepted `send` and never mutated afterwards; it becomes a
/// machine's current change atomically with the state update.
#[derive(Clone, Debug, Serialize)]
pub struct Change {
    /// The event type that caused the transition
    #[serde(rename = "type")]
    pub event_type: String,
    /// Arguments the event was sent with
    pub params: Vec<Value>,
    /// The state being transitioned from
    pub from: State,
    /// The state being transitioned to
    pub to: State,
    /// When the change was built
    pub timestamp: DateTime<Utc>,
}

impl Change {
    pub fn new(event_type: impl Into<String>, params: Vec<Value>, from: State, to: State) -> Self {
        Self {
            event_type: event_type.into(),
            params,
            from,
            to,
            timestamp: Utc::now(),
        }
    }

    /// The starting change of a machine: `from` and `to` are both `initial`.
    pub fn initial(state: State) -> Self {
        Self::new(INIT_EVENT, Vec::new(), state.clone(), state)
    }

    pub fn is_initial(&self) -> bool {
        self.event_type == INIT_EVENT
    }

    /// Parameter at `index`, if it was sent.
    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.get(index)
    }
}
