//! The call surface shared by flat and hierarchical machines.

use super::error::MachineError;
use super::machine::{Machine, SendOutcome};
use super::subscription::{Listener, Subscription};
use super::transition::Transitions;
use crate::core::{Change, State, StateFactory};
use serde_json::Value;

/// What adapters and visualizers are allowed to call.
///
/// Implemented by [`Machine`] and by
/// [`HierarchicalMachine`](crate::hierarchy::HierarchicalMachine), so code
/// written against this trait does not care about nesting.
pub trait StateMachine {
    fn send(&self, event_type: &str, params: Vec<Value>) -> Result<SendOutcome, MachineError>;

    fn get_state(&self) -> State;

    fn get_change(&self) -> Change;

    fn subscribe(&self, listener: Listener) -> Subscription;

    /// The state factory, for enumerating variant names.
    fn states(&self) -> &StateFactory;

    /// The transition table, for enumerating edges.
    fn transitions(&self) -> &Transitions;
}

impl StateMachine for Machine {
    fn send(&self, event_type: &str, params: Vec<Value>) -> Result<SendOutcome, MachineError> {
        Machine::send(self, event_type, params)
    }

    fn get_state(&self) -> State {
        Machine::get_state(self)
    }

    fn get_change(&self) -> Change {
        Machine::get_change(self)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        Machine::subscribe(self, move |change| listener(change))
    }

    fn states(&self) -> &StateFactory {
        Machine::states(self)
    }

    fn transitions(&self) -> &Transitions {
        Machine::transitions(self)
    }
}
