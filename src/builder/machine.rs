//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::core::{State, StateFactory};
use crate::machine::{Machine, Transitions};
use stillwater::validation::Validation;

/// Where a machine starts: a state key (instantiated with no arguments) or a
/// concrete state.
#[derive(Clone, Debug)]
pub enum Initial {
    Key(String),
    State(State),
}

impl From<&str> for Initial {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Initial {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<State> for Initial {
    fn from(state: State) -> Self {
        Self::State(state)
    }
}

/// Builder for constructing machines with a fluent API.
pub struct MachineBuilder {
    states: Option<StateFactory>,
    transitions: Option<Transitions>,
    initial: Option<Initial>,
    track_history: bool,
    validate: bool,
}

impl MachineBuilder {
    pub fn new() -> Self {
        Self {
            states: None,
            transitions: None,
            initial: None,
            track_history: false,
            validate: true,
        }
    }

    /// Set the state factory (required).
    pub fn states(mut self, states: StateFactory) -> Self {
        self.states = Some(states);
        self
    }

    /// Set the transition table (required).
    pub fn transitions(mut self, transitions: Transitions) -> Self {
        self.transitions = Some(transitions);
        self
    }

    /// Set the initial state (required).
    pub fn initial(mut self, initial: impl Into<Initial>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    /// Keep a [`ChangeHistory`](crate::core::ChangeHistory) of accepted changes.
    pub fn with_history(mut self) -> Self {
        self.track_history = true;
        self
    }

    /// Do not check the table against the factory, for dynamically composed
    /// tables. Unknown targets then surface from `send`.
    pub fn skip_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Build the machine.
    /// Returns an error if required fields are missing or the table refers
    /// to states the factory does not define.
    pub fn build(self) -> Result<Machine, BuildError> {
        let states = self.states.ok_or(BuildError::MissingStates)?;
        let transitions = self.transitions.ok_or(BuildError::MissingTransitions)?;
        let initial = match self.initial.ok_or(BuildError::MissingInitialState)? {
            Initial::Key(key) => states
                .create(&key, &[])
                .map_err(|_| BuildError::UnknownInitialState(key))?,
            Initial::State(state) if states.contains(state.key()) => state,
            Initial::State(state) => {
                return Err(BuildError::UnknownInitialState(state.key().to_string()))
            }
        };

        if self.validate {
            if let Validation::Failure(errors) = transitions.validate(&states) {
                return Err(BuildError::InvalidTable(errors.iter().cloned().collect()));
            }
        }

        Ok(Machine::new(
            states,
            transitions,
            initial,
            self.track_history,
        ))
    }
}

impl Default for MachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
