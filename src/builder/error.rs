//! Build errors for machine construction.

use crate::machine::TableError;
use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("State factory not specified. Call .states(factory) before .build()")]
    MissingStates,

    #[error("Transition table not specified. Call .transitions(table) before .build()")]
    MissingTransitions,

    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Initial state '{0}' is not a variant of the state factory")]
    UnknownInitialState(String),

    #[error("Transition table does not match the state factory ({} problems)", .0.len())]
    InvalidTable(Vec<TableError>),
}
