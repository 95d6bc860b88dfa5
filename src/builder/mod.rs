//! Builder API for ergonomic machine construction.
//!
//! This module provides a fluent builder and a declaration macro for
//! transition tables, validating the table against the state factory at
//! construction time.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::{Initial, MachineBuilder};

use crate::core::StateFactory;
use crate::machine::{Machine, Transitions};

/// Create a machine from a factory, a table and an initial state.
///
/// # Example
///
/// ```
/// use tagstate::builder::create_machine;
/// use tagstate::{transitions, StateFactory};
///
/// let states = StateFactory::builder().unit("Idle").unit("Pending").build();
/// let machine = create_machine(
///     states,
///     transitions! { "Idle" => { "execute" => "Pending" } },
///     "Idle",
/// )
/// .unwrap();
///
/// assert!(machine.get_state().is("Idle"));
/// ```
pub fn create_machine(
    states: StateFactory,
    transitions: Transitions,
    initial: impl Into<Initial>,
) -> Result<Machine, BuildError> {
    MachineBuilder::new()
        .states(states)
        .transitions(transitions)
        .initial(initial)
        .build()
}
