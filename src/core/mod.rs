//! Core value types.
//!
//! This module contains the pure values the machine engine works with:
//! - Tagged variants and their factories, with exhaustive matching
//! - States, optionally embedding a child machine
//! - Change records and their audit history
//! - Guard predicates
//! - Flattened dotted-path keys

mod change;
mod error;
mod guard;
mod history;
pub mod key;
mod state;
mod variant;

pub use change::{Change, INIT_EVENT};
pub use error::VariantError;
pub use guard::Guard;
pub use history::ChangeHistory;
pub use key::{join_key, parse_key, FlatKey};
pub use state::{ChildMachine, State, StateData, StateFactory};
pub use variant::{
    Constructor, Handlers, Variant, VariantFactory, VariantFactoryBuilder, DEFAULT_TAG_KEY,
};
