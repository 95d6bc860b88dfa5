//! Hierarchical composition of machines.
//!
//! A compound state embeds a whole child machine in its data. The composer
//! walks from the root through compound states to find the active path,
//! routes each event to the deepest machine that can handle it, and exposes
//! the path as a dotted address such as `"Working.Green"`.

mod composer;

pub use composer::{ComposerOptions, HierarchicalMachine};
