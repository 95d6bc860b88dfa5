//! Errors raised by variant inspection and construction.

use thiserror::Error;

/// Errors that can occur when working with tagged variants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariantError {
    /// `cast` was called with a tag that differs from the instance's tag
    #[error("Cannot cast variant '{actual}' to '{expected}'")]
    Cast { expected: String, actual: String },

    /// Exhaustive match found neither a handler nor a default branch
    #[error("No handler for variant '{tag}' and no default branch")]
    Unhandled { tag: String },

    /// The factory has no constructor registered under this name
    #[error("Unknown variant '{name}'")]
    UnknownVariant { name: String },
}
