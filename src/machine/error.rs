//! Errors surfaced by `send`.

use crate::core::VariantError;
use thiserror::Error;

/// Errors that can occur while a machine processes an event.
///
/// Guard vetoes and events with no table entry are not errors; they show up
/// as [`SendOutcome::Vetoed`](super::SendOutcome::Vetoed) and
/// [`SendOutcome::Ignored`](super::SendOutcome::Ignored).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    #[error(transparent)]
    Variant(#[from] VariantError),

    #[error("Transition '{event}' from '{from}' targets unknown state '{target}'")]
    UnknownTarget {
        from: String,
        event: String,
        target: String,
    },

    #[error("Hook failed: {0}")]
    HookFailed(String),
}

impl MachineError {
    pub fn hook_failed(message: impl Into<String>) -> Self {
        Self::HookFailed(message.into())
    }
}
