//! Audit log of accepted changes.
//!
//! Provides immutable tracking of a machine's change records over time: the
//! `record` method returns a new history rather than mutating in place.

use super::change::Change;
use std::time::Duration;

/// Ordered history of accepted changes.
///
/// # Example
///
/// ```rust
/// use tagstate::core::{Change, ChangeHistory, StateFactory};
///
/// let states = StateFactory::builder().unit("Red").unit("Green").build();
/// let red = states.create("Red", &[]).unwrap();
/// let green = states.create("Green", &[]).unwrap();
///
/// let history = ChangeHistory::new().record(Change::new("next", vec![], red, green));
///
/// assert_eq!(history.get_path(), vec!["Red", "Green"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ChangeHistory {
    changes: Vec<Change>,
}

impl ChangeHistory {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Record a change, returning a new history.
    pub fn record(&self, change: Change) -> Self {
        let mut changes = self.changes.clone();
        changes.push(change);
        Self { changes }
    }

    /// Append in place; used by the engine, which owns its history.
    pub(crate) fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Keys of the states traversed: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.changes.first() {
            path.push(first.from.key());
        }
        for change in &self.changes {
            path.push(change.to.key());
        }
        path
    }

    /// Time between the first and last recorded change.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.changes.first(), self.changes.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
