//! Guard predicates for vetoing transitions.
//!
//! Guards are boolean functions evaluated against the prospective change
//! before it is committed. A guard that returns `false` vetoes the transition
//! with no side effects.

use super::change::Change;
use std::fmt;
use std::rc::Rc;

/// Predicate over a prospective [`Change`], optionally scoped to one event type.
///
/// # Example
///
/// ```rust
/// use tagstate::core::{Change, Guard, StateFactory};
/// use serde_json::json;
///
/// let states = StateFactory::builder().unit("Idle").unit("Pending").build();
/// let positive = Guard::for_event("execute", |change: &Change| {
///     change.param(0).and_then(|v| v.as_i64()).is_some_and(|n| n > 0)
/// });
///
/// let change = Change::new(
///     "execute",
///     vec![json!(-1)],
///     states.create("Idle", &[]).unwrap(),
///     states.create("Pending", &[]).unwrap(),
/// );
/// assert!(!positive.check(&change));
/// ```
#[derive(Clone)]
pub struct Guard {
    event: Option<String>,
    predicate: Rc<dyn Fn(&Change) -> bool>,
}

impl Guard {
    /// Guard every transition of the machine.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Change) -> bool + 'static,
    {
        Guard {
            event: None,
            predicate: Rc::new(predicate),
        }
    }

    /// Guard only transitions caused by `event`; other events pass.
    pub fn for_event<F>(event: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Change) -> bool + 'static,
    {
        Guard {
            event: Some(event.into()),
            predicate: Rc::new(predicate),
        }
    }

    /// Check if the guard allows this change.
    pub fn check(&self, change: &Change) -> bool {
        let applies = self
            .event
            .as_deref()
            .is_none_or(|event| event == change.event_type);
        !applies || (self.predicate)(change)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("event", &self.event).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateFactory;
    use serde_json::{json, Value};

    fn change(event: &str, params: Vec<Value>) -> Change {
        let states = StateFactory::builder().unit("Idle").unit("Pending").build();
        Change::new(
            event,
            params,
            states.create("Idle", &[]).unwrap(),
            states.create("Pending", &[]).unwrap(),
        )
    }

    #[test]
    fn guard_checks_every_event() {
        let guard = Guard::new(|c: &Change| c.to.is("Pending"));

        assert!(guard.check(&change("execute", vec![])));
        assert!(guard.check(&change("other", vec![])));
    }

    #[test]
    fn scoped_guard_ignores_other_events() {
        let guard = Guard::for_event("execute", |_| false);

        assert!(!guard.check(&change("execute", vec![])));
        assert!(guard.check(&change("cancel", vec![])));
    }

    #[test]
    fn guard_reads_params() {
        let guard = Guard::for_event("execute", |c: &Change| {
            c.param(0).and_then(Value::as_i64).is_some_and(|n| n > 0)
        });

        assert!(!guard.check(&change("execute", vec![json!(-1)])));
        assert!(guard.check(&change("execute", vec![json!(1)])));
        assert!(!guard.check(&change("execute", vec![])));
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::new(|c: &Change| c.params.len() == 1);
        let c = change("execute", vec![json!(3)]);

        assert_eq!(guard.check(&c), guard.check(&c));
    }
}
