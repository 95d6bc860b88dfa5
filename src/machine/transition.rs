//! Transition tables and target resolution.

use super::error::MachineError;
use crate::core::{State, StateFactory};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// What a resolver sees when computing a target.
#[derive(Clone, Copy, Debug)]
pub struct ResolveContext<'a> {
    pub event_type: &'a str,
    pub params: &'a [Value],
    pub from: &'a State,
}

/// A concrete target. Cannot defer again.
#[derive(Clone, Debug)]
pub enum Resolved {
    /// Instantiate this state with the event's params
    Key(String),
    /// Instantiate this state with explicit constructor args
    Construct { key: String, args: Vec<Value> },
    /// Use this state as-is
    State(State),
}

/// Result of running a resolver: a concrete target, or one deferred step
/// that is evaluated immediately with no arguments.
pub enum Resolution {
    Now(Resolved),
    Deferred(Box<dyn FnOnce() -> Resolved>),
}

impl Resolution {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Now(Resolved::Key(key.into()))
    }

    pub fn construct(key: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Now(Resolved::Construct {
            key: key.into(),
            args,
        })
    }

    pub fn state(state: State) -> Self {
        Self::Now(Resolved::State(state))
    }

    pub fn deferred<F>(next: F) -> Self
    where
        F: FnOnce() -> Resolved + 'static,
    {
        Self::Deferred(Box::new(next))
    }

    fn finish(self) -> Resolved {
        match self {
            Self::Now(resolved) => resolved,
            Self::Deferred(next) => next(),
        }
    }
}

impl From<Resolved> for Resolution {
    fn from(resolved: Resolved) -> Self {
        Self::Now(resolved)
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Now(resolved) => f.debug_tuple("Now").field(resolved).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Resolver computing a target from the event.
pub type Resolver = Rc<dyn Fn(&ResolveContext<'_>) -> Resolution>;

/// Entry of a transition table.
#[derive(Clone)]
pub enum Target {
    Key(String),
    Resolver(Resolver),
}

impl Target {
    pub fn resolver<F>(resolve: F) -> Self
    where
        F: Fn(&ResolveContext<'_>) -> Resolution + 'static,
    {
        Self::Resolver(Rc::new(resolve))
    }

    /// Statically known target key, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Resolver(_) => None,
        }
    }

    /// Turn this entry into a concrete state of `states`.
    pub(crate) fn resolve(
        &self,
        ctx: &ResolveContext<'_>,
        states: &StateFactory,
    ) -> Result<State, MachineError> {
        let resolved = match self {
            Self::Key(key) => Resolved::Key(key.clone()),
            Self::Resolver(resolve) => resolve(ctx).finish(),
        };

        let unknown = |target: &str| MachineError::UnknownTarget {
            from: ctx.from.key().to_string(),
            event: ctx.event_type.to_string(),
            target: target.to_string(),
        };

        match resolved {
            Resolved::Key(key) => states.create(&key, ctx.params).map_err(|_| unknown(&key)),
            Resolved::Construct { key, args } => {
                states.create(&key, &args).map_err(|_| unknown(&key))
            }
            Resolved::State(state) if states.contains(state.key()) => Ok(state),
            Resolved::State(state) => Err(unknown(state.key())),
        }
    }
}

impl From<&str> for Target {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Target {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// An edge of the table, for visualizers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub event: String,
    /// `None` when the target is computed by a resolver
    pub to: Option<String>,
}

/// Mismatch between a transition table and its state factory.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Transitions declared for unknown state '{state}'")]
    UnknownSource { state: String },

    #[error("Transition '{event}' from '{from}' targets unknown state '{target}'")]
    UnknownTarget {
        from: String,
        event: String,
        target: String,
    },
}

/// Per-state mapping from event type to target.
#[derive(Clone, Debug, Default)]
pub struct Transitions {
    table: BTreeMap<String, BTreeMap<String, Target>>,
}

impl Transitions {
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Add an entry `from --event--> target`.
    pub fn on(mut self, from: &str, event: &str, target: impl Into<Target>) -> Self {
        self.insert(from, event, target);
        self
    }

    /// Add an entry whose target is computed from the event.
    pub fn on_resolve<F>(self, from: &str, event: &str, resolve: F) -> Self
    where
        F: Fn(&ResolveContext<'_>) -> Resolution + 'static,
    {
        self.on(from, event, Target::resolver(resolve))
    }

    pub fn insert(&mut self, from: &str, event: &str, target: impl Into<Target>) {
        self.table
            .entry(from.to_string())
            .or_default()
            .insert(event.to_string(), target.into());
    }

    pub fn get(&self, from: &str, event: &str) -> Option<&Target> {
        self.table.get(from).and_then(|events| events.get(event))
    }

    pub fn has(&self, from: &str, event: &str) -> bool {
        self.get(from, event).is_some()
    }

    /// Event types available in state `from`, sorted.
    pub fn events_for(&self, from: &str) -> Vec<&str> {
        self.table
            .get(from)
            .map(|events| events.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// States that have at least one outgoing entry.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.table
            .iter()
            .flat_map(|(from, events)| {
                events.iter().map(move |(event, target)| Edge {
                    from: from.clone(),
                    event: event.clone(),
                    to: target.key().map(str::to_string),
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.table.values().all(BTreeMap::is_empty)
    }

    /// Check the table against `states`, accumulating ALL mismatches.
    ///
    /// Resolver targets are only known at runtime and are not checked.
    pub fn validate(&self, states: &StateFactory) -> Validation<(), NonEmptyVec<TableError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<TableError>>> = Vec::new();

        for (from, events) in &self.table {
            let check = if states.contains(from) {
                Validation::success(())
            } else {
                Validation::fail(TableError::UnknownSource {
                    state: from.clone(),
                })
            };
            checks.push(check);

            for (event, target) in events {
                let Some(to) = target.key() else { continue };
                let check = if states.contains(to) {
                    Validation::success(())
                } else {
                    Validation::fail(TableError::UnknownTarget {
                        from: from.clone(),
                        event: event.clone(),
                        target: to.to_string(),
                    })
                };
                checks.push(check);
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }
}
