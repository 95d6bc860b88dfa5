//! States: variants whose data may embed a child machine.
//!
//! A [`State`] is a [`Variant`] produced by a [`StateFactory`]; its tag doubles
//! as the state's key. Leaf states carry a plain JSON record. Compound states
//! additionally own a nested [`Machine`], which is created fresh every time
//! the compound state is constructed and has no reference back to its parent.

use super::variant::{Variant, VariantFactory, VariantFactoryBuilder};
use crate::machine::Machine;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::rc::Rc;

/// A state instance. `tag()` / `key()` name the state.
pub type State = Variant<StateData>;

/// Factory for the closed set of states of one machine.
pub type StateFactory = VariantFactory<StateData>;

/// A nested machine owned by a compound state's data.
#[derive(Clone, Debug)]
pub struct ChildMachine {
    id: Option<String>,
    machine: Machine,
}

impl ChildMachine {
    pub fn new(machine: Machine) -> Self {
        Self { id: None, machine }
    }

    /// Tag the child with a stable id, e.g. for address-based routing.
    pub fn with_id(id: impl Into<String>, machine: Machine) -> Self {
        Self {
            id: Some(id.into()),
            machine,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }
}

/// Payload of a [`State`].
#[derive(Clone, Debug)]
pub struct StateData {
    pub fields: Value,
    pub child: Option<ChildMachine>,
}

impl StateData {
    /// Plain record data.
    pub fn leaf(fields: Value) -> Self {
        Self {
            fields,
            child: None,
        }
    }

    /// Data embedding a child machine.
    pub fn compound(child: ChildMachine) -> Self {
        Self {
            fields: Value::Object(Default::default()),
            child: Some(child),
        }
    }

    /// Look up a field of the record.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn is_compound(&self) -> bool {
        self.child.is_some()
    }
}

impl Default for StateData {
    fn default() -> Self {
        Self::leaf(Value::Object(Default::default()))
    }
}

// Children compare by identity: two states embed the same child only if they
// share the machine instance.
impl PartialEq for StateData {
    fn eq(&self, other: &Self) -> bool {
        let same_child = match (&self.child, &other.child) {
            (None, None) => true,
            (Some(a), Some(b)) => a.id == b.id && a.machine.ptr_eq(&b.machine),
            _ => false,
        };
        self.fields == other.fields && same_child
    }
}

impl Serialize for StateData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(child) = &self.child else {
            return self.fields.serialize(serializer);
        };

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("fields", &self.fields)?;
        if let Some(id) = child.id() {
            map.serialize_entry("id", id)?;
        }
        map.serialize_entry("child", &child.machine().get_state())?;
        map.end()
    }
}

impl Variant<StateData> {
    /// The embedded child machine, if this is a compound state.
    pub fn child(&self) -> Option<&Machine> {
        self.data().child.as_ref().map(ChildMachine::machine)
    }

    pub fn is_compound(&self) -> bool {
        self.data().is_compound()
    }
}

impl VariantFactoryBuilder<StateData> {
    /// Register a leaf state whose record is computed from the arguments.
    pub fn state<F>(self, name: impl Into<String>, fields: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.variant(name, move |args| StateData::leaf(fields(args)))
    }

    /// Register a compound state. `spawn` builds a fresh child machine each
    /// time the state is constructed.
    pub fn compound<F>(self, name: impl Into<String>, spawn: F) -> Self
    where
        F: Fn() -> Machine + 'static,
    {
        self.variant(name, move |_| {
            StateData::compound(ChildMachine::new(spawn()))
        })
    }

    /// Like [`VariantFactoryBuilder::compound`], tagging the child with a stable id.
    pub fn compound_with_id<F>(self, name: impl Into<String>, id: &str, spawn: F) -> Self
    where
        F: Fn() -> Machine + 'static,
    {
        let id: Rc<str> = Rc::from(id);
        self.variant(name, move |_| {
            StateData::compound(ChildMachine::with_id(id.as_ref(), spawn()))
        })
    }
}
