//! Closed families of tagged values.
//!
//! A [`VariantFactory`] is built once from a fixed set of names, each paired
//! with a constructor for that variant's data. Every [`Variant`] it produces
//! carries its tag and supports `is` / `cast` / `match` over the family.

use super::error::VariantError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Tag property name used when a factory does not configure one.
pub const DEFAULT_TAG_KEY: &str = "tag";

/// Constructor turning an argument list into variant data.
pub type Constructor<D> = Rc<dyn Fn(&[Value]) -> D>;

/// One member of a closed, named set of tagged data shapes.
///
/// # Example
///
/// ```rust
/// use tagstate::core::{Handlers, VariantFactory};
/// use serde_json::{json, Value};
///
/// let shapes = VariantFactory::<Value>::builder()
///     .variant("Circle", |args| json!({ "radius": args[0] }))
///     .unit("Empty")
///     .build();
///
/// let circle = shapes.create("Circle", &[json!(2)]).unwrap();
/// assert!(circle.is("Circle"));
///
/// let area = circle
///     .match_with(
///         &Handlers::new()
///             .on("Circle", |d: &Value| d["radius"].as_f64().unwrap_or(0.0) * 3.0)
///             .otherwise(|_| 0.0),
///     )
///     .unwrap();
/// assert_eq!(area, 6.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Variant<D = Value> {
    tag_key: Arc<str>,
    tag: String,
    data: D,
}

impl<D> Variant<D> {
    /// Build a variant directly, bypassing a factory.
    pub fn new(tag: impl Into<String>, data: D) -> Self {
        Self {
            tag_key: Arc::from(DEFAULT_TAG_KEY),
            tag: tag.into(),
            data,
        }
    }

    pub(crate) fn with_tag_key(tag_key: Arc<str>, tag: String, data: D) -> Self {
        Self { tag_key, tag, data }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Same as [`Variant::tag`]; reads better for states.
    pub fn key(&self) -> &str {
        &self.tag
    }

    /// Name of the tag property, fixed per factory.
    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn into_data(self) -> D {
        self.data
    }

    /// Pure equality check against this instance's tag.
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Return `self` when the tag matches, otherwise a [`VariantError::Cast`].
    pub fn cast(&self, tag: &str) -> Result<&Self, VariantError> {
        if self.is(tag) {
            Ok(self)
        } else {
            Err(VariantError::Cast {
                expected: tag.to_string(),
                actual: self.tag.clone(),
            })
        }
    }

    /// Exhaustive match: runs exactly one handler (specific, else default)
    /// or fails with [`VariantError::Unhandled`].
    pub fn match_with<R>(&self, handlers: &Handlers<'_, D, R>) -> Result<R, VariantError> {
        self.try_match(handlers).ok_or_else(|| VariantError::Unhandled {
            tag: self.tag.clone(),
        })
    }

    /// Non-exhaustive match: `None` when no handler applies.
    pub fn try_match<R>(&self, handlers: &Handlers<'_, D, R>) -> Option<R> {
        handlers.lookup(&self.tag).map(|handler| handler(&self.data))
    }
}

impl<D: Serialize> Serialize for Variant<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&*self.tag_key, &self.tag)?;
        map.serialize_entry("data", &self.data)?;
        map.end()
    }
}

type Handler<'a, D, R> = Box<dyn Fn(&D) -> R + 'a>;

/// Strategy table for [`Variant::match_with`], keyed by tag with an
/// optional default (`_`) branch.
pub struct Handlers<'a, D, R> {
    by_tag: HashMap<String, Handler<'a, D, R>>,
    default: Option<Handler<'a, D, R>>,
}

impl<'a, D, R> Handlers<'a, D, R> {
    pub fn new() -> Self {
        Self {
            by_tag: HashMap::new(),
            default: None,
        }
    }

    /// Handle one tag. A handler registered under `"_"` acts as the default.
    pub fn on<F>(mut self, tag: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&D) -> R + 'a,
    {
        let tag = tag.into();
        if tag == "_" {
            self.default = Some(Box::new(handler));
        } else {
            self.by_tag.insert(tag, Box::new(handler));
        }
        self
    }

    /// Default branch for tags without a specific handler.
    pub fn otherwise<F>(mut self, handler: F) -> Self
    where
        F: Fn(&D) -> R + 'a,
    {
        self.default = Some(Box::new(handler));
        self
    }

    fn lookup(&self, tag: &str) -> Option<&Handler<'a, D, R>> {
        self.by_tag.get(tag).or(self.default.as_ref())
    }
}

impl<D, R> Default for Handlers<'_, D, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the closed family of variants for one factory.
pub struct VariantFactory<D = Value> {
    tag_key: Arc<str>,
    constructors: BTreeMap<String, Constructor<D>>,
}

impl<D> Clone for VariantFactory<D> {
    fn clone(&self) -> Self {
        Self {
            tag_key: Arc::clone(&self.tag_key),
            constructors: self.constructors.clone(),
        }
    }
}

impl<D> fmt::Debug for VariantFactory<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantFactory")
            .field("tag_key", &self.tag_key)
            .field("names", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<D> VariantFactory<D> {
    pub fn builder() -> VariantFactoryBuilder<D> {
        VariantFactoryBuilder::new()
    }

    /// Instantiate the named variant with the given arguments.
    pub fn create(&self, name: &str, args: &[Value]) -> Result<Variant<D>, VariantError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| VariantError::UnknownVariant {
                    name: name.to_string(),
                })?;
        Ok(Variant::with_tag_key(
            Arc::clone(&self.tag_key),
            name.to_string(),
            constructor(args),
        ))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Variant names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }
}

/// Fluent builder for [`VariantFactory`].
pub struct VariantFactoryBuilder<D> {
    tag_key: Arc<str>,
    constructors: BTreeMap<String, Constructor<D>>,
}

impl<D> VariantFactoryBuilder<D> {
    pub fn new() -> Self {
        Self {
            tag_key: Arc::from(DEFAULT_TAG_KEY),
            constructors: BTreeMap::new(),
        }
    }

    /// Set the tag property name shared by all instances.
    pub fn tag_key(mut self, tag_key: &str) -> Self {
        self.tag_key = Arc::from(tag_key);
        self
    }

    /// Register a variant whose data is computed from the arguments.
    pub fn variant<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&[Value]) -> D + 'static,
    {
        self.constructors.insert(name.into(), Rc::new(constructor));
        self
    }

    pub fn build(self) -> VariantFactory<D> {
        VariantFactory {
            tag_key: self.tag_key,
            constructors: self.constructors,
        }
    }
}

impl<D: Default + 'static> VariantFactoryBuilder<D> {
    /// Register a no-argument variant with empty data.
    pub fn unit(self, name: impl Into<String>) -> Self {
        self.variant(name, |_| D::default())
    }
}

impl<D> Default for VariantFactoryBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn shapes() -> VariantFactory {
        VariantFactory::builder()
            .variant("Circle", |args| json!({ "radius": args.first().cloned() }))
            .variant("Rect", |args| json!({ "w": args[0], "h": args[1] }))
            .unit("Empty")
            .build()
    }

    #[test]
    fn create_builds_tagged_instance() {
        let rect = shapes().create("Rect", &[json!(2), json!(3)]).unwrap();

        assert_eq!(rect.tag(), "Rect");
        assert_eq!(rect.data(), &json!({ "w": 2, "h": 3 }));
        assert_eq!(rect.tag_key(), "tag");
    }

    #[test]
    fn unit_variant_has_empty_data() {
        let empty = shapes().create("Empty", &[]).unwrap();
        assert_eq!(empty.data(), &Value::Null);
    }

    #[test]
    fn create_rejects_unknown_name() {
        let result = shapes().create("Triangle", &[]);
        assert_eq!(
            result,
            Err(VariantError::UnknownVariant {
                name: "Triangle".to_string()
            })
        );
    }

    #[test]
    fn is_compares_tags() {
        let circle = shapes().create("Circle", &[json!(1)]).unwrap();
        assert!(circle.is("Circle"));
        assert!(!circle.is("Rect"));
    }

    #[test]
    fn cast_returns_self_or_error() {
        let circle = shapes().create("Circle", &[json!(1)]).unwrap();

        assert_eq!(circle.cast("Circle").unwrap(), &circle);
        assert_eq!(
            circle.cast("Rect"),
            Err(VariantError::Cast {
                expected: "Rect".to_string(),
                actual: "Circle".to_string(),
            })
        );
    }

    #[test]
    fn match_invokes_exactly_one_handler() {
        let calls = Cell::new(0);
        let circle = shapes().create("Circle", &[json!(4)]).unwrap();

        let handlers = Handlers::new()
            .on("Circle", |d: &Value| {
                calls.set(calls.get() + 1);
                d["radius"].as_i64().unwrap_or(0)
            })
            .on("Rect", |_| {
                calls.set(calls.get() + 100);
                -1
            })
            .otherwise(|_| {
                calls.set(calls.get() + 1000);
                -2
            });

        assert_eq!(circle.match_with(&handlers), Ok(4));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn match_falls_back_to_default() {
        let empty = shapes().create("Empty", &[]).unwrap();
        let handlers = Handlers::new().on("Circle", |_: &Value| "circle").on("_", |_| "other");

        assert_eq!(empty.match_with(&handlers), Ok("other"));
    }

    #[test]
    fn exhaustive_match_without_handler_fails() {
        let empty = shapes().create("Empty", &[]).unwrap();
        let handlers = Handlers::new().on("Circle", |_: &Value| 1);

        assert_eq!(
            empty.match_with(&handlers),
            Err(VariantError::Unhandled {
                tag: "Empty".to_string()
            })
        );
        assert_eq!(empty.try_match(&handlers), None);
    }

    #[test]
    fn custom_tag_key_is_used_for_serialization() {
        let factory = VariantFactory::<Value>::builder()
            .tag_key("kind")
            .variant("Point", |args| json!({ "x": args[0] }))
            .build();

        let point = factory.create("Point", &[json!(7)]).unwrap();
        let json = serde_json::to_value(&point).unwrap();

        assert_eq!(json, json!({ "kind": "Point", "data": { "x": 7 } }));
    }

    #[test]
    fn names_are_sorted() {
        let factory = shapes();
        let names: Vec<&str> = factory.names().collect();
        assert_eq!(names, vec!["Circle", "Empty", "Rect"]);
        assert_eq!(factory.len(), 3);
    }
}
