//! Synthetic stand-in objects for sampled execution of computed fields.
//!
//! A computed field's callable is normally run against a model instance.
//! For inference it is run against a [`Fixture`] instead: a minimal object
//! exposing the attributes such callables most often touch. Anything else
//! the callable asks for is a [`SampleError::MissingAttribute`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::{json, Map, Value};

use crate::error::SampleError;

/// Caller-supplied logic producing a computed field's value from an instance.
pub trait Sampler: Send + Sync {
    fn call(&self, fixture: &Fixture) -> Result<Value, SampleError>;
}

impl<F> Sampler for F
where
    F: Fn(&Fixture) -> Result<Value, SampleError> + Send + Sync,
{
    fn call(&self, fixture: &Fixture) -> Result<Value, SampleError> {
        self(fixture)
    }
}

/// Stand-in instance handed to a [`Sampler`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    attributes: Map<String, Value>,
    count: i64,
    items: FixtureCollection,
}

impl Fixture {
    /// Read a plain attribute such as `id` or `name`.
    pub fn attr(&self, name: &str) -> Result<&Value, SampleError> {
        self.attributes
            .get(name)
            .ok_or_else(|| SampleError::MissingAttribute {
                name: name.to_string(),
            })
    }

    /// The zero-argument counting accessor.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// The nested collection-like accessor.
    pub fn items(&self) -> &FixtureCollection {
        &self.items
    }
}

impl Default for Fixture {
    fn default() -> Self {
        FixtureBuilder::new().build()
    }
}

/// Collection-like accessor on a [`Fixture`].
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureCollection {
    count: i64,
    members: Vec<Value>,
}

impl FixtureCollection {
    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn all(&self) -> &[Value] {
        &self.members
    }
}

/// Builds [`Fixture`]s. The defaults are `id = 1`, `pk = 1`, `name = "test"`,
/// `count() = 5` and an `items` collection with `count() = 3` and no members.
#[derive(Debug, Clone)]
pub struct FixtureBuilder {
    attributes: Map<String, Value>,
    count: i64,
    items_count: i64,
    items: Vec<Value>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        let mut attributes = Map::new();
        attributes.insert("id".to_string(), json!(1));
        attributes.insert("pk".to_string(), json!(1));
        attributes.insert("name".to_string(), json!("test"));
        Self {
            attributes,
            count: 5,
            items_count: 3,
            items: Vec::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn count(mut self, count: i64) -> Self {
        self.count = count;
        self
    }

    pub fn items(mut self, count: i64, members: Vec<Value>) -> Self {
        self.items_count = count;
        self.items = members;
        self
    }

    pub fn build(&self) -> Fixture {
        Fixture {
            attributes: self.attributes.clone(),
            count: self.count,
            items: FixtureCollection {
                count: self.items_count,
                members: self.items.clone(),
            },
        }
    }
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a sampler against a fresh fixture, turning panics into errors.
///
/// The fixture is rebuilt per call so nothing a callable does to it can leak
/// into later invocations.
pub fn invoke_isolated(
    sampler: &dyn Sampler,
    builder: &FixtureBuilder,
) -> Result<Value, SampleError> {
    let fixture = builder.build();
    match panic::catch_unwind(AssertUnwindSafe(|| sampler.call(&fixture))) {
        Ok(result) => result,
        Err(payload) => Err(SampleError::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fixture_attributes() {
        let fixture = Fixture::default();
        assert_eq!(fixture.attr("id"), Ok(&json!(1)));
        assert_eq!(fixture.attr("pk"), Ok(&json!(1)));
        assert_eq!(fixture.attr("name"), Ok(&json!("test")));
        assert_eq!(fixture.count(), 5);
        assert_eq!(fixture.items().count(), 3);
        assert!(fixture.items().all().is_empty());
    }

    #[test]
    fn missing_attribute_errors() {
        let fixture = Fixture::default();
        assert_eq!(
            fixture.attr("owner"),
            Err(SampleError::MissingAttribute {
                name: "owner".into()
            })
        );
    }

    #[test]
    fn builder_overrides() {
        let fixture = FixtureBuilder::new()
            .attribute("slug", json!("hello"))
            .count(9)
            .items(1, vec![json!({ "id": 2 })])
            .build();
        assert_eq!(fixture.attr("slug"), Ok(&json!("hello")));
        assert_eq!(fixture.count(), 9);
        assert_eq!(fixture.items().all(), &[json!({ "id": 2 })]);
    }

    #[test]
    fn invoke_returns_value() {
        let sampler =
            |f: &Fixture| -> Result<Value, SampleError> { Ok(json!({ "total": f.count() })) };
        let result = invoke_isolated(&sampler, &FixtureBuilder::new());
        assert_eq!(result, Ok(json!({ "total": 5 })));
    }

    #[test]
    fn invoke_propagates_errors() {
        let sampler = |f: &Fixture| -> Result<Value, SampleError> { f.attr("owner").cloned() };
        let result = invoke_isolated(&sampler, &FixtureBuilder::new());
        assert!(matches!(result, Err(SampleError::MissingAttribute { .. })));
    }

    #[test]
    fn invoke_catches_panics() {
        let sampler = |_: &Fixture| -> Result<Value, SampleError> { panic!("boom") };
        let result = invoke_isolated(&sampler, &FixtureBuilder::new());
        assert_eq!(
            result,
            Err(SampleError::Panicked {
                message: "boom".into()
            })
        );
    }
}
