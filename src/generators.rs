//! Named-field value generators.
//!
//! A generator replaces schema-based synthesis for every property with a
//! matching name, so `email` fields read `user@example.com` rather than
//! `string`. Names are matched case-insensitively.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Produces the example value for a named field from its schema.
pub trait FieldGenerator: Send + Sync {
    fn generate(&self, schema: &Value) -> Value;
}

impl<F> FieldGenerator for F
where
    F: Fn(&Value) -> Value + Send + Sync,
{
    fn generate(&self, schema: &Value) -> Value {
        self(schema)
    }
}

/// Generators keyed by lower-cased field name.
#[derive(Clone, Default)]
pub struct FieldGenerators {
    generators: BTreeMap<String, Arc<dyn FieldGenerator>>,
}

impl FieldGenerators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build generators from configuration specs.
    pub fn from_specs<'a, I>(specs: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a GeneratorSpec)>,
    {
        let mut generators = Self::new();
        for (name, spec) in specs {
            generators.register(name, spec.clone());
        }
        generators
    }

    pub fn register(&mut self, name: &str, generator: impl FieldGenerator + 'static) {
        self.generators
            .insert(name.to_lowercase(), Arc::new(generator));
    }

    pub fn with(mut self, name: &str, generator: impl FieldGenerator + 'static) -> Self {
        self.register(name, generator);
        self
    }

    /// Take over every generator of `other`, replacing same-named ones.
    pub fn extend(&mut self, other: FieldGenerators) {
        self.generators.extend(other.generators);
    }

    /// Generate a value for `field`, if a generator is registered for it.
    pub fn generate(&self, field: &str, schema: &Value) -> Option<Value> {
        self.generators
            .get(&field.to_lowercase())
            .map(|g| g.generate(schema))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.generators.contains_key(&field.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl fmt::Debug for FieldGenerators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.generators.keys()).finish()
    }
}

/// A configured generator: a fixed value or a named builtin.
///
/// ```json
/// { "email": { "builtin": "email" }, "status": { "value": "active" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorSpec {
    Value(Value),
    Builtin(Builtin),
}

impl FieldGenerator for GeneratorSpec {
    fn generate(&self, _schema: &Value) -> Value {
        match self {
            GeneratorSpec::Value(value) => value.clone(),
            GeneratorSpec::Builtin(builtin) => builtin.value(),
        }
    }
}

/// Builtin realistic values for common field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    Email,
    Uuid,
    Date,
    Datetime,
    Url,
    Slug,
    Phone,
    FirstName,
    LastName,
    Username,
}

impl Builtin {
    pub fn value(&self) -> Value {
        let text = match self {
            Builtin::Email => "user@example.com",
            Builtin::Uuid => "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            Builtin::Date => "2024-01-15",
            Builtin::Datetime => "2024-01-15T09:30:00Z",
            Builtin::Url => "https://example.com/",
            Builtin::Slug => "example-slug",
            Builtin::Phone => "+1-202-555-0143",
            Builtin::FirstName => "Jane",
            Builtin::LastName => "Doe",
            Builtin::Username => "jdoe",
        };
        json!(text)
    }
}
