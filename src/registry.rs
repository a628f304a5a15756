//! Read-only registry of named schema definitions.

use serde_json::{Map, Value};

/// Named schema fragments, usually `components.schemas` of an OpenAPI document.
///
/// The registry is an immutable snapshot: nothing in this crate mutates it
/// after construction, so one instance can be shared across threads while
/// operations are assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    schemas: Map<String, Value>,
}

impl SchemaRegistry {
    pub fn new(schemas: Map<String, Value>) -> Self {
        Self { schemas }
    }

    /// Build a registry from `components.schemas` of an API document.
    ///
    /// Missing or non-object sections produce an empty registry.
    pub fn from_document(document: &Value) -> Self {
        let schemas = document
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self { schemas }
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Look up the definition a `$ref` pointer names.
    pub fn lookup_ref(&self, pointer: &str) -> Option<&Value> {
        self.get(&ref_name(pointer))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl FromIterator<(String, Value)> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            schemas: iter.into_iter().collect(),
        }
    }
}

/// Registry key named by a `$ref` pointer.
///
/// Takes the last `/`-separated segment and decodes JSON Pointer escapes
/// (`~1` = `/`, `~0` = `~`), so `#/components/schemas/User` names `User`.
pub fn ref_name(pointer: &str) -> String {
    let last = pointer.rsplit('/').next().unwrap_or(pointer);
    last.replace("~1", "/").replace("~0", "~")
}
