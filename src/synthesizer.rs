//! Example synthesis.
//!
//! Turns a schema fragment into a concrete example value. For each fragment,
//! in order:
//!
//! 1. resolve `$ref`/`allOf` (see [`resolve`](crate::resolve)),
//! 2. return an explicit value if there is one (`enum[0]`, `example`,
//!    `default`), except that `default: []` on an array with `items` falls
//!    through so a real item gets generated,
//! 3. replace a bare string property with an inferred fragment when a
//!    callable describes it,
//! 4. generate by `type`.
//!
//! Properties hidden in the requested [`Direction`] are dropped and named
//! field generators take precedence over schema-based generation.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::DEFAULT_MAX_DEPTH;
use crate::generators::FieldGenerators;
use crate::inference::{looks_computed, CallableRegistry, TypeInferencer};
use crate::registry::SchemaRegistry;
use crate::resolver::resolve_on_path;
use crate::types::{has_empty_array_default, Direction, Kind};

/// Builds example values against one registry.
///
/// Borrowed collaborators only; a synthesizer is cheap to create per call
/// and holds no state between calls.
#[derive(Debug, Clone)]
pub struct Synthesizer<'a> {
    registry: &'a SchemaRegistry,
    generators: Option<&'a FieldGenerators>,
    inference: Option<Inference<'a>>,
    max_depth: usize,
}

#[derive(Debug, Clone, Copy)]
struct Inference<'a> {
    callables: &'a CallableRegistry,
    inferencer: &'a TypeInferencer,
}

/// Position of one fragment in the walk.
#[derive(Debug, Clone, Default)]
struct Walk {
    /// Registry names followed from the root down to here.
    trail: Vec<String>,
    depth: usize,
    /// Type owning the property being synthesized, for callable lookup.
    enclosing: Option<String>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            generators: None,
            inference: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn generators(mut self, generators: &'a FieldGenerators) -> Self {
        self.generators = Some(generators);
        self
    }

    /// Enable type inference for computed fields.
    pub fn inference(
        mut self,
        callables: &'a CallableRegistry,
        inferencer: &'a TypeInferencer,
    ) -> Self {
        self.inference = Some(Inference {
            callables,
            inferencer,
        });
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Synthesize one example for `fragment` in `direction`.
    pub fn synthesize(&self, fragment: &Value, direction: Direction) -> Value {
        self.value(fragment, direction, &Walk::default(), None)
    }

    /// Synthesize the example variants for a top-level payload.
    ///
    /// Arrays declaring `default: []` (as the payload itself or as one of
    /// its properties) yield two examples: the empty variant first, then a
    /// variant holding one generated item. Anything else yields exactly one
    /// example. Response visibility applies.
    pub fn examples(&self, fragment: &Value) -> Vec<Value> {
        let direction = Direction::Response;
        let walk = Walk::default();
        let resolution = resolve_on_path(fragment, self.registry, &walk.trail);
        let schema = resolution.schema;

        if let Some(items) = variant_items(&schema) {
            let child = walk.descend(&resolution.followed, None);
            return vec![json!([]), json!([self.value(&items, direction, &child, None)])];
        }

        let Some(properties) = object_properties(&schema) else {
            return vec![self.synthesize(fragment, direction)];
        };

        let enclosing = enclosing_name(&schema, &resolution.followed);
        let child = walk.descend(&resolution.followed, enclosing);
        let mut empty = Map::new();
        let mut populated = Map::new();
        let mut expanded = false;

        for (name, property) in properties {
            let resolved = resolve_on_path(property, self.registry, &child.trail).schema;
            if direction.hides(property) || direction.hides(&resolved) {
                continue;
            }
            match variant_items(&resolved) {
                Some(items) => {
                    expanded = true;
                    empty.insert(name.clone(), json!([]));
                    let item = self.value(&items, direction, &child.nested(), None);
                    populated.insert(name.clone(), json!([item]));
                }
                None => {
                    let value = self.property(name, property, direction, &child);
                    empty.insert(name.clone(), value.clone());
                    populated.insert(name.clone(), value);
                }
            }
        }

        if expanded {
            vec![Value::Object(empty), Value::Object(populated)]
        } else {
            vec![self.synthesize(fragment, direction)]
        }
    }

    // --- Internal implementation ---

    fn value(
        &self,
        fragment: &Value,
        direction: Direction,
        walk: &Walk,
        field: Option<&str>,
    ) -> Value {
        if walk.depth > self.max_depth {
            debug!(depth = walk.depth, "synthesis depth exceeded");
            return Value::Null;
        }

        let resolution = resolve_on_path(fragment, self.registry, &walk.trail);
        let mut schema = resolution.schema;
        if !schema.is_object() {
            return Value::Null;
        }

        if let Some(explicit) = explicit_value(&schema) {
            return explicit;
        }

        if let Some(inferred) = self.infer(&schema, walk.enclosing.as_deref(), field) {
            schema = inferred;
        }

        match Kind::of(&schema) {
            Some(Kind::Object) => {
                let enclosing = enclosing_name(&schema, &resolution.followed);
                let child = walk.descend(&resolution.followed, enclosing);
                let mut out = Map::new();
                if let Some(properties) = object_properties(&schema) {
                    for (name, property) in properties {
                        let resolved = resolve_on_path(property, self.registry, &child.trail);
                        if direction.hides(property) || direction.hides(&resolved.schema) {
                            continue;
                        }
                        let value = self.property(name, property, direction, &child);
                        out.insert(name.clone(), value);
                    }
                }
                Value::Object(out)
            }
            Some(Kind::Array) => {
                let child = walk.descend(&resolution.followed, None);
                let empty = Value::Object(Map::new());
                let items = schema.get("items").unwrap_or(&empty);
                json!([self.value(items, direction, &child, None)])
            }
            Some(kind) => primitive(kind),
            None => Value::Null,
        }
    }

    fn property(&self, name: &str, property: &Value, direction: Direction, walk: &Walk) -> Value {
        if let Some(generated) = self.generators.and_then(|g| g.generate(name, property)) {
            return generated;
        }
        self.value(property, direction, walk, Some(name))
    }

    fn infer(&self, schema: &Value, enclosing: Option<&str>, field: Option<&str>) -> Option<Value> {
        let inference = self.inference?;
        let (enclosing, field) = (enclosing?, field?);
        if !looks_computed(schema) {
            return None;
        }
        let callable = inference.callables.lookup(enclosing, field)?;
        Some(inference.inferencer.infer(callable))
    }
}

impl Walk {
    fn descend(&self, followed: &[String], enclosing: Option<String>) -> Walk {
        let mut trail = self.trail.clone();
        trail.extend(followed.iter().cloned());
        Walk {
            trail,
            depth: self.depth + 1,
            enclosing,
        }
    }

    fn nested(&self) -> Walk {
        self.descend(&[], None)
    }
}

/// Synthesize one example with no field generators or inference.
pub fn synthesize(fragment: &Value, registry: &SchemaRegistry, direction: Direction) -> Value {
    Synthesizer::new(registry).synthesize(fragment, direction)
}

/// Synthesize the example variants for a top-level payload.
pub fn examples(fragment: &Value, registry: &SchemaRegistry) -> Vec<Value> {
    Synthesizer::new(registry).examples(fragment)
}

/// `enum[0]`, then `example`, then `default`. Null counts as absent.
fn explicit_value(schema: &Value) -> Option<Value> {
    if let Some(first) = schema
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
    {
        return Some(first.clone());
    }
    if let Some(example) = schema.get("example").filter(|v| !v.is_null()) {
        return Some(example.clone());
    }
    if empty_default_items(schema).is_some() {
        return None;
    }
    schema.get("default").filter(|v| !v.is_null()).cloned()
}

/// Item schema of an array declaring `default: []`.
fn empty_default_items(schema: &Value) -> Option<&Value> {
    if has_empty_array_default(schema) {
        schema.get("items")
    } else {
        None
    }
}

/// Item schema for the populated variant of an array declaring `default: []`.
///
/// An array without `items` gets an empty item schema.
fn variant_items(schema: &Value) -> Option<Value> {
    if !has_empty_array_default(schema) {
        return None;
    }
    Some(schema.get("items").cloned().unwrap_or_else(|| json!({})))
}

fn object_properties(schema: &Value) -> Option<&Map<String, Value>> {
    if Kind::of(schema) != Some(Kind::Object) {
        return None;
    }
    schema.get("properties").and_then(Value::as_object)
}

/// `title`, or else the last registry name followed to reach the schema.
fn enclosing_name(schema: &Value, followed: &[String]) -> Option<String> {
    schema
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| followed.last().cloned())
}

fn primitive(kind: Kind) -> Value {
    match kind {
        Kind::String => json!("string"),
        Kind::Integer => json!(0),
        Kind::Number => json!(0.0),
        Kind::Boolean => json!(true),
        Kind::Object => json!({}),
        Kind::Array => json!([]),
    }
}
