//! Reference and composition resolution.
//!
//! Normalizes the top of a schema fragment: `$ref` pointers are replaced by
//! the registry entry they name and `allOf` lists are flattened into one
//! fragment. Nested properties are left alone; callers resolve them as they
//! walk down.

use serde_json::{Map, Value};
use tracing::debug;

use crate::registry::{ref_name, SchemaRegistry};
use crate::types::json_type_name;

/// Resolve `$ref` and `allOf` at the top of a fragment.
///
/// - `$ref`: starts from a copy of the registry entry and overlays every
///   other key of the original fragment, so local flags such as `readOnly`
///   win. A pointer naming no registry entry yields an empty object.
/// - `allOf`: resolves each member (references included) and merges them
///   left to right, then overlays the composing fragment's own keys. If no
///   member resolves to anything the fragment is returned unchanged.
///
/// Reference cycles are cut and resolve to an empty object. Resolution is
/// idempotent and never mutates the registry or the input.
pub fn resolve(fragment: &Value, registry: &SchemaRegistry) -> Value {
    resolve_on_path(fragment, registry, &[]).schema
}

/// Result of resolving one fragment below a chain of enclosing references.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    pub schema: Value,
    /// Registry names followed through top-level `$ref` pointers, outermost first.
    pub followed: Vec<String>,
}

/// Resolve a fragment whose ancestors already followed the references in `path`.
///
/// A reference back to any name in `path` is treated as a cycle.
pub(crate) fn resolve_on_path(
    fragment: &Value,
    registry: &SchemaRegistry,
    path: &[String],
) -> Resolution {
    let mut walk = Walk {
        registry,
        trail: path.to_vec(),
        followed: Vec::new(),
        cut: false,
    };
    let schema = walk.value(fragment);
    Resolution {
        schema,
        followed: walk.followed,
    }
}

// --- Internal implementation ---

struct Walk<'a> {
    registry: &'a SchemaRegistry,
    trail: Vec<String>,
    followed: Vec<String>,
    /// Set once a cyclic reference has been cut below the current composition.
    cut: bool,
}

impl Walk<'_> {
    fn value(&mut self, fragment: &Value) -> Value {
        // Malformed input passes through; synthesis turns it into null
        let Some(map) = fragment.as_object() else {
            return fragment.clone();
        };

        match map.get("$ref") {
            Some(pointer) => self.reference(map, pointer),
            None if map.contains_key("allOf") => self.composition(fragment.clone()),
            None => fragment.clone(),
        }
    }

    fn reference(&mut self, map: &Map<String, Value>, pointer: &Value) -> Value {
        let Some(pointer) = pointer.as_str() else {
            debug!(
                actual = json_type_name(pointer),
                "ignoring $ref that is not a string"
            );
            return empty_fragment();
        };

        let name = ref_name(pointer);
        if self.trail.contains(&name) {
            debug!(reference = %pointer, "cutting cyclic reference");
            self.cut = true;
            return empty_fragment();
        }

        let registry = self.registry;
        let Some(target) = registry.get(&name).filter(|t| t.is_object()) else {
            debug!(reference = %pointer, "unresolvable reference");
            return empty_fragment();
        };

        self.trail.push(name.clone());
        self.followed.push(name);
        let mut resolved = self.value(target);

        if let Value::Object(out) = &mut resolved {
            for (key, value) in map {
                if key != "$ref" {
                    overlay(out, key, value);
                }
            }
        }
        // A local allOf beside the $ref still composes below the followed name
        if resolved.get("allOf").is_some() {
            resolved = self.composition(resolved);
        }
        self.trail.pop();

        resolved
    }

    fn composition(&mut self, schema: Value) -> Value {
        let Some(map) = schema.as_object() else {
            return schema;
        };
        let Some(members) = map.get("allOf").and_then(Value::as_array) else {
            return schema;
        };

        let outer_cut = std::mem::replace(&mut self.cut, false);
        // Names followed inside members don't describe the composed fragment
        let followed = self.followed.len();
        let mut merged = Map::new();
        for member in members {
            if let Value::Object(part) = self.value(member) {
                for (key, value) in &part {
                    if key != "allOf" {
                        overlay(&mut merged, key, value);
                    }
                }
            }
        }
        self.followed.truncate(followed);
        let cut = self.cut;
        self.cut |= outer_cut;

        // Unresolvable members leave the fragment as written; a cycle drops
        // the allOf so the result stays stable under another resolution
        if merged.is_empty() && !cut {
            return schema;
        }

        for (key, value) in map {
            if key != "allOf" {
                overlay(&mut merged, key, value);
            }
        }

        Value::Object(merged)
    }
}

/// Later keys replace earlier ones, except `properties` (merged per property)
/// and `required` (union).
fn overlay(target: &mut Map<String, Value>, key: &str, value: &Value) {
    if let Some(existing) = target.get_mut(key) {
        match (key, existing, value) {
            ("properties", Value::Object(existing), Value::Object(incoming)) => {
                for (name, prop) in incoming {
                    existing.insert(name.clone(), prop.clone());
                }
                return;
            }
            ("required", Value::Array(existing), Value::Array(incoming)) => {
                for name in incoming {
                    if !existing.contains(name) {
                        existing.push(name.clone());
                    }
                }
                return;
            }
            _ => {}
        }
    }
    target.insert(key.to_string(), value.clone());
}

fn empty_fragment() -> Value {
    Value::Object(Map::new())
}
