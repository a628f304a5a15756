//! Type inference for computed fields.
//!
//! Serializers often expose fields whose value comes from a method rather
//! than a model column. Schema generators can only describe those as a bare
//! string. [`TypeInferencer`] recovers a better fragment from the method
//! itself, trying in order:
//!
//! 1. the declared return annotation,
//! 2. the shapes of its `return` statements,
//! 3. the value it returns when run against a synthetic [`Fixture`](crate::Fixture).
//!
//! The first strategy that produces a fragment wins. When all of them miss
//! the field stays a string. Misses are logged, never raised.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{InferenceMiss, SampleError};
use crate::fixture::{invoke_isolated, FixtureBuilder, Sampler};
use crate::source::{analyze_source, declared_return_type, Vocabulary};
use crate::types::{string_array_fragment, Kind};

/// A computed field and the logic behind it.
#[derive(Clone, Deserialize)]
pub struct CallableDescriptor {
    /// Type that declares the field, e.g. `UserSerializer`.
    #[serde(rename = "type")]
    pub owner: String,
    pub field: String,
    /// Declared return annotation, e.g. `int` or `list[str]`.
    #[serde(default)]
    pub returns: Option<String>,
    /// Source text of the method computing the field.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(skip)]
    pub sampler: Option<Arc<dyn Sampler>>,
}

impl CallableDescriptor {
    pub fn new(owner: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            field: field.into(),
            returns: None,
            source: None,
            sampler: None,
        }
    }

    pub fn returns(mut self, annotation: impl Into<String>) -> Self {
        self.returns = Some(annotation.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Some(Arc::new(sampler));
        self
    }

    /// Owner name with a trailing `Serializer` removed.
    fn stem(&self) -> &str {
        match self.owner.strip_suffix("Serializer") {
            Some(stem) if !stem.is_empty() => stem,
            _ => &self.owner,
        }
    }
}

impl fmt::Debug for CallableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableDescriptor")
            .field("owner", &self.owner)
            .field("field", &self.field)
            .field("returns", &self.returns)
            .field("source", &self.source.as_ref().map(|s| s.len()))
            .field("sampler", &self.sampler.is_some())
            .finish()
    }
}

/// Computed-field descriptors keyed by (enclosing type, field name).
#[derive(Debug, Clone, Default)]
pub struct CallableRegistry {
    callables: Vec<CallableDescriptor>,
}

impl CallableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callable: CallableDescriptor) {
        self.callables.push(callable);
    }

    pub fn with(mut self, callable: CallableDescriptor) -> Self {
        self.register(callable);
        self
    }

    /// Find the callable behind `field` on the type named `enclosing`.
    ///
    /// An owner matches when its name, with any `Serializer` suffix removed,
    /// equals or appears in `enclosing`; schema names such as `UserDetail`
    /// match an owner `UserSerializer`. The longest matching owner wins.
    pub fn lookup(&self, enclosing: &str, field: &str) -> Option<&CallableDescriptor> {
        self.callables
            .iter()
            .filter(|c| c.field == field)
            .filter(|c| enclosing == c.owner || enclosing.contains(c.stem()))
            .max_by_key(|c| c.stem().len())
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }
}

impl FromIterator<CallableDescriptor> for CallableRegistry {
    fn from_iter<I: IntoIterator<Item = CallableDescriptor>>(iter: I) -> Self {
        Self {
            callables: iter.into_iter().collect(),
        }
    }
}

/// Whether a fragment looks like a computed field nothing else describes:
/// a plain string with no enum, format or example.
pub fn looks_computed(schema: &Value) -> bool {
    let set = |key: &str| match schema.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    };
    schema.get("type").and_then(Value::as_str) == Some("string")
        && !set("enum")
        && !set("format")
        && !set("example")
}

type Strategy = fn(&TypeInferencer, &CallableDescriptor) -> Result<Value, InferenceMiss>;

/// Three-tier return-type inference for computed fields.
#[derive(Debug, Clone, Default)]
pub struct TypeInferencer {
    vocabulary: Vocabulary,
    fixture: FixtureBuilder,
}

impl TypeInferencer {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            fixture: FixtureBuilder::new(),
        }
    }

    /// Use a custom fixture for sampled execution.
    pub fn fixture(mut self, fixture: FixtureBuilder) -> Self {
        self.fixture = fixture;
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Infer a fragment for `callable`. Falls back to `{"type": "string"}`.
    pub fn infer(&self, callable: &CallableDescriptor) -> Value {
        const STRATEGIES: [(&str, Strategy); 3] = [
            ("signature", TypeInferencer::from_signature),
            ("source", TypeInferencer::from_source),
            ("sample", TypeInferencer::from_sample),
        ];

        for (name, strategy) in STRATEGIES {
            match strategy(self, callable) {
                Ok(fragment) => {
                    debug!(
                        owner = %callable.owner,
                        field = %callable.field,
                        strategy = name,
                        "inferred computed field type"
                    );
                    return fragment;
                }
                Err(miss @ InferenceMiss::Sample(SampleError::Panicked { .. })) => {
                    warn!(
                        owner = %callable.owner,
                        field = %callable.field,
                        reason = %miss,
                        "callable panicked during sampling"
                    );
                }
                Err(miss) => {
                    debug!(
                        owner = %callable.owner,
                        field = %callable.field,
                        strategy = name,
                        reason = %miss,
                        "inference strategy missed"
                    );
                }
            }
        }

        Kind::String.fragment()
    }

    /// Map the declared return annotation, or the one written in the source.
    pub fn from_signature(&self, callable: &CallableDescriptor) -> Result<Value, InferenceMiss> {
        let annotation = callable
            .returns
            .clone()
            .or_else(|| callable.source.as_deref().and_then(declared_return_type))
            .ok_or(InferenceMiss::NoAnnotation)?;
        annotation_fragment(&annotation).ok_or(InferenceMiss::UnsupportedAnnotation { annotation })
    }

    /// Classify the shapes of the callable's `return` statements.
    pub fn from_source(&self, callable: &CallableDescriptor) -> Result<Value, InferenceMiss> {
        let source = callable.source.as_deref().ok_or(InferenceMiss::NoSource)?;
        analyze_source(source, &self.vocabulary)
    }

    /// Run the callable against a synthetic fixture and classify the result.
    pub fn from_sample(&self, callable: &CallableDescriptor) -> Result<Value, InferenceMiss> {
        let sampler = callable.sampler.as_ref().ok_or(InferenceMiss::NoSampler)?;
        let value = invoke_isolated(sampler.as_ref(), &self.fixture)?;
        Ok(classify_value(&value))
    }
}

/// Infer a fragment for `callable` with the default vocabulary and fixture.
pub fn infer(callable: &CallableDescriptor) -> Value {
    TypeInferencer::default().infer(callable)
}

/// Fragment for a return annotation such as `int`, `List[str]` or
/// `Optional[dict]`. `None` when the annotation names nothing known.
pub fn annotation_fragment(annotation: &str) -> Option<Value> {
    let annotation = annotation.trim();
    let annotation = annotation.strip_prefix("typing.").unwrap_or(annotation);

    if let Some(inner) = annotation
        .strip_prefix("Optional[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return annotation_fragment(inner);
    }
    if let Some((head, tail)) = split_union(annotation) {
        let (head, tail) = (head.trim(), tail.trim());
        return match (head, tail) {
            ("None", other) | (other, "None") => annotation_fragment(other),
            _ => None,
        };
    }

    let base = annotation.split('[').next().unwrap_or(annotation).trim();
    let fragment = match base {
        "int" | "integer" => Kind::Integer.fragment(),
        "str" | "string" => Kind::String.fragment(),
        "bool" | "boolean" => Kind::Boolean.fragment(),
        "float" | "number" | "Decimal" => Kind::Number.fragment(),
        "list" | "List" | "Sequence" | "tuple" | "Tuple" | "set" | "Set" | "Iterable" => {
            string_array_fragment()
        }
        "dict" | "Dict" | "Mapping" => Kind::Object.fragment(),
        _ => return None,
    };
    Some(fragment)
}

/// Split `A | B` at the first `|` outside generic brackets.
fn split_union(annotation: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (at, c) in annotation.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => return Some((&annotation[..at], &annotation[at + 1..])),
            _ => {}
        }
    }
    None
}

/// Describe a runtime value structurally.
///
/// Mappings become objects with classified properties, sequences become
/// arrays typed by their first element (strings when empty), and anything
/// without a JSON scalar type reads as a string.
pub fn classify_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let properties: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), classify_value(v)))
                .collect();
            json!({ "type": "object", "properties": properties })
        }
        Value::Array(items) => match items.first() {
            Some(first) => json!({ "type": "array", "items": classify_value(first) }),
            None => string_array_fragment(),
        },
        Value::Number(n) if n.is_f64() => Kind::Number.fragment(),
        Value::Number(_) => Kind::Integer.fragment(),
        Value::Bool(_) => Kind::Boolean.fragment(),
        Value::String(_) | Value::Null => Kind::String.fragment(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;
    use tracing_test::traced_test;

    // === Heuristic Tests ===

    #[test]
    fn looks_computed_plain_string() {
        assert!(looks_computed(&json!({ "type": "string" })));
        assert!(looks_computed(&json!({ "type": "string", "readOnly": true })));
    }

    #[test]
    fn looks_computed_pinned_down() {
        assert!(!looks_computed(&json!({ "type": "string", "format": "uuid" })));
        assert!(!looks_computed(&json!({ "type": "string", "enum": ["a"] })));
        assert!(!looks_computed(&json!({ "type": "string", "example": "x" })));
        assert!(!looks_computed(&json!({ "type": "integer" })));
        assert!(!looks_computed(&json!({})));
    }

    // === Signature Tests ===

    #[test]
    fn annotation_scalars() {
        assert_eq!(annotation_fragment("int"), Some(json!({ "type": "integer" })));
        assert_eq!(annotation_fragment("str"), Some(json!({ "type": "string" })));
        assert_eq!(annotation_fragment("bool"), Some(json!({ "type": "boolean" })));
        assert_eq!(annotation_fragment("float"), Some(json!({ "type": "number" })));
    }

    #[test]
    fn annotation_generics() {
        assert_eq!(
            annotation_fragment("List[int]"),
            Some(json!({ "type": "array", "items": { "type": "string" } }))
        );
        assert_eq!(
            annotation_fragment("typing.Dict[str, Any]"),
            Some(json!({ "type": "object" }))
        );
        assert_eq!(annotation_fragment("Optional[int]"), Some(json!({ "type": "integer" })));
        assert_eq!(annotation_fragment("bool | None"), Some(json!({ "type": "boolean" })));
        assert_eq!(
            annotation_fragment("Dict[str, int | None]"),
            Some(json!({ "type": "object" }))
        );
        assert_eq!(
            annotation_fragment("list[int | str] | None"),
            Some(json!({ "type": "array", "items": { "type": "string" } }))
        );
    }

    #[test]
    fn annotation_unknown() {
        assert_eq!(annotation_fragment("UserSummary"), None);
        assert_eq!(annotation_fragment("int | str"), None);
    }

    #[test]
    fn signature_strategy_reads_source_annotation() {
        let callable = CallableDescriptor::new("OrderSerializer", "total")
            .source("def get_total(self, obj) -> float:\n    return compute(obj)\n");
        let inferencer = TypeInferencer::default();
        assert_eq!(
            inferencer.from_signature(&callable),
            Ok(json!({ "type": "number" }))
        );
    }

    // === Chain Tests ===

    #[test]
    fn infer_prefers_signature() {
        let callable = CallableDescriptor::new("OrderSerializer", "total")
            .returns("int")
            .source("def get_total(self, obj):\n    return 'text'\n");
        assert_eq!(infer(&callable), json!({ "type": "integer" }));
    }

    #[test]
    fn infer_counting_source() {
        let callable = CallableDescriptor::new("OrderSerializer", "item_count")
            .source("def get_item_count(self, obj):\n    return obj.count()\n");
        assert_eq!(infer(&callable), json!({ "type": "integer" }));
    }

    #[test]
    fn infer_samples_when_source_is_opaque() {
        let callable = CallableDescriptor::new("OrderSerializer", "stats")
            .source("def get_stats(self, obj):\n    return build_stats(obj)\n")
            .sampler(|f: &Fixture| -> Result<Value, SampleError> {
                Ok(json!({ "items": f.items().count(), "tags": ["a"], "ratio": 0.5 }))
            });
        assert_eq!(
            infer(&callable),
            json!({
                "type": "object",
                "properties": {
                    "items": { "type": "integer" },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "ratio": { "type": "number" }
                }
            })
        );
    }

    #[test]
    fn infer_falls_back_to_string() {
        let callable = CallableDescriptor::new("OrderSerializer", "owner")
            .source("def get_owner(self, obj)\n    return (\n")
            .sampler(|f: &Fixture| -> Result<Value, SampleError> { f.attr("owner").cloned() });
        assert_eq!(infer(&callable), json!({ "type": "string" }));
    }

    #[test]
    #[traced_test]
    fn infer_survives_panicking_sampler() {
        let callable = CallableDescriptor::new("OrderSerializer", "owner").sampler(
            |_: &Fixture| -> Result<Value, SampleError> { panic!("database unavailable") },
        );
        assert_eq!(infer(&callable), json!({ "type": "string" }));
        assert!(logs_contain("callable panicked during sampling"));
        assert!(logs_contain("database unavailable"));
    }

    #[test]
    #[traced_test]
    fn infer_logs_misses() {
        let callable = CallableDescriptor::new("OrderSerializer", "owner");
        assert_eq!(infer(&callable), json!({ "type": "string" }));
        assert!(logs_contain("inference strategy missed"));
        assert!(logs_contain("no sampler attached"));
    }

    // === Classification Tests ===

    #[test]
    fn classify_runtime_values() {
        assert_eq!(classify_value(&json!(3)), json!({ "type": "integer" }));
        assert_eq!(classify_value(&json!(3.5)), json!({ "type": "number" }));
        assert_eq!(classify_value(&json!(false)), json!({ "type": "boolean" }));
        assert_eq!(classify_value(&Value::Null), json!({ "type": "string" }));
        assert_eq!(
            classify_value(&json!([])),
            json!({ "type": "array", "items": { "type": "string" } })
        );
        assert_eq!(
            classify_value(&json!([{ "id": 1 }])),
            json!({
                "type": "array",
                "items": { "type": "object", "properties": { "id": { "type": "integer" } } }
            })
        );
    }

    // === Registry Tests ===

    #[test]
    fn lookup_matches_serializer_stem() {
        let registry = CallableRegistry::new()
            .with(CallableDescriptor::new("UserSerializer", "full_name"))
            .with(CallableDescriptor::new("OrderSerializer", "total"));

        assert_eq!(
            registry.lookup("UserDetail", "full_name").map(|c| c.owner.as_str()),
            Some("UserSerializer")
        );
        assert_eq!(
            registry.lookup("UserSerializer", "full_name").map(|c| c.owner.as_str()),
            Some("UserSerializer")
        );
        assert!(registry.lookup("UserDetail", "total").is_none());
        assert!(registry.lookup("Account", "full_name").is_none());
    }

    #[test]
    fn lookup_prefers_longest_owner() {
        let registry = CallableRegistry::new()
            .with(CallableDescriptor::new("UserSerializer", "label").returns("int"))
            .with(CallableDescriptor::new("UserDetailSerializer", "label").returns("bool"));

        let found = registry.lookup("UserDetail", "label").unwrap();
        assert_eq!(found.owner, "UserDetailSerializer");
    }

    #[test]
    fn descriptors_deserialize() {
        let callable: CallableDescriptor = serde_json::from_value(json!({
            "type": "UserSerializer",
            "field": "full_name",
            "returns": "str"
        }))
        .unwrap();
        assert_eq!(callable.owner, "UserSerializer");
        assert_eq!(callable.returns.as_deref(), Some("str"));
        assert!(callable.source.is_none());
        assert!(callable.sampler.is_none());
    }
}
