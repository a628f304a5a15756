//! Core types shared by resolution, inference and synthesis.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// HTTP methods whose operations get documented.
pub const OPERATION_METHODS: &[&str] = &["get", "post", "put", "patch", "delete"];

/// Returns the JSON type name for log messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Direction of the example being built.
///
/// Governs which visibility flag hides a property: `readOnly` fields never
/// appear in requests, `writeOnly` fields never appear in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// Returns the schema flag that hides a property in this direction.
    pub fn hiding_flag(&self) -> &'static str {
        match self {
            Direction::Request => "readOnly",
            Direction::Response => "writeOnly",
        }
    }

    /// Create direction from a request flag (true = Request, false = Response).
    pub fn from_request_flag(is_request: bool) -> Self {
        if is_request {
            Direction::Request
        } else {
            Direction::Response
        }
    }

    /// Whether a property schema is hidden in this direction.
    pub fn hides(&self, schema: &Value) -> bool {
        schema
            .get(self.hiding_flag())
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// The shape named by a fragment's `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
}

impl Kind {
    /// Parse a `type` keyword value. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "object" => Some(Kind::Object),
            "array" => Some(Kind::Array),
            "string" => Some(Kind::String),
            "integer" => Some(Kind::Integer),
            "number" => Some(Kind::Number),
            "boolean" => Some(Kind::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
        }
    }

    /// A bare fragment of this kind, e.g. `{"type": "integer"}`.
    pub fn fragment(&self) -> Value {
        json!({ "type": self.as_str() })
    }

    /// Kind of a schema fragment.
    ///
    /// A missing `type` reads as object. A list such as `["string", "null"]`
    /// uses its first non-null entry. Returns `None` for unknown types.
    pub fn of(schema: &Value) -> Option<Self> {
        match schema.get("type") {
            None => Some(Kind::Object),
            Some(Value::String(s)) => Kind::parse(s),
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .and_then(Kind::parse),
            Some(_) => None,
        }
    }
}

/// Fragment for an array whose items are strings.
pub fn string_array_fragment() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

/// Whether a fragment is an array declaring `default: []`.
pub fn has_empty_array_default(schema: &Value) -> bool {
    Kind::of(schema) == Some(Kind::Array)
        && schema.get("type").is_some()
        && matches!(schema.get("default"), Some(Value::Array(items)) if items.is_empty())
}
