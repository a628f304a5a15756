//! Per-operation example assembly.
//!
//! Collects the request examples and the per-status response examples of
//! one API operation, ready for a page renderer.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::registry::SchemaRegistry;
use crate::synthesizer::Synthesizer;
use crate::types::Direction;

/// Description given to content-free responses that declare none.
pub const NO_CONTENT_DESCRIPTION: &str =
    "The request was successful. No content is returned in the response body.";

/// One request example.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestExample {
    /// Key of the declared example, or `default` for a synthesized one.
    pub key: String,
    pub summary: String,
    pub description: String,
    /// Pretty-printed JSON text of the example value.
    pub value: String,
}

/// Examples for one declared status code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseExamples {
    pub status_code: String,
    pub description: String,
    pub examples: Vec<Value>,
}

/// Assembled examples of one operation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationExamples {
    pub operation_id: String,
    pub request_examples: Vec<RequestExample>,
    /// In declared status-code order.
    pub responses: Vec<ResponseExamples>,
}

impl OperationExamples {
    pub fn response(&self, status_code: &str) -> Option<&ResponseExamples> {
        self.responses.iter().find(|r| r.status_code == status_code)
    }
}

/// Assembles operations with one synthesizer.
#[derive(Debug, Clone)]
pub struct OperationAssembler<'a> {
    synthesizer: Synthesizer<'a>,
    media_types: Vec<String>,
}

impl<'a> OperationAssembler<'a> {
    pub fn new(synthesizer: Synthesizer<'a>) -> Self {
        Self {
            synthesizer,
            media_types: vec!["application/json".to_string()],
        }
    }

    /// Preferred media types, most preferred first.
    pub fn media_types(mut self, media_types: &[String]) -> Self {
        self.media_types = media_types.to_vec();
        self
    }

    pub fn assemble(&self, operation: &Value) -> OperationExamples {
        let operation_id = operation
            .get("operationId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let request_examples = operation
            .get("requestBody")
            .map(|body| self.request_examples(&operation_id, body))
            .unwrap_or_default();

        let responses = operation
            .get("responses")
            .and_then(Value::as_object)
            .map(|responses| {
                responses
                    .iter()
                    .map(|(status, response)| self.response(status, response))
                    .collect()
            })
            .unwrap_or_default();

        OperationExamples {
            operation_id,
            request_examples,
            responses,
        }
    }

    // --- Internal implementation ---

    fn request_examples(&self, operation_id: &str, body: &Value) -> Vec<RequestExample> {
        let Some(media) = self.select_media(body.get("content")) else {
            return Vec::new();
        };

        let declared = declared_examples(operation_id, media);
        if !declared.is_empty() {
            return declared;
        }

        let Some(schema) = media.get("schema").filter(|s| is_present(s)) else {
            return Vec::new();
        };
        let value = self.synthesizer.synthesize(schema, Direction::Request);
        if value.is_null() {
            debug!(operation_id, "request schema produced no example");
            return Vec::new();
        }
        match serde_json::to_string_pretty(&value) {
            Ok(text) => vec![RequestExample {
                key: "default".to_string(),
                summary: "Example".to_string(),
                description: String::new(),
                value: text,
            }],
            Err(err) => {
                warn!(operation_id, error = %err, "failed to serialize request example");
                Vec::new()
            }
        }
    }

    fn response(&self, status: &str, response: &Value) -> ResponseExamples {
        let description = response
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let Some(media) = self.select_media(response.get("content")) else {
            let status_code = if status == "200" { "204" } else { status };
            return ResponseExamples {
                status_code: status_code.to_string(),
                description: if description.is_empty() {
                    NO_CONTENT_DESCRIPTION.to_string()
                } else {
                    description
                },
                examples: Vec::new(),
            };
        };

        let empty = Value::Object(Map::new());
        let schema = media.get("schema").unwrap_or(&empty);
        ResponseExamples {
            status_code: status.to_string(),
            description,
            examples: self.synthesizer.examples(schema),
        }
    }

    /// Media entry to use from a `content` map: the first preferred type
    /// present, else any `+json` type, else the first entry.
    fn select_media<'v>(&self, content: Option<&'v Value>) -> Option<&'v Value> {
        let content = content.and_then(Value::as_object).filter(|c| !c.is_empty())?;
        self.media_types
            .iter()
            .find_map(|media_type| content.get(media_type))
            .or_else(|| {
                content
                    .iter()
                    .find(|(media_type, _)| media_type.ends_with("+json"))
                    .map(|(_, media)| media)
            })
            .or_else(|| content.values().next())
    }
}

/// Assemble `operation` with no field generators or inference.
pub fn assemble_operation(operation: &Value, registry: &SchemaRegistry) -> OperationExamples {
    OperationAssembler::new(Synthesizer::new(registry)).assemble(operation)
}

fn declared_examples(operation_id: &str, media: &Value) -> Vec<RequestExample> {
    let Some(examples) = media.get("examples").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut extracted = Vec::new();
    for (key, example) in examples {
        let Some(entry) = example.as_object() else {
            debug!(operation_id, key = %key, "skipping example that is not an object");
            continue;
        };
        let Some(value) = entry.get("value").filter(|v| !v.is_null()) else {
            debug!(operation_id, key = %key, "skipping example without a value");
            continue;
        };
        let text = match serde_json::to_string_pretty(value) {
            Ok(text) => text,
            Err(err) => {
                warn!(operation_id, key = %key, error = %err, "failed to serialize example");
                continue;
            }
        };
        let field = |name: &str| entry.get(name).and_then(Value::as_str).map(str::to_string);
        extracted.push(RequestExample {
            key: key.clone(),
            summary: field("summary").unwrap_or_else(|| key.clone()),
            description: field("description").unwrap_or_default(),
            value: text,
        });
    }
    extracted
}

fn is_present(schema: &Value) -> bool {
    match schema {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
