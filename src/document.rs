//! API documents and endpoint enumeration.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::assembler::{RequestExample, ResponseExamples};
use crate::engine::ExampleEngine;
use crate::error::LoadError;
use crate::registry::SchemaRegistry;
use crate::types::OPERATION_METHODS;

/// A loaded OpenAPI document.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDocument {
    document: Value,
    registry: SchemaRegistry,
}

/// One documented operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint<'a> {
    pub path: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// `operationId`, empty when undeclared.
    pub operation_id: String,
    /// Page file name, see [`safe_filename`].
    pub filename: String,
    pub operation: &'a Value,
}

impl ApiDocument {
    /// Wrap a parsed document.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidDocument` if the root or `paths` is not
    /// an object.
    pub fn new(document: Value) -> Result<Self, LoadError> {
        if !document.is_object() {
            return Err(LoadError::InvalidDocument {
                message: "document root must be an object".to_string(),
            });
        }
        if document.get("paths").is_some_and(|p| !p.is_object()) {
            return Err(LoadError::InvalidDocument {
                message: "`paths` must be an object".to_string(),
            });
        }
        let registry = SchemaRegistry::from_document(&document);
        Ok(Self { document, registry })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Operations in `paths` order, documented methods only.
    pub fn endpoints(&self) -> Vec<Endpoint<'_>> {
        let Some(paths) = self.document.get("paths").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut endpoints = Vec::new();
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            for (method, operation) in item {
                if !OPERATION_METHODS.contains(&method.as_str()) || !operation.is_object() {
                    continue;
                }
                endpoints.push(Endpoint {
                    path: path.clone(),
                    method: method.to_uppercase(),
                    operation_id: operation
                        .get("operationId")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    filename: safe_filename(path, method),
                    operation,
                });
            }
        }
        endpoints
    }
}

/// File name for an endpoint page, e.g. `get_api_users_id_.md` for
/// `GET /api/users/{id}/`.
pub fn safe_filename(path: &str, method: &str) -> String {
    let safe_path: String = path
        .trim_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}.md", method.to_lowercase(), safe_path)
}

/// Declared `in: path` parameters of an operation.
pub fn path_parameters(operation: &Value) -> Vec<&Value> {
    operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .filter(|p| p.get("in").and_then(Value::as_str) == Some("path"))
                .collect()
        })
        .unwrap_or_default()
}

/// Examples for every endpoint of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentExamples {
    pub endpoints: Vec<EndpointExamples>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointExamples {
    pub path: String,
    pub method: String,
    pub operation_id: String,
    pub filename: String,
    pub request_examples: Vec<RequestExample>,
    pub responses: Vec<ResponseExamples>,
}

/// Assemble every endpoint of `document` with `engine`.
pub fn assemble_document(document: &ApiDocument, engine: &ExampleEngine) -> DocumentExamples {
    let assembler = engine.assembler();
    let endpoints: Vec<EndpointExamples> = document
        .endpoints()
        .into_iter()
        .map(|endpoint| {
            let assembled = assembler.assemble(endpoint.operation);
            EndpointExamples {
                path: endpoint.path,
                method: endpoint.method,
                operation_id: endpoint.operation_id,
                filename: endpoint.filename,
                request_examples: assembled.request_examples,
                responses: assembled.responses,
            }
        })
        .collect();

    info!(endpoints = endpoints.len(), "assembled document examples");
    DocumentExamples { endpoints }
}
