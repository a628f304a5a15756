//! OpenAPI Example Synthesis
//!
//! Builds realistic request and response example payloads from an OpenAPI
//! document for generated API documentation.
//!
//! The pipeline, per schema fragment:
//!
//! 1. [`resolve`] replaces `$ref` pointers and flattens `allOf`, keeping
//!    local overrides such as `readOnly`.
//! 2. Bare string fields computed at serialization time are typed by
//!    [`TypeInferencer`] from a declared signature, the method source, or a
//!    sample run against a synthetic [`Fixture`].
//! 3. [`synthesize`] materializes one example for a [`Direction`], dropping
//!    `readOnly` fields from requests and `writeOnly` fields from responses.
//! 4. [`examples`] expands arrays declaring `default: []` into an empty and a
//!    populated variant.
//! 5. [`assemble_operation`] collates request and per-status response
//!    examples for one operation.
//!
//! # Example
//!
//! ```
//! use oas_examples::{synthesize, Direction, SchemaRegistry};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::from_document(&json!({
//!     "components": { "schemas": {
//!         "User": {
//!             "type": "object",
//!             "properties": {
//!                 "id": { "type": "integer", "readOnly": true },
//!                 "name": { "type": "string" }
//!             }
//!         }
//!     }}
//! }));
//! let user = json!({ "$ref": "#/components/schemas/User" });
//!
//! assert_eq!(
//!     synthesize(&user, &registry, Direction::Response),
//!     json!({ "id": 0, "name": "string" })
//! );
//! // The read-only id is never sent by clients
//! assert_eq!(
//!     synthesize(&user, &registry, Direction::Request),
//!     json!({ "name": "string" })
//! );
//! ```
//!
//! # Explicit Values
//!
//! | Keyword | Result |
//! |---------|--------|
//! | `enum` | first entry |
//! | `example` | as-is |
//! | `default` | as-is, except `[]` on an array with `items` |
//! | (none) | generated from `type` |

mod assembler;
mod config;
mod document;
mod engine;
mod error;
mod fixture;
mod generators;
mod inference;
mod loader;
mod registry;
mod resolver;
mod source;
mod synthesizer;
mod types;

pub use assembler::{
    assemble_operation, OperationAssembler, OperationExamples, RequestExample, ResponseExamples,
    NO_CONTENT_DESCRIPTION,
};
pub use config::{EngineConfig, DEFAULT_MAX_DEPTH};
pub use document::{
    assemble_document, path_parameters, safe_filename, ApiDocument, DocumentExamples, Endpoint,
    EndpointExamples,
};
pub use engine::ExampleEngine;
pub use error::{InferenceMiss, LoadError, SampleError};
pub use fixture::{invoke_isolated, Fixture, FixtureBuilder, FixtureCollection, Sampler};
pub use generators::{Builtin, FieldGenerator, FieldGenerators, GeneratorSpec};
pub use inference::{
    annotation_fragment, classify_value, infer, looks_computed, CallableDescriptor,
    CallableRegistry, TypeInferencer,
};
pub use loader::{
    is_url, load_callables, load_config, load_document, load_document_auto, load_document_str,
};
pub use registry::{ref_name, SchemaRegistry};
pub use resolver::resolve;
pub use source::{analyze_source, declared_return_type, Vocabulary};
pub use synthesizer::{examples, synthesize, Synthesizer};
pub use types::{Direction, Kind};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
