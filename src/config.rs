//! Engine configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::generators::{FieldGenerators, GeneratorSpec};
use crate::source::Vocabulary;

/// Default cap on synthesis recursion.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Tunables for resolution, inference and synthesis.
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Field name to generator, consulted before schema-based synthesis.
    pub field_generators: BTreeMap<String, GeneratorSpec>,
    /// Names recognized by structural source analysis.
    pub vocabulary: Vocabulary,
    /// Nesting depth beyond which synthesis yields `null`.
    pub max_depth: usize,
    /// Preferred media types for request and response content.
    pub media_types: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field_generators: BTreeMap::new(),
            vocabulary: Vocabulary::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            media_types: vec!["application/json".to_string()],
        }
    }
}

impl EngineConfig {
    /// Lower-case generator names; later duplicates win.
    pub fn normalized(mut self) -> Self {
        self.field_generators = self
            .field_generators
            .into_iter()
            .map(|(name, spec)| (name.to_lowercase(), spec))
            .collect();
        self
    }

    pub fn field_generators(&self) -> FieldGenerators {
        FieldGenerators::from_specs(&self.field_generators)
    }
}
