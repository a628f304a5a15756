//! Owning entry point tying the registry, configuration and callables together.

use serde_json::Value;

use crate::assembler::{OperationAssembler, OperationExamples};
use crate::config::EngineConfig;
use crate::fixture::FixtureBuilder;
use crate::generators::FieldGenerators;
use crate::inference::{CallableDescriptor, CallableRegistry, TypeInferencer};
use crate::registry::SchemaRegistry;
use crate::resolver;
use crate::synthesizer::Synthesizer;
use crate::types::Direction;

/// Everything needed to produce examples for one API document.
///
/// All state is read-only after construction, so an engine can be shared
/// across threads assembling independent operations.
#[derive(Debug, Clone)]
pub struct ExampleEngine {
    registry: SchemaRegistry,
    generators: FieldGenerators,
    callables: CallableRegistry,
    inferencer: TypeInferencer,
    max_depth: usize,
    media_types: Vec<String>,
}

impl ExampleEngine {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self::from_config(registry, EngineConfig::default())
    }

    pub fn from_config(registry: SchemaRegistry, config: EngineConfig) -> Self {
        let config = config.normalized();
        Self {
            generators: config.field_generators(),
            inferencer: TypeInferencer::new(config.vocabulary),
            callables: CallableRegistry::new(),
            max_depth: config.max_depth,
            media_types: config.media_types,
            registry,
        }
    }

    pub fn with_callables(mut self, callables: CallableRegistry) -> Self {
        self.callables = callables;
        self
    }

    /// Add generators on top of the configured ones; same names replace.
    pub fn with_generators(mut self, generators: FieldGenerators) -> Self {
        self.generators.extend(generators);
        self
    }

    pub fn with_fixture(mut self, fixture: FixtureBuilder) -> Self {
        self.inferencer = self.inferencer.fixture(fixture);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn callables(&self) -> &CallableRegistry {
        &self.callables
    }

    pub fn synthesizer(&self) -> Synthesizer<'_> {
        Synthesizer::new(&self.registry)
            .generators(&self.generators)
            .inference(&self.callables, &self.inferencer)
            .max_depth(self.max_depth)
    }

    pub fn assembler(&self) -> OperationAssembler<'_> {
        OperationAssembler::new(self.synthesizer()).media_types(&self.media_types)
    }

    pub fn resolve(&self, fragment: &Value) -> Value {
        resolver::resolve(fragment, &self.registry)
    }

    pub fn infer(&self, callable: &CallableDescriptor) -> Value {
        self.inferencer.infer(callable)
    }

    pub fn synthesize(&self, fragment: &Value, direction: Direction) -> Value {
        self.synthesizer().synthesize(fragment, direction)
    }

    pub fn examples(&self, fragment: &Value) -> Vec<Value> {
        self.synthesizer().examples(fragment)
    }

    pub fn assemble(&self, operation: &Value) -> OperationExamples {
        self.assembler().assemble(operation)
    }
}
