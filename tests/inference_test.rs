//! Integration tests for computed-field type inference.

use oas_examples::{
    infer, CallableDescriptor, CallableRegistry, Direction, ExampleEngine, Fixture, SampleError,
    SchemaRegistry, TypeInferencer, Vocabulary,
};
use serde_json::{json, Value};

// === Fallback Chain Tests ===

mod fallback_chain {
    use super::*;

    #[test]
    fn counting_return_is_integer() {
        let callable =
            CallableDescriptor::new("OrderSerializer", "line_count").source("return obj.count()");
        assert_eq!(infer(&callable), json!({ "type": "integer" }));
    }

    #[test]
    fn raising_sampler_without_parseable_source_is_string() {
        let callable = CallableDescriptor::new("OrderSerializer", "summary")
            .source("def get_summary(self, obj:\n    return {\n")
            .sampler(|_: &Fixture| -> Result<Value, SampleError> {
                Err(SampleError::failed("relation does not exist"))
            });
        assert_eq!(infer(&callable), json!({ "type": "string" }));
    }

    #[test]
    fn signature_beats_source_and_sample() {
        let callable = CallableDescriptor::new("OrderSerializer", "paid")
            .returns("bool")
            .source("def get_paid(self, obj):\n    return obj.count()\n")
            .sampler(|_: &Fixture| -> Result<Value, SampleError> { Ok(json!("yes")) });
        assert_eq!(infer(&callable), json!({ "type": "boolean" }));
    }

    #[test]
    fn unsupported_signature_falls_through_to_source() {
        let callable = CallableDescriptor::new("OrderSerializer", "owner")
            .returns("UserSummary")
            .source("def get_owner(self, obj):\n    return {'id': obj.pk, 'name': obj.name}\n");
        assert_eq!(
            infer(&callable),
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer" },
                    "name": { "type": "string" }
                }
            })
        );
    }

    #[test]
    fn sampled_value_uses_fixture_accessors() {
        let callable = CallableDescriptor::new("OrderSerializer", "lines").sampler(
            |f: &Fixture| -> Result<Value, SampleError> {
                let names: Vec<Value> = f.items().all().to_vec();
                Ok(json!({ "owner": f.attr("name")?, "total": f.items().count(), "names": names }))
            },
        );
        assert_eq!(
            infer(&callable),
            json!({
                "type": "object",
                "properties": {
                    "owner": { "type": "string" },
                    "total": { "type": "integer" },
                    "names": { "type": "array", "items": { "type": "string" } }
                }
            })
        );
    }

    #[test]
    fn class_indented_source() {
        let source = "
    def get_ids(self, obj):
        if obj.pk:
            return [obj.pk]
        return [1, 2]
";
        let callable = CallableDescriptor::new("OrderSerializer", "ids").source(source);
        assert_eq!(
            infer(&callable),
            json!({ "type": "array", "items": { "type": "integer" } })
        );
    }
}

// === Vocabulary Tests ===

mod vocabulary {
    use super::*;

    #[test]
    fn configured_names_are_recognized() {
        let vocabulary = Vocabulary {
            integer_calls: vec!["total".to_string()],
            ..Vocabulary::default()
        };
        let callable = CallableDescriptor::new("CartSerializer", "sum")
            .source("def get_sum(self, obj):\n    return obj.lines.total()\n");

        assert_eq!(infer(&callable), json!({ "type": "string" }));
        assert_eq!(
            TypeInferencer::new(vocabulary).infer(&callable),
            json!({ "type": "integer" })
        );
    }
}

// === Synthesis Integration Tests ===

mod synthesis {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_document(&json!({
            "components": { "schemas": {
                "UserDetail": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "readOnly": true },
                        "full_name": { "type": "string", "readOnly": true },
                        "group_count": { "type": "string", "readOnly": true },
                        "email": { "type": "string", "format": "email" }
                    }
                }
            }}
        }))
    }

    fn callables() -> CallableRegistry {
        CallableRegistry::new()
            .with(CallableDescriptor::new("UserSerializer", "full_name").returns("str"))
            .with(
                CallableDescriptor::new("UserSerializer", "group_count")
                    .source("def get_group_count(self, obj):\n    return obj.groups.count()\n"),
            )
    }

    #[test]
    fn computed_fields_typed_in_response() {
        let engine = ExampleEngine::new(registry()).with_callables(callables());
        let value = engine.synthesize(
            &json!({ "$ref": "#/components/schemas/UserDetail" }),
            Direction::Response,
        );
        assert_eq!(
            value,
            json!({ "id": 0, "full_name": "string", "group_count": 0, "email": "string" })
        );
    }

    #[test]
    fn without_callables_fields_stay_strings() {
        let engine = ExampleEngine::new(registry());
        let value = engine.synthesize(
            &json!({ "$ref": "#/components/schemas/UserDetail" }),
            Direction::Response,
        );
        assert_eq!(value["group_count"], "string");
    }
}
