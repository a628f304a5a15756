//! Structural analysis of callable source text.
//!
//! Parses a computed field's method body with tree-sitter and classifies the
//! value shape of every `return` statement. Only a small set of node patterns
//! is recognized: mapping, sequence and scalar literals, calls of named
//! accessors, and attribute access. The accessor and attribute names that
//! carry meaning live in a [`Vocabulary`] so they can be configured per
//! code base.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::InferenceMiss;
use crate::types::Kind;

/// Recognized accessor and attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Accessor calls returning a count, e.g. `obj.items.count()`.
    pub integer_calls: Vec<String>,
    /// Accessor calls returning a flag, e.g. `qs.exists()`.
    pub boolean_calls: Vec<String>,
    /// Accessor calls returning a collection of records.
    pub collection_calls: Vec<String>,
    /// Accessor calls returning one record.
    pub single_calls: Vec<String>,
    pub integer_attributes: Vec<String>,
    pub string_attributes: Vec<String>,
    pub boolean_attributes: Vec<String>,
    /// Attribute prefixes marking flags, e.g. `is_`.
    pub boolean_prefixes: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            integer_calls: names(&["count"]),
            boolean_calls: names(&["exists"]),
            collection_calls: names(&["all", "filter", "exclude"]),
            single_calls: names(&["first", "last", "get"]),
            integer_attributes: names(&["id", "pk", "count"]),
            string_attributes: names(&["name", "title", "description", "slug"]),
            boolean_attributes: names(&["enabled"]),
            boolean_prefixes: names(&["is_"]),
        }
    }
}

impl Vocabulary {
    /// Shape returned by calling the accessor `name`.
    pub fn call_shape(&self, name: &str) -> Option<Value> {
        if contains(&self.integer_calls, name) {
            Some(Kind::Integer.fragment())
        } else if contains(&self.boolean_calls, name) {
            Some(Kind::Boolean.fragment())
        } else if contains(&self.collection_calls, name) {
            Some(json!({ "type": "array", "items": { "type": "object" } }))
        } else if contains(&self.single_calls, name) {
            Some(Kind::Object.fragment())
        } else {
            None
        }
    }

    /// Shape of reading the attribute `name`.
    pub fn attribute_shape(&self, name: &str) -> Option<Value> {
        if contains(&self.integer_attributes, name) {
            Some(Kind::Integer.fragment())
        } else if contains(&self.string_attributes, name) {
            Some(Kind::String.fragment())
        } else if contains(&self.boolean_attributes, name)
            || self.boolean_prefixes.iter().any(|p| name.starts_with(p.as_str()))
        {
            Some(Kind::Boolean.fragment())
        } else {
            None
        }
    }
}

fn contains(list: &[String], name: &str) -> bool {
    list.iter().any(|n| n == name)
}

/// Infer a fragment from the `return` statements in `source`.
///
/// Every recognized return shape is collected in source order. If all of
/// them agree on `type` the first wins, with object properties merged
/// across returns; disagreeing shapes collapse to a plain string.
pub fn analyze_source(source: &str, vocabulary: &Vocabulary) -> Result<Value, InferenceMiss> {
    let parsed = ParsedSource::parse(source)?;
    let mut collector = ReturnCollector {
        source: parsed.text.as_bytes(),
        vocabulary,
        shapes: Vec::new(),
    };
    collector.visit(parsed.tree.root_node());
    merge_shapes(collector.shapes).ok_or(InferenceMiss::NoReturns)
}

/// The return annotation of the first function defined in `source`, if any.
///
/// `def get_total(self, obj) -> int:` yields `"int"`.
pub fn declared_return_type(source: &str) -> Option<String> {
    let parsed = ParsedSource::parse(source).ok()?;
    let root = parsed.tree.root_node();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "function_definition" {
            return node
                .child_by_field_name("return_type")
                .and_then(|n| n.utf8_text(parsed.text.as_bytes()).ok())
                .map(|s| s.trim().to_string());
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        // Reverse so the first definition in the file is popped first
        stack.extend(children.into_iter().rev());
    }
    None
}

struct ParsedSource {
    text: String,
    tree: Tree,
}

impl ParsedSource {
    fn parse(source: &str) -> Result<Self, InferenceMiss> {
        let text = dedent(source);
        if text.trim().is_empty() {
            return Err(InferenceMiss::NoSource);
        }

        let language: Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| InferenceMiss::ParseFailed {
                message: e.to_string(),
            })?;

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| InferenceMiss::ParseFailed {
                message: "parser produced no tree".to_string(),
            })?;

        if tree.root_node().has_error() {
            return Err(InferenceMiss::ParseFailed {
                message: "syntax error".to_string(),
            });
        }

        Ok(Self { text, tree })
    }
}

/// Remove the indentation common to all non-blank lines.
///
/// Method source is usually captured with its class-level indentation,
/// which the parser rejects.
fn dedent(source: &str) -> String {
    let indent = source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    source
        .lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

struct ReturnCollector<'a> {
    source: &'a [u8],
    vocabulary: &'a Vocabulary,
    shapes: Vec<Value>,
}

impl<'a> ReturnCollector<'a> {
    fn visit(&mut self, node: Node) {
        if node.kind() == "return_statement" {
            if let Some(shape) = first_expression(node).and_then(|value| self.return_shape(value)) {
                self.shapes.push(shape);
            }
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child);
        }
    }

    /// Shape of a returned expression; `None` for unrecognized patterns.
    fn return_shape(&self, node: Node) -> Option<Value> {
        match node.kind() {
            "parenthesized_expression" => first_expression(node).and_then(|n| self.return_shape(n)),
            "dictionary" => Some(self.mapping_shape(node)),
            "list" => Some(self.sequence_shape(node)),
            "call" => self.call_shape(node),
            "attribute" => self.attribute_shape(node),
            "unary_operator" => node
                .child_by_field_name("argument")
                .filter(|arg| matches!(arg.kind(), "integer" | "float"))
                .and_then(literal_shape),
            _ => literal_shape(node),
        }
    }

    /// Shape of a value nested in a literal mapping or sequence.
    ///
    /// Unrecognized accessor calls and attributes are dropped; any other
    /// unrecognized expression reads as a string.
    fn value_shape(&self, node: Node) -> Option<Value> {
        match node.kind() {
            "call" => self.call_shape(node),
            "attribute" => self.attribute_shape(node),
            _ => Some(self.return_shape(node).unwrap_or_else(|| Kind::String.fragment())),
        }
    }

    fn mapping_shape(&self, node: Node) -> Value {
        let mut properties = Map::new();
        let mut cursor = node.walk();
        for pair in node.named_children(&mut cursor) {
            if pair.kind() != "pair" {
                continue;
            }
            let (Some(key), Some(value)) = (
                pair.child_by_field_name("key"),
                pair.child_by_field_name("value"),
            ) else {
                continue;
            };
            let Some(key) = self.string_literal(key) else {
                continue;
            };
            if let Some(shape) = self.value_shape(value) {
                properties.insert(key, shape);
            }
        }
        json!({ "type": "object", "properties": properties })
    }

    fn sequence_shape(&self, node: Node) -> Value {
        let items = first_expression(node)
            .and_then(|first| self.value_shape(first))
            .unwrap_or_else(|| Kind::String.fragment());
        json!({ "type": "array", "items": items })
    }

    fn call_shape(&self, node: Node) -> Option<Value> {
        let function = node.child_by_field_name("function")?;
        if function.kind() != "attribute" {
            return None;
        }
        let name = self.text(function.child_by_field_name("attribute")?)?;
        self.vocabulary.call_shape(name)
    }

    fn attribute_shape(&self, node: Node) -> Option<Value> {
        let name = self.text(node.child_by_field_name("attribute")?)?;
        self.vocabulary.attribute_shape(name)
    }

    /// Content of a plain string literal; `None` for f-strings and non-strings.
    fn string_literal(&self, node: Node) -> Option<String> {
        if node.kind() != "string" {
            return None;
        }
        let mut content = String::new();
        let mut cursor = node.walk();
        for part in node.named_children(&mut cursor) {
            match part.kind() {
                "string_content" => content.push_str(self.text(part)?),
                "interpolation" => return None,
                _ => {}
            }
        }
        Some(content)
    }

    fn text(&self, node: Node) -> Option<&'a str> {
        node.utf8_text(self.source).ok()
    }
}

fn first_expression(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let first = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    first
}

fn literal_shape(node: Node) -> Option<Value> {
    let kind = match node.kind() {
        "integer" => Kind::Integer,
        "float" => Kind::Number,
        "string" | "concatenated_string" => Kind::String,
        "true" | "false" => Kind::Boolean,
        // A bare `return None` documents nothing better than a string
        "none" => Kind::String,
        _ => return None,
    };
    Some(kind.fragment())
}

fn merge_shapes(shapes: Vec<Value>) -> Option<Value> {
    let first = shapes.first()?;
    let kind = first.get("type");
    if !shapes.iter().all(|s| s.get("type") == kind) {
        return Some(Kind::String.fragment());
    }

    if kind.and_then(Value::as_str) == Some("object") {
        let mut properties = Map::new();
        for shape in &shapes {
            if let Some(props) = shape.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    properties.insert(name.clone(), prop.clone());
                }
            }
        }
        return Some(json!({ "type": "object", "properties": properties }));
    }

    Some(first.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(source: &str) -> Result<Value, InferenceMiss> {
        analyze_source(source, &Vocabulary::default())
    }

    // === Pattern Tests ===

    #[test]
    fn counting_call_is_integer() {
        let source = "def get_total(self, obj):\n    return obj.count()\n";
        assert_eq!(analyze(source), Ok(json!({ "type": "integer" })));
    }

    #[test]
    fn exists_call_is_boolean() {
        let source = "def get_has_orders(self, obj):\n    return obj.orders.exists()\n";
        assert_eq!(analyze(source), Ok(json!({ "type": "boolean" })));
    }

    #[test]
    fn filter_call_is_array_of_objects() {
        let source = "def get_active(self, obj):\n    return obj.members.filter(active=True)\n";
        assert_eq!(
            analyze(source),
            Ok(json!({ "type": "array", "items": { "type": "object" } }))
        );
    }

    #[test]
    fn first_call_is_object() {
        let source = "def get_latest(self, obj):\n    return obj.orders.first()\n";
        assert_eq!(analyze(source), Ok(json!({ "type": "object" })));
    }

    #[test]
    fn attribute_conventions() {
        let cases = [
            ("obj.pk", "integer"),
            ("obj.owner.title", "string"),
            ("obj.is_archived", "boolean"),
            ("obj.enabled", "boolean"),
        ];
        for (expr, expected) in cases {
            let source = format!("def get_x(self, obj):\n    return {}\n", expr);
            assert_eq!(
                analyze(&source),
                Ok(json!({ "type": expected })),
                "expression: {}",
                expr
            );
        }
    }

    #[test]
    fn scalar_literals() {
        let cases = [
            ("42", "integer"),
            ("-3", "integer"),
            ("1.5", "number"),
            ("'text'", "string"),
            ("True", "boolean"),
            ("None", "string"),
        ];
        for (expr, expected) in cases {
            let source = format!("def get_x(self, obj):\n    return {}\n", expr);
            assert_eq!(
                analyze(&source),
                Ok(json!({ "type": expected })),
                "literal: {}",
                expr
            );
        }
    }

    #[test]
    fn mapping_literal_classifies_values() {
        let source = r#"
def get_summary(self, obj):
    return {
        "id": obj.id,
        "label": obj.name,
        "total": obj.items.count(),
        "ratio": 0.5,
        "flags": {"hidden": False},
        "other": obj.unknown_thing,
        "computed": compute(obj),
    }
"#;
        assert_eq!(
            analyze(source),
            Ok(json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer" },
                    "label": { "type": "string" },
                    "total": { "type": "integer" },
                    "ratio": { "type": "number" },
                    "flags": {
                        "type": "object",
                        "properties": { "hidden": { "type": "boolean" } }
                    }
                }
            }))
        );
    }

    #[test]
    fn sequence_literal_uses_first_element() {
        let source = "def get_ids(self, obj):\n    return [obj.id, 'x']\n";
        assert_eq!(
            analyze(source),
            Ok(json!({ "type": "array", "items": { "type": "integer" } }))
        );

        let source = "def get_ids(self, obj):\n    return []\n";
        assert_eq!(
            analyze(source),
            Ok(json!({ "type": "array", "items": { "type": "string" } }))
        );
    }

    // === Merge Tests ===

    #[test]
    fn object_returns_merge_properties() {
        let source = r#"
def get_status(self, obj):
    if obj.is_active:
        return {"state": "active", "since": obj.id}
    return {"state": "inactive", "reason": "closed"}
"#;
        assert_eq!(
            analyze(source),
            Ok(json!({
                "type": "object",
                "properties": {
                    "state": { "type": "string" },
                    "since": { "type": "integer" },
                    "reason": { "type": "string" }
                }
            }))
        );
    }

    #[test]
    fn disagreeing_returns_fall_back_to_string() {
        let source = r#"
def get_value(self, obj):
    if obj.pk:
        return obj.count()
    return [1, 2]
"#;
        assert_eq!(analyze(source), Ok(json!({ "type": "string" })));
    }

    #[test]
    fn unrecognized_returns_are_ignored() {
        let source = r#"
def get_value(self, obj):
    if obj.flag:
        return helper(obj)
    return 3
"#;
        assert_eq!(analyze(source), Ok(json!({ "type": "integer" })));
    }

    // === Miss Tests ===

    #[test]
    fn no_returns_is_a_miss() {
        let source = "def get_value(self, obj):\n    pass\n";
        assert_eq!(analyze(source), Err(InferenceMiss::NoReturns));
    }

    #[test]
    fn syntax_error_is_a_miss() {
        let source = "def get_value(self, obj)\n    return {\n";
        assert!(matches!(
            analyze(source),
            Err(InferenceMiss::ParseFailed { .. })
        ));
    }

    #[test]
    fn empty_source_is_a_miss() {
        assert_eq!(analyze("   \n"), Err(InferenceMiss::NoSource));
    }

    #[test]
    fn indented_method_source_parses() {
        let source = "    def get_total(self, obj):\n        return obj.count()\n";
        assert_eq!(analyze(source), Ok(json!({ "type": "integer" })));
    }

    #[test]
    fn custom_vocabulary() {
        let vocabulary = Vocabulary {
            integer_calls: vec!["size".into()],
            ..Vocabulary::default()
        };
        let source = "def get_total(self, obj):\n    return obj.tags.size()\n";
        assert_eq!(
            analyze_source(source, &vocabulary),
            Ok(json!({ "type": "integer" }))
        );
    }

    // === Annotation Tests ===

    #[test]
    fn declared_return_type_reads_annotation() {
        let source = "def get_total(self, obj) -> int:\n    return compute(obj)\n";
        assert_eq!(declared_return_type(source), Some("int".to_string()));
    }

    #[test]
    fn declared_return_type_missing() {
        let source = "def get_total(self, obj):\n    return 1\n";
        assert_eq!(declared_return_type(source), None);
    }

    #[test]
    fn dedent_strips_common_indent() {
        assert_eq!(dedent("    a\n\n      b"), "a\n\n  b");
    }
}
