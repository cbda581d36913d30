//! Schema compilation.
//!
//! A recursive factory from schema values to arena nodes. `$ref` keywords
//! become stubs recorded on the document for the link phase; every other
//! fragment compiles depth-first into a [`DispatchNode`] whose per-kind
//! slots are built from the whole fragment, so each keyword is consumed
//! only when the matching instance kind is selected.
//!
//! Every compiled fragment registers its `{base}#{pointer}` location on the
//! document, which is what lets later `$ref`s land on already-built nodes.

use vouch_value::{Map, Value};

use crate::error::CompileError;
use crate::schema::{
    ArraySchema, Bound, Conditional, Dependency, DispatchNode, Items, Leaf, NumberSchema,
    ObjectSchema, Pattern, SchemaDocument, SchemaNode, SchemaNodeId, StringSchema, TypeSlot,
    TypeTable,
};

pub(crate) fn location_key(base: &str, pointer: &str) -> String {
    format!("{base}#{pointer}")
}

fn child_pointer(pointer: &str, token: &str) -> String {
    format!(
        "{pointer}/{}",
        token.replace('~', "~0").replace('/', "~1")
    )
}

/// Compile the fragment found at `{base}#{pointer}`.
pub(crate) fn compile_at(
    doc: &mut SchemaDocument,
    fragment: &Value,
    base: &str,
    pointer: &str,
) -> Result<SchemaNodeId, CompileError> {
    let key = location_key(base, pointer);
    if let Some(&id) = doc.compiled_at.get(&key) {
        return Ok(id);
    }

    let id = match fragment {
        Value::Bool(true) => doc.create_node(SchemaNode::Everything),
        Value::Bool(false) => doc.create_node(SchemaNode::Nothing),
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref") {
                let uri = reference
                    .as_str()
                    .ok_or_else(|| keyword_type("$ref", "a string", reference))?;
                // Draft-07: keywords alongside $ref are ignored
                let id = doc.create_node(SchemaNode::Ref {
                    uri: uri.to_string(),
                    target: None,
                });
                doc.pending_refs.push((id, uri.to_string()));
                id
            } else {
                let node = compile_dispatch(doc, obj, base, pointer)?;
                doc.create_node(node)
            }
        }
        other => {
            return Err(CompileError::NotASchema {
                actual: other.kind().name().to_string(),
            })
        }
    };

    log::trace!("compiled '{key}' into node {}", id.0);
    doc.compiled_at.insert(key, id);

    if let Value::Object(obj) = fragment {
        compile_definitions(doc, obj, base, pointer)?;
    }

    Ok(id)
}

/// Compile `definitions` / `$defs` so their entries can be referenced.
/// They do not constrain the parent.
fn compile_definitions(
    doc: &mut SchemaDocument,
    obj: &Map,
    base: &str,
    pointer: &str,
) -> Result<(), CompileError> {
    for keyword in ["definitions", "$defs"] {
        let Some(defs) = obj.get(keyword) else {
            continue;
        };
        let defs = defs
            .as_object()
            .ok_or_else(|| keyword_type(keyword, "an object", defs))?;
        let section = child_pointer(pointer, keyword);
        for (name, sub) in defs {
            compile_at(doc, sub, base, &child_pointer(&section, name))?;
        }
    }
    Ok(())
}

// =============================================================================
// Dispatch node assembly
// =============================================================================

/// Which kinds the `type` keyword selects.
#[derive(Clone, Copy, Default)]
struct TypeSet {
    null: bool,
    boolean: bool,
    integer: bool,
    number: bool,
    string: bool,
    array: bool,
    object: bool,
}

impl TypeSet {
    fn all() -> Self {
        Self {
            null: true,
            boolean: true,
            integer: false,
            number: true,
            string: true,
            array: true,
            object: true,
        }
    }

    fn add(&mut self, name: &str) -> Result<(), CompileError> {
        match name {
            "null" => self.null = true,
            "boolean" => self.boolean = true,
            "integer" => self.integer = true,
            "number" => self.number = true,
            "string" => self.string = true,
            "array" => self.array = true,
            "object" => self.object = true,
            other => {
                return Err(CompileError::UnknownTypeName {
                    name: other.to_string(),
                })
            }
        }
        Ok(())
    }
}

fn read_type(obj: &Map) -> Result<Option<TypeSet>, CompileError> {
    let Some(value) = obj.get("type") else {
        return Ok(None);
    };
    let mut set = TypeSet::default();
    match value {
        Value::String(name) => set.add(name)?,
        Value::Array(names) => {
            for entry in names {
                let name = entry
                    .as_str()
                    .ok_or_else(|| keyword_type("type", "a string or array of strings", entry))?;
                set.add(name)?;
            }
        }
        other => return Err(keyword_type("type", "a string or array of strings", other)),
    }
    Ok(Some(set))
}

fn compile_dispatch(
    doc: &mut SchemaDocument,
    obj: &Map,
    base: &str,
    pointer: &str,
) -> Result<SchemaNode, CompileError> {
    let typed = read_type(obj)?;
    let select = typed.unwrap_or_else(TypeSet::all);
    let mut node = DispatchNode::new(if typed.is_some() {
        TypeTable::deny_all()
    } else {
        TypeTable::allow_all()
    });

    // Stage 1: per-kind leaves, each built from the whole fragment.
    if select.null {
        node.table.null = TypeSlot::Allow;
    }
    if select.boolean {
        node.table.boolean = TypeSlot::Allow;
    }

    if select.string {
        let schema = string_schema(obj)?;
        node.table.string = if schema.is_trivial() {
            TypeSlot::Allow
        } else {
            node.leaves.push(Leaf::String(schema));
            TypeSlot::Check(node.leaves.len() - 1)
        };
    }

    let numbers = number_schema(obj)?;
    if select.number {
        // "integer" alongside "number" adds nothing
        let slot = if numbers.is_trivial() {
            TypeSlot::Allow
        } else {
            node.leaves.push(Leaf::Number(numbers));
            TypeSlot::Check(node.leaves.len() - 1)
        };
        node.table.integer = slot;
        node.table.unsigned = slot;
        node.table.float = slot;
    } else if select.integer {
        // The float slot always needs the leaf: it carries the integral
        // check that admits 3.0 and rejects 3.5.
        node.leaves.push(Leaf::Integer(numbers));
        let leaf = node.leaves.len() - 1;
        let slot = if numbers.is_trivial() {
            TypeSlot::Allow
        } else {
            TypeSlot::Check(leaf)
        };
        node.table.integer = slot;
        node.table.unsigned = slot;
        node.table.float = TypeSlot::Check(leaf);
    }

    if select.array {
        let schema = array_schema(doc, obj, base, pointer)?;
        node.table.array = if schema.is_trivial() {
            TypeSlot::Allow
        } else {
            node.leaves.push(Leaf::Array(schema));
            TypeSlot::Check(node.leaves.len() - 1)
        };
    }

    if select.object {
        let schema = object_schema(doc, obj, base, pointer)?;
        node.table.object = if schema.is_trivial() {
            TypeSlot::Allow
        } else {
            node.leaves.push(Leaf::Object(schema));
            TypeSlot::Check(node.leaves.len() - 1)
        };
    }

    // Stages 2 and 3: enum / const.
    if let Some(values) = obj.get("enum") {
        let values = match values {
            Value::Array(items) => items.clone(),
            other => return Err(keyword_type("enum", "an array", other)),
        };
        node.enumeration = Some(values);
    }
    if let Some(constant) = obj.get("const") {
        node.constant = Some(constant.clone());
    }

    // Stage 4: combinators.
    if let Some(sub) = obj.get("not") {
        node.not = Some(compile_at(doc, sub, base, &child_pointer(pointer, "not"))?);
    }
    node.all_of = schema_list(doc, obj, "allOf", base, pointer)?;
    node.any_of = schema_list(doc, obj, "anyOf", base, pointer)?;
    node.one_of = schema_list(doc, obj, "oneOf", base, pointer)?;

    // Stage 5: if/then/else. then and else without if are inert (Draft-07).
    if let Some(condition) = obj.get("if") {
        let when = compile_at(doc, condition, base, &child_pointer(pointer, "if"))?;
        let then = obj
            .get("then")
            .map(|sub| compile_at(doc, sub, base, &child_pointer(pointer, "then")))
            .transpose()?;
        let otherwise = obj
            .get("else")
            .map(|sub| compile_at(doc, sub, base, &child_pointer(pointer, "else")))
            .transpose()?;
        node.conditional = Some(Conditional {
            when,
            then,
            otherwise,
        });
    }

    if node.is_trivial() {
        Ok(SchemaNode::Everything)
    } else {
        Ok(SchemaNode::Dispatch(Box::new(node)))
    }
}

fn schema_list(
    doc: &mut SchemaDocument,
    obj: &Map,
    keyword: &'static str,
    base: &str,
    pointer: &str,
) -> Result<Vec<SchemaNodeId>, CompileError> {
    let Some(value) = obj.get(keyword) else {
        return Ok(Vec::new());
    };
    let items = match value {
        Value::Array(items) => items,
        other => return Err(keyword_type(keyword, "an array of schemas", other)),
    };
    if items.is_empty() {
        return Err(CompileError::EmptyCombinator { keyword });
    }
    let section = child_pointer(pointer, keyword);
    items
        .iter()
        .enumerate()
        .map(|(i, sub)| compile_at(doc, sub, base, &format!("{section}/{i}")))
        .collect()
}

// =============================================================================
// Leaf builders
// =============================================================================

fn string_schema(obj: &Map) -> Result<StringSchema, CompileError> {
    let pattern = match obj.get("pattern") {
        None => None,
        Some(value) => {
            let source = value
                .as_str()
                .ok_or_else(|| keyword_type("pattern", "a string", value))?;
            Some(Pattern::new(source).map_err(|source_err| CompileError::InvalidPattern {
                pattern: source.to_string(),
                source: source_err,
            })?)
        }
    };
    let format = match obj.get("format") {
        None => None,
        Some(value) => Some(
            value
                .as_str()
                .ok_or_else(|| keyword_type("format", "a string", value))?
                .to_string(),
        ),
    };
    Ok(StringSchema {
        min_length: keyword_count(obj, "minLength")?,
        max_length: keyword_count(obj, "maxLength")?,
        pattern,
        format,
    })
}

fn number_schema(obj: &Map) -> Result<NumberSchema, CompileError> {
    let minimum = keyword_number(obj, "minimum")?;
    let maximum = keyword_number(obj, "maximum")?;
    let exclusive_minimum = keyword_number(obj, "exclusiveMinimum")?;
    let exclusive_maximum = keyword_number(obj, "exclusiveMaximum")?;

    let multiple_of = keyword_number(obj, "multipleOf")?;
    if let Some(m) = multiple_of {
        if m <= 0.0 {
            return Err(CompileError::NonPositiveMultipleOf { value: m });
        }
    }

    Ok(NumberSchema {
        min: merge_lower(minimum, exclusive_minimum),
        max: merge_upper(maximum, exclusive_maximum),
        multiple_of,
    })
}

// Both the inclusive and the exclusive keyword may be present; the compiled
// bound keeps whichever excludes more, exclusive winning ties.
fn merge_lower(inclusive: Option<f64>, exclusive: Option<f64>) -> Bound {
    match (inclusive, exclusive) {
        (None, None) => Bound::Unbounded,
        (Some(m), None) => Bound::Inclusive(m),
        (None, Some(e)) => Bound::Exclusive(e),
        (Some(m), Some(e)) => {
            if e >= m {
                Bound::Exclusive(e)
            } else {
                Bound::Inclusive(m)
            }
        }
    }
}

fn merge_upper(inclusive: Option<f64>, exclusive: Option<f64>) -> Bound {
    match (inclusive, exclusive) {
        (None, None) => Bound::Unbounded,
        (Some(m), None) => Bound::Inclusive(m),
        (None, Some(e)) => Bound::Exclusive(e),
        (Some(m), Some(e)) => {
            if e <= m {
                Bound::Exclusive(e)
            } else {
                Bound::Inclusive(m)
            }
        }
    }
}

fn array_schema(
    doc: &mut SchemaDocument,
    obj: &Map,
    base: &str,
    pointer: &str,
) -> Result<ArraySchema, CompileError> {
    let items = match obj.get("items") {
        None => Items::Unconstrained,
        Some(Value::Array(list)) => {
            let section = child_pointer(pointer, "items");
            let ids = list
                .iter()
                .enumerate()
                .map(|(i, sub)| compile_at(doc, sub, base, &format!("{section}/{i}")))
                .collect::<Result<Vec<_>, _>>()?;
            Items::PerPosition(ids)
        }
        Some(sub) => Items::Uniform(compile_at(doc, sub, base, &child_pointer(pointer, "items"))?),
    };

    let additional_items = obj
        .get("additionalItems")
        .map(|sub| compile_at(doc, sub, base, &child_pointer(pointer, "additionalItems")))
        .transpose()?;

    let contains = obj
        .get("contains")
        .map(|sub| compile_at(doc, sub, base, &child_pointer(pointer, "contains")))
        .transpose()?;

    let unique = match obj.get("uniqueItems") {
        None => false,
        Some(value) => value
            .as_bool()
            .ok_or_else(|| keyword_type("uniqueItems", "a boolean", value))?,
    };

    Ok(ArraySchema {
        items,
        additional_items,
        min_items: keyword_count(obj, "minItems")?,
        max_items: keyword_count(obj, "maxItems")?,
        unique,
        contains,
    })
}

fn object_schema(
    doc: &mut SchemaDocument,
    obj: &Map,
    base: &str,
    pointer: &str,
) -> Result<ObjectSchema, CompileError> {
    let mut schema = ObjectSchema {
        min_properties: keyword_count(obj, "minProperties")?,
        max_properties: keyword_count(obj, "maxProperties")?,
        ..ObjectSchema::default()
    };

    if let Some(value) = obj.get("properties") {
        let properties = value
            .as_object()
            .ok_or_else(|| keyword_type("properties", "an object", value))?;
        let section = child_pointer(pointer, "properties");
        for (name, sub) in properties {
            let id = compile_at(doc, sub, base, &child_pointer(&section, name))?;
            schema.properties.insert(name.clone(), id);
        }
    }

    if let Some(value) = obj.get("patternProperties") {
        let patterns = value
            .as_object()
            .ok_or_else(|| keyword_type("patternProperties", "an object", value))?;
        let section = child_pointer(pointer, "patternProperties");
        for (source, sub) in patterns {
            let pattern = Pattern::new(source).map_err(|source_err| CompileError::InvalidPattern {
                pattern: source.clone(),
                source: source_err,
            })?;
            let id = compile_at(doc, sub, base, &child_pointer(&section, source))?;
            schema.pattern_properties.push((pattern, id));
        }
    }

    schema.additional = obj
        .get("additionalProperties")
        .map(|sub| compile_at(doc, sub, base, &child_pointer(pointer, "additionalProperties")))
        .transpose()?;

    schema.property_names = obj
        .get("propertyNames")
        .map(|sub| compile_at(doc, sub, base, &child_pointer(pointer, "propertyNames")))
        .transpose()?;

    if let Some(value) = obj.get("required") {
        let names = match value {
            Value::Array(items) => items,
            other => return Err(keyword_type("required", "an array of strings", other)),
        };
        for entry in names {
            let name = entry
                .as_str()
                .ok_or_else(|| keyword_type("required", "an array of strings", entry))?;
            schema.required.push(name.to_string());
        }
    }

    if let Some(value) = obj.get("dependencies") {
        let entries = value
            .as_object()
            .ok_or_else(|| keyword_type("dependencies", "an object", value))?;
        let section = child_pointer(pointer, "dependencies");
        for (key, dep) in entries {
            let dependency = match dep {
                Value::Array(items) => {
                    let mut needed = Vec::with_capacity(items.len());
                    for entry in items {
                        let name = entry.as_str().ok_or_else(|| {
                            keyword_type("dependencies", "an array of strings or a schema", entry)
                        })?;
                        needed.push(name.to_string());
                    }
                    Dependency::Keys(needed)
                }
                Value::Bool(_) | Value::Object(_) => {
                    Dependency::Schema(compile_at(doc, dep, base, &child_pointer(&section, key))?)
                }
                other => {
                    return Err(keyword_type(
                        "dependencies",
                        "an array of strings or a schema",
                        other,
                    ))
                }
            };
            schema.dependencies.insert(key.clone(), dependency);
        }
    }

    Ok(schema)
}

// =============================================================================
// Keyword readers
// =============================================================================

fn keyword_type(keyword: &'static str, expected: &'static str, got: &Value) -> CompileError {
    CompileError::KeywordType {
        keyword,
        expected,
        actual: got.kind().name().to_string(),
    }
}

/// A non-negative integer keyword (`minLength`, `maxItems`, ...). Integral
/// floats such as `2.0` qualify, per the Draft-07 definition of integer.
fn keyword_count(obj: &Map, keyword: &'static str) -> Result<Option<u64>, CompileError> {
    let Some(value) = obj.get(keyword) else {
        return Ok(None);
    };
    let count = match value {
        Value::I64(i) if *i >= 0 => *i as u64,
        Value::U64(u) => *u,
        Value::F64(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64 => *f as u64,
        _ => return Err(keyword_type(keyword, "a non-negative integer", value)),
    };
    Ok(Some(count))
}

/// A numeric keyword. Booleans are rejected here, which is what rules out
/// the Draft-04 flavor of `exclusiveMinimum` / `exclusiveMaximum`.
fn keyword_number(obj: &Map, keyword: &'static str) -> Result<Option<f64>, CompileError> {
    let Some(value) = obj.get(keyword) else {
        return Ok(None);
    };
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| keyword_type(keyword, "a number", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_value::from_json;

    fn compile_root(schema: serde_json::Value) -> Result<SchemaDocument, CompileError> {
        let value = from_json(&schema);
        let mut doc = SchemaDocument::new();
        let root = compile_at(&mut doc, &value, "", "")?;
        doc.root = root;
        Ok(doc)
    }

    #[test]
    fn boolean_schemas() {
        let doc = compile_root(serde_json::json!(true)).unwrap();
        assert!(matches!(doc.node(doc.root()), SchemaNode::Everything));

        let doc = compile_root(serde_json::json!(false)).unwrap();
        assert!(matches!(doc.node(doc.root()), SchemaNode::Nothing));
    }

    #[test]
    fn empty_object_collapses_to_everything() {
        let doc = compile_root(serde_json::json!({})).unwrap();
        assert!(matches!(doc.node(doc.root()), SchemaNode::Everything));
    }

    #[test]
    fn typed_string_schema() {
        let doc = compile_root(serde_json::json!({"type": "string", "minLength": 2})).unwrap();
        let SchemaNode::Dispatch(node) = doc.node(doc.root()) else {
            panic!("expected dispatch node");
        };
        assert!(matches!(node.table.string, TypeSlot::Check(_)));
        assert_eq!(node.table.array, TypeSlot::Deny);
        assert_eq!(node.table.null, TypeSlot::Deny);
    }

    #[test]
    fn integer_type_populates_float_slot() {
        let doc = compile_root(serde_json::json!({"type": "integer"})).unwrap();
        let SchemaNode::Dispatch(node) = doc.node(doc.root()) else {
            panic!("expected dispatch node");
        };
        assert_eq!(node.table.integer, TypeSlot::Allow);
        assert_eq!(node.table.unsigned, TypeSlot::Allow);
        assert!(matches!(node.table.float, TypeSlot::Check(_)));
        assert!(matches!(node.leaves[0], Leaf::Integer(_)));
    }

    #[test]
    fn number_slots_share_one_leaf() {
        let doc = compile_root(serde_json::json!({"type": "number", "minimum": 0})).unwrap();
        let SchemaNode::Dispatch(node) = doc.node(doc.root()) else {
            panic!("expected dispatch node");
        };
        assert_eq!(node.table.integer, node.table.float);
        assert_eq!(node.table.unsigned, node.table.float);
        assert_eq!(node.leaves.len(), 1);
    }

    #[test]
    fn draft04_exclusive_bounds_are_rejected() {
        let err = compile_root(serde_json::json!({"exclusiveMaximum": true})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::KeywordType {
                keyword: "exclusiveMaximum",
                ..
            }
        ));
    }

    #[test]
    fn merged_bounds_keep_the_stricter_side() {
        assert_eq!(merge_lower(Some(5.0), Some(3.0)), Bound::Inclusive(5.0));
        assert_eq!(merge_lower(Some(3.0), Some(5.0)), Bound::Exclusive(5.0));
        assert_eq!(merge_lower(Some(5.0), Some(5.0)), Bound::Exclusive(5.0));
        assert_eq!(merge_upper(Some(3.0), Some(5.0)), Bound::Inclusive(3.0));
        assert_eq!(merge_upper(Some(5.0), Some(3.0)), Bound::Exclusive(3.0));
    }

    #[test]
    fn invalid_pattern_is_a_compile_error() {
        let err = compile_root(serde_json::json!({"pattern": "("})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPattern { .. }));
    }

    #[test]
    fn non_positive_multiple_of_is_rejected() {
        let err = compile_root(serde_json::json!({"multipleOf": 0})).unwrap_err();
        assert!(matches!(err, CompileError::NonPositiveMultipleOf { .. }));
    }

    #[test]
    fn empty_combinator_is_rejected() {
        let err = compile_root(serde_json::json!({"allOf": []})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::EmptyCombinator { keyword: "allOf" }
        ));
    }

    #[test]
    fn definitions_are_compiled_and_registered() {
        let doc = compile_root(serde_json::json!({
            "type": "object",
            "definitions": {"name": {"type": "string"}},
            "$defs": {"age": {"type": "integer"}}
        }))
        .unwrap();
        assert!(doc.compiled_at.contains_key("#/definitions/name"));
        assert!(doc.compiled_at.contains_key("#/$defs/age"));
    }

    #[test]
    fn ref_becomes_a_pending_stub() {
        let doc = compile_root(serde_json::json!({
            "properties": {"next": {"$ref": "#/definitions/node"}},
            "definitions": {"node": {"type": "null"}}
        }))
        .unwrap();
        assert_eq!(doc.pending_refs.len(), 1);
        assert_eq!(doc.pending_refs[0].1, "#/definitions/node");
    }

    #[test]
    fn unknown_keywords_are_ignored() {
        let doc = compile_root(serde_json::json!({"x-vendor": 1, "title": "t"})).unwrap();
        assert!(matches!(doc.node(doc.root()), SchemaNode::Everything));
    }

    #[test]
    fn unknown_type_name_is_rejected() {
        let err = compile_root(serde_json::json!({"type": "decimal"})).unwrap_err();
        assert!(matches!(err, CompileError::UnknownTypeName { .. }));
    }
}
