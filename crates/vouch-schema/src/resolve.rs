//! Reference linking.
//!
//! Compilation leaves `$ref`s as stubs paired with their URIs. This phase
//! resolves each one: split the URI into a document base and a JSON-Pointer
//! fragment, find the document (root schema, cache, or loader), walk the
//! pointer, compile the fragment if it has not been compiled yet, and point
//! the stub at the result.
//!
//! Resolution runs as a worklist because compiling a fragment can surface
//! further stubs. The document's location index makes the whole thing
//! idempotent and turns cyclic references into plain back-pointers.

use ahash::AHashMap;

use vouch_value::{decode_pointer, Value};

use crate::compile::{compile_at, location_key};
use crate::error::CompileError;
use crate::root::SchemaLoader;
use crate::schema::{SchemaDocument, SchemaNode, SchemaNodeId};

pub(crate) fn link_references(
    doc: &mut SchemaDocument,
    root_value: &Value,
    cache: &mut AHashMap<String, Value>,
    loader: Option<&SchemaLoader>,
) -> Result<(), CompileError> {
    while let Some((stub, uri)) = doc.pending_refs.pop() {
        let (base, fragment) = split_uri(&uri);
        log::debug!("resolving reference '{uri}'");

        let key = location_key(base, fragment);
        if let Some(&target) = doc.compiled_at.get(&key) {
            point_stub(doc, stub, target);
            continue;
        }

        // Find the document the reference lands in.
        if !base.is_empty() && !cache.contains_key(base) {
            let Some(loader) = loader else {
                return Err(CompileError::UnresolvedReference { uri: uri.clone() });
            };
            let document = loader(base).map_err(|source| CompileError::Load {
                uri: base.to_string(),
                source,
            })?;
            cache.insert(base.to_string(), document);
        }
        let found = if base.is_empty() {
            Some(root_value)
        } else {
            cache.get(base)
        };
        let Some(document) = found else {
            return Err(CompileError::UnresolvedReference { uri: uri.clone() });
        };

        // Walk the fragment pointer to the referenced subschema.
        let tokens = decode_pointer(fragment).map_err(|_| CompileError::BadPointer {
            pointer: fragment.to_string(),
        })?;
        let target_value = document
            .locate(&tokens)
            .ok_or_else(|| CompileError::UnresolvedReference { uri: uri.clone() })?
            .clone();

        let target = compile_at(doc, &target_value, base, fragment)?;
        point_stub(doc, stub, target);
    }
    Ok(())
}

fn split_uri(uri: &str) -> (&str, &str) {
    match uri.split_once('#') {
        Some((base, fragment)) => (base, fragment),
        None => (uri, ""),
    }
}

fn point_stub(doc: &mut SchemaDocument, stub: SchemaNodeId, target: SchemaNodeId) {
    if let SchemaNode::Ref { target: slot, .. } = doc.node_mut(stub) {
        *slot = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_value::from_json;

    fn compile_and_link(schema: serde_json::Value) -> Result<SchemaDocument, CompileError> {
        let value = from_json(&schema);
        let mut doc = SchemaDocument::new();
        let root = compile_at(&mut doc, &value, "", "")?;
        doc.root = root;
        let mut cache = AHashMap::new();
        link_references(&mut doc, &value, &mut cache, None)?;
        Ok(doc)
    }

    #[test]
    fn local_reference_links_to_definition() {
        let doc = compile_and_link(serde_json::json!({
            "properties": {"name": {"$ref": "#/definitions/name"}},
            "definitions": {"name": {"type": "string"}}
        }))
        .unwrap();
        assert!(doc.pending_refs.is_empty());

        let def = doc.compiled_at["#/definitions/name"];
        let stub = doc.compiled_at["#/properties/name"];
        match doc.node(stub) {
            SchemaNode::Ref { target, .. } => assert_eq!(*target, Some(def)),
            other => panic!("expected ref stub, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_reference_becomes_back_pointer() {
        let doc = compile_and_link(serde_json::json!({
            "$defs": {
                "node": {
                    "properties": {"next": {"$ref": "#/$defs/node"}}
                }
            },
            "$ref": "#/$defs/node"
        }))
        .unwrap();
        // both stubs point at the one compiled definition
        let def = doc.compiled_at["#/$defs/node"];
        for key in ["#", "#/$defs/node/properties/next"] {
            match doc.node(doc.compiled_at[key]) {
                SchemaNode::Ref { target, .. } => assert_eq!(*target, Some(def)),
                other => panic!("expected ref stub at {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn unresolvable_reference_is_a_compile_error() {
        let err = compile_and_link(serde_json::json!({"$ref": "#/definitions/missing"})).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedReference { .. }));
    }

    #[test]
    fn external_reference_without_loader_fails() {
        let err = compile_and_link(serde_json::json!({
            "$ref": "https://example.com/other.json#/definitions/x"
        }))
        .unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedReference { .. }));
    }

    #[test]
    fn external_reference_resolves_through_loader() {
        let schema = from_json(&serde_json::json!({
            "$ref": "https://example.com/other.json#/definitions/name"
        }));
        let mut doc = SchemaDocument::new();
        let root = compile_at(&mut doc, &schema, "", "").unwrap();
        doc.root = root;

        let loader: SchemaLoader = Box::new(|_uri| {
            Ok(from_json(&serde_json::json!({
                "definitions": {"name": {"type": "string"}}
            })))
        });
        let mut cache = AHashMap::new();
        link_references(&mut doc, &schema, &mut cache, Some(&loader)).unwrap();

        assert!(cache.contains_key("https://example.com/other.json"));
        assert!(doc
            .compiled_at
            .contains_key("https://example.com/other.json#/definitions/name"));
    }

    #[test]
    fn whole_document_self_reference() {
        let doc = compile_and_link(serde_json::json!({"$ref": "#"})).unwrap();
        match doc.node(doc.root()) {
            SchemaNode::Ref { target, .. } => assert_eq!(*target, Some(doc.root())),
            other => panic!("expected ref stub, got {other:?}"),
        }
    }
}
