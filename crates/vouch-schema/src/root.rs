//! The root object: owns the compiled tree and everything pluggable.

use ahash::AHashMap;

use vouch_value::{Path, Value};

use crate::compile;
use crate::error::{CompileError, ValidationError};
use crate::resolve;
use crate::schema::SchemaDocument;
use crate::sink::ErrorSink;
use crate::validate::{self, EvalContext};

/// Checks one format name against a string instance. Receives the format
/// name so one closure can back several registrations.
pub type FormatChecker = Box<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;

/// Produces the schema document behind a URI. The transport is the
/// caller's business; the resolver only caches the result.
pub type SchemaLoader = Box<dyn Fn(&str) -> std::io::Result<Value> + Send + Sync>;

/// Registry of format checkers, read-only during validation.
#[derive(Default)]
pub struct FormatRegistry {
    checkers: AHashMap<String, FormatChecker>,
}

impl FormatRegistry {
    pub fn register(&mut self, name: impl Into<String>, checker: FormatChecker) {
        self.checkers.insert(name.into(), checker);
    }

    pub fn get(&self, name: &str) -> Option<&FormatChecker> {
        self.checkers.get(name)
    }
}

/// Owns the compiled schema tree, the external-document cache, the format
/// registry and the loader.
///
/// The tree is immutable once [`set_root_schema`](Self::set_root_schema)
/// returns; [`validate`](Self::validate) takes `&self`, so concurrent
/// validations against distinct sinks need no locking.
#[derive(Default)]
pub struct SchemaRoot {
    document: SchemaDocument,
    schema_value: Option<Value>,
    cache: AHashMap<String, Value>,
    formats: Option<FormatRegistry>,
    loader: Option<SchemaLoader>,
}

impl SchemaRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and link a schema document. Calling again replaces the
    /// previous tree; on error the previous tree stays in place.
    pub fn set_root_schema(&mut self, schema: Value) -> Result<(), CompileError> {
        let mut document = SchemaDocument::new();
        let root = compile::compile_at(&mut document, &schema, "", "")?;
        document.root = root;
        resolve::link_references(
            &mut document,
            &schema,
            &mut self.cache,
            self.loader.as_ref(),
        )?;
        log::debug!("root schema compiled into {} nodes", document.len());

        self.document = document;
        self.schema_value = Some(schema);
        Ok(())
    }

    /// Register a format checker. The first registration creates the
    /// registry, which switches `format` from annotation to constraint.
    pub fn set_format_checker(&mut self, name: impl Into<String>, checker: FormatChecker) {
        self.formats
            .get_or_insert_with(FormatRegistry::default)
            .register(name, checker);
    }

    pub fn set_loader(&mut self, loader: SchemaLoader) {
        self.loader = Some(loader);
    }

    /// Evaluate an instance, accumulating every violation into `sink`.
    pub fn validate(&self, instance: &Value, sink: &mut ErrorSink) {
        if self.schema_value.is_none() {
            sink.record(&Path::root(), instance, ValidationError::NoRootSchema);
            return;
        }
        let ctx = EvalContext::new(&self.document, self.formats.as_ref());
        validate::eval_node(&ctx, self.document.root(), instance, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_value::from_json;

    #[test]
    fn validate_without_schema_reports_once() {
        let root = SchemaRoot::new();
        let mut sink = ErrorSink::new();
        root.validate(&Value::Null, &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.iter().next().unwrap().message, "no root schema set");
    }

    #[test]
    fn set_root_schema_replaces_the_tree() {
        let mut root = SchemaRoot::new();
        root.set_root_schema(from_json(&serde_json::json!({"type": "string"})))
            .unwrap();
        root.set_root_schema(from_json(&serde_json::json!({"type": "integer"})))
            .unwrap();

        let mut sink = ErrorSink::new();
        root.validate(&Value::I64(3), &mut sink);
        assert!(!sink.has_error());
    }

    #[test]
    fn compile_error_keeps_previous_schema() {
        let mut root = SchemaRoot::new();
        root.set_root_schema(from_json(&serde_json::json!({"type": "integer"})))
            .unwrap();
        let err = root.set_root_schema(from_json(&serde_json::json!({"pattern": "("})));
        assert!(err.is_err());

        let mut sink = ErrorSink::new();
        root.validate(&Value::I64(3), &mut sink);
        assert!(!sink.has_error());
    }

    #[test]
    fn format_checker_registration_enables_format() {
        let mut root = SchemaRoot::new();
        root.set_format_checker(
            "even-length",
            Box::new(|_, value| {
                let text = value.as_str().unwrap_or_default();
                if text.chars().count() % 2 == 0 {
                    Ok(())
                } else {
                    Err("odd length".to_string())
                }
            }),
        );
        root.set_root_schema(from_json(&serde_json::json!({"format": "even-length"})))
            .unwrap();

        let mut sink = ErrorSink::new();
        root.validate(&Value::String("ab".into()), &mut sink);
        assert!(!sink.has_error());

        let mut sink = ErrorSink::new();
        root.validate(&Value::String("abc".into()), &mut sink);
        assert!(sink.has_error());
    }
}
