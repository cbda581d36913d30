//! JSON Schema (Draft-07) compiler and evaluator.
//!
//! A schema document is compiled once into an immutable tree of typed
//! validator nodes owned by a [`SchemaRoot`]; instances are then evaluated
//! against that tree with every violation accumulated in an [`ErrorSink`].
//!
//! # Architecture
//!
//! - Compile: [`SchemaRoot::set_root_schema`] walks the schema value
//!   depth-first and builds one node per subschema in an arena. `$ref`
//!   keywords become stubs that a link phase resolves afterwards, so cyclic
//!   schemas come out as back-pointers into the same arena.
//! - Evaluate: [`SchemaRoot::validate`] dispatches per instance kind
//!   through the compiled table. Validation never aborts at the top level;
//!   combinators speculate against disposable local sinks and forward a
//!   summary.
//!
//! # Example
//!
//! ```
//! use vouch_schema::{ErrorSink, SchemaRoot};
//! use vouch_value::from_json;
//!
//! let mut root = SchemaRoot::new();
//! root.set_root_schema(from_json(&serde_json::json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string", "minLength": 1}},
//!     "required": ["name"]
//! })))
//! .unwrap();
//!
//! let mut sink = ErrorSink::new();
//! root.validate(&from_json(&serde_json::json!({"name": ""})), &mut sink);
//! assert!(sink.has_error());
//! ```

mod compile;
mod error;
mod resolve;
mod root;
mod schema;
mod sink;
mod validate;

pub use error::{CompileError, ValidationError};
pub use root::{FormatChecker, FormatRegistry, SchemaLoader, SchemaRoot};
pub use schema::{
    ArraySchema, Bound, Conditional, Dependency, DispatchNode, Items, Leaf, LeafIndex,
    NumberSchema, ObjectSchema, Pattern, SchemaDocument, SchemaNode, SchemaNodeId, StringSchema,
    TypeSlot, TypeTable,
};
pub use sink::{Diagnostic, ErrorSink};

pub use vouch_value::{from_json, to_json, Map, Path, Value, ValueKind};
