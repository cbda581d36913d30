//! Error types.
//!
//! Two categories:
//! - `CompileError`: problems with the schema itself, surfaced from
//!   `set_root_schema` and fatal to compilation.
//! - `ValidationError`: mismatches between instance and schema, accumulated
//!   in the sink while evaluation continues.

use thiserror::Error;

/// A schema that cannot be compiled.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A schema position held something other than a boolean or object.
    #[error("expected a schema (boolean or object), got {actual}")]
    NotASchema { actual: String },

    /// A keyword held a value of the wrong type.
    #[error("keyword '{keyword}' expects {expected}, got {actual}")]
    KeywordType {
        keyword: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// An entry of the `type` keyword is not a known type name.
    #[error("unknown type name '{name}'")]
    UnknownTypeName { name: String },

    /// `pattern` or `patternProperties` holds an invalid regex.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// `multipleOf` must be a positive number.
    #[error("multipleOf must be positive, got {value}")]
    NonPositiveMultipleOf { value: f64 },

    /// `allOf`, `anyOf` and `oneOf` require a non-empty array.
    #[error("'{keyword}' must hold at least one schema")]
    EmptyCombinator { keyword: &'static str },

    /// A `$ref` target could not be found in any known document.
    #[error("unresolvable reference '{uri}'")]
    UnresolvedReference { uri: String },

    /// A `$ref` fragment is not a valid pointer into its document.
    #[error("reference fragment '{pointer}' does not address a schema")]
    BadPointer { pointer: String },

    /// The schema loader failed to produce a document.
    #[error("failed to load schema document '{uri}': {source}")]
    Load {
        uri: String,
        source: std::io::Error,
    },
}

/// A violation found while evaluating an instance.
///
/// The `Display` rendering is the human-readable message of the diagnostic
/// wire shape; path and snippet are attached by the sink.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("the false schema permits nothing")]
    FalseSchema,

    #[error("value is not one of the enumerated values")]
    NotInEnum,

    #[error("value does not equal the required constant")]
    ConstMismatch,

    #[error("string length {length} is out of bounds ({})", bounds_text(.min, .max))]
    StringLengthOutOfBounds {
        length: usize,
        min: Option<u64>,
        max: Option<u64>,
    },

    #[error("string does not match pattern '{pattern}'")]
    PatternMismatch { pattern: String },

    #[error("unknown format '{name}'")]
    UnknownFormat { name: String },

    #[error("value is not a valid '{format}': {reason}")]
    FormatMismatch { format: String, reason: String },

    #[error("{value} is {} the bound {bound}", range_side(.below))]
    OutOfRange {
        value: f64,
        bound: f64,
        below: bool,
    },

    #[error("{value} is not a multiple of {divisor}")]
    NotMultipleOf { value: f64, divisor: f64 },

    #[error("array length {length} is out of bounds ({})", bounds_text(.min, .max))]
    ArrayLengthOutOfBounds {
        length: usize,
        min: Option<u64>,
        max: Option<u64>,
    },

    #[error("array elements at {first} and {second} are equal")]
    NotUnique { first: usize, second: usize },

    #[error("no array element matches the contains schema")]
    MissingContains,

    #[error("missing required properties: {}", .names.join(", "))]
    MissingRequiredProperties { names: Vec<String> },

    #[error("property count {count} is out of bounds ({})", bounds_text(.min, .max))]
    PropertyCountOutOfBounds {
        count: usize,
        min: Option<u64>,
        max: Option<u64>,
    },

    #[error("property '{name}' is not permitted")]
    UnexpectedProperty { name: String },

    #[error("property '{key}' requires properties: {}", .needed.join(", "))]
    PropertyDependencyMissing { key: String, needed: Vec<String> },

    #[error("instance matches the schema it must not match")]
    Negation,

    #[error("{failed} of {total} allOf branches failed")]
    AllOfFailed { failed: usize, total: usize },

    #[error("none of the {total} anyOf branches matched")]
    AnyOfFailed { total: usize },

    #[error("{matched} of {total} oneOf branches matched, exactly one required")]
    OneOfMismatch { matched: usize, total: usize },

    #[error("reference '{uri}' was not resolved")]
    UnresolvedRef { uri: String },

    #[error("no root schema set")]
    NoRootSchema,
}

fn bounds_text(min: &Option<u64>, max: &Option<u64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("expected {min}..={max}"),
        (Some(min), None) => format!("expected at least {min}"),
        (None, Some(max)) => format!("expected at most {max}"),
        (None, None) => "unbounded".to_string(),
    }
}

fn range_side(below: &bool) -> &'static str {
    if *below { "below" } else { "above" }
}
