use std::fmt;

use indexmap::IndexMap;

/// Object storage. Insertion order is preserved so diagnostics list
/// properties in document order; lookups stay O(1).
pub type Map = IndexMap<String, Value>;

/// A JSON value.
///
/// Integer, unsigned and float numbers are distinct variants (a number
/// parsed as `3` and one parsed as `3.0` dispatch differently), but
/// [`PartialEq`] compares them by numeric value.
///
/// `Invalid` is an internal placeholder and never appears in well-formed
/// input; it compares unequal to everything, including itself.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Invalid,
}

/// The kind of a [`Value`], used for schema dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    I64,
    U64,
    F64,
    String,
    Array,
    Object,
    Invalid,
}

impl ValueKind {
    /// User-facing type name, in JSON Schema vocabulary.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::I64 | ValueKind::U64 => "integer",
            ValueKind::F64 => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Invalid => "invalid",
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::I64(_) => ValueKind::I64,
            Value::U64(_) => ValueKind::U64,
            Value::F64(_) => ValueKind::F64,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Invalid => ValueKind::Invalid,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::U64(_) | Value::F64(_))
    }

    /// True for integer values, including floats with no fractional part.
    pub fn is_integral(&self) -> bool {
        match self {
            Value::I64(_) | Value::U64(_) => true,
            Value::F64(f) => f.is_finite() && f.fract() == 0.0,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of any number kind, lossy for integers beyond 2^53.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::U64(u) => Some(*u as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::I64(i) => u64::try_from(*i).ok(),
            Value::U64(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Compact rendering truncated for diagnostics.
    pub fn snippet(&self, limit: usize) -> String {
        let rendered = self.to_string();
        if rendered.chars().count() <= limit {
            return rendered;
        }
        let mut out: String = rendered.chars().take(limit).collect();
        out.push_str("...");
        out
    }
}

// Structural equality: numeric kinds compare by value so that `1`, `1.0`
// and unsigned `1` are the same instance.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, val)| b.get(key).is_some_and(|w| val == w))
            }
            (a, b) if a.is_number() && b.is_number() => number_eq(a, b),
            _ => false,
        }
    }
}

fn number_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::I64(x), Value::I64(y)) => x == y,
        (Value::U64(x), Value::U64(y)) => x == y,
        (Value::I64(x), Value::U64(y)) | (Value::U64(y), Value::I64(x)) => {
            *x >= 0 && *x as u64 == *y
        }
        (Value::F64(x), Value::F64(y)) => x == y,
        (Value::F64(x), Value::I64(y)) | (Value::I64(y), Value::F64(x)) => *x == *y as f64,
        (Value::F64(x), Value::U64(y)) | (Value::U64(y), Value::F64(x)) => *x == *y as f64,
        _ => false,
    }
}

/// Compact JSON rendering, used for diagnostic snippets.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::I64(i) => write!(f, "{i}"),
            Value::U64(u) => write!(f, "{u}"),
            Value::F64(x) if x.is_finite() => write!(f, "{x}"),
            // JSON has no rendering for NaN or infinities
            Value::F64(_) => f.write_str("null"),
            Value::String(s) => write_escaped(f, s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (key, val)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_escaped(f, key)?;
                    write!(f, ":{val}")?;
                }
                f.write_str("}")
            }
            Value::Invalid => f.write_str("<invalid>"),
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_equality_folds_kinds() {
        assert_eq!(Value::I64(1), Value::F64(1.0));
        assert_eq!(Value::U64(1), Value::I64(1));
        assert_eq!(Value::U64(7), Value::F64(7.0));
        assert_ne!(Value::I64(1), Value::F64(1.5));
        assert_ne!(Value::I64(-1), Value::U64(u64::MAX));
    }

    #[test]
    fn invalid_equals_nothing() {
        assert_ne!(Value::Invalid, Value::Invalid);
        assert_ne!(Value::Invalid, Value::Null);
    }

    #[test]
    fn object_equality_ignores_insertion_order() {
        let mut a = Map::new();
        a.insert("x".into(), Value::I64(1));
        a.insert("y".into(), Value::I64(2));
        let mut b = Map::new();
        b.insert("y".into(), Value::I64(2));
        b.insert("x".into(), Value::F64(1.0));
        assert_eq!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn integral_floats() {
        assert!(Value::F64(3.0).is_integral());
        assert!(!Value::F64(3.5).is_integral());
        assert!(!Value::F64(f64::NAN).is_integral());
        assert!(Value::I64(-2).is_integral());
        assert!(!Value::String("3".into()).is_integral());
    }

    #[test]
    fn display_is_compact_json() {
        let mut obj = Map::new();
        obj.insert("a\"b".into(), Value::Array(vec![Value::Null, Value::Bool(true)]));
        assert_eq!(Value::Object(obj).to_string(), r#"{"a\"b":[null,true]}"#);
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let value = Value::String("éééééééééé".into());
        let snip = value.snippet(5);
        assert!(snip.ends_with("..."));
        assert_eq!(snip.chars().count(), 8);
    }

    #[test]
    fn kind_names() {
        assert_eq!(Value::I64(0).kind().name(), "integer");
        assert_eq!(Value::U64(0).kind().name(), "integer");
        assert_eq!(Value::F64(0.5).kind().name(), "number");
        assert_eq!(Value::Null.kind().name(), "null");
    }
}
