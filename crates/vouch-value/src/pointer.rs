//! JSON Pointer (RFC 6901) support.
//!
//! Two consumers: `$ref` fragments are decoded and walked with
//! [`decode_pointer`] and [`Value::locate`], and diagnostics carry a
//! [`Path`] rendered in pointer syntax.

use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// One step of a diagnostic path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object property name.
    Key(String),
    /// Array element index.
    Index(usize),
}

/// Path from the instance root to the offending location.
///
/// Renders as a JSON Pointer: the root is the empty string, descent through
/// property `a` and element `0` is `/a/0`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path(pub Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push_key(&mut self, key: &str) {
        self.0.push(PathSegment::Key(key.to_string()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            f.write_str("/")?;
            match segment {
                PathSegment::Key(key) => {
                    for ch in key.chars() {
                        match ch {
                            '~' => f.write_str("~0")?,
                            '/' => f.write_str("~1")?,
                            c => write!(f, "{c}")?,
                        }
                    }
                }
                PathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("pointer must be empty or start with '/': '{0}'")]
    MissingSlash(String),
}

/// Split a pointer into unescaped reference tokens.
///
/// The empty pointer addresses the whole document and yields no tokens.
pub fn decode_pointer(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| PointerError::MissingSlash(pointer.to_string()))?;
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

impl Value {
    /// Walk decoded pointer tokens down the tree.
    pub fn locate(&self, tokens: &[String]) -> Option<&Value> {
        let mut current = self;
        for token in tokens {
            current = match current {
                Value::Object(map) => map.get(token.as_str())?,
                Value::Array(items) => {
                    // RFC 6901 forbids leading zeros in array indices
                    if token.len() > 1 && token.starts_with('0') {
                        return None;
                    }
                    let index: usize = token.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Map;

    #[test]
    fn decode_unescapes_tokens() {
        assert_eq!(decode_pointer("").unwrap(), Vec::<String>::new());
        assert_eq!(decode_pointer("/a/b").unwrap(), vec!["a", "b"]);
        assert_eq!(decode_pointer("/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert!(decode_pointer("a/b").is_err());
    }

    #[test]
    fn locate_walks_objects_and_arrays() {
        let mut inner = Map::new();
        inner.insert("b".into(), Value::Array(vec![Value::I64(10), Value::I64(20)]));
        let mut outer = Map::new();
        outer.insert("a".into(), Value::Object(inner));
        let doc = Value::Object(outer);

        let tokens = decode_pointer("/a/b/1").unwrap();
        assert_eq!(doc.locate(&tokens), Some(&Value::I64(20)));

        assert!(doc.locate(&decode_pointer("/a/missing").unwrap()).is_none());
        assert!(doc.locate(&decode_pointer("/a/b/01").unwrap()).is_none());
        assert_eq!(doc.locate(&[]), Some(&doc));
    }

    #[test]
    fn path_renders_as_pointer() {
        let mut path = Path::root();
        assert_eq!(path.to_string(), "");
        path.push_key("a/b");
        path.push_index(3);
        path.push_key("~x");
        assert_eq!(path.to_string(), "/a~1b/3/~0x");
        path.pop();
        assert_eq!(path.to_string(), "/a~1b/3");
    }
}
