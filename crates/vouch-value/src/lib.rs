//! JSON value tree for the vouch validator.
//!
//! The validator core never touches a parser: callers hand it a [`Value`]
//! tree, usually obtained from `serde_json` through [`from_json`]. The type
//! keeps integer, unsigned and float numbers apart so that schema dispatch
//! can tell them apart, while [`Value`]'s equality folds them back together
//! the way `enum`, `const` and `uniqueItems` require.

pub mod convert;
pub mod pointer;
pub mod value;

pub use convert::{from_json, to_json};
pub use pointer::{decode_pointer, Path, PathSegment, PointerError};
pub use value::{Map, Value, ValueKind};
