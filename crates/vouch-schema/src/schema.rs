//! Compiled schema representation.
//!
//! Compilation turns a schema value into an arena of [`SchemaNode`]s owned
//! by a [`SchemaDocument`]; nodes refer to each other by [`SchemaNodeId`],
//! so cyclic `$ref`s are plain back-indices with no ownership bookkeeping.
//! Everything here is immutable once `set_root_schema` has returned.

use ahash::AHashMap;
use indexmap::IndexMap;
use regex::Regex;

use vouch_value::{Value, ValueKind};

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaNodeId(pub usize);

/// The compiled schema tree.
#[derive(Debug)]
pub struct SchemaDocument {
    nodes: Vec<SchemaNode>,
    pub(crate) root: SchemaNodeId,
    /// `$ref` stubs awaiting the link phase, with their target URIs.
    pub(crate) pending_refs: Vec<(SchemaNodeId, String)>,
    /// Every compiled fragment, keyed by `{base}#{pointer}`. Lets `$ref`s
    /// land on already-compiled nodes, which is also what turns cyclic
    /// references into back-pointers.
    pub(crate) compiled_at: AHashMap<String, SchemaNodeId>,
}

impl Default for SchemaDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDocument {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: SchemaNodeId(0),
            pending_refs: Vec::new(),
            compiled_at: AHashMap::new(),
        }
    }

    pub fn root(&self) -> SchemaNodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: SchemaNodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: SchemaNodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    pub(crate) fn create_node(&mut self, node: SchemaNode) -> SchemaNodeId {
        let id = SchemaNodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

/// A compiled schema node.
#[derive(Debug)]
pub enum SchemaNode {
    /// The literal `true` schema: accepts every instance.
    Everything,
    /// The literal `false` schema: rejects every instance.
    Nothing,
    /// A non-trivial subschema with per-kind dispatch.
    Dispatch(Box<DispatchNode>),
    /// A `$ref`; `target` is filled in by the link phase.
    Ref { uri: String, target: Option<SchemaNodeId> },
}

/// Index into a dispatch node's local leaf table.
pub type LeafIndex = usize;

/// What a dispatch node does with one instance kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSlot {
    /// Kind excluded by `type`: a type-mismatch diagnostic.
    Deny,
    /// Kind accepted with no further constraints.
    Allow,
    /// Kind accepted, constraints checked by the indexed leaf.
    Check(LeafIndex),
}

/// Per-kind slot table; the dominant dispatch is one field read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    pub null: TypeSlot,
    pub boolean: TypeSlot,
    pub integer: TypeSlot,
    pub unsigned: TypeSlot,
    pub float: TypeSlot,
    pub string: TypeSlot,
    pub array: TypeSlot,
    pub object: TypeSlot,
}

impl TypeTable {
    pub fn deny_all() -> Self {
        Self {
            null: TypeSlot::Deny,
            boolean: TypeSlot::Deny,
            integer: TypeSlot::Deny,
            unsigned: TypeSlot::Deny,
            float: TypeSlot::Deny,
            string: TypeSlot::Deny,
            array: TypeSlot::Deny,
            object: TypeSlot::Deny,
        }
    }

    pub fn allow_all() -> Self {
        Self {
            null: TypeSlot::Allow,
            boolean: TypeSlot::Allow,
            integer: TypeSlot::Allow,
            unsigned: TypeSlot::Allow,
            float: TypeSlot::Allow,
            string: TypeSlot::Allow,
            array: TypeSlot::Allow,
            object: TypeSlot::Allow,
        }
    }

    pub fn slot(&self, kind: ValueKind) -> TypeSlot {
        match kind {
            ValueKind::Null => self.null,
            ValueKind::Bool => self.boolean,
            ValueKind::I64 => self.integer,
            ValueKind::U64 => self.unsigned,
            ValueKind::F64 => self.float,
            ValueKind::String => self.string,
            ValueKind::Array => self.array,
            ValueKind::Object => self.object,
            ValueKind::Invalid => TypeSlot::Deny,
        }
    }

    /// True when every slot accepts its kind unconditionally.
    pub fn is_allow_all(&self) -> bool {
        *self == Self::allow_all()
    }
}

/// A compiled non-trivial schema: the five evaluation stages in order.
#[derive(Debug)]
pub struct DispatchNode {
    /// Stage 1: per-kind dispatch. Slots index into `leaves`; the three
    /// numeric slots may share one leaf.
    pub table: TypeTable,
    pub leaves: Vec<Leaf>,
    /// Stage 2: `enum`.
    pub enumeration: Option<Vec<Value>>,
    /// Stage 3: `const`.
    pub constant: Option<Value>,
    /// Stage 4: combinators.
    pub not: Option<SchemaNodeId>,
    pub all_of: Vec<SchemaNodeId>,
    pub any_of: Vec<SchemaNodeId>,
    pub one_of: Vec<SchemaNodeId>,
    /// Stage 5: `if`/`then`/`else`.
    pub conditional: Option<Conditional>,
}

impl DispatchNode {
    pub(crate) fn new(table: TypeTable) -> Self {
        Self {
            table,
            leaves: Vec::new(),
            enumeration: None,
            constant: None,
            not: None,
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            conditional: None,
        }
    }

    /// Names of the accepted kinds, for type-mismatch messages. A float
    /// slot holding an integer leaf counts as "integer", not "number".
    pub fn allowed_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut push = |name: &'static str| {
            if !names.contains(&name) {
                names.push(name);
            }
        };
        if self.table.null != TypeSlot::Deny {
            push("null");
        }
        if self.table.boolean != TypeSlot::Deny {
            push("boolean");
        }
        // "number" subsumes "integer": name the wider kind when the float
        // slot admits arbitrary numbers, the narrower one otherwise.
        let number_allowed = match self.table.float {
            TypeSlot::Deny => false,
            TypeSlot::Check(i) => !matches!(self.leaves[i], Leaf::Integer(_)),
            TypeSlot::Allow => true,
        };
        if number_allowed {
            push("number");
        } else if self.table.integer != TypeSlot::Deny
            || self.table.unsigned != TypeSlot::Deny
            || self.table.float != TypeSlot::Deny
        {
            push("integer");
        }
        if self.table.string != TypeSlot::Deny {
            push("string");
        }
        if self.table.array != TypeSlot::Deny {
            push("array");
        }
        if self.table.object != TypeSlot::Deny {
            push("object");
        }
        names
    }

    /// An otherwise empty node is equivalent to the literal `true` schema.
    pub(crate) fn is_trivial(&self) -> bool {
        self.table.is_allow_all()
            && self.enumeration.is_none()
            && self.constant.is_none()
            && self.not.is_none()
            && self.all_of.is_empty()
            && self.any_of.is_empty()
            && self.one_of.is_empty()
            && self.conditional.is_none()
    }
}

/// Compiled `if`/`then`/`else` triple.
#[derive(Debug, Clone, Copy)]
pub struct Conditional {
    pub when: SchemaNodeId,
    pub then: Option<SchemaNodeId>,
    pub otherwise: Option<SchemaNodeId>,
}

/// A type-specialized validator.
#[derive(Debug)]
pub enum Leaf {
    String(StringSchema),
    /// Numeric constraints plus the requirement that the instance be
    /// integral; fills the float slot of `type: "integer"` so that `3.0`
    /// passes and `3.5` does not.
    Integer(NumberSchema),
    Number(NumberSchema),
    Array(ArraySchema),
    Object(ObjectSchema),
}

/// `minLength` / `maxLength` / `pattern` / `format`.
///
/// Lengths count Unicode codepoints, not bytes.
#[derive(Debug, Default)]
pub struct StringSchema {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
    pub format: Option<String>,
}

impl StringSchema {
    pub(crate) fn is_trivial(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.format.is_none()
    }
}

/// One side of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Bound {
    #[default]
    Unbounded,
    Inclusive(f64),
    Exclusive(f64),
}

/// `minimum` / `maximum` / `exclusiveMinimum` / `exclusiveMaximum` /
/// `multipleOf`, evaluated in f64 for every numeric instance kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberSchema {
    pub min: Bound,
    pub max: Bound,
    pub multiple_of: Option<f64>,
}

impl NumberSchema {
    pub(crate) fn is_trivial(&self) -> bool {
        self.min == Bound::Unbounded && self.max == Bound::Unbounded && self.multiple_of.is_none()
    }
}

/// The `items` keyword.
#[derive(Debug, Default)]
pub enum Items {
    #[default]
    Unconstrained,
    /// `items` was a schema: every element validates against it.
    Uniform(SchemaNodeId),
    /// `items` was a list: the i-th schema validates the i-th element;
    /// elements past the list fall to `additionalItems`.
    PerPosition(Vec<SchemaNodeId>),
}

#[derive(Debug, Default)]
pub struct ArraySchema {
    pub items: Items,
    pub additional_items: Option<SchemaNodeId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique: bool,
    pub contains: Option<SchemaNodeId>,
}

impl ArraySchema {
    pub(crate) fn is_trivial(&self) -> bool {
        matches!(self.items, Items::Unconstrained)
            && self.additional_items.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && !self.unique
            && self.contains.is_none()
    }
}

/// A `dependencies` entry.
#[derive(Debug)]
pub enum Dependency {
    /// Property dependency: these keys must also be present.
    Keys(Vec<String>),
    /// Schema dependency: the whole instance validates against it.
    Schema(SchemaNodeId),
}

#[derive(Debug, Default)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaNodeId>,
    pub pattern_properties: Vec<(Pattern, SchemaNodeId)>,
    /// Applies to properties matched neither by name nor by pattern.
    pub additional: Option<SchemaNodeId>,
    pub property_names: Option<SchemaNodeId>,
    pub required: Vec<String>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub dependencies: IndexMap<String, Dependency>,
}

impl ObjectSchema {
    pub(crate) fn is_trivial(&self) -> bool {
        self.properties.is_empty()
            && self.pattern_properties.is_empty()
            && self.additional.is_none()
            && self.property_names.is_none()
            && self.required.is_empty()
            && self.min_properties.is_none()
            && self.max_properties.is_none()
            && self.dependencies.is_empty()
    }
}

/// A compiled regex, matched with search (unanchored) semantics.
#[derive(Debug)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_slot_lookup() {
        let mut table = TypeTable::deny_all();
        table.integer = TypeSlot::Check(0);
        table.unsigned = TypeSlot::Check(0);
        table.float = TypeSlot::Check(0);
        assert_eq!(table.slot(ValueKind::I64), TypeSlot::Check(0));
        assert_eq!(table.slot(ValueKind::U64), TypeSlot::Check(0));
        assert_eq!(table.slot(ValueKind::String), TypeSlot::Deny);
        assert_eq!(table.slot(ValueKind::Invalid), TypeSlot::Deny);
    }

    #[test]
    fn integer_float_slot_reports_integer() {
        let mut node = DispatchNode::new(TypeTable::deny_all());
        node.leaves.push(Leaf::Integer(NumberSchema::default()));
        node.table.integer = TypeSlot::Check(0);
        node.table.unsigned = TypeSlot::Check(0);
        node.table.float = TypeSlot::Check(0);
        assert_eq!(node.allowed_names(), vec!["integer"]);
    }

    #[test]
    fn trivial_dispatch_node() {
        let node = DispatchNode::new(TypeTable::allow_all());
        assert!(node.is_trivial());

        let mut node = DispatchNode::new(TypeTable::allow_all());
        node.constant = Some(Value::Null);
        assert!(!node.is_trivial());
    }

    #[test]
    fn pattern_is_unanchored() {
        let pattern = Pattern::new("b+c").unwrap();
        assert!(pattern.is_match("abbbcd"));
        assert!(!pattern.is_match("abd"));
    }
}
