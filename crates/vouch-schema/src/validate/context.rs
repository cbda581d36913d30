//! Evaluation context.
//!
//! `EvalContext` carries what a single `validate` call needs: the compiled
//! document, the optional format registry, and mutable state behind a
//! RefCell — the diagnostic path mirroring the descent into the instance,
//! and the active reference stack that guarantees termination on cyclic
//! schemas.

use std::cell::RefCell;

use vouch_value::{Path, Value};

use crate::error::ValidationError;
use crate::root::FormatRegistry;
use crate::schema::{SchemaDocument, SchemaNodeId};
use crate::sink::ErrorSink;

pub(crate) struct EvalContext<'a> {
    pub doc: &'a SchemaDocument,
    pub formats: Option<&'a FormatRegistry>,
    state: RefCell<EvalState>,
}

struct EvalState {
    /// Current location in the instance, for diagnostics.
    path: Path,
    /// (reference node, instance address) pairs currently on the stack.
    /// Re-entering a pair means a cyclic schema has looped back onto the
    /// same value; that re-entry adds no new constraint and returns early.
    active: Vec<(SchemaNodeId, usize)>,
}

impl<'a> EvalContext<'a> {
    pub fn new(doc: &'a SchemaDocument, formats: Option<&'a FormatRegistry>) -> Self {
        Self {
            doc,
            formats,
            state: RefCell::new(EvalState {
                path: Path::root(),
                active: Vec::new(),
            }),
        }
    }

    pub fn push_key(&self, key: &str) {
        self.state.borrow_mut().path.push_key(key);
    }

    pub fn push_index(&self, index: usize) {
        self.state.borrow_mut().path.push_index(index);
    }

    pub fn pop_path(&self) {
        self.state.borrow_mut().path.pop();
    }

    /// Record a violation at the current path.
    pub fn record(&self, sink: &mut ErrorSink, instance: &Value, error: ValidationError) {
        sink.record(&self.state.borrow().path, instance, error);
    }

    /// Mark a reference as active for this instance value. Returns false if
    /// the pair is already on the stack, in which case the caller must not
    /// descend (and must not call [`leave_ref`](Self::leave_ref)).
    pub fn enter_ref(&self, node: SchemaNodeId, instance: &Value) -> bool {
        let pair = (node, instance as *const Value as usize);
        let mut state = self.state.borrow_mut();
        if state.active.contains(&pair) {
            return false;
        }
        state.active.push(pair);
        true
    }

    pub fn leave_ref(&self) {
        self.state.borrow_mut().active.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_reentry_is_detected_per_instance() {
        let doc = SchemaDocument::new();
        let ctx = EvalContext::new(&doc, None);
        let node = SchemaNodeId(0);
        let a = Value::I64(1);
        let b = Value::I64(2);

        assert!(ctx.enter_ref(node, &a));
        assert!(!ctx.enter_ref(node, &a));
        // a different instance value is a different pair
        assert!(ctx.enter_ref(node, &b));
        ctx.leave_ref();
        ctx.leave_ref();
        assert!(ctx.enter_ref(node, &a));
    }

    #[test]
    fn path_mirrors_descent() {
        let doc = SchemaDocument::new();
        let ctx = EvalContext::new(&doc, None);
        let mut sink = ErrorSink::new();
        ctx.push_key("items");
        ctx.push_index(2);
        ctx.record(&mut sink, &Value::Null, ValidationError::NotInEnum);
        ctx.pop_path();
        ctx.pop_path();
        assert_eq!(sink.iter().next().unwrap().path, "/items/2");
    }
}
