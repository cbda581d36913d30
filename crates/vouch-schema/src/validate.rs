//! Instance evaluation.
//!
//! # Architecture
//!
//! [`eval_node`] is the single entry point: it dispatches on the compiled
//! node variant and recurses through children by node id. A dispatch node
//! runs its five stages in order — type table, `enum`, `const`,
//! combinators, `if`/`then`/`else` — and all five run even when earlier
//! stages failed, so diagnostics accumulate.
//!
//! # Error handling
//!
//! Violations go into the caller's [`ErrorSink`]; nothing here returns a
//! `Result` and nothing panics on instance content. Combinators evaluate
//! their branches against disposable local sinks and decide afterwards
//! what reaches the outer one.

mod combinator;
mod compound;
pub(crate) mod context;
mod primitive;

use vouch_value::Value;

use crate::error::ValidationError;
use crate::schema::{DispatchNode, Leaf, SchemaNode, SchemaNodeId, TypeSlot};
use crate::sink::ErrorSink;

pub(crate) use context::EvalContext;

/// Evaluate one compiled node against an instance value.
pub(crate) fn eval_node(
    ctx: &EvalContext<'_>,
    id: SchemaNodeId,
    instance: &Value,
    sink: &mut ErrorSink,
) {
    match ctx.doc.node(id) {
        SchemaNode::Everything => {}
        SchemaNode::Nothing => ctx.record(sink, instance, ValidationError::FalseSchema),
        SchemaNode::Dispatch(node) => eval_dispatch(ctx, node, instance, sink),
        SchemaNode::Ref { uri, target } => match target {
            Some(target) => {
                // A pair already on the stack means a schema cycle looped
                // back onto this same value; re-entry adds no constraint.
                if ctx.enter_ref(id, instance) {
                    eval_node(ctx, *target, instance, sink);
                    ctx.leave_ref();
                }
            }
            None => ctx.record(
                sink,
                instance,
                ValidationError::UnresolvedRef { uri: uri.clone() },
            ),
        },
    }
}

fn eval_dispatch(ctx: &EvalContext<'_>, node: &DispatchNode, instance: &Value, sink: &mut ErrorSink) {
    // Stage 1: per-kind dispatch.
    match node.table.slot(instance.kind()) {
        TypeSlot::Deny => ctx.record(
            sink,
            instance,
            ValidationError::TypeMismatch {
                expected: node.allowed_names().join(" or "),
                actual: instance.kind().name().to_string(),
            },
        ),
        TypeSlot::Allow => {}
        TypeSlot::Check(leaf) => eval_leaf(ctx, &node.leaves[leaf], instance, sink),
    }

    // Stage 2: enum.
    if let Some(values) = &node.enumeration
        && !values.iter().any(|value| value == instance)
    {
        ctx.record(sink, instance, ValidationError::NotInEnum);
    }

    // Stage 3: const.
    if let Some(constant) = &node.constant
        && constant != instance
    {
        ctx.record(sink, instance, ValidationError::ConstMismatch);
    }

    // Stage 4: combinators, each speculating against local sinks.
    if let Some(child) = node.not {
        combinator::check_not(ctx, child, instance, sink);
    }
    if !node.all_of.is_empty() {
        combinator::check_all_of(ctx, &node.all_of, instance, sink);
    }
    if !node.any_of.is_empty() {
        combinator::check_any_of(ctx, &node.any_of, instance, sink);
    }
    if !node.one_of.is_empty() {
        combinator::check_one_of(ctx, &node.one_of, instance, sink);
    }

    // Stage 5: if/then/else.
    if let Some(conditional) = &node.conditional {
        combinator::check_conditional(ctx, conditional, instance, sink);
    }
}

fn eval_leaf(ctx: &EvalContext<'_>, leaf: &Leaf, instance: &Value, sink: &mut ErrorSink) {
    match leaf {
        Leaf::String(schema) => {
            if let Some(text) = instance.as_str() {
                primitive::check_string(ctx, schema, instance, text, sink);
            }
        }
        Leaf::Integer(schema) => primitive::check_integer(ctx, schema, instance, sink),
        Leaf::Number(schema) => primitive::check_number(ctx, schema, instance, sink),
        Leaf::Array(schema) => {
            if let Some(items) = instance.as_array() {
                compound::check_array(ctx, schema, instance, items, sink);
            }
        }
        Leaf::Object(schema) => {
            if let Some(map) = instance.as_object() {
                compound::check_object(ctx, schema, instance, map, sink);
            }
        }
    }
}
