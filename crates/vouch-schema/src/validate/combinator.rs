//! Logical combinators.
//!
//! Every combinator evaluates its branches against local sinks and forwards
//! at most one summary diagnostic; branch diagnostics are discarded. The
//! exception is `then`/`else`, which run against the outer sink once the
//! `if` outcome (always local) has picked one of them.

use vouch_value::Value;

use crate::error::ValidationError;
use crate::schema::{Conditional, SchemaNodeId};
use crate::sink::ErrorSink;

use super::context::EvalContext;
use super::eval_node;

/// `not`: fail iff the child succeeds.
pub(crate) fn check_not(
    ctx: &EvalContext<'_>,
    child: SchemaNodeId,
    instance: &Value,
    sink: &mut ErrorSink,
) {
    let mut local = ErrorSink::new();
    eval_node(ctx, child, instance, &mut local);
    if !local.has_error() {
        ctx.record(sink, instance, ValidationError::Negation);
    }
}

/// `allOf`: every branch must succeed. Branches share one reusable local
/// buffer; the outer sink receives a single summary.
pub(crate) fn check_all_of(
    ctx: &EvalContext<'_>,
    branches: &[SchemaNodeId],
    instance: &Value,
    sink: &mut ErrorSink,
) {
    let mut local = ErrorSink::new();
    let mut failed = 0;
    for &branch in branches {
        eval_node(ctx, branch, instance, &mut local);
        if local.has_error() {
            failed += 1;
        }
        local.clear();
    }
    if failed > 0 {
        ctx.record(
            sink,
            instance,
            ValidationError::AllOfFailed {
                failed,
                total: branches.len(),
            },
        );
    }
}

/// `anyOf`: short-circuits on the first succeeding branch.
pub(crate) fn check_any_of(
    ctx: &EvalContext<'_>,
    branches: &[SchemaNodeId],
    instance: &Value,
    sink: &mut ErrorSink,
) {
    let mut local = ErrorSink::new();
    for &branch in branches {
        eval_node(ctx, branch, instance, &mut local);
        if !local.has_error() {
            return;
        }
        local.clear();
    }
    ctx.record(
        sink,
        instance,
        ValidationError::AnyOfFailed {
            total: branches.len(),
        },
    );
}

/// `oneOf`: exactly one branch must succeed. Counting stops at two, which
/// is enough to know the answer is "too many".
pub(crate) fn check_one_of(
    ctx: &EvalContext<'_>,
    branches: &[SchemaNodeId],
    instance: &Value,
    sink: &mut ErrorSink,
) {
    let mut local = ErrorSink::new();
    let mut matched = 0;
    for &branch in branches {
        eval_node(ctx, branch, instance, &mut local);
        if !local.has_error() {
            matched += 1;
            if matched > 1 {
                break;
            }
        }
        local.clear();
    }
    if matched != 1 {
        ctx.record(
            sink,
            instance,
            ValidationError::OneOfMismatch {
                matched,
                total: branches.len(),
            },
        );
    }
}

/// `if`/`then`/`else`: the `if` outcome is always discarded; the selected
/// branch, when present, reports into the outer sink.
pub(crate) fn check_conditional(
    ctx: &EvalContext<'_>,
    conditional: &Conditional,
    instance: &Value,
    sink: &mut ErrorSink,
) {
    let mut condition = ErrorSink::new();
    eval_node(ctx, conditional.when, instance, &mut condition);
    if !condition.has_error() {
        if let Some(then) = conditional.then {
            eval_node(ctx, then, instance, sink);
        }
    } else if let Some(otherwise) = conditional.otherwise {
        eval_node(ctx, otherwise, instance, sink);
    }
}
