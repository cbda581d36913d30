//! String and numeric leaf checks.

use vouch_value::Value;

use crate::error::ValidationError;
use crate::schema::{Bound, NumberSchema, StringSchema};
use crate::sink::ErrorSink;

use super::context::EvalContext;

pub(crate) fn check_string(
    ctx: &EvalContext<'_>,
    schema: &StringSchema,
    instance: &Value,
    text: &str,
    sink: &mut ErrorSink,
) {
    // Lengths count codepoints, not bytes: "é" has length 1.
    let length = text.chars().count();

    if let Some(min) = schema.min_length
        && (length as u64) < min
    {
        ctx.record(
            sink,
            instance,
            ValidationError::StringLengthOutOfBounds {
                length,
                min: Some(min),
                max: schema.max_length,
            },
        );
    }
    if let Some(max) = schema.max_length
        && (length as u64) > max
    {
        ctx.record(
            sink,
            instance,
            ValidationError::StringLengthOutOfBounds {
                length,
                min: schema.min_length,
                max: Some(max),
            },
        );
    }

    if let Some(pattern) = &schema.pattern
        && !pattern.is_match(text)
    {
        ctx.record(
            sink,
            instance,
            ValidationError::PatternMismatch {
                pattern: pattern.as_str().to_string(),
            },
        );
    }

    if let Some(format) = &schema.format {
        check_format(ctx, format, instance, sink);
    }
}

/// Without a registry `format` is an annotation and stays silent. With one,
/// an unregistered name is itself a diagnostic.
fn check_format(ctx: &EvalContext<'_>, name: &str, instance: &Value, sink: &mut ErrorSink) {
    let Some(registry) = ctx.formats else {
        return;
    };
    match registry.get(name) {
        None => ctx.record(
            sink,
            instance,
            ValidationError::UnknownFormat {
                name: name.to_string(),
            },
        ),
        Some(checker) => {
            if let Err(reason) = checker(name, instance) {
                ctx.record(
                    sink,
                    instance,
                    ValidationError::FormatMismatch {
                        format: name.to_string(),
                        reason,
                    },
                );
            }
        }
    }
}

/// The integer leaf: integral check first, then the shared numeric checks.
/// Fills the float slot of `type: "integer"` so `3.0` passes and `3.5`
/// fails with a type mismatch.
pub(crate) fn check_integer(
    ctx: &EvalContext<'_>,
    schema: &NumberSchema,
    instance: &Value,
    sink: &mut ErrorSink,
) {
    if !instance.is_integral() {
        ctx.record(
            sink,
            instance,
            ValidationError::TypeMismatch {
                expected: "integer".to_string(),
                actual: instance.kind().name().to_string(),
            },
        );
        return;
    }
    check_number(ctx, schema, instance, sink);
}

pub(crate) fn check_number(
    ctx: &EvalContext<'_>,
    schema: &NumberSchema,
    instance: &Value,
    sink: &mut ErrorSink,
) {
    let Some(x) = instance.as_f64() else {
        return;
    };

    match schema.min {
        Bound::Unbounded => {}
        Bound::Inclusive(bound) if x < bound => ctx.record(
            sink,
            instance,
            ValidationError::OutOfRange {
                value: x,
                bound,
                below: true,
            },
        ),
        Bound::Exclusive(bound) if x <= bound => ctx.record(
            sink,
            instance,
            ValidationError::OutOfRange {
                value: x,
                bound,
                below: true,
            },
        ),
        _ => {}
    }

    match schema.max {
        Bound::Unbounded => {}
        Bound::Inclusive(bound) if x > bound => ctx.record(
            sink,
            instance,
            ValidationError::OutOfRange {
                value: x,
                bound,
                below: false,
            },
        ),
        Bound::Exclusive(bound) if x >= bound => ctx.record(
            sink,
            instance,
            ValidationError::OutOfRange {
                value: x,
                bound,
                below: false,
            },
        ),
        _ => {}
    }

    // x is a multiple of m iff it is within machine epsilon of the nearest
    // true multiple; zero is a multiple of everything.
    if let Some(divisor) = schema.multiple_of
        && x != 0.0
    {
        let nearest = (x / divisor).round() * divisor;
        if (x - nearest).abs() > f64::EPSILON {
            ctx.record(
                sink,
                instance,
                ValidationError::NotMultipleOf { value: x, divisor },
            );
        }
    }
}
