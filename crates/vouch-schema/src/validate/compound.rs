//! Array and object leaf checks.

use vouch_value::{Map, Value};

use crate::error::ValidationError;
use crate::schema::{ArraySchema, Dependency, Items, ObjectSchema, SchemaNode};
use crate::sink::ErrorSink;

use super::context::EvalContext;
use super::eval_node;

pub(crate) fn check_array(
    ctx: &EvalContext<'_>,
    schema: &ArraySchema,
    instance: &Value,
    items: &[Value],
    sink: &mut ErrorSink,
) {
    let length = items.len();

    if let Some(min) = schema.min_items
        && (length as u64) < min
    {
        ctx.record(
            sink,
            instance,
            ValidationError::ArrayLengthOutOfBounds {
                length,
                min: Some(min),
                max: schema.max_items,
            },
        );
    }
    if let Some(max) = schema.max_items
        && (length as u64) > max
    {
        ctx.record(
            sink,
            instance,
            ValidationError::ArrayLengthOutOfBounds {
                length,
                min: schema.min_items,
                max: Some(max),
            },
        );
    }

    match &schema.items {
        Items::Unconstrained => {}
        Items::Uniform(item_schema) => {
            for (index, item) in items.iter().enumerate() {
                ctx.push_index(index);
                eval_node(ctx, *item_schema, item, sink);
                ctx.pop_path();
            }
        }
        Items::PerPosition(schemas) => {
            for (index, item) in items.iter().enumerate() {
                if let Some(&positional) = schemas.get(index) {
                    ctx.push_index(index);
                    eval_node(ctx, positional, item, sink);
                    ctx.pop_path();
                } else if let Some(extra) = schema.additional_items {
                    // elements past the list are unconstrained otherwise
                    ctx.push_index(index);
                    eval_node(ctx, extra, item, sink);
                    ctx.pop_path();
                }
            }
        }
    }

    if schema.unique {
        check_unique(ctx, instance, items, sink);
    }

    if let Some(contains) = schema.contains {
        // Speculative: one success is enough, failures stay local.
        let found = items.iter().any(|item| {
            let mut local = ErrorSink::new();
            eval_node(ctx, contains, item, &mut local);
            !local.has_error()
        });
        if !found {
            ctx.record(sink, instance, ValidationError::MissingContains);
        }
    }
}

/// Structural equality across all pairs, one diagnostic for the first
/// duplicate. Numeric kinds fold, so `[1, 1.0]` is a duplicate.
fn check_unique(ctx: &EvalContext<'_>, instance: &Value, items: &[Value], sink: &mut ErrorSink) {
    for second in 1..items.len() {
        for first in 0..second {
            if items[first] == items[second] {
                ctx.record(sink, instance, ValidationError::NotUnique { first, second });
                return;
            }
        }
    }
}

pub(crate) fn check_object(
    ctx: &EvalContext<'_>,
    schema: &ObjectSchema,
    instance: &Value,
    map: &Map,
    sink: &mut ErrorSink,
) {
    let count = map.len();

    if let Some(min) = schema.min_properties
        && (count as u64) < min
    {
        ctx.record(
            sink,
            instance,
            ValidationError::PropertyCountOutOfBounds {
                count,
                min: Some(min),
                max: schema.max_properties,
            },
        );
    }
    if let Some(max) = schema.max_properties
        && (count as u64) > max
    {
        ctx.record(
            sink,
            instance,
            ValidationError::PropertyCountOutOfBounds {
                count,
                min: schema.min_properties,
                max: Some(max),
            },
        );
    }

    let missing: Vec<String> = schema
        .required
        .iter()
        .filter(|name| !map.contains_key(name.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        ctx.record(
            sink,
            instance,
            ValidationError::MissingRequiredProperties { names: missing },
        );
    }

    for (key, value) in map {
        if let Some(names_schema) = schema.property_names {
            // the key itself is validated as a string instance
            let name = Value::String(key.clone());
            ctx.push_key(key);
            eval_node(ctx, names_schema, &name, sink);
            ctx.pop_path();
        }

        let mut matched = false;

        if let Some(&property) = schema.properties.get(key) {
            matched = true;
            ctx.push_key(key);
            eval_node(ctx, property, value, sink);
            ctx.pop_path();
        }

        for (pattern, pattern_schema) in &schema.pattern_properties {
            if pattern.is_match(key) {
                matched = true;
                ctx.push_key(key);
                eval_node(ctx, *pattern_schema, value, sink);
                ctx.pop_path();
            }
        }

        if !matched && let Some(additional) = schema.additional {
            ctx.push_key(key);
            if matches!(ctx.doc.node(additional), SchemaNode::Nothing) {
                // `additionalProperties: false` names the property instead
                // of reporting an opaque false-schema failure
                ctx.record(
                    sink,
                    value,
                    ValidationError::UnexpectedProperty { name: key.clone() },
                );
            } else {
                eval_node(ctx, additional, value, sink);
            }
            ctx.pop_path();
        }
    }

    for (key, dependency) in &schema.dependencies {
        if !map.contains_key(key.as_str()) {
            continue;
        }
        match dependency {
            Dependency::Keys(needed) => {
                let absent: Vec<String> = needed
                    .iter()
                    .filter(|name| !map.contains_key(name.as_str()))
                    .cloned()
                    .collect();
                if !absent.is_empty() {
                    ctx.record(
                        sink,
                        instance,
                        ValidationError::PropertyDependencyMissing {
                            key: key.clone(),
                            needed: absent,
                        },
                    );
                }
            }
            // a schema dependency constrains the whole instance
            Dependency::Schema(dependent) => eval_node(ctx, *dependent, instance, sink),
        }
    }
}
