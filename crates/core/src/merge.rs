//! Pure merge and diff functions over [`Value`].
//!
//! Object-shaped values are combined field by field; every other value is
//! replaced wholesale. Lists are never concatenated.

use crate::clone::CloneStrategy;
use crate::value::Value;

/// Deep-merge `source` into `target` in place.
///
/// When both sides are objects every field of `source` is written into
/// `target`, recursing where both hold an object. An object `target` ignores a
/// non-object `source`; a non-object `target` is replaced by `source`.
pub fn merge_into(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, incoming) in src {
                let nested = incoming.is_object() && dst.get(key).is_some_and(Value::is_object);
                if nested {
                    if let Some(existing) = dst.get_mut(key) {
                        merge_into(existing, incoming);
                    }
                } else {
                    dst.insert(key.clone(), incoming.clone());
                }
            }
        }
        (Value::Object(_), _) => {}
        (target, source) => *target = source.clone(),
    }
}

/// Owned variant of [`merge_into`].
pub fn merge_objects(mut target: Value, source: &Value) -> Value {
    merge_into(&mut target, source);
    target
}

/// Combine two optional values, `second` taking precedence.
///
/// If either is an object the result is an independent copy of `first` with
/// `second` merged over it. Otherwise `second` wins unless it is absent or
/// null.
pub fn merge_values(
    cloner: &dyn CloneStrategy,
    first: Option<&Value>,
    second: Option<&Value>,
) -> Option<Value> {
    let first_is_object = first.is_some_and(Value::is_object);
    let second_is_object = second.is_some_and(Value::is_object);

    if first_is_object || second_is_object {
        return match (first, second) {
            (Some(base), Some(over)) if first_is_object => {
                Some(merge_objects(cloner.clone_value(base), over))
            }
            (Some(base), _) if first_is_object => Some(cloner.clone_value(base)),
            (_, Some(over)) => Some(cloner.clone_value(over)),
            (first, None) => first.map(|v| cloner.clone_value(v)),
        };
    }

    match second {
        Some(v) if !v.is_null() => Some(v.clone()),
        _ => first.cloned(),
    }
}

/// Drop every field of `value` that already matches `record_ref`.
///
/// Returns `true` when the remaining value no longer describes a change: an
/// object with no fields left, or a scalar equal to `record_ref`.
pub fn strip_unchanged(value: &mut Value, record_ref: &Value) -> bool {
    match value {
        Value::Object(fields) => {
            if let Value::Object(original) = record_ref {
                fields.retain(|key, v| original.get(key) != Some(&*v));
            }
            fields.is_empty()
        }
        scalar => *scalar == *record_ref,
    }
}

/// Remove list-typed fields from an object value.
///
/// Tree-shaped records keep their children in list fields; aggregated changes
/// report children separately, so the lists are dropped.
pub fn strip_lists(value: &mut Value) {
    if let Value::Object(fields) = value {
        fields.retain(|_, v| !v.is_list());
    }
}
