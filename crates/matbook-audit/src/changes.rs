//! Field-level change detection.
//!
//! `before` is the full current state of an entity, `after` is a partial
//! update holding only the candidate new values. A key missing from
//! `after` means "not being changed". A JSON `null` in `after` is a real
//! value and compares normally.

use matbook_core::ChangeDetection;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AuditError;
use crate::event::{Changes, FieldChange};

/// A JSON object viewed as a set of named fields.
pub type FieldMap = Map<String, Value>;

/// Compute changes using [`ChangeDetection::Shallow`].
///
/// Returns `None` when no tracked field changed.
pub fn compute_changes(
    before: &FieldMap,
    after: &FieldMap,
    fields: Option<&[&str]>,
) -> Option<Changes> {
    compute_changes_with(ChangeDetection::Shallow, before, after, fields)
}

/// Compute changes between `before` and `after`.
///
/// Only fields in `fields` (default: every key of `after`) are compared.
/// A field is reported when it is present in `after` and its value differs
/// from the one in `before`. A field absent from `before` differs from any
/// value, `null` included, and is reported with `before: null`.
pub fn compute_changes_with(
    mode: ChangeDetection,
    before: &FieldMap,
    after: &FieldMap,
    fields: Option<&[&str]>,
) -> Option<Changes> {
    let mut changes = Changes::new();

    let mut compare = |field: &str| {
        let Some(after_val) = after.get(field) else {
            return;
        };
        let before_val = before.get(field);
        if differs(mode, before_val, after_val) {
            changes.insert(
                field.to_string(),
                FieldChange {
                    before: before_val.cloned().unwrap_or(Value::Null),
                    after: after_val.clone(),
                },
            );
        }
    };

    match fields {
        Some(fields) => {
            for field in fields {
                compare(*field);
            }
        }
        None => {
            for field in after.keys() {
                compare(field.as_str());
            }
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes)
    }
}

fn differs(mode: ChangeDetection, before: Option<&Value>, after: &Value) -> bool {
    let Some(before) = before else {
        return true;
    };
    match mode {
        ChangeDetection::Structural => before != after,
        // Two separately held composites are never the same value.
        ChangeDetection::Shallow if is_composite(before) || is_composite(after) => true,
        ChangeDetection::Shallow => before != after,
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Lower a serializable value to a field map.
///
/// `Option` fields marked `skip_serializing_if = "Option::is_none"` become
/// absent keys, which `compute_changes` treats as "not being changed".
pub fn to_fields<T: Serialize>(value: &T) -> Result<FieldMap, AuditError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        Value::Null => Err(AuditError::NotAnObject("null")),
        Value::Bool(_) => Err(AuditError::NotAnObject("bool")),
        Value::Number(_) => Err(AuditError::NotAnObject("number")),
        Value::String(_) => Err(AuditError::NotAnObject("string")),
        Value::Array(_) => Err(AuditError::NotAnObject("array")),
    }
}
