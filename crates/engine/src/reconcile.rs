//! Write pending changes back into a caller-owned data source.
//!
//! Each function applies one change and reports whether it touched `data`.
//! Changes that cannot be placed are skipped.

use editlog_core::{
    CloneStrategy, RecordKey, State, Transaction, TransactionKind, TreePath, Value,
    merge::{merge_into, merge_values},
};
use tracing::warn;

/// Apply `state` to a flat list, locating the record by deep equality with
/// its `record_ref`.
pub fn reconcile_flat<X>(data: &mut Vec<Value>, state: &State<X>, cloner: &dyn CloneStrategy) -> bool {
    if state.kind == TransactionKind::Add {
        data.push(cloner.clone_value(&state.value));
        return true;
    }
    let Some(record_ref) = state.record_ref.as_ref() else {
        return false;
    };
    let Some(index) = data.iter().position(|row| row == record_ref) else {
        return false;
    };
    match state.kind {
        TransactionKind::Delete => {
            data.remove(index);
        }
        _ => {
            if let Some(merged) = merge_values(cloner, Some(record_ref), Some(&state.value)) {
                data[index] = merged;
            }
        }
    }
    true
}

/// Apply `state` to a flat list of object records, locating the record by
/// its `primary_key` field.
pub fn reconcile_keyed<X>(
    data: &mut Vec<Value>,
    primary_key: &str,
    id: &Value,
    state: &State<X>,
    cloner: &dyn CloneStrategy,
) -> bool {
    if state.kind == TransactionKind::Add {
        data.push(cloner.clone_value(&state.value));
        return true;
    }
    let Some(index) = position_by_key(data, primary_key, id) else {
        return false;
    };
    match state.kind {
        TransactionKind::Delete => {
            data.remove(index);
        }
        _ => merge_into(&mut data[index], &state.value),
    }
    true
}

/// Apply one aggregated hierarchical change, following its path through
/// nested `child_key` lists. A change without a path targets the top level.
pub fn reconcile_tree<Id: RecordKey>(
    data: &mut Vec<Value>,
    primary_key: &str,
    child_key: &str,
    change: &Transaction<Id, TreePath<Id>>,
    cloner: &dyn CloneStrategy,
) -> bool {
    let path = change.extra.path.as_deref().unwrap_or(&[]);
    let is_add = change.kind == TransactionKind::Add;
    let Some(collection) = resolve_collection(data, path, primary_key, child_key, is_add) else {
        warn!(id = %change.id, depth = path.len(), "parent of changed record not found, skipping");
        return false;
    };

    if is_add {
        collection.push(cloner.clone_value(&change.new_value));
        return true;
    }
    let Some(index) = position_by_key(collection, primary_key, &change.id.to_value()) else {
        warn!(id = %change.id, kind = %change.kind, "changed record not found, skipping");
        return false;
    };
    match change.kind {
        TransactionKind::Delete => {
            collection.remove(index);
        }
        _ => merge_into(&mut collection[index], &change.new_value),
    }
    true
}

fn position_by_key(data: &[Value], primary_key: &str, id: &Value) -> Option<usize> {
    data.iter().position(|row| row.get(primary_key) == Some(id))
}

/// Walk `path` from `collection` down through `child_key` lists. With
/// `create_leaf` a missing list under the last ancestor is created empty.
fn resolve_collection<'a, Id: RecordKey>(
    collection: &'a mut Vec<Value>,
    path: &[Id],
    primary_key: &str,
    child_key: &str,
    create_leaf: bool,
) -> Option<&'a mut Vec<Value>> {
    let Some((ancestor, rest)) = path.split_first() else {
        return Some(collection);
    };
    let key = ancestor.to_value();
    let row = collection
        .iter_mut()
        .find(|row| row.get(primary_key) == Some(&key))?;
    let fields = row.as_object_mut()?;
    if create_leaf && rest.is_empty() && !fields.contains_key(child_key) {
        fields.insert(child_key.to_string(), Value::List(Vec::new()));
    }
    let children = fields.get_mut(child_key)?.as_list_mut()?;
    resolve_collection(children, rest, primary_key, child_key, create_leaf)
}
