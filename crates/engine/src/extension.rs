//! Flavor hooks layered over the core state transition.
//!
//! Flat record sets use `()`. Tree-shaped record sets use [`TreePath`], which
//! records each state's ancestor chain, cascades deletes to descendants, and
//! keeps child lists out of aggregated changes.

use std::fmt;

use editlog_core::{
    RecordKey, Transaction, TransactionKind, TreePath, Value, merge::strip_lists,
};
use tracing::trace;

use crate::store::StateStore;

pub trait StateExtension<Id>: Clone + Default + PartialEq + fmt::Debug + Sized {
    /// Runs after `transaction` has been folded into `store`.
    fn after_transition(_store: &mut StateStore<Id, Self>, _transaction: &Transaction<Id, Self>) {}

    /// Post-processing for values reported by aggregated changes.
    fn finish_aggregate(_value: &mut Value) {}
}

impl<Id> StateExtension<Id> for () {}

impl<Id: RecordKey> StateExtension<Id> for TreePath<Id> {
    fn after_transition(store: &mut StateStore<Id, Self>, transaction: &Transaction<Id, Self>) {
        // Records from a flat source carry no path.
        if transaction.extra.path.is_none() {
            return;
        }
        if let Some(state) = store.get_mut(&transaction.id) {
            state.extra = transaction.extra.clone();
        }
        if transaction.kind != TransactionKind::Delete {
            return;
        }

        let parent = &transaction.id;
        store.retain(|id, state| {
            if !state.extra.contains(parent) {
                return true;
            }
            match state.kind {
                TransactionKind::Add => {
                    trace!(%id, %parent, "dropping added descendant of deleted record");
                    false
                }
                TransactionKind::Update => {
                    trace!(%id, %parent, "marking descendant of deleted record as deleted");
                    state.kind = TransactionKind::Delete;
                    state.value = Value::Null;
                    true
                }
                TransactionKind::Delete => true,
            }
        });
    }

    fn finish_aggregate(value: &mut Value) {
        strip_lists(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{apply, validate};
    use editlog_core::{DeepClone, RecordId};

    type Tx = Transaction<RecordId, TreePath<RecordId>>;
    type Store = StateStore<RecordId, TreePath<RecordId>>;

    fn run(store: &mut Store, tx: Tx, record_ref: Option<Value>) {
        validate(store, &tx, record_ref.as_ref(), false).unwrap();
        apply(store, &tx, record_ref.as_ref(), &DeepClone);
    }

    #[test]
    fn path_follows_latest_transaction() {
        let mut store = Store::new();
        run(&mut store, Tx::add(1, "Add row").with_path(["P1", "P2"]), None);
        let state = store.get(&RecordId::from(1)).unwrap();
        assert_eq!(
            state.extra.path,
            Some(vec![RecordId::from("P1"), RecordId::from("P2")])
        );

        run(
            &mut store,
            Tx::update(1, "Updated row").with_path(["P1", "P2", "P3"]),
            Some("Update row".into()),
        );
        let state = store.get(&RecordId::from(1)).unwrap();
        assert_eq!(state.extra.path.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn deleting_parent_drops_added_children() {
        let mut store = Store::new();
        run(&mut store, Tx::add(1, "Parent row").with_path(Vec::<i64>::new()), None);
        run(&mut store, Tx::add(2, "Child row").with_path([1]), None);
        run(&mut store, Tx::delete(1).with_path(Vec::<i64>::new()), None);
        assert!(store.is_empty());
    }

    #[test]
    fn deleting_parent_marks_updated_children_deleted() {
        let mut store = Store::new();
        run(
            &mut store,
            Tx::update(1, "Parent row").with_path(Vec::<i64>::new()),
            Some("Original value".into()),
        );
        run(
            &mut store,
            Tx::update(2, "Child row").with_path([1]),
            Some("Original Value".into()),
        );
        run(&mut store, Tx::delete(1).with_path(Vec::<i64>::new()), None);

        let parent = store.get(&RecordId::from(1)).unwrap();
        assert_eq!(parent.kind, TransactionKind::Delete);
        let child = store.get(&RecordId::from(2)).unwrap();
        assert_eq!(child.kind, TransactionKind::Delete);
        assert!(child.value.is_null());
    }

    #[test]
    fn pathless_delete_does_not_cascade() {
        let mut store = Store::new();
        run(&mut store, Tx::add(1, "Parent row"), None);
        run(&mut store, Tx::add(2, "Child row").with_path([1]), None);
        run(&mut store, Tx::delete(1), None);
        assert!(store.get(&RecordId::from(1)).is_none());
        assert!(store.get(&RecordId::from(2)).is_some());
    }

    #[test]
    fn aggregate_hook_strips_children() {
        let mut value = Value::object([
            ("ID", Value::from(999)),
            ("Employees", Value::List(vec![Value::object([("ID", Value::from(1))])])),
        ]);
        <TreePath<RecordId> as StateExtension<RecordId>>::finish_aggregate(&mut value);
        assert_eq!(value, Value::object([("ID", Value::from(999))]));

        let mut flat = value.clone();
        <() as StateExtension<RecordId>>::finish_aggregate(&mut flat);
        assert_eq!(flat, value);
    }
}
