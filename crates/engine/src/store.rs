use std::collections::{BTreeMap, HashMap};

use editlog_core::{
    CloneStrategy, RecordKey, State, Transaction, TransactionKind, Value,
    merge::{merge_into, strip_unchanged},
};
use tracing::trace;

use crate::error::TransactionError;
use crate::extension::StateExtension;

/// Map from record id to its current [`State`], iterated in insertion order.
#[derive(Debug, Clone)]
pub struct StateStore<Id, X = ()> {
    entries: BTreeMap<u64, (Id, State<X>)>,
    index: HashMap<Id, u64>,
    next_seq: u64,
}

impl<Id, X> Default for StateStore<Id, X> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<Id: RecordKey, X> StateStore<Id, X> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Id) -> Option<&State<X>> {
        let seq = self.index.get(id)?;
        self.entries.get(seq).map(|(_, state)| state)
    }

    pub fn get_mut(&mut self, id: &Id) -> Option<&mut State<X>> {
        let seq = self.index.get(id)?;
        self.entries.get_mut(seq).map(|(_, state)| state)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.index.contains_key(id)
    }

    /// Insert or replace. A replaced state keeps its position.
    pub fn insert(&mut self, id: Id, state: State<X>) {
        if let Some(seq) = self.index.get(&id) {
            if let Some(entry) = self.entries.get_mut(seq) {
                entry.1 = state;
            }
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(id.clone(), seq);
        self.entries.insert(seq, (id, state));
    }

    pub fn remove(&mut self, id: &Id) -> Option<State<X>> {
        let seq = self.index.remove(id)?;
        self.entries.remove(&seq).map(|(_, state)| state)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, &State<X>)> {
        self.entries.values().map(|(id, state)| (id, state))
    }

    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.entries.values().map(|(id, _)| id)
    }

    /// Keep only the states for which `keep` returns true. `keep` may also
    /// edit the states it keeps.
    pub fn retain(&mut self, mut keep: impl FnMut(&Id, &mut State<X>) -> bool) {
        let index = &mut self.index;
        self.entries.retain(|_, (id, state)| {
            let kept = keep(id, state);
            if !kept {
                index.remove(id);
            }
            kept
        });
    }
}

impl<Id: RecordKey, X: PartialEq> PartialEq for StateStore<Id, X> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

/// Check `transaction` against `store` without touching it.
///
/// The first update or delete of a record must carry the record as it exists
/// in the data source, except inside a pending buffer.
pub fn validate<Id: RecordKey, X>(
    store: &StateStore<Id, X>,
    transaction: &Transaction<Id, X>,
    record_ref: Option<&Value>,
    pending: bool,
) -> Result<(), TransactionError> {
    let state = store.get(&transaction.id);
    match transaction.kind {
        TransactionKind::Add => {
            if state.is_some() {
                return Err(TransactionError::DuplicateAdd {
                    id: transaction.id.to_string(),
                });
            }
        }
        TransactionKind::Update | TransactionKind::Delete => {
            match state {
                Some(state) if state.kind == TransactionKind::Delete => {
                    return Err(TransactionError::AlreadyDeleted {
                        id: transaction.id.to_string(),
                    });
                }
                None if record_ref.is_none() && !pending => {
                    return Err(TransactionError::MissingRecordRef {
                        id: transaction.id.to_string(),
                        kind: transaction.kind,
                    });
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Fold `transaction` into `store`.
///
/// | existing | incoming | result |
/// |---|---|---|
/// | none | any | new state; adds drop `record_ref` |
/// | add | delete | state removed |
/// | any | update | new value merged into the state's value |
/// | update | delete | value replaced, kind becomes delete |
///
/// Replays skip validation, so an add over an existing state replaces its
/// value. Afterwards fields that match the source record are dropped and a
/// state left without changes is removed; then the extension hook runs.
pub fn apply<Id: RecordKey, X: StateExtension<Id>>(
    store: &mut StateStore<Id, X>,
    transaction: &Transaction<Id, X>,
    record_ref: Option<&Value>,
    cloner: &dyn CloneStrategy,
) {
    let id = &transaction.id;
    let incoming = &transaction.new_value;

    match store.get_mut(id) {
        None => {
            let (value, record_ref) = match transaction.kind {
                TransactionKind::Add => (cloner.clone_value(incoming), None),
                TransactionKind::Update => (cloner.clone_value(incoming), record_ref.cloned()),
                TransactionKind::Delete => (incoming.clone(), record_ref.cloned()),
            };
            store.insert(
                id.clone(),
                State {
                    value,
                    record_ref,
                    kind: transaction.kind,
                    extra: X::default(),
                },
            );
        }
        Some(state) => match (state.kind, transaction.kind) {
            (TransactionKind::Add, TransactionKind::Delete) => {
                store.remove(id);
                trace!(%id, "added record deleted before commit");
            }
            (_, TransactionKind::Update) => merge_into(&mut state.value, incoming),
            (_, TransactionKind::Delete) => {
                state.value = incoming.clone();
                state.kind = TransactionKind::Delete;
            }
            (_, TransactionKind::Add) => state.value = cloner.clone_value(incoming),
        },
    }

    clean_state(store, id);
    X::after_transition(store, transaction);
}

/// Remove fields that match the source record, and the state itself when
/// nothing is left to change.
fn clean_state<Id: RecordKey, X>(store: &mut StateStore<Id, X>, id: &Id) {
    let Some(state) = store.get_mut(id) else {
        return;
    };
    let Some(record_ref) = state.record_ref.as_ref() else {
        return;
    };
    if state.value.is_null() {
        return;
    }

    let unchanged = strip_unchanged(&mut state.value, record_ref);
    let drop_state = if state.value.is_object() {
        unchanged && state.kind != TransactionKind::Delete
    } else {
        unchanged
    };
    if drop_state {
        store.remove(id);
        trace!(%id, "state reverted to source record, removed");
    }
}
