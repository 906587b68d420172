pub mod config;
pub mod error;
pub mod events;
pub mod extension;
pub mod log;
pub mod pending;
pub mod reconcile;
pub mod store;

pub use config::EngineConfig;
pub use error::{EngineError, TransactionError};
pub use events::{EventOrigin, StateUpdate, SubscriptionId};
pub use extension::StateExtension;
pub use store::StateStore;

use editlog_core::{
    Action, Batch, CloneStrategy, DeepClone, RecordId, RecordKey, State, Transaction, TreePath,
    Value, encode_changes, merge::merge_values,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::events::Subscribers;
use crate::log::TransactionLog;
use crate::pending::PendingBuffer;

pub type HierarchicalTransaction<Id = RecordId> = Transaction<Id, TreePath<Id>>;
pub type HierarchicalTransactionService<Id = RecordId> = TransactionService<Id, TreePath<Id>>;

/// Tracks uncommitted edits to the records of one data source.
///
/// Every accepted [`Transaction`] is folded into a per-record [`State`],
/// appended to the transaction log and pushed as a batch onto the undo
/// stack. Nothing touches the data source until [`commit`](Self::commit).
pub struct TransactionService<Id = RecordId, X = ()> {
    config: EngineConfig,
    cloner: Box<dyn CloneStrategy>,
    states: StateStore<Id, X>,
    /// Effect of batches evicted from a bounded undo stack. Undo rebuilds
    /// from here instead of from empty.
    baseline: StateStore<Id, X>,
    log: TransactionLog<Id, X>,
    pending: PendingBuffer<Id, X>,
    subscribers: Subscribers<Id, X>,
}

impl<Id: RecordKey, X: StateExtension<Id>> Default for TransactionService<Id, X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: RecordKey, X: StateExtension<Id>> TransactionService<Id, X> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_clone_strategy(config, DeepClone)
    }

    pub fn with_clone_strategy(config: EngineConfig, cloner: impl CloneStrategy + 'static) -> Self {
        Self {
            config,
            cloner: Box::new(cloner),
            states: StateStore::new(),
            baseline: StateStore::new(),
            log: TransactionLog::new(config.max_undo_depth),
            pending: PendingBuffer::new(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Validate and record one transaction.
    ///
    /// `record_ref` is the record as it exists in the data source. It is
    /// required for the first update or delete of a record outside pending
    /// mode. A rejected transaction leaves the service unchanged.
    pub fn add(
        &mut self,
        transaction: Transaction<Id, X>,
        record_ref: Option<Value>,
    ) -> Result<(), TransactionError> {
        let pending = self.pending.is_active();
        let target = if pending {
            self.pending.states()
        } else {
            &self.states
        };
        if let Err(err) = store::validate(target, &transaction, record_ref.as_ref(), pending) {
            warn!(id = %transaction.id, kind = %transaction.kind, error = %err, "transaction rejected");
            return Err(err);
        }

        debug!(id = %transaction.id, kind = %transaction.kind, pending, "transaction accepted");
        if pending {
            store::apply(
                self.pending.states_mut(),
                &transaction,
                record_ref.as_ref(),
                self.cloner.as_ref(),
            );
            self.pending.record(Action {
                transaction,
                record_ref,
            });
            return Ok(());
        }

        store::apply(
            &mut self.states,
            &transaction,
            record_ref.as_ref(),
            self.cloner.as_ref(),
        );
        let batch = vec![Action {
            transaction,
            record_ref,
        }];
        self.notify(EventOrigin::Add, &batch);
        let evicted = self.log.push_batch(batch);
        self.fold_into_baseline(evicted);
        Ok(())
    }

    /// Revert the most recent batch. Does nothing when there is nothing to
    /// undo.
    pub fn undo(&mut self) {
        let Some(batch) = self.log.pop_undo() else {
            return;
        };
        debug!(actions = batch.len(), remaining = self.log.undo_depth(), "undo");

        // Merges have no inverse, so rebuild from the baseline.
        let mut states = self.baseline.clone();
        for action in self.log.undo_batches().flatten() {
            store::apply(
                &mut states,
                &action.transaction,
                action.record_ref.as_ref(),
                self.cloner.as_ref(),
            );
        }
        self.states = states;

        self.notify(EventOrigin::Undo, &batch);
        self.log.push_redo(batch);
    }

    /// Re-apply the most recently undone batch. Does nothing when there is
    /// nothing to redo.
    pub fn redo(&mut self) {
        let Some(batch) = self.log.pop_redo() else {
            return;
        };
        debug!(actions = batch.len(), "redo");

        for action in &batch {
            store::apply(
                &mut self.states,
                &action.transaction,
                action.record_ref.as_ref(),
                self.cloner.as_ref(),
            );
        }
        self.notify(EventOrigin::Redo, &batch);
        let evicted = self.log.push_redone(batch);
        self.fold_into_baseline(evicted);
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.log.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.log.redo_depth()
    }

    fn fold_into_baseline(&mut self, evicted: Option<Batch<Id, X>>) {
        let Some(batch) = evicted else {
            return;
        };
        debug!(actions = batch.len(), "undo depth exceeded, folding oldest batch into baseline");
        for action in &batch {
            store::apply(
                &mut self.baseline,
                &action.transaction,
                action.record_ref.as_ref(),
                self.cloner.as_ref(),
            );
        }
    }

    // ========================================================================
    // Pending mode
    // ========================================================================

    /// Divert subsequent transactions into an isolated buffer.
    pub fn start_pending(&mut self) {
        debug!(buffered = self.pending.len(), "pending mode started");
        self.pending.start();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_active()
    }

    /// Leave pending mode. With `commit` the buffered transactions are
    /// replayed against the main store as a single undo batch; otherwise
    /// they are discarded.
    pub fn end_pending(&mut self, commit: bool) {
        let (pending_states, actions) = self.pending.finish();
        debug!(commit, actions = actions.len(), "pending mode ended");
        if !commit || actions.is_empty() {
            return;
        }

        let mut batch = Vec::with_capacity(actions.len());
        for action in actions {
            let record_ref = pending_states
                .get(&action.transaction.id)
                .and_then(|state| state.record_ref.clone())
                .or(action.record_ref);
            store::apply(
                &mut self.states,
                &action.transaction,
                record_ref.as_ref(),
                self.cloner.as_ref(),
            );
            batch.push(Action {
                transaction: action.transaction,
                record_ref,
            });
        }
        self.notify(EventOrigin::End, &batch);
        let evicted = self.log.push_batch(batch);
        self.fold_into_baseline(evicted);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Transactions in the order they were recorded, optionally only those
    /// for `id`. Pending transactions are not included.
    pub fn get_transaction_log(&self, id: Option<&Id>) -> Vec<Transaction<Id, X>> {
        self.log.transactions(id)
    }

    pub fn get_state(&self, id: &Id) -> Option<&State<X>> {
        self.states.get(id)
    }

    /// Net value of all changes to `id`, pending ones taking precedence.
    /// With `merge_with_source` the changes are laid over the source record.
    pub fn get_aggregated_value(&self, id: &Id, merge_with_source: bool) -> Option<Value> {
        let state = self.states.get(id);
        let pending_state = self.pending.states().get(id);
        if state.is_none() && pending_state.is_none() {
            return None;
        }

        let cloner = self.cloner.as_ref();
        let value = merge_values(
            cloner,
            state.map(|s| &s.value),
            pending_state.map(|s| &s.value),
        );
        if !merge_with_source {
            return value;
        }
        let record_ref = state
            .or(pending_state)
            .and_then(|s| s.record_ref.as_ref());
        merge_values(cloner, record_ref, value.as_ref())
    }

    /// One synthetic transaction per changed record, in the order records
    /// were first changed.
    pub fn get_aggregated_changes(&self, merge_with_source: bool) -> Vec<Transaction<Id, X>> {
        let cloner = self.cloner.as_ref();
        self.states
            .iter()
            .map(|(id, state)| {
                let mut new_value = if merge_with_source {
                    merge_values(cloner, state.record_ref.as_ref(), Some(&state.value))
                        .unwrap_or_default()
                } else {
                    cloner.clone_value(&state.value)
                };
                X::finish_aggregate(&mut new_value);
                Transaction {
                    id: id.clone(),
                    kind: state.kind,
                    new_value,
                    extra: state.extra.clone(),
                }
            })
            .collect()
    }

    /// Aggregated changes encoded as MessagePack, for shipping to a backend.
    pub fn export_changes(&self, merge_with_source: bool) -> Result<Vec<u8>, EngineError>
    where
        Id: Serialize,
        X: Serialize,
    {
        Ok(encode_changes(&self.get_aggregated_changes(merge_with_source))?)
    }

    // ========================================================================
    // Commit and clear
    // ========================================================================

    /// Write changes into `data`, locating each record by equality with its
    /// record reference, then clear what was written. `None` commits
    /// everything.
    pub fn commit(&mut self, data: &mut Vec<Value>, id: Option<&Id>) {
        let cloner = self.cloner.as_ref();
        let touched = match id {
            Some(id) => usize::from(
                self.states
                    .get(id)
                    .is_some_and(|state| reconcile::reconcile_flat(data, state, cloner)),
            ),
            None => self
                .states
                .iter()
                .filter(|(_, state)| reconcile::reconcile_flat(data, state, cloner))
                .count(),
        };
        debug!(touched, "committed");
        self.clear(id);
    }

    /// Like [`commit`](Self::commit), but records are located by their
    /// `primary_key` field.
    pub fn commit_keyed(&mut self, data: &mut Vec<Value>, primary_key: &str, id: Option<&Id>) {
        let cloner = self.cloner.as_ref();
        let mut touched = 0;
        for (state_id, state) in self.states.iter() {
            if id.is_some_and(|id| id != state_id) {
                continue;
            }
            if reconcile::reconcile_keyed(data, primary_key, &state_id.to_value(), state, cloner) {
                touched += 1;
            }
        }
        debug!(touched, primary_key, "committed");
        self.clear(id);
    }

    /// Forget changes to `id`, or every change when `id` is `None`. Always
    /// notifies.
    pub fn clear(&mut self, id: Option<&Id>) {
        match id {
            Some(id) => {
                self.states.remove(id);
                self.baseline.remove(id);
                self.log.forget(id);
            }
            None => {
                self.states.clear();
                self.baseline.clear();
                self.log.reset();
            }
        }
        self.notify(EventOrigin::Clear, &[]);
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StateUpdate<Id, X>) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(Box::new(listener))
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn notify(&mut self, origin: EventOrigin, actions: &[Action<Id, X>]) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.emit(origin, actions.to_vec());
    }
}

impl<Id: RecordKey> TransactionService<Id, TreePath<Id>> {
    /// Write changes into a tree-shaped `data`, following each record's path
    /// through nested `child_key` lists matched by `primary_key`, then clear
    /// what was written.
    pub fn commit_tree(
        &mut self,
        data: &mut Vec<Value>,
        primary_key: &str,
        child_key: &str,
        id: Option<&Id>,
    ) {
        let changes = self.get_aggregated_changes(true);
        let cloner = self.cloner.as_ref();
        let touched = changes
            .iter()
            .filter(|change| id.is_none_or(|id| *id == change.id))
            .filter(|change| reconcile::reconcile_tree(data, primary_key, child_key, change, cloner))
            .count();
        debug!(touched, primary_key, child_key, "committed tree");
        self.clear(id);
    }
}
