use std::collections::VecDeque;

use editlog_core::{Batch, RecordKey, Transaction};

/// Chronological transaction log plus the undo and redo stacks.
///
/// Undo and redo operate on whole batches. When a depth limit is set the
/// oldest undo batch is handed back to the caller on overflow so its effect
/// can be folded into a baseline.
pub struct TransactionLog<Id, X = ()> {
    transactions: Vec<Transaction<Id, X>>,
    undo_stack: VecDeque<Batch<Id, X>>,
    redo_stack: Vec<Batch<Id, X>>,
    max_depth: Option<usize>,
}

impl<Id: RecordKey, X: Clone> TransactionLog<Id, X> {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            transactions: Vec::new(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Record a freshly applied batch. Clears the redo stack. Returns the
    /// evicted oldest batch, if any.
    pub fn push_batch(&mut self, batch: Batch<Id, X>) -> Option<Batch<Id, X>> {
        self.redo_stack.clear();
        self.push_undo(batch)
    }

    /// Record a batch coming back from the redo stack.
    pub fn push_redone(&mut self, batch: Batch<Id, X>) -> Option<Batch<Id, X>> {
        self.push_undo(batch)
    }

    fn push_undo(&mut self, batch: Batch<Id, X>) -> Option<Batch<Id, X>> {
        self.transactions
            .extend(batch.iter().map(|action| action.transaction.clone()));
        self.undo_stack.push_back(batch);
        match self.max_depth {
            Some(max) if self.undo_stack.len() > max => self.undo_stack.pop_front(),
            _ => None,
        }
    }

    /// Pop the newest batch and drop its transactions from the log.
    pub fn pop_undo(&mut self) -> Option<Batch<Id, X>> {
        let batch = self.undo_stack.pop_back()?;
        let keep = self.transactions.len().saturating_sub(batch.len());
        self.transactions.truncate(keep);
        Some(batch)
    }

    pub fn push_redo(&mut self, batch: Batch<Id, X>) {
        self.redo_stack.push(batch);
    }

    pub fn pop_redo(&mut self) -> Option<Batch<Id, X>> {
        self.redo_stack.pop()
    }

    /// Undo batches, oldest first.
    pub fn undo_batches(&self) -> impl Iterator<Item = &Batch<Id, X>> {
        self.undo_stack.iter()
    }

    pub fn transactions(&self, id: Option<&Id>) -> Vec<Transaction<Id, X>> {
        match id {
            Some(id) => self
                .transactions
                .iter()
                .filter(|t| t.id == *id)
                .cloned()
                .collect(),
            None => self.transactions.clone(),
        }
    }

    /// Remove every trace of `id`: its log entries and its actions in undo
    /// and redo batches. Batches left empty are dropped.
    pub fn forget(&mut self, id: &Id) {
        self.transactions.retain(|t| t.id != *id);
        for batch in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            batch.retain(|action| action.transaction.id != *id);
        }
        self.undo_stack.retain(|batch| !batch.is_empty());
        self.redo_stack.retain(|batch| !batch.is_empty());
    }

    pub fn reset(&mut self) {
        self.transactions.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}
