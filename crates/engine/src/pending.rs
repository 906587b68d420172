use editlog_core::{Action, RecordKey};

use crate::store::StateStore;

/// Isolated state store and action list used while the service is in
/// pending mode. Nothing here reaches the main log, the undo/redo stacks,
/// or subscribers until the buffer is committed.
pub struct PendingBuffer<Id, X = ()> {
    active: bool,
    states: StateStore<Id, X>,
    actions: Vec<Action<Id, X>>,
}

impl<Id, X> Default for PendingBuffer<Id, X> {
    fn default() -> Self {
        Self {
            active: false,
            states: StateStore::default(),
            actions: Vec::new(),
        }
    }
}

impl<Id: RecordKey, X> PendingBuffer<Id, X> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enter pending mode. Re-entering keeps what has accumulated so far.
    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn states(&self) -> &StateStore<Id, X> {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut StateStore<Id, X> {
        &mut self.states
    }

    pub fn record(&mut self, action: Action<Id, X>) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Leave pending mode, handing back the buffered states and actions.
    pub fn finish(&mut self) -> (StateStore<Id, X>, Vec<Action<Id, X>>) {
        self.active = false;
        (
            std::mem::take(&mut self.states),
            std::mem::take(&mut self.actions),
        )
    }
}
