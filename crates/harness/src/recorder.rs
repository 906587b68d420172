use std::cell::RefCell;
use std::rc::Rc;

use editlog_core::RecordKey;
use editlog_engine::{EventOrigin, StateExtension, StateUpdate, SubscriptionId, TransactionService};

/// Captures every notification a service emits.
pub struct EventRecorder<Id, X = ()> {
    pub subscription: SubscriptionId,
    updates: Rc<RefCell<Vec<StateUpdate<Id, X>>>>,
}

impl<Id, X> EventRecorder<Id, X>
where
    Id: RecordKey + 'static,
    X: StateExtension<Id> + 'static,
{
    pub fn attach(service: &mut TransactionService<Id, X>) -> Self {
        let updates = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&updates);
        let subscription = service.subscribe(move |update| sink.borrow_mut().push(update.clone()));
        Self {
            subscription,
            updates,
        }
    }

    pub fn count(&self) -> usize {
        self.updates.borrow().len()
    }

    pub fn origins(&self) -> Vec<EventOrigin> {
        self.updates.borrow().iter().map(|u| u.origin).collect()
    }

    pub fn last(&self) -> Option<StateUpdate<Id, X>> {
        self.updates.borrow().last().cloned()
    }
}
