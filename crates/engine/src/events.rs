use editlog_core::Batch;

/// Which operation produced a [`StateUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    Add,
    Undo,
    Redo,
    Clear,
    End,
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate<Id, X = ()> {
    pub origin: EventOrigin,
    /// The actions involved. Empty for `Clear`.
    pub actions: Batch<Id, X>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<Id, X> = Box<dyn FnMut(&StateUpdate<Id, X>)>;

pub(crate) struct Subscribers<Id, X> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<Id, X>)>,
}

impl<Id, X> Default for Subscribers<Id, X> {
    fn default() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }
}

impl<Id, X> Subscribers<Id, X> {
    pub(crate) fn subscribe(&mut self, listener: Listener<Id, X>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub(crate) fn emit(&mut self, origin: EventOrigin, actions: Batch<Id, X>) {
        let update = StateUpdate { origin, actions };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&update);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editlog_core::RecordId;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emit_reaches_live_subscribers_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subs: Subscribers<RecordId, ()> = Subscribers::default();

        let sink = Rc::clone(&seen);
        let first = subs.subscribe(Box::new(move |u: &StateUpdate<RecordId>| {
            sink.borrow_mut().push(u.origin)
        }));
        let sink = Rc::clone(&seen);
        subs.subscribe(Box::new(move |u: &StateUpdate<RecordId>| {
            sink.borrow_mut().push(u.origin)
        }));

        subs.emit(EventOrigin::Add, Vec::new());
        assert_eq!(seen.borrow().len(), 2);

        assert!(subs.unsubscribe(first));
        assert!(!subs.unsubscribe(first));
        subs.emit(EventOrigin::Clear, Vec::new());
        assert_eq!(*seen.borrow(), vec![EventOrigin::Add, EventOrigin::Add, EventOrigin::Clear]);
        assert!(!subs.is_empty());
    }
}
