use editlog_core::{RecordId, State, Transaction, TransactionKind, Value};
use editlog_engine::{EventOrigin, TransactionError, TransactionService};
use editlog_harness::EventRecorder;
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

type Tx = Transaction<RecordId>;

fn key(id: impl Into<RecordId>) -> RecordId {
    id.into()
}

fn obj(fields: &[(&str, Value)]) -> Value {
    Value::object(fields.iter().cloned())
}

fn mixed_log() -> Vec<Tx> {
    vec![
        Tx::add("1", 1),
        Tx::add("2", 2),
        Tx::add("3", 3),
        Tx::update("1", 4),
        Tx::add("5", 5),
        Tx::add("6", 6),
        Tx::new("2", TransactionKind::Delete, 7),
        Tx::add("8", 8),
        Tx::add("9", 9),
        Tx::update("8", 10),
    ]
}

// ============================================================================
// Transaction log and validation
// ============================================================================

#[test]
fn fresh_service_is_empty() -> Result<(), Box<dyn std::error::Error>> {
    let service: TransactionService = TransactionService::new();
    assert!(service.get_transaction_log(None).is_empty());
    assert!(service.get_aggregated_changes(true).is_empty());
    assert!(!service.can_undo());
    assert!(!service.can_redo());
    assert!(!service.is_pending());
    Ok(())
}

#[test]
fn transactions_are_logged_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    for (index, tx) in mixed_log().into_iter().enumerate() {
        service.add(tx.clone(), None)?;
        assert_eq!(service.get_transaction_log(Some(&tx.id)).pop(), Some(tx));
        assert_eq!(service.get_transaction_log(None).len(), index + 1);
        assert!(!service.can_redo());
    }
    assert!(service.get_transaction_log(Some(&key("100"))).is_empty());
    Ok(())
}

#[test]
fn duplicate_add_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    for tx in mixed_log() {
        service.add(tx, None)?;
    }

    let err = service.add(Tx::add("6", 6), None).unwrap_err();
    assert_eq!(err, TransactionError::DuplicateAdd { id: "6".into() });
    assert_eq!(
        err.to_string(),
        "cannot add this transaction: transaction with id 6 has already been added"
    );
    assert_eq!(service.get_transaction_log(None).len(), 10);
    Ok(())
}

#[test]
fn first_update_needs_record_ref() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    for tx in mixed_log() {
        service.add(tx, None)?;
    }

    // "2" was added then deleted, so no state is left to update.
    let err = service.add(Tx::new("2", TransactionKind::Delete, 107), None).unwrap_err();
    assert!(matches!(
        err,
        TransactionError::MissingRecordRef { kind: TransactionKind::Delete, .. }
    ));
    assert!(err.to_string().contains("record reference is mandatory"));
    Ok(())
}

#[test]
fn deleted_record_rejects_further_changes() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    let record_ref = obj(&[("key", "Key1".into()), ("value", 1.into())]);
    service.add(Tx::delete("Key1"), Some(record_ref))?;

    for tx in [Tx::delete("Key1"), Tx::update("Key1", 5)] {
        let err = service.add(tx, None).unwrap_err();
        assert_eq!(err, TransactionError::AlreadyDeleted { id: "Key1".into() });
    }
    assert_eq!(service.get_transaction_log(None), vec![Tx::delete("Key1")]);
    Ok(())
}

// ============================================================================
// Add paths with notifications
// ============================================================================

#[test]
fn add_paths_emit_expected_notifications() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    let events = EventRecorder::attach(&mut service);
    let add = Tx::add(0, 1);
    let added_state = State {
        value: Value::from(1),
        record_ref: None,
        kind: TransactionKind::Add,
        extra: (),
    };

    service.add(add.clone(), None)?;
    assert_eq!(service.get_aggregated_value(&key(0), true), Some(Value::from(1)));
    assert_eq!(service.get_transaction_log(None), vec![add.clone()]);
    assert_eq!(service.get_state(&key(0)), Some(&added_state));
    assert_eq!(events.count(), 1);

    service.clear(None);
    assert!(service.get_state(&key(0)).is_none());
    assert_eq!(service.get_aggregated_value(&key(0), true), None);
    assert!(service.get_aggregated_changes(true).is_empty());
    assert_eq!(events.count(), 2);

    // add, undo
    service.add(add.clone(), None)?;
    service.undo();
    assert!(service.get_transaction_log(None).is_empty());
    assert!(service.get_aggregated_changes(true).is_empty());
    assert_eq!(events.count(), 4);
    service.clear(None);

    // add, undo, redo
    service.add(add.clone(), None)?;
    service.undo();
    service.redo();
    assert_eq!(service.get_transaction_log(None), vec![add.clone()]);
    assert_eq!(service.get_state(&key(0)), Some(&added_state));
    assert_eq!(events.count(), 8);
    service.clear(None);

    // add, delete
    let delete = Tx::new(0, TransactionKind::Delete, 1);
    service.add(add.clone(), None)?;
    service.add(delete.clone(), None)?;
    assert_eq!(service.get_transaction_log(None), vec![add.clone(), delete.clone()]);
    assert!(service.get_aggregated_changes(true).is_empty());
    assert_eq!(events.count(), 11);
    service.clear(None);

    // add, delete, undo
    service.add(add.clone(), None)?;
    service.add(delete.clone(), None)?;
    service.undo();
    assert_eq!(service.get_transaction_log(None), vec![add.clone()]);
    assert_eq!(service.get_state(&key(0)), Some(&added_state));
    assert_eq!(events.count(), 15);
    service.clear(None);

    // add, delete, undo, undo
    service.add(add.clone(), None)?;
    service.add(delete.clone(), None)?;
    service.undo();
    service.undo();
    assert!(service.get_transaction_log(None).is_empty());
    assert!(service.get_aggregated_changes(true).is_empty());
    assert_eq!(events.count(), 20);
    service.clear(None);

    // add, update, undo, redo
    let update = Tx::update(0, 2);
    service.add(add.clone(), None)?;
    service.add(update.clone(), None)?;
    service.undo();
    assert_eq!(service.get_state(&key(0)), Some(&added_state));
    service.redo();
    assert_eq!(service.get_transaction_log(None), vec![add, update]);
    let state = service.get_state(&key(0)).ok_or("missing state")?;
    assert_eq!(state.value, Value::from(2));
    assert_eq!(state.kind, TransactionKind::Add);
    assert_eq!(events.count(), 25);

    assert_eq!(
        events.origins()[20..],
        [
            EventOrigin::Clear,
            EventOrigin::Add,
            EventOrigin::Add,
            EventOrigin::Undo,
            EventOrigin::Redo,
        ]
    );
    Ok(())
}

#[test]
fn empty_undo_and_redo_are_silent() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    let events = EventRecorder::attach(&mut service);
    service.undo();
    service.redo();
    assert_eq!(events.count(), 0);
    Ok(())
}

#[test]
fn unsubscribed_listener_stops_receiving() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    let events = EventRecorder::attach(&mut service);
    service.add(Tx::add(1, 1), None)?;
    assert!(service.unsubscribe(events.subscription));
    service.add(Tx::add(2, 2), None)?;
    assert_eq!(events.count(), 1);

    let last = events.last().ok_or("no notification")?;
    assert_eq!(last.origin, EventOrigin::Add);
    assert_eq!(last.actions.len(), 1);
    assert_eq!(last.actions[0].transaction, Tx::add(1, 1));
    Ok(())
}

// ============================================================================
// Delete and update paths
// ============================================================================

#[test]
fn delete_paths() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    let record_ref = obj(&[("key", "Key1".into()), ("value", 1.into())]);
    let delete = Tx::delete("Key1");
    let deleted_state = State {
        value: Value::Null,
        record_ref: Some(record_ref.clone()),
        kind: TransactionKind::Delete,
        extra: (),
    };

    service.add(delete.clone(), Some(record_ref.clone()))?;
    assert_eq!(service.get_state(&key("Key1")), Some(&deleted_state));
    service.clear(None);
    assert!(service.get_aggregated_changes(true).is_empty());

    service.add(delete.clone(), Some(record_ref.clone()))?;
    service.undo();
    assert!(service.get_transaction_log(None).is_empty());
    assert!(service.get_aggregated_changes(true).is_empty());

    service.redo();
    assert_eq!(service.get_transaction_log(None), vec![delete]);
    assert_eq!(service.get_state(&key("Key1")), Some(&deleted_state));
    Ok(())
}

#[test]
fn update_paths() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    let record_ref = obj(&[("key", "Key1".into()), ("value", 1.into())]);
    let update = Tx::update("Key1", obj(&[("key", "Key1".into()), ("value", 2.into())]));
    let update2 = Tx::update("Key1", obj(&[("key", "Key1".into()), ("value", 3.into())]));
    let state_with = |value: i64, kind| State {
        value: obj(&[("value", value.into())]),
        record_ref: Some(record_ref.clone()),
        kind,
        extra: (),
    };

    service.add(update.clone(), Some(record_ref.clone()))?;
    assert_eq!(
        service.get_aggregated_value(&key("Key1"), true),
        Some(update.new_value.clone())
    );
    assert_eq!(service.get_state(&key("Key1")), Some(&state_with(2, TransactionKind::Update)));
    service.clear(None);
    assert_eq!(service.get_aggregated_value(&key("Key1"), true), None);

    // update, update
    service.add(update.clone(), Some(record_ref.clone()))?;
    service.add(update2.clone(), Some(record_ref.clone()))?;
    assert_eq!(service.get_transaction_log(None), vec![update.clone(), update2.clone()]);
    assert_eq!(service.get_state(&key("Key1")), Some(&state_with(3, TransactionKind::Update)));

    // undo, redo
    service.undo();
    assert_eq!(service.get_transaction_log(Some(&key("Key1"))).pop(), Some(update.clone()));
    assert_eq!(service.get_state(&key("Key1")), Some(&state_with(2, TransactionKind::Update)));
    service.redo();
    assert_eq!(service.get_state(&key("Key1")), Some(&state_with(3, TransactionKind::Update)));
    service.clear(None);

    // Updating back to the source record removes the state.
    service.add(update.clone(), Some(record_ref.clone()))?;
    service.add(Tx::update("Key1", record_ref.clone()), Some(record_ref.clone()))?;
    assert_eq!(service.get_transaction_log(None).len(), 2);
    assert!(service.get_state(&key("Key1")).is_none());
    assert!(service.get_aggregated_changes(false).is_empty());
    service.clear(None);

    // update, delete, undo, redo
    let delete = Tx::delete("Key1");
    service.add(update.clone(), Some(record_ref.clone()))?;
    service.add(delete.clone(), None)?;
    let deleted = State {
        value: Value::Null,
        record_ref: Some(record_ref.clone()),
        kind: TransactionKind::Delete,
        extra: (),
    };
    assert_eq!(service.get_state(&key("Key1")), Some(&deleted));
    service.undo();
    assert_eq!(service.get_transaction_log(None), vec![update.clone()]);
    assert_eq!(service.get_state(&key("Key1")), Some(&state_with(2, TransactionKind::Update)));
    service.redo();
    assert_eq!(service.get_transaction_log(None), vec![update, delete]);
    assert_eq!(service.get_state(&key("Key1")), Some(&deleted));
    Ok(())
}

// ============================================================================
// Undo/redo stacks and clear
// ============================================================================

#[test]
fn undo_redo_availability() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    service.add(Tx::add(1, obj(&[("Category", "Something".into())])), None)?;
    assert!(service.can_undo() && !service.can_redo());
    service.add(Tx::add(2, obj(&[("Category", "Something 2".into())])), None)?;
    assert!(service.can_undo() && !service.can_redo());

    service.undo();
    assert!(service.can_undo() && service.can_redo());
    service.undo();
    assert!(!service.can_undo() && service.can_redo());
    service.redo();
    assert!(service.can_undo() && service.can_redo());
    service.redo();
    assert!(service.can_undo() && !service.can_redo());
    assert_eq!((service.undo_depth(), service.redo_depth()), (2, 0));
    Ok(())
}

#[test]
fn new_transaction_discards_redo() -> Result<(), Box<dyn std::error::Error>> {
    let mut service: TransactionService = TransactionService::new();
    service.add(Tx::add(1, 1), None)?;
    service.undo();
    assert!(service.can_redo());
    service.add(Tx::add(2, 2), None)?;
    assert!(!service.can_redo());
    Ok(())
}

#[test]
fn clear_single_record() -> Result<(), Box<dyn std::error::Error>> {
    let data = editlog_harness::product_data(50);
    let mut service: TransactionService = TransactionService::new();
    let category = |v: &str| obj(&[("Category", v.into())]);

    service.add(Tx::update(1, category("Some new value")), Some(data[1].clone()))?;
    service.add(Tx::update(2, category("Some new value")), Some(data[2].clone()))?;
    service.add(
        Tx::update(2, obj(&[("Items", "Some new value".into())])),
        Some(data[2].clone()),
    )?;
    service.add(Tx::update(1, category("Some very new value")), Some(data[1].clone()))?;
    service.add(Tx::update(10, category("Some new value")), Some(data[10].clone()))?;
    assert_eq!(service.get_transaction_log(None).len(), 5);
    assert_eq!(service.get_aggregated_changes(true).len(), 3);

    let events = EventRecorder::attach(&mut service);
    service.clear(Some(&key(1)));
    assert_eq!(service.get_transaction_log(None).len(), 3);
    assert_eq!(service.get_aggregated_changes(true).len(), 2);
    assert!(service.can_undo() && !service.can_redo());

    for unknown in [key("FAKE ID"), key(20)] {
        service.clear(Some(&unknown));
        assert_eq!(service.get_transaction_log(None).len(), 3);
        assert_eq!(service.get_aggregated_changes(true).len(), 2);
    }

    service.clear(Some(&key(10)));
    assert_eq!(service.get_transaction_log(None).len(), 2);
    assert_eq!(service.get_aggregated_changes(true).len(), 1);
    assert!(service.can_undo());
    assert_eq!(service.undo_depth(), 2);

    assert_eq!(events.origins(), vec![EventOrigin::Clear; 4]);
    assert!(events.last().is_some_and(|u| u.actions.is_empty()));
    Ok(())
}

#[test]
fn clearing_one_record_keeps_redo_for_others() -> Result<(), Box<dyn std::error::Error>> {
    let mut data = editlog_harness::product_data(5);
    let mut service: TransactionService = TransactionService::new();
    service.add(Tx::add(100, obj(&[("ID", 100.into())])), None)?;
    service.add(
        Tx::update(2, obj(&[("Items", "edited".into())])),
        Some(data[2].clone()),
    )?;
    service.undo();
    assert_eq!(service.redo_depth(), 1);

    service.clear(Some(&key("FAKE ID")));
    assert!(service.can_redo());

    service.commit(&mut data, Some(&key(100)));
    assert_eq!(data.len(), 6);
    assert!(!service.can_undo());
    assert!(service.can_redo());

    service.redo();
    let state = service.get_state(&key(2)).ok_or("redo lost record 2")?;
    assert_eq!(state.kind, TransactionKind::Update);
    assert_eq!(service.get_transaction_log(None).len(), 1);

    // Clearing the only record in a redo batch drops the batch.
    service.undo();
    service.clear(Some(&key(2)));
    assert!(!service.can_redo());
    Ok(())
}
