//! Identical, covariant and contravariant events.

use std::sync::Arc;

use mallard_cast::Adapter;
use mallard_ir::{CallError, Value};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use crate::common::{recording_handler, Fixture};

fn raise(f: &Fixture, duck: &Value, method: &str, args: Value) -> Result<Value, CallError> {
    f.call_duck(duck, method, &[duck.clone(), args])
}

#[test]
fn identical_events_subscribe_on_the_duck() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let value = f.engine.cast(f.interface, &duck).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_handler(f.event_handler, &seen);

    adapter.subscribe("Event", &handler).unwrap();
    assert_eq!(duck.as_object().unwrap().events().handler_count("Event"), 1);
    raise(&f, &duck, "RaiseEvent", f.new_event_args()).unwrap();
    assert_eq!(*seen.lock(), vec![duck.clone()]);

    assert!(adapter.unsubscribe("Event", &handler).unwrap());
    raise(&f, &duck, "RaiseEvent", f.new_event_args()).unwrap();
    assert_eq!(seen.lock().len(), 1);
}

#[test]
fn covariant_events_relay_and_downcast() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let value = f.engine.cast(f.interface, &duck).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_handler(f.adding_new_event_handler, &seen);

    adapter.subscribe("CovariantEvent", &handler).unwrap();
    raise(&f, &duck, "RaiseCovariantEvent", f.new_event_args()).unwrap();
    assert_eq!(seen.lock().len(), 1);

    // The duck may raise with arguments the shape's handler cannot take
    let plain = f.registry.instantiate(f.event_args).unwrap();
    assert!(matches!(
        raise(&f, &duck, "RaiseCovariantEvent", plain),
        Err(CallError::InvalidCast { .. })
    ));
    assert_eq!(seen.lock().len(), 1);

    assert!(adapter.unsubscribe("CovariantEvent", &handler).unwrap());
    raise(&f, &duck, "RaiseCovariantEvent", f.new_event_args()).unwrap();
    assert_eq!(seen.lock().len(), 1);
}

#[test]
fn contravariant_events_relay() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let value = f.engine.cast(f.interface, &duck).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_handler(f.event_handler, &seen);

    adapter.subscribe("ContravariantEvent", &handler).unwrap();
    raise(&f, &duck, "RaiseContravariantEvent", f.new_event_args()).unwrap();
    assert_eq!(*seen.lock(), vec![duck.clone()]);

    assert!(adapter.unsubscribe("ContravariantEvent", &handler).unwrap());
    raise(&f, &duck, "RaiseContravariantEvent", f.new_event_args()).unwrap();
    assert_eq!(seen.lock().len(), 1);
    assert!(!adapter.unsubscribe("ContravariantEvent", &handler).unwrap());
}

#[test]
fn relayed_handlers_are_independent_per_adapter() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let first = f.engine.cast(f.interface, &duck).unwrap();
    let second = f.engine.cast(f.interface, &duck).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_handler(f.adding_new_event_handler, &seen);

    Adapter::from_value(&first)
        .unwrap()
        .subscribe("CovariantEvent", &handler)
        .unwrap();
    raise(&f, &duck, "RaiseCovariantEvent", f.new_event_args()).unwrap();
    assert_eq!(seen.lock().len(), 1);
    assert!(!Adapter::from_value(&second)
        .unwrap()
        .unsubscribe("CovariantEvent", &handler)
        .unwrap());
}

#[test]
fn handlers_must_match_the_shape() {
    let f = Fixture::new();
    let value = f.engine.cast(f.interface, &f.new_duck()).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_handler(f.event_handler, &seen);

    assert_eq!(
        adapter.subscribe("CovariantEvent", &handler),
        Err(CallError::TypeMismatch {
            expected: "AddingNewEventHandler".to_owned(),
            found: "EventHandler".to_owned(),
        })
    );
    assert!(matches!(
        adapter.subscribe("Missing", &handler),
        Err(CallError::UnknownMember { .. })
    ));
}
