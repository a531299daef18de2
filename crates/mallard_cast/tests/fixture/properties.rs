//! Plain properties and the indexer.

use mallard_cast::Adapter;
use mallard_ir::{CallError, Value};
use pretty_assertions::assert_eq;

use crate::common::Fixture;

#[test]
fn reference_properties_round_trip() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let value = f.engine.cast(f.interface, &duck).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();

    assert_eq!(adapter.get("Property").unwrap(), Value::Null);
    adapter.set("Property", Value::from("feathers")).unwrap();
    assert_eq!(adapter.get("Property").unwrap(), Value::from("feathers"));
    assert_eq!(duck.as_object().unwrap().field("property"), Value::from("feathers"));
}

#[test]
fn value_properties_reject_null() {
    let f = Fixture::new();
    let value = f.engine.cast(f.interface, &f.new_duck()).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();

    adapter.set("ValueProperty", Value::Int(12)).unwrap();
    assert_eq!(adapter.get("ValueProperty").unwrap(), Value::Int(12));
    assert_eq!(
        adapter.set("ValueProperty", Value::Null),
        Err(CallError::NullValue {
            expected: "int".to_owned(),
        })
    );
}

#[test]
fn writes_through_the_duck_are_visible() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let value = f.engine.cast(f.interface, &duck).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();

    duck.as_object().unwrap().set_field("property", Value::from("direct"));
    assert_eq!(adapter.get("Property").unwrap(), Value::from("direct"));
}

#[test]
fn indexer_forwards_reads_and_writes() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let value = f.engine.cast(f.interface, &duck).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();

    adapter.set_index(&[Value::Int(2)], Value::from("two")).unwrap();
    assert_eq!(adapter.get_index(&[Value::Int(2)]).unwrap(), Value::from("two"));
    assert_eq!(adapter.get_index(&[Value::Int(3)]).unwrap(), Value::Null);
    assert_eq!(duck.as_object().unwrap().field("item2"), Value::from("two"));
}

#[test]
fn indexer_checks_index_arguments() {
    let f = Fixture::new();
    let value = f.engine.cast(f.interface, &f.new_duck()).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();

    assert!(matches!(
        adapter.get_index(&[Value::from("two")]),
        Err(CallError::TypeMismatch { .. })
    ));
    assert!(matches!(
        adapter.get_index(&[Value::Int(1), Value::Int(2)]),
        Err(CallError::UnknownMember { .. })
    ));
}
