//! Adapters over a type's static members.

use mallard_cast::Adapter;
use mallard_ir::Value;
use pretty_assertions::assert_eq;

use crate::common::Fixture;

#[test]
fn static_members_satisfy_the_shape() {
    let f = Fixture::new();
    assert!(f.engine.can_static_cast(f.adder, f.static_adder));
    assert!(!f.engine.can_cast(f.adder, f.static_adder));
    assert!(!f.engine.can_static_cast(f.adder, f.duck));
}

#[test]
fn static_adapter_forwards_to_static_members() {
    let f = Fixture::new();
    let value = f.engine.static_cast(f.adder, f.static_adder).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();

    assert_eq!(adapter.get("LastTotal").unwrap(), Value::Int(-1));
    assert_eq!(
        adapter.call("Add", &[Value::Int(2), Value::Int(3)]).unwrap(),
        Value::Int(5)
    );
    assert_eq!(adapter.get("LastTotal").unwrap(), Value::Int(5));
    adapter.set("LastTotal", Value::Int(40)).unwrap();
    assert_eq!(adapter.get("LastTotal").unwrap(), Value::Int(40));
}

#[test]
fn static_adapters_are_shared() {
    let f = Fixture::new();
    assert!(!f.engine.is_static_prepared(f.adder, f.static_adder));
    f.engine.prepare_static_cast(f.adder, f.static_adder).unwrap();
    assert!(f.engine.is_static_prepared(f.adder, f.static_adder));

    let first = f.engine.static_cast(f.adder, f.static_adder).unwrap();
    let second = f.engine.static_cast(f.adder, f.static_adder).unwrap();
    let first_adapter = Adapter::from_value(&first).unwrap();
    assert!(std::ptr::eq(first_adapter, Adapter::from_value(&second).unwrap()));

    first_adapter.call("Add", &[Value::Int(1), Value::Int(1)]).unwrap();
    let second_adapter = Adapter::from_value(&second).unwrap();
    assert_eq!(second_adapter.get("LastTotal").unwrap(), Value::Int(2));
}

#[test]
fn static_adapters_do_not_uncast() {
    let f = Fixture::new();
    let value = f.engine.static_cast(f.adder, f.static_adder).unwrap();
    assert_eq!(f.engine.uncast(&value), value);
    assert_eq!(Adapter::from_value(&value).unwrap().source(), &Value::Null);
}
