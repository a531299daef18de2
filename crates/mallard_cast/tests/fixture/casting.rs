//! Compatibility verdicts, casts and uncasts.

use mallard_cast::Adapter;
use mallard_ir::{TypeId, Value};
use pretty_assertions::assert_eq;

use crate::common::Fixture;

// =============================================================================
// Verdicts
// =============================================================================

#[test]
fn duck_fits_the_interface() {
    let f = Fixture::new();
    assert!(f.engine.can_cast(f.interface, f.duck));
}

#[test]
fn interface_fits_the_duck() {
    let f = Fixture::new();
    assert!(f.engine.can_cast(f.duck, f.interface));
}

#[test]
fn duck_does_not_fit_unrelated_shapes() {
    let f = Fixture::new();
    assert!(!f.engine.can_cast(f.formattable, f.duck));
    assert!(!f.engine.can_cast(f.adder, f.duck));
}

#[test]
fn delegates_fit_by_signature() {
    let f = Fixture::new();
    assert!(f.engine.can_cast(f.general_delegate, f.specialized_delegate));
    assert!(f.engine.can_cast(f.specialized_delegate, f.general_delegate));
    assert!(!f.engine.can_cast(f.general_delegate, f.event_handler));
    assert!(!f.engine.can_cast(f.event_handler, f.general_delegate));
}

#[test]
fn enums_fit_strings_only() {
    let f = Fixture::new();
    assert!(f.engine.can_cast(f.attribute_targets, TypeId::STR));
    assert!(f.engine.can_cast(TypeId::STR, f.attribute_targets));
    assert!(!f.engine.can_cast(f.attribute_targets, f.date_time));
    assert!(!f.engine.can_cast(f.date_time, f.attribute_targets));
}

#[test]
fn verdicts_are_stable() {
    let f = Fixture::new();
    let first = f.engine.can_cast(f.interface, f.duck);
    let count = f.engine.verdict_count();
    assert_eq!(f.engine.can_cast(f.interface, f.duck), first);
    assert_eq!(f.engine.verdict_count(), count);
}

// =============================================================================
// Casts
// =============================================================================

#[test]
fn null_casts_to_null() {
    let f = Fixture::new();
    assert_eq!(f.engine.cast(f.interface, &Value::Null).unwrap(), Value::Null);
    assert_eq!(f.engine.cast(f.duck, &Value::Null).unwrap(), Value::Null);
}

#[test]
fn cast_wraps_and_uncast_unwraps() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let adapter = f.engine.cast(f.interface, &duck).unwrap();

    assert_eq!(adapter.type_id(), Some(f.interface));
    assert_eq!(Adapter::from_value(&adapter).unwrap().source(), &duck);

    let back = f.engine.uncast(&adapter);
    assert!(Adapter::from_value(&back).is_none());
    assert_eq!(back, duck);
}

#[test]
fn casting_an_adapter_to_its_source_type_unwraps_it() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let adapter = f.engine.cast(f.interface, &duck).unwrap();
    let back = f.engine.cast(f.duck, &adapter).unwrap();
    assert!(Adapter::from_value(&back).is_none());
    assert_eq!(back, duck);
}

#[test]
fn preparation_is_observable() {
    let f = Fixture::new();
    assert!(!f.engine.is_prepared(f.interface, f.duck));
    f.engine.prepare_cast(f.interface, f.duck).unwrap();
    assert!(f.engine.is_prepared(f.interface, f.duck));
    assert_eq!(f.engine.factory_count(), 1);
}

#[test]
fn unrelated_values_do_not_cast() {
    let f = Fixture::new();
    let args = f.new_event_args();
    assert!(f.engine.cast(f.interface, &args).is_err());
    assert!(!f.engine.can_cast_value(f.interface, &args));
}
