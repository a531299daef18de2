//! Covariant and contravariant member signatures.
//!
//! The shape side and the duck side of each method differ in one direction;
//! forwarding converts on the way in and on the way out.

use mallard_cast::Adapter;
use mallard_ir::{CallError, MethodDef, TypeDefinition, TypeKind, Value};
use pretty_assertions::assert_eq;

use crate::common::Fixture;

fn call(f: &Fixture, duck: &Value, name: &str, arg: Value) -> Result<Value, CallError> {
    let value = f.engine.cast(f.interface, duck).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();
    adapter.call(name, &[arg])
}

// =============================================================================
// Covariant: the duck is more general
// =============================================================================

#[test]
fn covariant_reference_results_are_downcast() {
    let f = Fixture::new();
    let duck = f.new_duck();
    assert_eq!(call(&f, &duck, "CovariantMethod", Value::from("x")), Ok(Value::from("x")));
    assert_eq!(call(&f, &duck, "CovariantMethod", Value::Null), Ok(Value::Null));
}

#[test]
fn covariant_value_results_are_unboxed() {
    let f = Fixture::new();
    let duck = f.new_duck();
    assert_eq!(call(&f, &duck, "CovariantValueMethod", Value::Int(5)), Ok(Value::Int(5)));
}

#[test]
fn covariant_enums_travel_as_strings() {
    let f = Fixture::new();
    let duck = f.new_duck();
    assert_eq!(
        call(&f, &duck, "CovariantEnumMethod", f.target("Method")),
        Ok(f.target("Method"))
    );
}

// =============================================================================
// Contravariant: the duck is more specific
// =============================================================================

#[test]
fn contravariant_reference_arguments_are_checked() {
    let f = Fixture::new();
    let duck = f.new_duck();
    assert_eq!(call(&f, &duck, "ContravariantMethod", Value::from("x")), Ok(Value::from("x")));
    assert_eq!(
        call(&f, &duck, "ContravariantMethod", Value::Int(1)),
        Err(CallError::InvalidCast {
            from: "int".to_owned(),
            to: "string".to_owned(),
        })
    );
}

#[test]
fn contravariant_value_arguments_are_unboxed() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let date = f.date(42);
    assert_eq!(call(&f, &duck, "ContravariantValueMethod", date.clone()), Ok(date));
    assert_eq!(
        call(&f, &duck, "ContravariantValueMethod", Value::Int(7)),
        Err(CallError::TypeMismatch {
            expected: "DateTime".to_owned(),
            found: "int".to_owned(),
        })
    );
    assert_eq!(
        call(&f, &duck, "ContravariantValueMethod", Value::Null),
        Err(CallError::NullValue {
            expected: "DateTime".to_owned(),
        })
    );
}

#[test]
fn contravariant_enums_parse_their_arguments() {
    let f = Fixture::new();
    let duck = f.new_duck();
    assert_eq!(
        call(&f, &duck, "ContravariantEnumMethod", Value::from("Method")),
        Ok(Value::from("Method"))
    );
    assert_eq!(
        call(&f, &duck, "ContravariantEnumMethod", Value::Null),
        Err(CallError::NullValue {
            expected: "AttributeTargets".to_owned(),
        })
    );
    assert!(matches!(
        call(&f, &duck, "ContravariantEnumMethod", Value::from("Nowhere")),
        Err(CallError::UnknownVariant { .. })
    ));
}

// =============================================================================
// Variance through the engine
// =============================================================================

#[test]
fn arguments_are_cast_recursively() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let other = f.new_duck();
    let result = call(&f, &duck, "VariantByRecursiveCastMethod", other.clone()).unwrap();
    let adapter = Adapter::from_value(&result).unwrap();
    assert_eq!(adapter.factory().shape(), f.interface);
    assert_eq!(adapter.source(), &other);
    assert_eq!(result, other);
}

#[test]
fn arguments_are_uncast() {
    let f = Fixture::new();
    let duck = f.new_duck();
    let other = f.new_duck();
    let wrapped = f.engine.cast(f.interface, &other).unwrap();
    let result = call(&f, &duck, "VariantByUncastMethod", wrapped).unwrap();
    assert!(Adapter::from_value(&result).is_none());
    assert_eq!(result, other);
}

#[test]
fn self_referential_signatures_resolve() {
    let f = Fixture::new();
    let value = f.engine.cast(f.interface, &f.new_duck()).unwrap();
    let adapter = Adapter::from_value(&value).unwrap();
    assert_eq!(adapter.call("StackOverflowCheckMethod", &[]), Ok(Value::Null));
}

#[test]
fn shape_typed_signatures_round_trip_through_adapters() {
    let f = Fixture::new();
    let node_shape = f.registry.declare("INode", TypeKind::Interface).unwrap();
    let node = f.registry.declare("Node", TypeKind::Class).unwrap();
    f.registry
        .define(
            node_shape,
            TypeDefinition::new().method(MethodDef::new("VariantMethod", vec![node_shape], node_shape)),
        )
        .unwrap();
    f.registry
        .define(
            node,
            TypeDefinition::new().method(
                MethodDef::new("VariantMethod", vec![node], node).body(|_, args| Ok(args[0].clone())),
            ),
        )
        .unwrap();
    assert!(f.engine.can_cast(node_shape, node));

    let first = f.registry.instantiate(node).unwrap();
    let second = f.registry.instantiate(node).unwrap();
    let value = f.engine.cast(node_shape, &first).unwrap();
    let argument = f.engine.cast(node_shape, &second).unwrap();
    let result = Adapter::from_value(&value)
        .unwrap()
        .call("VariantMethod", &[argument.clone()])
        .unwrap();

    assert_eq!(result.type_id(), Some(node_shape));
    assert_eq!(result, argument);
    assert_eq!(result, second);
    assert_ne!(result, first);
}
