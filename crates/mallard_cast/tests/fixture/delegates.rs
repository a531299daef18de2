//! Delegate-to-delegate adapters.

use mallard_cast::{CastError, DelegateAdapter};
use mallard_ir::{CallError, Callable, TypeDefinition, TypeId, TypeKind, Value};
use pretty_assertions::assert_eq;

use crate::common::Fixture;

fn is_yes(f: &Fixture) -> Value {
    Value::Callable(Callable::native(f.specialized_delegate, |args| {
        Ok(Value::Bool(args[0].as_str() == Some("yes")))
    }))
}

fn invoke(value: &Value, args: &[Value]) -> Result<Value, CallError> {
    value.as_callable().unwrap().invoke(args)
}

#[test]
fn specialized_casts_to_general() {
    let f = Fixture::new();
    let specialized = is_yes(&f);
    let general = f.engine.cast(f.general_delegate, &specialized).unwrap();

    assert_eq!(general.type_id(), Some(f.general_delegate));
    assert_eq!(invoke(&general, &[Value::from("yes")]), Ok(Value::Bool(true)));
    assert_eq!(invoke(&general, &[Value::from("no")]), Ok(Value::Bool(false)));
    assert_eq!(
        invoke(&general, &[Value::Int(1)]),
        Err(CallError::InvalidCast {
            from: "int".to_owned(),
            to: "string".to_owned(),
        })
    );
}

#[test]
fn casting_back_unwraps() {
    let f = Fixture::new();
    let specialized = is_yes(&f);
    let general = f.engine.cast(f.general_delegate, &specialized).unwrap();
    let adapter = DelegateAdapter::from_value(&general).unwrap();
    assert_eq!(adapter.factory().source(), f.specialized_delegate);

    let back = f.engine.cast(f.specialized_delegate, &general).unwrap();
    assert!(DelegateAdapter::from_value(&back).is_none());
    assert_eq!(back, specialized);
    assert_eq!(f.engine.uncast(&general), specialized);
}

#[test]
fn general_casts_to_specialized() {
    let f = Fixture::new();
    let general = Value::Callable(Callable::native(f.general_delegate, |args| {
        Ok(Value::Bool(args[0].is_null()))
    }));
    let specialized = f.engine.cast(f.specialized_delegate, &general).unwrap();
    assert_eq!(invoke(&specialized, &[Value::Null]), Ok(Value::Bool(true)));
    assert_eq!(invoke(&specialized, &[Value::from("x")]), Ok(Value::Bool(false)));
}

#[test]
fn arity_mismatch_is_an_invalid_cast() {
    let f = Fixture::new();
    assert!(f.engine.cast(f.event_handler, &is_yes(&f)).is_err());
    assert!(f.engine.delegate_factory(f.event_handler, f.specialized_delegate).is_err());
}

#[test]
fn delegate_factories_are_shared() {
    let f = Fixture::new();
    let first = f.engine.delegate_factory(f.general_delegate, f.specialized_delegate).unwrap();
    let second = f.engine.delegate_factory(f.general_delegate, f.specialized_delegate).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.target(), f.general_delegate);
}

#[test]
fn incompatible_parameter_shapes_are_rejected() {
    let f = Fixture::new();
    let plain = f
        .registry
        .register("Plain", TypeKind::Class, TypeDefinition::new())
        .unwrap();
    let takes_adder = f
        .registry
        .register(
            "TakesAdder",
            TypeKind::Delegate,
            TypeDefinition::new().invoke(vec![f.adder], TypeId::VOID),
        )
        .unwrap();
    let takes_plain = f
        .registry
        .register(
            "TakesPlain",
            TypeKind::Delegate,
            TypeDefinition::new().invoke(vec![plain], TypeId::VOID),
        )
        .unwrap();
    assert!(!f.engine.can_cast(takes_adder, takes_plain));

    let callable = Value::Callable(Callable::native(takes_plain, |_| Ok(Value::Null)));
    assert_eq!(
        f.engine.cast(takes_adder, &callable),
        Err(CastError::InvalidCast {
            from: "TakesPlain".to_owned(),
            to: "TakesAdder".to_owned(),
        })
    );
    assert!(f.engine.delegate_factory(takes_adder, takes_plain).is_err());
    assert!(!f.engine.is_prepared(takes_adder, takes_plain));
}
