//! The duck fixture shared by the integration suites.
//!
//! `Duck` implements every member of `IInterface` structurally, often with
//! different but compatible types; `StaticAdder` implements `IAdder` with
//! static members only.

#![allow(dead_code, reason = "each suite uses a different subset")]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use mallard_cast::Engine;
use mallard_ir::{
    CallError, CallResult, Callable, EventDef, GenericOwner, MethodDef, PropertyDef, TypeDefinition,
    TypeFlags, TypeId, TypeKind, TypeRegistry, Value,
};

/// Argument values `Duck::Method(object, string, int, DateTime)` insists on.
pub const A: &str = "A";
pub const B: &str = "B";
pub const C: i64 = 3;
pub const D_TICKS: i64 = 633_185_856_000_000_000;

/// `AttributeTargets` variants used by the suites.
pub const TARGET_VARIANTS: &[(&str, i64)] = &[
    ("Assembly", 1),
    ("Module", 2),
    ("Class", 4),
    ("Struct", 8),
    ("Enum", 16),
    ("Constructor", 32),
    ("Method", 64),
    ("Property", 128),
    ("All", 32767),
];

pub struct Fixture {
    pub registry: Arc<TypeRegistry>,
    pub engine: Engine,
    pub event_args: TypeId,
    pub adding_new_event_args: TypeId,
    pub event_handler: TypeId,
    pub adding_new_event_handler: TypeId,
    pub general_delegate: TypeId,
    pub specialized_delegate: TypeId,
    pub attribute_targets: TypeId,
    pub date_time: TypeId,
    pub formattable: TypeId,
    pub interface: TypeId,
    pub duck: TypeId,
    pub adder: TypeId,
    pub static_adder: TypeId,
}

impl Fixture {
    pub fn new() -> Self {
        let registry = TypeRegistry::new();

        let event_args = registry
            .register("EventArgs", TypeKind::Class, TypeDefinition::new())
            .unwrap();
        let adding_new_event_args = registry
            .register(
                "AddingNewEventArgs",
                TypeKind::Class,
                TypeDefinition::new().base(event_args),
            )
            .unwrap();
        let event_handler = delegate(&registry, "EventHandler", vec![TypeId::OBJECT, event_args], TypeId::VOID);
        let adding_new_event_handler = delegate(
            &registry,
            "AddingNewEventHandler",
            vec![TypeId::OBJECT, adding_new_event_args],
            TypeId::VOID,
        );
        let general_delegate = delegate(&registry, "GeneralDelegate", vec![TypeId::OBJECT], TypeId::OBJECT);
        let specialized_delegate = delegate(&registry, "SpecializedDelegate", vec![TypeId::STR], TypeId::BOOL);

        let mut targets = TypeDefinition::new();
        for &(name, value) in TARGET_VARIANTS {
            targets = targets.variant(name, value);
        }
        let attribute_targets = registry
            .register("AttributeTargets", TypeKind::Enum, targets)
            .unwrap();
        let date_time = registry
            .register("DateTime", TypeKind::Struct, TypeDefinition::new())
            .unwrap();

        let formattable = registry
            .register(
                "IFormattable",
                TypeKind::Interface,
                TypeDefinition::new().method(MethodDef::new(
                    "ToString",
                    vec![TypeId::STR, TypeId::OBJECT],
                    TypeId::STR,
                )),
            )
            .unwrap();

        let interface = registry.declare("IInterface", TypeKind::Interface).unwrap();
        let duck = registry.declare("Duck", TypeKind::Class).unwrap();
        let shape_t = registry.generic_param(
            GenericOwner::Method {
                declaring: interface,
                method: "GenericMethod".to_owned(),
            },
            0,
            "T",
        );
        let duck_t = registry.generic_param(
            GenericOwner::Method {
                declaring: duck,
                method: "GenericMethod".to_owned(),
            },
            0,
            "T",
        );

        let types = Types {
            event_args,
            event_handler,
            adding_new_event_handler,
            attribute_targets,
            date_time,
            interface,
            duck,
        };
        registry.define(interface, interface_definition(&types, shape_t)).unwrap();
        registry.define(duck, duck_definition(&types, duck_t)).unwrap();

        let adder = registry
            .register(
                "IAdder",
                TypeKind::Interface,
                TypeDefinition::new()
                    .method(MethodDef::new("Add", vec![TypeId::INT, TypeId::INT], TypeId::INT))
                    .property(PropertyDef::new("LastTotal", TypeId::INT).readable().writable()),
            )
            .unwrap();
        let static_adder = registry
            .register("StaticAdder", TypeKind::Class, static_adder_definition())
            .unwrap();

        let registry = Arc::new(registry);
        Fixture {
            engine: Engine::new(Arc::clone(&registry)),
            registry,
            event_args,
            adding_new_event_args,
            event_handler,
            adding_new_event_handler,
            general_delegate,
            specialized_delegate,
            attribute_targets,
            date_time,
            formattable,
            interface,
            duck,
            adder,
            static_adder,
        }
    }

    pub fn new_duck(&self) -> Value {
        self.registry.instantiate(self.duck).unwrap()
    }

    pub fn new_event_args(&self) -> Value {
        self.registry.instantiate(self.adding_new_event_args).unwrap()
    }

    pub fn date(&self, ticks: i64) -> Value {
        Value::structure(self.date_time, vec![Value::Int(ticks)])
    }

    pub fn target(&self, name: &str) -> Value {
        let value = TARGET_VARIANTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, v)| v)
            .unwrap();
        Value::enum_value(self.attribute_targets, value)
    }

    /// Call a `Duck` method directly, bypassing any adapter.
    pub fn call_duck(&self, duck: &Value, name: &str, args: &[Value]) -> CallResult {
        let desc = self.registry.get(self.duck);
        let method = desc
            .methods_named(name)
            .find(|m| m.params.len() == args.len())
            .unwrap();
        method.invoke(duck, args)
    }
}

struct Types {
    event_args: TypeId,
    event_handler: TypeId,
    adding_new_event_handler: TypeId,
    attribute_targets: TypeId,
    date_time: TypeId,
    interface: TypeId,
    duck: TypeId,
}

fn delegate(registry: &TypeRegistry, name: &str, params: Vec<TypeId>, ret: TypeId) -> TypeId {
    registry
        .register(name, TypeKind::Delegate, TypeDefinition::new().invoke(params, ret))
        .unwrap()
}

fn interface_definition(t: &Types, generic: TypeId) -> TypeDefinition {
    let m = MethodDef::new;
    TypeDefinition::new()
        .method(m("Method", vec![], TypeId::VOID))
        .method(m(
            "Method",
            vec![TypeId::OBJECT, TypeId::STR, TypeId::INT, t.date_time],
            TypeId::VOID,
        ))
        .method(m("Method", vec![TypeId::STR], TypeId::STR))
        .method(m("Method", vec![TypeId::INT], TypeId::INT))
        .method(m("GenericMethod", vec![generic], generic).generic(1))
        .method(m("BestMatchMethod", vec![TypeId::STR], TypeId::BOOL))
        .method(m("CovariantMethod", vec![TypeId::STR], TypeId::STR))
        .method(m("CovariantValueMethod", vec![TypeId::INT], TypeId::INT))
        .method(m("CovariantEnumMethod", vec![t.attribute_targets], t.attribute_targets))
        .method(m("ContravariantMethod", vec![TypeId::OBJECT], TypeId::OBJECT))
        .method(m("ContravariantValueMethod", vec![TypeId::OBJECT], TypeId::OBJECT))
        .method(m("ContravariantEnumMethod", vec![TypeId::STR], TypeId::STR))
        .method(m("VariantByRecursiveCastMethod", vec![t.duck], TypeId::OBJECT))
        .method(m("VariantByUncastMethod", vec![t.interface], TypeId::OBJECT))
        .method(m("StackOverflowCheckMethod", vec![], t.interface))
        .property(PropertyDef::new("Property", TypeId::STR).readable().writable())
        .property(PropertyDef::new("ValueProperty", TypeId::INT).readable().writable())
        .property(
            PropertyDef::new("Item", TypeId::OBJECT)
                .readable()
                .writable()
                .indexed(vec![TypeId::INT]),
        )
        .event(EventDef::new("Event", t.event_handler))
        .event(EventDef::new("CovariantEvent", t.adding_new_event_handler))
        .event(EventDef::new("ContravariantEvent", t.event_handler))
}

fn echo(_: &Value, args: &[Value]) -> CallResult {
    Ok(args[0].clone())
}

fn duck_definition(t: &Types, generic: TypeId) -> TypeDefinition {
    let m = MethodDef::new;
    let date_time = t.date_time;
    TypeDefinition::new()
        .method(m("Method", vec![], TypeId::VOID).body(|_, _| Ok(Value::Null)))
        .method(
            m(
                "Method",
                vec![TypeId::OBJECT, TypeId::STR, TypeId::INT, t.date_time],
                TypeId::VOID,
            )
            .body(move |_, args| {
                let expected = [
                    Value::from(A),
                    Value::from(B),
                    Value::Int(C),
                    Value::structure(date_time, vec![Value::Int(D_TICKS)]),
                ];
                match args.iter().zip(&expected).position(|(a, e)| a != e) {
                    Some(i) => Err(CallError::host(format!("wrong value for parameter {i}"))),
                    None => Ok(Value::Null),
                }
            }),
        )
        .method(m("Method", vec![TypeId::STR], TypeId::STR).body(echo))
        .method(m("Method", vec![TypeId::INT], TypeId::INT).body(echo))
        .method(m("GenericMethod", vec![generic], generic).generic(1).body(echo))
        .method(m("BestMatchMethod", vec![TypeId::OBJECT], TypeId::BOOL).body(|_, _| Ok(Value::Bool(false))))
        .method(m("BestMatchMethod", vec![TypeId::STR], TypeId::BOOL).body(|_, _| Ok(Value::Bool(true))))
        .method(m("CovariantMethod", vec![TypeId::OBJECT], TypeId::OBJECT).body(echo))
        .method(m("CovariantValueMethod", vec![TypeId::OBJECT], TypeId::OBJECT).body(echo))
        .method(m("CovariantEnumMethod", vec![TypeId::STR], TypeId::STR).body(echo))
        .method(m("ContravariantMethod", vec![TypeId::STR], TypeId::STR).body(echo))
        .method(m("ContravariantValueMethod", vec![t.date_time], t.date_time).body(echo))
        .method(m("ContravariantEnumMethod", vec![t.attribute_targets], t.attribute_targets).body(echo))
        .method(m("VariantByRecursiveCastMethod", vec![t.interface], TypeId::OBJECT).body(echo))
        .method(m("VariantByUncastMethod", vec![t.duck], TypeId::OBJECT).body(echo))
        .method(m("StackOverflowCheckMethod", vec![], t.duck).body(|_, _| Ok(Value::Null)))
        .method(raiser("RaiseEvent", "Event", t.event_args))
        .method(raiser("RaiseCovariantEvent", "CovariantEvent", t.event_args))
        .method(raiser("RaiseContravariantEvent", "ContravariantEvent", t.event_args))
        .property(field_property("Property", TypeId::STR, "property"))
        .property(field_property("ValueProperty", TypeId::INT, "value_property"))
        .property(
            PropertyDef::new("Item", TypeId::OBJECT)
                .indexed(vec![TypeId::INT])
                .getter(|this, index| Ok(this.as_object().map_or(Value::Null, |o| o.field(&slot(index)))))
                .setter(|this, index, value| {
                    if let Some(instance) = this.as_object() {
                        instance.set_field(&slot(index), value);
                    }
                    Ok(())
                }),
        )
        .event(EventDef::new("Event", t.event_handler))
        .event(EventDef::new("CovariantEvent", t.event_handler))
        .event(EventDef::new("ContravariantEvent", t.adding_new_event_handler))
}

fn slot(index: &[Value]) -> String {
    format!("item{}", index[0].as_int().unwrap_or_default())
}

fn field_property(name: &str, ty: TypeId, field: &'static str) -> PropertyDef {
    PropertyDef::new(name, ty)
        .getter(move |this, _| Ok(this.as_object().map_or(Value::Null, |o| o.field(field))))
        .setter(move |this, _, value| {
            if let Some(instance) = this.as_object() {
                instance.set_field(field, value);
            }
            Ok(())
        })
}

/// `void Raise*(object sender, EventArgs e)`: raise `event` on the duck.
fn raiser(name: &str, event: &'static str, event_args: TypeId) -> MethodDef {
    MethodDef::new(name, vec![TypeId::OBJECT, event_args], TypeId::VOID).body(move |this, args| {
        if let Some(instance) = this.as_object() {
            instance.events().raise(event, args)?;
        }
        Ok(Value::Null)
    })
}

fn static_adder_definition() -> TypeDefinition {
    let last_total = Arc::new(AtomicI64::new(-1));
    let on_add = Arc::clone(&last_total);
    let on_get = Arc::clone(&last_total);
    TypeDefinition::new()
        .flags(TypeFlags::STATIC)
        .method(
            MethodDef::new("Add", vec![TypeId::INT, TypeId::INT], TypeId::INT)
                .static_member()
                .body(move |_, args| {
                    let total = args[0].as_int().unwrap_or_default() + args[1].as_int().unwrap_or_default();
                    on_add.store(total, Ordering::SeqCst);
                    Ok(Value::Int(total))
                }),
        )
        .property(
            PropertyDef::new("LastTotal", TypeId::INT)
                .static_member()
                .getter(move |_, _| Ok(Value::Int(on_get.load(Ordering::SeqCst))))
                .setter(move |_, _, value| {
                    last_total.store(value.as_int().unwrap_or_default(), Ordering::SeqCst);
                    Ok(())
                }),
        )
}

/// A handler of delegate type `ty` that records the sender it was raised
/// with into `seen`.
pub fn recording_handler(ty: TypeId, seen: &Arc<parking_lot::Mutex<Vec<Value>>>) -> Value {
    let seen = Arc::clone(seen);
    Value::Callable(Callable::native(ty, move |args| {
        seen.lock().push(args[0].clone());
        Ok(Value::Null)
    }))
}
