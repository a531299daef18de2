//! Enum values to and from their variant names.

use mallard_ir::{CallError, TypeId, TypeKind, Value};

use super::Caster;
use crate::compat::GuardStack;
use crate::engine::EngineInner;
use crate::CastResult;

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct EnumStringCaster;

impl EnumStringCaster {
    /// Variant named `text`, or the variant-less value `text` parses to.
    fn parse(engine: &EngineInner, to: TypeId, text: &str) -> CastResult<Value> {
        let desc = engine.registry.get(to);
        if let Some(variant) = desc.variant_named(text) {
            return Ok(Value::enum_value(to, variant.value));
        }
        match text.trim().parse::<i64>() {
            Ok(value) => Ok(Value::enum_value(to, value)),
            Err(_) => Err(CallError::UnknownVariant {
                enum_name: desc.name.clone(),
                name: text.to_owned(),
            }
            .into()),
        }
    }

    /// Name of the variant with `value`, or its numeric text.
    fn format(engine: &EngineInner, ty: TypeId, value: i64) -> Value {
        match engine.registry.get(ty).variant_valued(value) {
            Some(variant) => Value::string(variant.name.clone()),
            None => Value::string(value.to_string()),
        }
    }
}

impl Caster for EnumStringCaster {
    fn name(&self) -> &'static str {
        "enum-string"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn should_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool {
        let registry = &engine.registry;
        (registry.kind(to) == TypeKind::Enum && from == TypeId::STR)
            || (to == TypeId::STR && registry.kind(from) == TypeKind::Enum)
    }

    fn can_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, _guard: &mut GuardStack) -> bool {
        self.should_cast(engine, to, from)
    }

    fn prepare(&self, _engine: &EngineInner, _to: TypeId, _from: TypeId) -> CastResult<()> {
        Ok(())
    }

    fn cast(&self, engine: &EngineInner, to: TypeId, value: &Value) -> CastResult<Value> {
        match value {
            Value::Str(text) => Self::parse(engine, to, text),
            Value::Enum(e) if to == TypeId::STR => Ok(Self::format(engine, e.ty, e.value)),
            other => {
                let from = engine.registry.type_of(other).unwrap_or(TypeId::OBJECT);
                Err(engine.invalid_cast(from, to))
            }
        }
    }

    fn should_uncast(&self, _value: &Value) -> bool {
        false
    }

    fn uncast(&self, value: &Value) -> Value {
        value.clone()
    }
}
