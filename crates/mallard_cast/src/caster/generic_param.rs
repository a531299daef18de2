//! Values between generic parameters declared at the same position.

use mallard_ir::{TypeId, TypeKind, Value};

use super::Caster;
use crate::compat::GuardStack;
use crate::engine::EngineInner;
use crate::CastResult;

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct GenericParamCaster;

impl Caster for GenericParamCaster {
    fn name(&self) -> &'static str {
        "generic-param"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn should_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool {
        let registry = &engine.registry;
        if registry.kind(to) != TypeKind::GenericParam || registry.kind(from) != TypeKind::GenericParam {
            return false;
        }
        let position = registry.get(to).generic_position();
        position.is_some() && position == registry.get(from).generic_position()
    }

    fn can_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, _guard: &mut GuardStack) -> bool {
        self.should_cast(engine, to, from)
    }

    /// Positional matching already covers both directions.
    fn could_uncast(&self, _engine: &EngineInner, _to: TypeId, _from: TypeId, _guard: &mut GuardStack) -> bool {
        false
    }

    fn prepare(&self, _engine: &EngineInner, _to: TypeId, _from: TypeId) -> CastResult<()> {
        Ok(())
    }

    fn cast(&self, _engine: &EngineInner, _to: TypeId, value: &Value) -> CastResult<Value> {
        Ok(value.clone())
    }

    fn should_uncast(&self, _value: &Value) -> bool {
        false
    }

    fn uncast(&self, value: &Value) -> Value {
        value.clone()
    }
}
