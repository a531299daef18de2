//! Shared adapters presenting a type's static members as an interface.

use std::sync::Arc;

use tracing::debug;

use mallard_ir::{TypeId, TypeKind, Value};

use super::StaticCaster;
use crate::compat::GuardStack;
use crate::engine::EngineInner;
use crate::CastResult;

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct StaticInterfaceCaster;

impl StaticCaster for StaticInterfaceCaster {
    fn name(&self) -> &'static str {
        "static-interface"
    }

    fn priority(&self) -> u8 {
        0
    }

    fn should_static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool {
        engine.registry.kind(to) == TypeKind::Interface && engine.registry.kind(from) != TypeKind::Interface
    }

    fn can_static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        self.should_static_cast(engine, to, from)
            && (engine.cache.statics.contains((to, from)) || engine.build_descriptor(to, from, true, guard).is_ok())
    }

    fn prepare_static(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<()> {
        self.static_cast(engine, to, from).map(drop)
    }

    fn static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<Value> {
        engine.cache.statics.get_or_generate((to, from), || {
            let mut guard = GuardStack::new();
            let descriptor = engine.build_descriptor(to, from, true, &mut guard)?;
            let factory = Arc::new(engine.synthesize(descriptor)?);
            let adapter = factory.instantiate(engine, Value::Null)?;
            debug!(
                shape = %engine.registry.name(to),
                source = %engine.registry.name(from),
                "built static adapter"
            );
            Ok(adapter)
        })
    }
}
