//! Instance adapters onto interface shapes.

use std::sync::Arc;

use tracing::trace;

use mallard_ir::{TypeId, TypeKind, Value};

use super::Caster;
use crate::compat::GuardStack;
use crate::engine::EngineInner;
use crate::synth::{Adapter, AdapterFactory};
use crate::CastResult;

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct InterfaceCaster;

impl InterfaceCaster {
    /// The factory adapting `from` values to `to`, generating it if needed.
    ///
    /// With `widen_to_ancestors`, the source's class chain is walked from the
    /// most general ancestor down: an existing factory for any ancestor is
    /// reused, otherwise the most general ancestor that resolves gets one.
    /// Only the factory for `from` itself reports a resolution failure.
    pub(crate) fn factory(engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<Arc<AdapterFactory>> {
        if !engine.config.widen_to_ancestors {
            return Self::factory_for(engine, to, from);
        }
        let chain = engine.registry.inheritance_chain(from);
        for &ancestor in chain.iter().rev() {
            if let Some(factory) = engine.cache.interfaces.get((to, ancestor)) {
                trace!(?to, ?from, ?ancestor, "reusing ancestor adapter");
                return Ok(factory);
            }
        }
        for &ancestor in chain.iter().rev().filter(|&&a| a != from) {
            if let Ok(factory) = Self::factory_for(engine, to, ancestor) {
                return Ok(factory);
            }
        }
        Self::factory_for(engine, to, from)
    }

    fn factory_for(engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<Arc<AdapterFactory>> {
        engine.cache.interfaces.get_or_generate((to, from), || {
            let mut guard = GuardStack::new();
            let descriptor = engine.build_descriptor(to, from, false, &mut guard)?;
            Ok(Arc::new(engine.synthesize(descriptor)?))
        })
    }

    /// Whether a factory usable for `(to, from)` is cached.
    pub(crate) fn is_prepared(engine: &EngineInner, to: TypeId, from: TypeId) -> bool {
        if !engine.config.widen_to_ancestors {
            return engine.cache.interfaces.contains((to, from));
        }
        engine
            .registry
            .inheritance_chain(from)
            .into_iter()
            .any(|ancestor| engine.cache.interfaces.contains((to, ancestor)))
    }
}

impl Caster for InterfaceCaster {
    fn name(&self) -> &'static str {
        "interface"
    }

    fn priority(&self) -> u8 {
        0
    }

    fn should_cast(&self, engine: &EngineInner, to: TypeId, _from: TypeId) -> bool {
        engine.registry.kind(to) == TypeKind::Interface
    }

    fn can_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        if !self.should_cast(engine, to, from) {
            return false;
        }
        Self::is_prepared(engine, to, from) || engine.build_descriptor(to, from, false, guard).is_ok()
    }

    fn prepare(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<()> {
        Self::factory(engine, to, from).map(drop)
    }

    fn cast(&self, engine: &EngineInner, to: TypeId, value: &Value) -> CastResult<Value> {
        let from = engine.registry.type_of(value).unwrap_or(TypeId::OBJECT);
        let factory = Self::factory(engine, to, from)?;
        Ok(factory.instantiate(engine, value.clone())?)
    }

    fn should_uncast(&self, value: &Value) -> bool {
        Adapter::from_value(value).is_some_and(|adapter| !adapter.factory().is_static())
    }

    fn uncast(&self, value: &Value) -> Value {
        match Adapter::from_value(value) {
            Some(adapter) => adapter.source().clone(),
            None => value.clone(),
        }
    }
}
