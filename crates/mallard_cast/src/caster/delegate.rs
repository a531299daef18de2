//! Callables between delegate types.

use std::sync::Arc;

use mallard_ir::{TypeId, TypeKind, Value};

use super::Caster;
use crate::compat::GuardStack;
use crate::engine::EngineInner;
use crate::synth::{DelegateAdapter, DelegateFactory};
use crate::CastResult;

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct DelegateCaster;

impl DelegateCaster {
    pub(crate) fn factory(engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<Arc<DelegateFactory>> {
        engine
            .cache
            .delegates
            .get_or_generate((to, from), || Ok(Arc::new(engine.synthesize_delegate(to, from)?)))
    }
}

impl Caster for DelegateCaster {
    fn name(&self) -> &'static str {
        "delegate"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn should_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool {
        engine.registry.kind(to) == TypeKind::Delegate && engine.registry.kind(from) == TypeKind::Delegate
    }

    /// Same arity, and every parameter and the return type compatible.
    fn can_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        if !self.should_cast(engine, to, from) {
            return false;
        }
        let to_desc = engine.registry.get(to);
        let from_desc = engine.registry.get(from);
        let (Some(to_sig), Some(from_sig)) = (&to_desc.invoke, &from_desc.invoke) else {
            return false;
        };
        to_sig.params.len() == from_sig.params.len()
            && to_sig
                .params
                .iter()
                .zip(&from_sig.params)
                .all(|(&t, &f)| engine.are_compatible(t, f, false, guard))
            && engine.are_compatible(to_sig.ret, from_sig.ret, false, guard)
    }

    fn prepare(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<()> {
        Self::factory(engine, to, from).map(drop)
    }

    fn cast(&self, engine: &EngineInner, to: TypeId, value: &Value) -> CastResult<Value> {
        let Some(callable) = value.as_callable() else {
            let from = engine.registry.type_of(value).unwrap_or(TypeId::OBJECT);
            return Err(engine.invalid_cast(from, to));
        };
        let factory = Self::factory(engine, to, callable.ty())?;
        Ok(factory.wrap(callable.clone()))
    }

    fn should_uncast(&self, value: &Value) -> bool {
        DelegateAdapter::from_value(value).is_some()
    }

    fn uncast(&self, value: &Value) -> Value {
        match DelegateAdapter::from_value(value) {
            Some(adapter) => Value::Callable(adapter.inner().clone()),
            None => value.clone(),
        }
    }
}
