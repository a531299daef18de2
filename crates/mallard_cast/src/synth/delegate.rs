//! Delegate adapters: a callable of one delegate type forwarding to a
//! callable of another.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;

use mallard_ir::{CallError, CallResult, Callable, Invoke, Proxy, TypeId, Value};

use crate::caster::{Caster, DelegateCaster};
use crate::compat::GuardStack;
use crate::convert::Conversion;
use crate::engine::EngineInner;
use crate::{CastError, CastResult};

/// Conversions between two delegate signatures.
pub struct DelegateFactory {
    to: TypeId,
    from: TypeId,
    to_name: String,
    params: Vec<TypeId>,
    ret: TypeId,
    /// Target arguments to source parameters.
    args: Vec<Conversion>,
    /// Source result to target result.
    result: Conversion,
    engine: Weak<EngineInner>,
}

impl DelegateFactory {
    /// Delegate type presented.
    #[inline]
    pub fn target(&self) -> TypeId {
        self.to
    }

    /// Delegate type wrapped.
    #[inline]
    pub fn source(&self) -> TypeId {
        self.from
    }

    /// A callable of the target delegate type wrapping `inner`.
    pub(crate) fn wrap(self: &Arc<Self>, inner: Callable) -> Value {
        Value::Callable(Callable::from_invoke(
            self.to,
            DelegateAdapter {
                factory: Arc::clone(self),
                inner,
            },
        ))
    }
}

impl fmt::Debug for DelegateFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateFactory")
            .field("to", &self.to_name)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

/// Body of a delegate adapter.
pub struct DelegateAdapter {
    factory: Arc<DelegateFactory>,
    inner: Callable,
}

impl DelegateAdapter {
    /// The adapter behind `value`, if it is a delegate adapter.
    pub fn from_value(value: &Value) -> Option<&DelegateAdapter> {
        value
            .as_callable()?
            .body()
            .as_proxy()?
            .as_any()
            .downcast_ref::<DelegateAdapter>()
    }

    pub fn factory(&self) -> &Arc<DelegateFactory> {
        &self.factory
    }

    pub fn inner(&self) -> &Callable {
        &self.inner
    }
}

impl Invoke for DelegateAdapter {
    fn invoke(&self, args: &[Value]) -> CallResult {
        let factory = &self.factory;
        let engine = factory.engine.upgrade().ok_or(CallError::EngineDropped)?;
        engine.check_arguments(&factory.to_name, &factory.params, args)?;
        let converted = engine.apply_all(&factory.args, args)?;
        let result = self.inner.invoke(&converted)?;
        if factory.ret == TypeId::VOID {
            return Ok(Value::Null);
        }
        engine.apply_conversion(factory.result, result)
    }

    fn as_proxy(&self) -> Option<&dyn Proxy> {
        Some(self)
    }
}

impl Proxy for DelegateAdapter {
    fn shape(&self) -> TypeId {
        self.factory.to
    }

    fn shape_name(&self) -> &str {
        &self.factory.to_name
    }

    fn unwrap(&self) -> Value {
        Value::Callable(self.inner.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl EngineInner {
    /// Build the conversion table between delegate types `to` and `from`.
    ///
    /// # Errors
    /// `InvalidCast` unless both are delegates whose parameters and return
    /// types are pairwise compatible; `NoConversion` if a compatible pair
    /// still cannot be planned.
    pub(crate) fn synthesize_delegate(&self, to: TypeId, from: TypeId) -> CastResult<DelegateFactory> {
        let mut guard = GuardStack::new();
        if !DelegateCaster.can_cast(self, to, from, &mut guard) {
            return Err(self.invalid_cast(from, to));
        }
        let to_desc = self.registry.get(to);
        let from_desc = self.registry.get(from);
        let (Some(to_sig), Some(from_sig)) = (&to_desc.invoke, &from_desc.invoke) else {
            return Err(self.invalid_cast(from, to));
        };
        let factory = DelegateFactory {
            to,
            from,
            to_name: to_desc.name.clone(),
            params: to_sig.params.clone(),
            ret: to_sig.ret,
            args: self.plan_all(&from_sig.params, &to_sig.params)?,
            result: self.plan_conversion(to_sig.ret, from_sig.ret)?,
            engine: self.this.clone(),
        };
        debug!(to = %to_desc.name, from = %from_desc.name, "synthesized delegate adapter");
        Ok(factory)
    }

    pub(crate) fn invalid_cast(&self, from: TypeId, to: TypeId) -> CastError {
        CastError::InvalidCast {
            from: self.registry.name(from),
            to: self.registry.name(to),
        }
    }
}
