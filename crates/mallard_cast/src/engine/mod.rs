//! The cast engine.
//!
//! An [`Engine`] owns everything a cast needs: the injected type registry,
//! the adapter and verdict caches, the configuration and the strategy
//! chain. Engines are cheap to clone and share their state; independent
//! engines over one registry share nothing.
//!
//! # Cast order
//!
//! 1. `Null` casts to `Null`.
//! 2. An adapter is uncast to its source first, so adapters never nest.
//! 3. A value whose runtime type natively converts is returned unchanged.
//! 4. Otherwise the first strategy claiming the pair casts.
//! 5. If none does, the cast fails with `InvalidCast`.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::instrument;

use mallard_ir::{TypeId, TypeRegistry, Value};

use crate::cache::AdapterCache;
use crate::caster::{CasterChain, DelegateCaster, InterfaceCaster};
use crate::compat::GuardStack;
use crate::{CastResult, DelegateFactory, EngineConfig};

/// Shared engine state. Adapters hold it weakly.
pub(crate) struct EngineInner {
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) cache: AdapterCache,
    pub(crate) config: EngineConfig,
    pub(crate) casters: CasterChain,
    /// Handed to factories so adapters can call back without keeping the
    /// engine alive.
    pub(crate) this: Weak<EngineInner>,
}

impl EngineInner {
    fn new(registry: Arc<TypeRegistry>, config: EngineConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| EngineInner {
            registry,
            cache: AdapterCache::new(),
            config,
            casters: CasterChain::default(),
            this: this.clone(),
        })
    }

    /// Cast `value` to `to`; see the module docs for the order of attempts.
    pub(crate) fn cast(&self, to: TypeId, value: &Value) -> CastResult<Value> {
        if !self.registry.contains(to) {
            let from = self.registry.type_of(value).unwrap_or(TypeId::OBJECT);
            return Err(self.invalid_cast(from, to));
        }
        if value.is_null() {
            return Ok(Value::Null);
        }
        let value = self.casters.uncast(value);
        if self.registry.is_instance_of(to, &value) {
            return Ok(value);
        }
        let from = self.registry.type_of(&value).unwrap_or(TypeId::OBJECT);
        self.casters
            .cast(self, to, from, &value)
            .unwrap_or_else(|| Err(self.invalid_cast(from, to)))
    }

    pub(crate) fn can_cast(&self, to: TypeId, from: TypeId) -> bool {
        if !self.knows(to, from) {
            return false;
        }
        let mut guard = GuardStack::new();
        self.are_compatible(to, from, false, &mut guard)
    }

    pub(crate) fn can_static_cast(&self, to: TypeId, from: TypeId) -> bool {
        if !self.knows(to, from) {
            return false;
        }
        if let Some(verdict) = self.cache.static_verdict(to, from) {
            return verdict;
        }
        let mut guard = GuardStack::new();
        let verdict = self.casters.can_static_cast(self, to, from, &mut guard);
        self.cache.store_static_verdict(to, from, verdict);
        verdict
    }

    /// Whether both ids were issued by this engine's registry.
    fn knows(&self, to: TypeId, from: TypeId) -> bool {
        self.registry.contains(to) && self.registry.contains(from)
    }

    /// `InvalidCast` unless both ids belong to the registry.
    fn require_known(&self, to: TypeId, from: TypeId) -> CastResult<()> {
        if self.knows(to, from) {
            Ok(())
        } else {
            Err(self.invalid_cast(from, to))
        }
    }
}

/// Structural cast engine.
///
/// ```text
/// let engine = Engine::new(registry);
/// if engine.can_cast(shape, duck_type) {
///     let adapter = engine.cast(shape, &duck)?;
/// }
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Create an engine over `registry` with the default configuration.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: Arc<TypeRegistry>, config: EngineConfig) -> Self {
        Engine {
            inner: EngineInner::new(registry, config),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Convert `value` to `to`, producing an adapter when needed.
    ///
    /// # Errors
    /// `InvalidCast` if `to` is not a registered type or no strategy claims
    /// the pair; the claiming
    /// strategy's error otherwise (e.g. `MemberNotImplemented`).
    #[instrument(level = "debug", skip(self, value))]
    pub fn cast(&self, to: TypeId, value: &Value) -> CastResult<Value> {
        self.inner.cast(to, value)
    }

    /// Whether values of `from` can be cast to `to`, natively in either
    /// direction or through a strategy in either direction.
    #[instrument(level = "debug", skip(self))]
    pub fn can_cast(&self, to: TypeId, from: TypeId) -> bool {
        self.inner.can_cast(to, from)
    }

    /// Whether `value` can be cast to `to`. `Null` fits any reference type.
    pub fn can_cast_value(&self, to: TypeId, value: &Value) -> bool {
        if !self.inner.registry.contains(to) {
            return false;
        }
        if value.is_null() {
            return to != TypeId::VOID && !self.inner.registry.is_value_type(to);
        }
        let value = self.inner.casters.uncast(value);
        match self.inner.registry.type_of(&value) {
            Some(from) => self.inner.can_cast(to, from),
            None => false,
        }
    }

    /// Resolve and generate the adapter for `(to, from)` ahead of time.
    ///
    /// # Errors
    /// As for [`cast`](Self::cast).
    #[instrument(level = "debug", skip(self))]
    pub fn prepare_cast(&self, to: TypeId, from: TypeId) -> CastResult<()> {
        let inner = &*self.inner;
        inner.require_known(to, from)?;
        if inner.registry.is_assignable(to, from) {
            return Ok(());
        }
        inner
            .casters
            .prepare(inner, to, from)
            .unwrap_or_else(|| Err(inner.invalid_cast(from, to)))
    }

    /// Whether an adapter for `(to, from)` has been generated.
    pub fn is_prepared(&self, to: TypeId, from: TypeId) -> bool {
        let inner = &*self.inner;
        InterfaceCaster::is_prepared(inner, to, from) || inner.cache.delegates.contains((to, from))
    }

    /// The shared adapter presenting the static members of `from` as `to`.
    ///
    /// Every call for one pair returns the same adapter.
    ///
    /// # Errors
    /// `InvalidCast` if `to` is not an interface or `from` is one;
    /// `MemberNotImplemented` if a member has no static counterpart.
    #[instrument(level = "debug", skip(self))]
    pub fn static_cast(&self, to: TypeId, from: TypeId) -> CastResult<Value> {
        let inner = &*self.inner;
        inner.require_known(to, from)?;
        inner
            .casters
            .static_cast(inner, to, from)
            .unwrap_or_else(|| Err(inner.invalid_cast(from, to)))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn can_static_cast(&self, to: TypeId, from: TypeId) -> bool {
        self.inner.can_static_cast(to, from)
    }

    /// # Errors
    /// As for [`static_cast`](Self::static_cast).
    pub fn prepare_static_cast(&self, to: TypeId, from: TypeId) -> CastResult<()> {
        let inner = &*self.inner;
        inner.require_known(to, from)?;
        inner
            .casters
            .prepare_static(inner, to, from)
            .unwrap_or_else(|| Err(inner.invalid_cast(from, to)))
    }

    /// Whether the static adapter for `(to, from)` has been built.
    pub fn is_static_prepared(&self, to: TypeId, from: TypeId) -> bool {
        self.inner.cache.statics.contains((to, from))
    }

    /// The value an adapter was produced from; other values unchanged.
    /// Static adapters have no source and are returned as they are.
    pub fn uncast(&self, value: &Value) -> Value {
        self.inner.casters.uncast(value)
    }

    /// The delegate adapter factory for `(to, from)`, generating it if
    /// needed.
    ///
    /// # Errors
    /// `InvalidCast` unless both are delegate types of equal arity.
    pub fn delegate_factory(&self, to: TypeId, from: TypeId) -> CastResult<Arc<DelegateFactory>> {
        let inner = &*self.inner;
        inner.require_known(to, from)?;
        if !(inner.registry.get(to).is_delegate() && inner.registry.get(from).is_delegate()) {
            return Err(inner.invalid_cast(from, to));
        }
        DelegateCaster::factory(inner, to, from)
    }

    /// Number of cached verdicts, instance and static.
    pub fn verdict_count(&self) -> usize {
        self.inner.cache.verdict_count()
    }

    /// Number of generated interface adapter factories.
    pub fn factory_count(&self) -> usize {
        self.inner.cache.interfaces.len()
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &EngineInner {
        &self.inner
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("types", &self.inner.registry.type_count())
            .field("verdicts", &self.inner.cache.verdict_count())
            .field("factories", &self.inner.cache.interfaces.len())
            .finish()
    }
}
