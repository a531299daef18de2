//! Cast strategies.
//!
//! Each strategy handles one family of non-native conversions. The
//! [`CasterChain`] holds them sorted by priority; the first strategy whose
//! `should_cast` claims a pair performs the cast.
//!
//! # Priority
//!
//! 0. [`InterfaceCaster`]: instance adapters onto interface shapes
//! 1. [`DelegateCaster`]: callables between delegate types
//! 2. [`EnumStringCaster`]: enum values to and from their names
//! 3. [`GenericParamCaster`]: between generic parameters at one position
//!
//! Static sources have their own chain of [`StaticCaster`]s, currently only
//! [`StaticInterfaceCaster`].

mod delegate;
mod enum_string;
mod generic_param;
mod interface;
mod static_interface;

pub(crate) use delegate::DelegateCaster;
pub(crate) use enum_string::EnumStringCaster;
pub(crate) use generic_param::GenericParamCaster;
pub(crate) use interface::InterfaceCaster;
pub(crate) use static_interface::StaticInterfaceCaster;

use mallard_ir::{TypeId, Value};

use crate::compat::GuardStack;
use crate::engine::EngineInner;
use crate::CastResult;

/// A strategy for converting between two non-natively related types.
pub(crate) trait Caster {
    /// Name used in trace output.
    fn name(&self) -> &'static str;

    /// Lower runs first.
    fn priority(&self) -> u8;

    /// Whether this strategy is responsible for converting `from` into `to`.
    ///
    /// Claiming a pair does not promise the conversion succeeds.
    fn should_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool;

    /// Whether this strategy can convert `from` into `to`.
    fn can_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool;

    /// Whether a `to` value produced from a `from` value could be converted
    /// back, i.e. whether this strategy converts `to` into `from`.
    fn could_uncast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        self.can_cast(engine, from, to, guard)
    }

    /// Resolve and generate whatever `cast` needs for the pair.
    fn prepare(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<()>;

    /// Convert `value` (already uncast, never `Null`) to `to`.
    fn cast(&self, engine: &EngineInner, to: TypeId, value: &Value) -> CastResult<Value>;

    /// Whether `value` was produced by this strategy and can be unwrapped.
    fn should_uncast(&self, value: &Value) -> bool;

    /// The value `value` was produced from.
    fn uncast(&self, value: &Value) -> Value;
}

/// Enum dispatch over the fixed set of strategies.
#[derive(Copy, Clone, Debug)]
pub(crate) enum CasterKind {
    Interface(InterfaceCaster),
    Delegate(DelegateCaster),
    EnumString(EnumStringCaster),
    GenericParam(GenericParamCaster),
}

macro_rules! dispatch {
    ($self:ident, $caster:ident => $body:expr) => {
        match $self {
            CasterKind::Interface($caster) => $body,
            CasterKind::Delegate($caster) => $body,
            CasterKind::EnumString($caster) => $body,
            CasterKind::GenericParam($caster) => $body,
        }
    };
}

impl CasterKind {
    pub(crate) fn name(&self) -> &'static str {
        dispatch!(self, c => c.name())
    }

    pub(crate) fn priority(&self) -> u8 {
        dispatch!(self, c => c.priority())
    }

    fn should_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool {
        dispatch!(self, c => c.should_cast(engine, to, from))
    }

    fn can_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        dispatch!(self, c => c.can_cast(engine, to, from, guard))
    }

    fn could_uncast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        dispatch!(self, c => c.could_uncast(engine, to, from, guard))
    }

    fn prepare(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<()> {
        dispatch!(self, c => c.prepare(engine, to, from))
    }

    fn cast(&self, engine: &EngineInner, to: TypeId, value: &Value) -> CastResult<Value> {
        dispatch!(self, c => c.cast(engine, to, value))
    }

    fn should_uncast(&self, value: &Value) -> bool {
        dispatch!(self, c => c.should_uncast(value))
    }

    fn uncast(&self, value: &Value) -> Value {
        dispatch!(self, c => c.uncast(value))
    }
}

/// A strategy for adapting the static members of a type.
pub(crate) trait StaticCaster {
    fn name(&self) -> &'static str;

    fn priority(&self) -> u8;

    fn should_static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool;

    fn can_static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool;

    fn prepare_static(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<()>;

    /// The shared adapter presenting the static members of `from` as `to`.
    fn static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<Value>;
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum StaticCasterKind {
    Interface(StaticInterfaceCaster),
}

impl StaticCasterKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Interface(c) => c.name(),
        }
    }

    pub(crate) fn priority(&self) -> u8 {
        match self {
            Self::Interface(c) => c.priority(),
        }
    }

    fn should_static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool {
        match self {
            Self::Interface(c) => c.should_static_cast(engine, to, from),
        }
    }

    fn can_static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        match self {
            Self::Interface(c) => c.can_static_cast(engine, to, from, guard),
        }
    }

    fn prepare_static(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<()> {
        match self {
            Self::Interface(c) => c.prepare_static(engine, to, from),
        }
    }

    fn static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> CastResult<Value> {
        match self {
            Self::Interface(c) => c.static_cast(engine, to, from),
        }
    }
}

/// Strategies tried in priority order.
#[derive(Clone, Debug)]
pub(crate) struct CasterChain {
    casters: Vec<CasterKind>,
    statics: Vec<StaticCasterKind>,
}

impl Default for CasterChain {
    fn default() -> Self {
        CasterChain::new(
            vec![
                CasterKind::Interface(InterfaceCaster),
                CasterKind::Delegate(DelegateCaster),
                CasterKind::EnumString(EnumStringCaster),
                CasterKind::GenericParam(GenericParamCaster),
            ],
            vec![StaticCasterKind::Interface(StaticInterfaceCaster)],
        )
    }
}

impl CasterChain {
    /// Create a chain; strategies are sorted by priority (lowest first).
    pub(crate) fn new(mut casters: Vec<CasterKind>, mut statics: Vec<StaticCasterKind>) -> Self {
        casters.sort_by_key(CasterKind::priority);
        statics.sort_by_key(StaticCasterKind::priority);
        CasterChain { casters, statics }
    }

    /// The first strategy claiming `(to, from)`.
    fn claimant(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> Option<&CasterKind> {
        self.casters.iter().find(|c| c.should_cast(engine, to, from))
    }

    pub(crate) fn should_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> bool {
        self.claimant(engine, to, from).is_some()
    }

    pub(crate) fn can_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        self.casters.iter().any(|c| c.can_cast(engine, to, from, guard))
    }

    pub(crate) fn could_uncast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        self.casters.iter().any(|c| c.could_uncast(engine, to, from, guard))
    }

    /// Prepare with the claiming strategy; `None` if nothing claims the pair.
    pub(crate) fn prepare(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> Option<CastResult<()>> {
        self.claimant(engine, to, from).map(|c| c.prepare(engine, to, from))
    }

    /// Cast with the claiming strategy; `None` if nothing claims the pair.
    pub(crate) fn cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, value: &Value) -> Option<CastResult<Value>> {
        let caster = self.claimant(engine, to, from)?;
        tracing::trace!(caster = caster.name(), ?to, ?from, "dispatching cast");
        Some(caster.cast(engine, to, value))
    }

    /// Unwrap `value` until no strategy recognizes it.
    pub(crate) fn uncast(&self, value: &Value) -> Value {
        let mut current = value.clone();
        while let Some(caster) = self.casters.iter().find(|c| c.should_uncast(&current)) {
            current = caster.uncast(&current);
        }
        current
    }

    fn static_claimant(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> Option<&StaticCasterKind> {
        self.statics.iter().find(|c| c.should_static_cast(engine, to, from))
    }

    pub(crate) fn can_static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        self.statics.iter().any(|c| c.can_static_cast(engine, to, from, guard))
    }

    pub(crate) fn prepare_static(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> Option<CastResult<()>> {
        self.static_claimant(engine, to, from).map(|c| c.prepare_static(engine, to, from))
    }

    pub(crate) fn static_cast(&self, engine: &EngineInner, to: TypeId, from: TypeId) -> Option<CastResult<Value>> {
        let caster = self.static_claimant(engine, to, from)?;
        tracing::trace!(caster = caster.name(), ?to, ?from, "dispatching static cast");
        Some(caster.static_cast(engine, to, from))
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.casters.iter().map(CasterKind::name).collect()
    }
}
