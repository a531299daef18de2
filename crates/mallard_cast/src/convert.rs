//! Value conversions applied by forwarding stubs.
//!
//! Each conversion is planned once, when a factory is synthesized, from the
//! static types on both sides. Applying it only inspects the runtime value.

use mallard_ir::{CallError, CallResult, TypeId, TypeKind, Value};

use crate::engine::EngineInner;
use crate::{CastError, CastResult};

/// How a value of one type becomes a value of another.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Same representation; nothing to do (identity, upcast, boxing).
    Identity,
    /// Reference to value type: null and foreign values are rejected.
    Unbox { to: TypeId },
    /// Reference to more derived reference: null passes.
    Downcast { to: TypeId },
    /// Between generic parameters.
    PassThrough,
    /// Through the engine: adapter, enum/string or uncast.
    Duck { to: TypeId },
}

impl EngineInner {
    /// Plan the conversion of a `from` value into a `to` slot.
    ///
    /// # Errors
    /// `NoConversion` if the types were judged compatible but none of the
    /// conversion rules applies.
    pub(crate) fn plan_conversion(&self, to: TypeId, from: TypeId) -> CastResult<Conversion> {
        if to == from || to == TypeId::VOID || from == TypeId::VOID {
            return Ok(Conversion::Identity);
        }
        let registry = &self.registry;
        if self.native_either(to, from) {
            let to_value = registry.is_value_type(to);
            return Ok(if to_value && !registry.is_value_type(from) {
                Conversion::Unbox { to }
            } else if !to_value && !registry.is_assignable(to, from) {
                Conversion::Downcast { to }
            } else {
                Conversion::Identity
            });
        }
        if registry.kind(to) == TypeKind::GenericParam && registry.kind(from) == TypeKind::GenericParam {
            return Ok(Conversion::PassThrough);
        }
        if self.casters.should_cast(self, to, from) || self.casters.should_cast(self, from, to) {
            return Ok(Conversion::Duck { to });
        }
        Err(CastError::NoConversion {
            from: registry.name(from),
            to: registry.name(to),
        })
    }

    /// Apply a planned conversion.
    ///
    /// # Errors
    /// `NullValue`, `TypeMismatch` or `InvalidCast` as described on each
    /// [`Conversion`] variant; engine failures for `Duck`.
    pub(crate) fn apply_conversion(&self, conversion: Conversion, value: Value) -> CallResult {
        match conversion {
            Conversion::Identity | Conversion::PassThrough => Ok(value),
            Conversion::Unbox { to } => {
                if value.is_null() {
                    return Err(CallError::NullValue {
                        expected: self.registry.name(to),
                    });
                }
                if value.type_id() == Some(to) {
                    Ok(value)
                } else {
                    Err(CallError::TypeMismatch {
                        expected: self.registry.name(to),
                        found: self.registry.type_name_of(&value),
                    })
                }
            }
            Conversion::Downcast { to } => {
                if self.registry.is_instance_of(to, &value) {
                    Ok(value)
                } else {
                    Err(CallError::InvalidCast {
                        from: self.registry.type_name_of(&value),
                        to: self.registry.name(to),
                    })
                }
            }
            Conversion::Duck { to } => {
                let converted = self.cast(to, &value)?;
                if converted.is_null() && self.registry.is_value_type(to) {
                    return Err(CallError::NullValue {
                        expected: self.registry.name(to),
                    });
                }
                Ok(converted)
            }
        }
    }

    /// Plan conversions for a list of slots, pairwise.
    pub(crate) fn plan_all(&self, to: &[TypeId], from: &[TypeId]) -> CastResult<Vec<Conversion>> {
        to.iter()
            .zip(from)
            .map(|(&t, &f)| self.plan_conversion(t, f))
            .collect()
    }

    /// Apply conversions pairwise.
    pub(crate) fn apply_all(&self, conversions: &[Conversion], values: &[Value]) -> CallResult<Vec<Value>> {
        conversions
            .iter()
            .zip(values)
            .map(|(&c, v)| self.apply_conversion(c, v.clone()))
            .collect()
    }
}
