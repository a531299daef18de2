//! Per-type metadata flags.
//!
//! Computed once when a type is declared or defined and read on every
//! assignability and conversion query.

use bitflags::bitflags;

use crate::TypeKind;

bitflags! {
    /// Pre-computed type properties.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u16 {
        /// Values are copied, never shared; cannot be null.
        const VALUE_TYPE = 1 << 0;
        /// No type may derive from this one.
        const SEALED = 1 << 1;
        /// Cannot be instantiated directly.
        const ABSTRACT = 1 << 2;
        /// Only static members; never instantiated.
        const STATIC = 1 << 3;
    }
}

impl TypeFlags {
    /// Default flags implied by a type kind.
    pub fn for_kind(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Struct | TypeKind::Enum => Self::VALUE_TYPE | Self::SEALED,
            TypeKind::Delegate => Self::SEALED,
            TypeKind::Interface => Self::ABSTRACT,
            TypeKind::Class | TypeKind::GenericParam | TypeKind::Primitive => Self::empty(),
        }
    }
}
