//! Type identity handle.
//!
//! Every type the engine reasons about is referenced by a 32-bit `TypeId`
//! handed out by a [`TypeRegistry`](crate::TypeRegistry). Equality is
//! identity: two handles are the same type iff their indices match.
//!
//! Primitive types are pre-registered at fixed indices so that hot paths
//! (boxing checks, string/enum pairing) compare against constants instead
//! of consulting the registry.

use std::fmt;

/// A 32-bit index into a type registry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Pre-registered Types (indices 0-5) ===

    /// Root of every reference type; everything is assignable to it.
    pub const OBJECT: Self = Self(0);
    /// Absence of a value (method return type only).
    pub const VOID: Self = Self(1);
    /// Boolean value type.
    pub const BOOL: Self = Self(2);
    /// 64-bit signed integer value type.
    pub const INT: Self = Self(3);
    /// 64-bit float value type.
    pub const FLOAT: Self = Self(4);
    /// Immutable string (sealed reference type deriving from `OBJECT`).
    pub const STR: Self = Self(5);

    /// Number of pre-registered types.
    pub const PRIMITIVE_COUNT: u32 = 6;

    /// First index handed out to host-declared types.
    ///
    /// Indices between `PRIMITIVE_COUNT` and this value are reserved.
    pub const FIRST_DYNAMIC: u32 = 16;

    /// Sentinel for "no type".
    pub const NONE: Self = Self(u32::MAX);

    /// Create a handle from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this is one of the pre-registered types.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }

    /// Check if this is the `NONE` sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Human-readable name of a pre-registered type.
    ///
    /// Dynamic types need a registry to render their names.
    pub const fn primitive_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("object"),
            1 => Some("void"),
            2 => Some("bool"),
            3 => Some("int"),
            4 => Some("float"),
            5 => Some("string"),
            _ => None,
        }
    }

    /// Slot index inside the registry's storage.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "TypeId::NONE");
        }
        match self.primitive_name() {
            Some(name) => write!(f, "TypeId::{}", name.to_ascii_uppercase()),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}
