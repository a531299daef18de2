//! Registry and per-call error types.

use thiserror::Error;

use crate::TypeId;

/// Result of invoking a member, callable, or forwarding stub.
pub type CallResult<T = crate::Value> = Result<T, CallError>;

/// A failure raised at the point of a call.
///
/// Forwarding stubs surface these unchanged: a conversion that fails inside
/// an adapter reports the same error a direct call would.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CallError {
    /// `Null` arrived where a value type is required.
    #[error("null value where `{expected}` is required")]
    NullValue { expected: String },

    /// A value of the wrong runtime type reached a value-typed slot.
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    /// A reference of the wrong runtime type reached a reference-typed slot,
    /// or a recursive cast found no conversion.
    #[error("a conversion from `{from}` to `{to}` does not exist")]
    InvalidCast { from: String, to: String },

    /// Wrong number of arguments for a member.
    #[error("`{member}` takes {expected} argument(s), {found} given")]
    ArityMismatch {
        member: String,
        expected: usize,
        found: usize,
    },

    /// The member is declared but the host supplied no implementation.
    #[error("`{member}` has no implementation")]
    MissingBody { member: String },

    /// No member with that name (and shape) exists on the target.
    #[error("`{owner}` has no member `{member}`")]
    UnknownMember { owner: String, member: String },

    /// Enum parsing failed.
    #[error("`{name}` is not a variant of `{enum_name}`")]
    UnknownVariant { enum_name: String, name: String },

    /// The engine owning an adapter was dropped before the adapter was used.
    #[error("the cast engine backing this adapter has been dropped")]
    EngineDropped,

    /// Failure reported by a host-provided member body.
    #[error("{0}")]
    Host(String),

    /// A nested cast failed for a reason other than a missing conversion.
    #[error("adapter failure: {0}")]
    Adapter(String),
}

impl CallError {
    /// Convenience constructor for host bodies.
    pub fn host(message: impl Into<String>) -> Self {
        CallError::Host(message.into())
    }
}

/// Error raised while declaring or defining types.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two registrations produced the same structural key.
    ///
    /// This indicates a defect in how the host describes its types; the
    /// engine never retries or merges.
    #[error(
        "types cannot be distinguished from one another for keying:\n  type 1: {first}\n  type 2: {second}"
    )]
    AmbiguousTypes { first: String, second: String },

    /// The identity was not issued by this registry.
    #[error("type id {id:?} was not issued by this registry")]
    UnknownType { id: TypeId },

    /// `define` was called twice for the same type.
    #[error("type `{name}` is already defined")]
    AlreadyDefined { name: String },

    /// Instance creation requested for a type that is not a concrete class.
    #[error("type `{name}` cannot be instantiated")]
    NotInstantiable { name: String },
}
