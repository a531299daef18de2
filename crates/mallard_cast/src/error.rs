//! Engine errors.

use mallard_ir::{CallError, MemberKind, RegistryError};
use thiserror::Error;

/// Result type for engine operations.
pub type CastResult<T> = Result<T, CastError>;

/// A failure to analyze, build or apply an adapter.
///
/// Every variant except `Call` is a deterministic function of the two types
/// involved.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CastError {
    /// Two distinct types produced the same registration key.
    #[error(transparent)]
    AmbiguousTypes(#[from] RegistryError),

    /// The target shape declares a member kind adapters cannot implement.
    #[error("`{shape}` declares {kind} `{member}`, which an adapter cannot implement")]
    UnsupportedMemberKind {
        shape: String,
        member: String,
        kind: MemberKind,
    },

    /// The source has no compatible counterpart for a member of the shape.
    #[error("`{source_type}` has no compatible implementation of `{shape}::{member}`")]
    MemberNotImplemented {
        shape: String,
        source_type: String,
        member: String,
    },

    /// No native conversion and no strategy claims the pair.
    #[error("a conversion from `{from}` to `{to}` does not exist")]
    InvalidCast { from: String, to: String },

    /// Two types were judged compatible but no conversion could be planned.
    #[error("no conversion plan from `{from}` to `{to}` despite a compatible verdict")]
    NoConversion { from: String, to: String },

    /// A call made while applying a cast failed.
    #[error(transparent)]
    Call(#[from] CallError),
}

impl From<CastError> for CallError {
    /// Surface an engine failure at a forwarding point.
    fn from(err: CastError) -> Self {
        match err {
            CastError::Call(inner) => inner,
            CastError::InvalidCast { from, to } => CallError::InvalidCast { from, to },
            other => CallError::Adapter(other.to_string()),
        }
    }
}
