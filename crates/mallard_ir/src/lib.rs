//! Type and value model for the mallard adapter engine.
//!
//! This crate is the introspection boundary: the host describes its types in
//! a [`TypeRegistry`] and exchanges [`Value`]s with the engine. Nothing here
//! decides compatibility; that lives in `mallard_cast`.
//!
//! - [`TypeId`]: 32-bit type handle with pre-registered primitives
//! - [`TypeDescriptor`] / [`TypeDefinition`]: what a type declares
//! - [`MethodDef`], [`PropertyDef`], [`EventDef`], [`FieldDef`]: members
//! - [`Value`]: runtime values, including adapters
//! - [`EventTable`]: per-owner event subscriber lists

mod descriptor;
mod error;
mod event;
mod flags;
mod member;
mod registry;
mod type_id;
mod value;

pub use descriptor::{GenericOwner, TypeDefinition, TypeDescriptor, TypeKey, TypeKind};
pub use error::{CallError, CallResult, RegistryError};
pub use event::{EventTable, Multicast};
pub use flags::TypeFlags;
pub use member::{
    Accessor, DelegateSignature, EnumVariant, EventDef, FieldDef, GetterBody, MemberKind,
    MethodBody, MethodDef, NativeFn, NativeSetFn, PropertyDef, SetterBody, Visibility,
};
pub use registry::TypeRegistry;
pub use type_id::TypeId;
pub use value::{Callable, EnumValue, Heap, Instance, Invoke, Proxy, StructValue, Value};
