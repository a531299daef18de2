//! Mallard cast engine: structural compatibility and adapter synthesis.
//!
//! Given a [`TypeRegistry`](mallard_ir::TypeRegistry) describing host types,
//! an [`Engine`] decides whether a value of one type can stand in for
//! another shape (interface, delegate or enum) by matching members
//! structurally, and if so builds an adapter forwarding to the original.
//!
//! # Architecture
//!
//! - `compat`: recursive compatibility analysis with a cycle guard
//! - `resolve`: best-match selection of source members
//! - `capability` / `descriptor`: flattening shapes and binding members
//! - `convert` / `synth`: conversion plans and forwarding tables
//! - `cache`: append-only factory and verdict caches
//! - `caster`: cast strategies in priority order
//! - `engine`: the public entry points
//!
//! # Tracing
//!
//! Call [`init_tracing`] and set `RUST_LOG=mallard_cast=debug` to see
//! descriptor resolution and factory synthesis.

mod cache;
mod capability;
mod caster;
mod compat;
mod config;
mod convert;
mod descriptor;
mod engine;
mod error;
mod resolve;
mod stack;
mod synth;
mod tracing_setup;


pub use capability::{CapabilitySet, CapabilitySignature, ShapeMember};
pub use compat::GuardStack;
pub use config::EngineConfig;
pub use convert::Conversion;
pub use descriptor::{AdapterDescriptor, Binding, DescriptorState, SourceMember};
pub use engine::Engine;
pub use error::{CastError, CastResult};
pub use stack::{ensure_sufficient_stack, DEFAULT_RED_ZONE, DEFAULT_STACK_GROWTH};
pub use synth::{
    Adapter, AdapterFactory, DelegateAdapter, DelegateFactory, EventSlot, MethodSlot, PropertySlot,
};
pub use tracing_setup::init_tracing;
