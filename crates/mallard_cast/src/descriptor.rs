//! Adapter descriptors: which source member implements each shape member.

use tracing::debug;

use mallard_ir::{EventDef, Heap, MethodDef, PropertyDef, TypeId};

use crate::capability::{CapabilitySet, CapabilitySignature, ShapeMember, SourceMembers};
use crate::compat::GuardStack;
use crate::engine::EngineInner;
use crate::{CastError, CastResult};

/// The source member bound to a shape member.
#[derive(Clone, Debug)]
pub enum SourceMember {
    Method(Heap<MethodDef>),
    Property(Heap<PropertyDef>),
    Event(Heap<EventDef>),
}

/// One resolved shape member.
#[derive(Clone, Debug)]
pub struct Binding {
    pub signature: CapabilitySignature,
    pub source: SourceMember,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DescriptorState {
    Unresolved,
    /// Every shape member has a binding.
    Resolved,
    /// A factory was synthesized from the bindings.
    Generated,
}

/// Mapping from a shape's members to a source type's members.
#[derive(Clone, Debug)]
pub struct AdapterDescriptor {
    pub shape: TypeId,
    pub source: TypeId,
    pub is_static: bool,
    pub bindings: Vec<Binding>,
    pub state: DescriptorState,
}

impl AdapterDescriptor {
    fn new(shape: TypeId, source: TypeId, is_static: bool) -> Self {
        AdapterDescriptor {
            shape,
            source,
            is_static,
            bindings: Vec::new(),
            state: DescriptorState::Unresolved,
        }
    }

    pub(crate) fn mark_generated(&mut self) {
        debug_assert_eq!(self.state, DescriptorState::Resolved);
        self.state = DescriptorState::Generated;
    }
}

impl EngineInner {
    /// Resolve every member of `shape` against `source`.
    ///
    /// # Errors
    /// `UnsupportedMemberKind` for shapes with fields, `MemberNotImplemented`
    /// for the first shape member without a compatible source member. No
    /// partial descriptor is returned.
    pub(crate) fn build_descriptor(
        &self,
        shape: TypeId,
        source: TypeId,
        is_static: bool,
        guard: &mut GuardStack,
    ) -> CastResult<AdapterDescriptor> {
        let capabilities = CapabilitySet::of(&self.registry, shape)?;
        let members = SourceMembers::of(&self.registry, source, is_static);
        let mut descriptor = AdapterDescriptor::new(shape, source, is_static);

        for signature in capabilities {
            let found = match &signature.member {
                ShapeMember::Method(m) => self
                    .find_best_method(m, &members, is_static, guard)
                    .map(SourceMember::Method),
                ShapeMember::Property(p) => self
                    .find_best_property(p, &members, is_static, guard)
                    .map(SourceMember::Property),
                ShapeMember::Event(e) => self
                    .find_best_event(e, &members, is_static, guard)
                    .map(SourceMember::Event),
            };
            let Some(source_member) = found else {
                return Err(CastError::MemberNotImplemented {
                    shape: self.registry.name(shape),
                    source_type: self.registry.name(source),
                    member: signature.describe(&self.registry),
                });
            };
            descriptor.bindings.push(Binding {
                signature,
                source: source_member,
            });
        }

        descriptor.state = DescriptorState::Resolved;
        debug!(
            shape = %self.registry.name(shape),
            source = %self.registry.name(source),
            is_static,
            members = descriptor.bindings.len(),
            "resolved adapter descriptor"
        );
        Ok(descriptor)
    }
}
