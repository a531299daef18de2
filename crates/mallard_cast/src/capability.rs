//! Capability sets: the flattened members a shape requires, and the members
//! a source type offers.

use std::fmt::Write as _;

use rustc_hash::FxHashSet;

use mallard_ir::{EventDef, Heap, MemberKind, MethodDef, PropertyDef, TypeId, TypeRegistry};

use crate::{CastError, CastResult};

/// A member declared by a target shape.
#[derive(Clone, Debug)]
pub enum ShapeMember {
    Method(Heap<MethodDef>),
    Property(Heap<PropertyDef>),
    Event(Heap<EventDef>),
}

/// One required member of a shape.
#[derive(Clone, Debug)]
pub struct CapabilitySignature {
    pub kind: MemberKind,
    pub name: String,
    /// Method parameters or indexer parameters.
    pub params: Vec<TypeId>,
    /// Method return type, property type or event handler type.
    pub ret: TypeId,
    pub is_static: bool,
    pub generic_arity: u16,
    /// Shape that declared the member.
    pub declaring: TypeId,
    pub member: ShapeMember,
}

impl CapabilitySignature {
    fn method(declaring: TypeId, method: &Heap<MethodDef>) -> Self {
        CapabilitySignature {
            kind: MemberKind::Method,
            name: method.name.clone(),
            params: method.params.clone(),
            ret: method.ret,
            is_static: method.is_static,
            generic_arity: method.generic_arity,
            declaring,
            member: ShapeMember::Method(method.clone()),
        }
    }

    fn property(declaring: TypeId, property: &Heap<PropertyDef>) -> Self {
        CapabilitySignature {
            kind: property.kind(),
            name: property.name.clone(),
            params: property.index.clone(),
            ret: property.ty,
            is_static: property.is_static,
            generic_arity: 0,
            declaring,
            member: ShapeMember::Property(property.clone()),
        }
    }

    fn event(declaring: TypeId, event: &Heap<EventDef>) -> Self {
        CapabilitySignature {
            kind: MemberKind::Event,
            name: event.name.clone(),
            params: Vec::new(),
            ret: event.handler,
            is_static: event.is_static,
            generic_arity: 0,
            declaring,
            member: ShapeMember::Event(event.clone()),
        }
    }

    /// Same kind, name and types; the declaring shape is ignored.
    pub fn same_signature(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.params == other.params
            && self.ret == other.ret
            && self.is_static == other.is_static
            && self.generic_arity == other.generic_arity
    }

    /// Human-readable rendering, e.g. `string Method(string)`.
    pub fn describe(&self, registry: &TypeRegistry) -> String {
        let mut out = String::new();
        match self.kind {
            MemberKind::Event => {
                let _ = write!(out, "event {} {}", registry.name(self.ret), self.name);
            }
            MemberKind::Property | MemberKind::Field => {
                let _ = write!(out, "{} {}", registry.name(self.ret), self.name);
            }
            MemberKind::Method | MemberKind::Indexer => {
                let (open, close) = if self.kind == MemberKind::Indexer {
                    ('[', ']')
                } else {
                    ('(', ')')
                };
                let _ = write!(out, "{} {}", registry.name(self.ret), self.name);
                if self.generic_arity > 0 {
                    let _ = write!(out, "<{}>", self.generic_arity);
                }
                out.push(open);
                for (i, param) in self.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&registry.name(*param));
                }
                out.push(close);
            }
        }
        out
    }
}

/// Ordered required members of a shape, extended interfaces included.
#[derive(Clone, Debug, Default)]
pub struct CapabilitySet {
    signatures: Vec<CapabilitySignature>,
}

impl CapabilitySet {
    /// Flatten `shape`: its own members first, then each extended interface
    /// depth-first, every interface at most once.
    ///
    /// # Errors
    /// `UnsupportedMemberKind` if any visited shape declares a field.
    pub fn of(registry: &TypeRegistry, shape: TypeId) -> CastResult<Self> {
        let mut set = CapabilitySet::default();
        let mut visited = FxHashSet::default();
        set.collect(registry, shape, &mut visited)?;
        Ok(set)
    }

    fn collect(
        &mut self,
        registry: &TypeRegistry,
        shape: TypeId,
        visited: &mut FxHashSet<TypeId>,
    ) -> CastResult<()> {
        if !visited.insert(shape) {
            return Ok(());
        }
        let desc = registry.get(shape);
        if let Some(field) = desc.fields.first() {
            return Err(CastError::UnsupportedMemberKind {
                shape: desc.name.clone(),
                member: field.name.clone(),
                kind: MemberKind::Field,
            });
        }
        for method in &desc.methods {
            self.add(CapabilitySignature::method(shape, method));
        }
        for property in &desc.properties {
            self.add(CapabilitySignature::property(shape, property));
        }
        for event in &desc.events {
            self.add(CapabilitySignature::event(shape, event));
        }
        for &extended in &desc.interfaces {
            self.collect(registry, extended, visited)?;
        }
        Ok(())
    }

    fn add(&mut self, signature: CapabilitySignature) {
        if !self.signatures.iter().any(|s| s.same_signature(&signature)) {
            self.signatures.push(signature);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CapabilitySignature> {
        self.signatures.iter()
    }
}

impl IntoIterator for CapabilitySet {
    type Item = CapabilitySignature;
    type IntoIter = std::vec::IntoIter<CapabilitySignature>;

    fn into_iter(self) -> Self::IntoIter {
        self.signatures.into_iter()
    }
}

/// Members a source type offers to the resolver.
///
/// Instance sources list their own members before inherited ones, so among
/// equally good overloads the most derived declaration wins. Static sources
/// offer only the type's own static members.
#[derive(Debug, Default)]
pub(crate) struct SourceMembers {
    pub methods: Vec<Heap<MethodDef>>,
    pub properties: Vec<Heap<PropertyDef>>,
    pub events: Vec<Heap<EventDef>>,
}

impl SourceMembers {
    pub(crate) fn of(registry: &TypeRegistry, source: TypeId, is_static: bool) -> Self {
        let owners = if is_static {
            vec![source]
        } else if registry.get(source).is_interface() {
            let mut owners = vec![source];
            owners.extend(registry.all_interfaces(source));
            owners
        } else {
            registry.inheritance_chain(source)
        };

        let mut members = SourceMembers::default();
        for owner in owners {
            let desc = registry.get(owner);
            members.methods.extend(
                desc.methods
                    .iter()
                    .filter(|m| m.is_static == is_static)
                    .cloned(),
            );
            members.properties.extend(
                desc.properties
                    .iter()
                    .filter(|p| p.is_static == is_static)
                    .cloned(),
            );
            members.events.extend(
                desc.events
                    .iter()
                    .filter(|e| e.is_static == is_static)
                    .cloned(),
            );
        }
        members
    }
}
