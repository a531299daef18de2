//! Type descriptors: what the registry knows about one type.

use crate::event::EventTable;
use crate::member::{DelegateSignature, EnumVariant, EventDef, FieldDef, MethodDef, PropertyDef};
use crate::value::Heap;
use crate::{TypeFlags, TypeId};

/// Kind of a registered type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Reference type with a single-inheritance class chain.
    Class,
    /// User-defined value type.
    Struct,
    Interface,
    /// Function type with a single invoke signature.
    Delegate,
    Enum,
    /// A generic parameter of a type or a method.
    GenericParam,
    /// One of the pre-registered scalar types.
    Primitive,
}

/// Declaration site of a generic parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GenericOwner {
    Type(TypeId),
    Method { declaring: TypeId, method: String },
}

/// Structural registration key.
///
/// Keys identify types; the registry refuses a second registration with an
/// equal key instead of merging the two.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// A non-generic or generic-definition type by its full path.
    Named(String),
    /// A constructed generic type.
    Constructed { definition: String, args: Vec<TypeId> },
    GenericParam { owner: GenericOwner, position: u16 },
}

impl From<&str> for TypeKey {
    fn from(path: &str) -> Self {
        TypeKey::Named(path.to_owned())
    }
}

impl From<String> for TypeKey {
    fn from(path: String) -> Self {
        TypeKey::Named(path)
    }
}

/// Members and relationships supplied by the host when defining a type.
#[derive(Clone, Debug, Default)]
pub struct TypeDefinition {
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub methods: Vec<MethodDef>,
    pub properties: Vec<PropertyDef>,
    pub events: Vec<EventDef>,
    pub fields: Vec<FieldDef>,
    pub variants: Vec<EnumVariant>,
    pub invoke: Option<DelegateSignature>,
    pub generic_arity: u16,
    /// Flags added to the ones implied by the kind.
    pub flags: TypeFlags,
}

impl TypeDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    /// Implemented interface (or, for interfaces, extended interface).
    #[must_use]
    pub fn implements(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn event(mut self, event: EventDef) -> Self {
        self.events.push(event);
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn variant(mut self, name: impl Into<String>, value: i64) -> Self {
        self.variants.push(EnumVariant::new(name, value));
        self
    }

    #[must_use]
    pub fn invoke(mut self, params: Vec<TypeId>, ret: TypeId) -> Self {
        self.invoke = Some(DelegateSignature::new(params, ret));
        self
    }

    #[must_use]
    pub fn generic_arity(mut self, arity: u16) -> Self {
        self.generic_arity = arity;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Every type the definition mentions, in no particular order.
    pub(crate) fn referenced_types(&self) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = self.base.into_iter().chain(self.interfaces.iter().copied()).collect();
        for method in &self.methods {
            out.extend(method.params.iter().copied());
            out.push(method.ret);
        }
        for property in &self.properties {
            out.extend(property.index.iter().copied());
            out.push(property.ty);
        }
        out.extend(self.events.iter().map(|e| e.handler));
        out.extend(self.fields.iter().map(|f| f.ty));
        if let Some(sig) = &self.invoke {
            out.extend(sig.params.iter().copied());
            out.push(sig.ret);
        }
        out
    }
}

/// Everything the registry knows about one type.
///
/// Immutable once defined; members keep the order the host declared them in.
#[derive(Debug)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: String,
    pub key: TypeKey,
    pub kind: TypeKind,
    pub flags: TypeFlags,
    pub base: Option<TypeId>,
    /// Directly implemented (or extended) interfaces.
    pub interfaces: Vec<TypeId>,
    pub methods: Vec<Heap<MethodDef>>,
    pub properties: Vec<Heap<PropertyDef>>,
    pub events: Vec<Heap<EventDef>>,
    pub fields: Vec<FieldDef>,
    pub variants: Vec<EnumVariant>,
    pub invoke: Option<DelegateSignature>,
    pub generic_arity: u16,
    pub defined: bool,
    /// Subscriber lists of the type's static events.
    pub static_events: EventTable,
}

impl TypeDescriptor {
    pub(crate) fn declared(id: TypeId, name: String, key: TypeKey, kind: TypeKind) -> Self {
        TypeDescriptor {
            id,
            name,
            key,
            kind,
            flags: TypeFlags::for_kind(kind),
            base: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            fields: Vec::new(),
            variants: Vec::new(),
            invoke: None,
            generic_arity: 0,
            defined: false,
            static_events: EventTable::default(),
        }
    }

    /// Placeholder for an id the registry never issued.
    pub(crate) fn unknown(id: TypeId) -> Self {
        let name = format!("{id:?}");
        TypeDescriptor::declared(id, name.clone(), TypeKey::Named(name), TypeKind::Primitive)
    }

    pub(crate) fn with_definition(&self, def: TypeDefinition) -> Self {
        let base = def.base.or(match self.kind {
            TypeKind::Class | TypeKind::Struct | TypeKind::Enum | TypeKind::Delegate
                if self.id != TypeId::OBJECT =>
            {
                Some(TypeId::OBJECT)
            }
            _ => None,
        });
        TypeDescriptor {
            id: self.id,
            name: self.name.clone(),
            key: self.key.clone(),
            kind: self.kind,
            flags: self.flags | def.flags,
            base,
            interfaces: def.interfaces,
            methods: def.methods.into_iter().map(Heap::new).collect(),
            properties: def.properties.into_iter().map(Heap::new).collect(),
            events: def.events.into_iter().map(Heap::new).collect(),
            fields: def.fields,
            variants: def.variants,
            invoke: def.invoke,
            generic_arity: def.generic_arity,
            defined: true,
            static_events: EventTable::default(),
        }
    }

    #[inline]
    pub fn is_value_type(&self) -> bool {
        self.flags.contains(TypeFlags::VALUE_TYPE)
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    #[inline]
    pub fn is_delegate(&self) -> bool {
        self.kind == TypeKind::Delegate
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    /// Declaration position, for generic parameters.
    pub fn generic_position(&self) -> Option<u16> {
        match &self.key {
            TypeKey::GenericParam { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Heap<MethodDef>> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&Heap<PropertyDef>> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&Heap<EventDef>> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn variant_named(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_valued(&self, value: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }
}
