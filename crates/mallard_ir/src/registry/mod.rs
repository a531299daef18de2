//! Type registry: the host-populated introspection boundary.
//!
//! The engine never reflects over Rust types. Everything it knows about a
//! type (its kind, class chain, interfaces and public members) comes from a
//! `TypeRegistry` that the host fills in and hands to the engine.
//!
//! # Registration
//!
//! Registration is two-phase so that shapes can refer to themselves:
//!
//! 1. [`declare`](TypeRegistry::declare) reserves an identity for a key.
//! 2. [`define`](TypeRegistry::define) attaches members, exactly once.
//!
//! # Thread Safety
//!
//! The registry sits behind a `parking_lot::RwLock`. Descriptors are handed
//! out as shared [`Heap`] handles, so readers never hold the lock while they
//! walk members.

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::value::{Heap, Instance};
use crate::{
    GenericOwner, RegistryError, TypeDefinition, TypeDescriptor, TypeFlags, TypeId, TypeKey,
    TypeKind, Value,
};

/// Application-owned table of type descriptors.
pub struct TypeRegistry {
    inner: RwLock<RegistryInner>,
}

struct RegistryInner {
    /// Descriptor storage, indexed by `TypeId`.
    types: Vec<Heap<TypeDescriptor>>,
    /// Reverse lookup for duplicate detection.
    keys: FxHashMap<TypeKey, TypeId>,
}

impl TypeRegistry {
    /// Create a registry with the primitive types pre-registered.
    pub fn new() -> Self {
        let mut inner = RegistryInner {
            types: Vec::with_capacity(TypeId::FIRST_DYNAMIC as usize * 2),
            keys: FxHashMap::default(),
        };
        inner.register_primitives();
        TypeRegistry {
            inner: RwLock::new(inner),
        }
    }

    /// Reserve an identity for `key`.
    ///
    /// # Errors
    /// `AmbiguousTypes` if `key` is already registered.
    pub fn declare(&self, key: impl Into<TypeKey>, kind: TypeKind) -> Result<TypeId, RegistryError> {
        let key = key.into();
        let mut inner = self.inner.write();
        if let Some(&existing) = inner.keys.get(&key) {
            let first = inner.diagnostic(existing);
            let second = format!("{} ({kind:?}, key {key:?})", inner.render_key(&key));
            return Err(RegistryError::AmbiguousTypes { first, second });
        }
        let name = inner.render_key(&key);
        Ok(inner.push(name, key, kind))
    }

    /// Identity of generic parameter `position` of `owner`, declaring it on
    /// first use.
    pub fn generic_param(&self, owner: GenericOwner, position: u16, name: &str) -> TypeId {
        let key = TypeKey::GenericParam { owner, position };
        if let Some(&id) = self.inner.read().keys.get(&key) {
            return id;
        }
        let mut inner = self.inner.write();
        // Double-check after acquiring write lock
        if let Some(&id) = inner.keys.get(&key) {
            return id;
        }
        inner.push(name.to_owned(), key, TypeKind::GenericParam)
    }

    /// Attach members to a declared type.
    ///
    /// # Errors
    /// `UnknownType` if `id`, or any type the definition mentions, was not
    /// issued by this registry; `AlreadyDefined` on a second call for the
    /// same type.
    pub fn define(&self, id: TypeId, def: TypeDefinition) -> Result<(), RegistryError> {
        let mut inner = self.inner.write();
        let Some(current) = inner.types.get(id.slot()) else {
            return Err(RegistryError::UnknownType { id });
        };
        if let Some(unknown) = def.referenced_types().into_iter().find(|&r| !inner.issued(r)) {
            return Err(RegistryError::UnknownType { id: unknown });
        }
        if current.defined {
            return Err(RegistryError::AlreadyDefined {
                name: current.name.clone(),
            });
        }
        let defined = Heap::new(current.with_definition(def));
        if let Some(slot) = inner.types.get_mut(id.slot()) {
            *slot = defined;
        }
        Ok(())
    }

    /// Declare and define in one step.
    ///
    /// # Errors
    /// See [`declare`](Self::declare).
    pub fn register(
        &self,
        key: impl Into<TypeKey>,
        kind: TypeKind,
        def: TypeDefinition,
    ) -> Result<TypeId, RegistryError> {
        let id = self.declare(key, kind)?;
        self.define(id, def)?;
        Ok(id)
    }

    /// Descriptor of `id`.
    ///
    /// Ids this registry never issued read as an empty, undefined
    /// descriptor named after the id; use [`contains`](Self::contains) or
    /// [`try_get`](Self::try_get) to tell them apart.
    pub fn get(&self, id: TypeId) -> Heap<TypeDescriptor> {
        self.try_get(id).unwrap_or_else(|| Heap::new(TypeDescriptor::unknown(id)))
    }

    pub fn try_get(&self, id: TypeId) -> Option<Heap<TypeDescriptor>> {
        self.inner.read().types.get(id.slot()).cloned()
    }

    /// Whether `id` was issued by this registry.
    #[inline]
    pub fn contains(&self, id: TypeId) -> bool {
        self.inner.read().issued(id)
    }

    /// Look up a type by key.
    pub fn lookup(&self, key: &TypeKey) -> Option<TypeId> {
        self.inner.read().keys.get(key).copied()
    }

    /// Display name of `id`.
    pub fn name(&self, id: TypeId) -> String {
        if id.is_none() {
            return "<none>".to_owned();
        }
        match self.try_get(id) {
            Some(desc) => desc.name.clone(),
            None => format!("{id:?}"),
        }
    }

    pub fn kind(&self, id: TypeId) -> TypeKind {
        self.get(id).kind
    }

    #[inline]
    pub fn is_value_type(&self, id: TypeId) -> bool {
        self.get(id).is_value_type()
    }

    /// `id` followed by its base classes, most specific first.
    pub fn inheritance_chain(&self, id: TypeId) -> Vec<TypeId> {
        let inner = self.inner.read();
        let mut chain = vec![id];
        let mut current = inner.types.get(id.slot()).and_then(|desc| desc.base);
        while let Some(base) = current {
            chain.push(base);
            current = inner.types.get(base.slot()).and_then(|desc| desc.base);
        }
        chain
    }

    /// Number of class-chain steps from `sub` up to `base`.
    pub fn base_distance(&self, sub: TypeId, base: TypeId) -> Option<u32> {
        let mut distance = 0;
        for ancestor in self.inheritance_chain(sub) {
            if ancestor == base {
                return Some(distance);
            }
            distance += 1;
        }
        None
    }

    /// Every interface `id` implements, through its bases and through
    /// extended interfaces, without duplicates.
    pub fn all_interfaces(&self, id: TypeId) -> Vec<TypeId> {
        let inner = self.inner.read();
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut direct = Vec::new();
        let mut current = Some(id);
        while let Some(desc) = current.and_then(|ty| inner.types.get(ty.slot())) {
            direct.extend(desc.interfaces.iter().copied());
            current = desc.base;
        }
        // Depth-first, declaration order
        let mut pending: Vec<TypeId> = direct.into_iter().rev().collect();
        while let Some(iface) = pending.pop() {
            if !seen.insert(iface) {
                continue;
            }
            out.push(iface);
            if let Some(desc) = inner.types.get(iface.slot()) {
                pending.extend(desc.interfaces.iter().rev());
            }
        }
        out
    }

    /// Whether a value of type `from` may be used as `to` without an adapter.
    pub fn is_assignable(&self, to: TypeId, from: TypeId) -> bool {
        if to == from {
            return true;
        }
        if to == TypeId::VOID || from == TypeId::VOID {
            return false;
        }
        if to == TypeId::OBJECT {
            return true;
        }
        if self.inheritance_chain(from).contains(&to) {
            return true;
        }
        self.get(to).is_interface() && self.all_interfaces(from).contains(&to)
    }

    /// Whether `value` may be stored in a slot of type `to` as-is.
    ///
    /// `Null` fits every non-value type.
    pub fn is_instance_of(&self, to: TypeId, value: &Value) -> bool {
        match value.type_id() {
            Some(ty) => self.is_assignable(to, ty),
            None => to != TypeId::VOID && !self.is_value_type(to),
        }
    }

    /// Runtime type of `value`.
    #[inline]
    pub fn type_of(&self, value: &Value) -> Option<TypeId> {
        value.type_id()
    }

    /// Display name of `value`'s runtime type.
    pub fn type_name_of(&self, value: &Value) -> String {
        match value.type_id() {
            Some(ty) => self.name(ty),
            None => "null".to_owned(),
        }
    }

    /// New instance of class `id` with no fields set.
    ///
    /// # Errors
    /// `UnknownType` for a foreign id; `NotInstantiable` unless `id` is a
    /// concrete, non-static class.
    pub fn instantiate(&self, id: TypeId) -> Result<Value, RegistryError> {
        let desc = self.try_get(id).ok_or(RegistryError::UnknownType { id })?;
        if desc.kind != TypeKind::Class
            || id.is_primitive()
            || desc.flags.intersects(TypeFlags::ABSTRACT | TypeFlags::STATIC)
        {
            return Err(RegistryError::NotInstantiable {
                name: desc.name.clone(),
            });
        }
        Ok(Value::object(Instance::new(id, desc.name.clone())))
    }

    /// Number of issued identities, reserved slots included.
    pub fn type_count(&self) -> usize {
        self.inner.read().types.len()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_count())
            .finish_non_exhaustive()
    }
}

impl RegistryInner {
    fn register_primitives(&mut self) {
        let primitives = [
            (TypeId::OBJECT, TypeKind::Class, TypeFlags::empty(), None),
            (TypeId::VOID, TypeKind::Primitive, TypeFlags::empty(), None),
            (TypeId::BOOL, TypeKind::Primitive, TypeFlags::VALUE_TYPE | TypeFlags::SEALED, Some(TypeId::OBJECT)),
            (TypeId::INT, TypeKind::Primitive, TypeFlags::VALUE_TYPE | TypeFlags::SEALED, Some(TypeId::OBJECT)),
            (TypeId::FLOAT, TypeKind::Primitive, TypeFlags::VALUE_TYPE | TypeFlags::SEALED, Some(TypeId::OBJECT)),
            (TypeId::STR, TypeKind::Class, TypeFlags::SEALED, Some(TypeId::OBJECT)),
        ];
        for (id, kind, flags, base) in primitives {
            debug_assert_eq!(id.slot(), self.types.len());
            let name = id.primitive_name().unwrap_or("<primitive>").to_owned();
            let key = TypeKey::Named(name.clone());
            let mut desc = TypeDescriptor::declared(id, name, key.clone(), kind);
            desc.flags = flags;
            desc.base = base;
            desc.defined = true;
            self.keys.insert(key, id);
            self.types.push(Heap::new(desc));
        }
        // Reserved slots up to the first dynamic index
        while self.types.len() < TypeId::FIRST_DYNAMIC as usize {
            let id = TypeId::from_raw(self.next_raw());
            let name = format!("<reserved {}>", id.raw());
            let key = TypeKey::Named(name.clone());
            let mut desc = TypeDescriptor::declared(id, name, key, TypeKind::Primitive);
            desc.defined = true;
            self.types.push(Heap::new(desc));
        }
    }

    fn next_raw(&self) -> u32 {
        u32::try_from(self.types.len()).unwrap_or(u32::MAX - 1)
    }

    fn push(&mut self, name: String, key: TypeKey, kind: TypeKind) -> TypeId {
        let id = TypeId::from_raw(self.next_raw());
        self.keys.insert(key.clone(), id);
        self.types
            .push(Heap::new(TypeDescriptor::declared(id, name, key, kind)));
        id
    }

    fn render_key(&self, key: &TypeKey) -> String {
        match key {
            TypeKey::Named(path) => path.clone(),
            TypeKey::Constructed { definition, args } => {
                let args: Vec<&str> = args
                    .iter()
                    .map(|a| {
                        self.types
                            .get(a.slot())
                            .map_or("?", |desc| desc.name.as_str())
                    })
                    .collect();
                format!("{definition}<{}>", args.join(", "))
            }
            TypeKey::GenericParam { position, .. } => format!("T{position}"),
        }
    }

    fn issued(&self, id: TypeId) -> bool {
        id.slot() < self.types.len()
    }

    fn diagnostic(&self, id: TypeId) -> String {
        match self.types.get(id.slot()) {
            Some(desc) => format!("{} ({:?}, {:?}, key {:?})", desc.name, desc.kind, id, desc.key),
            None => format!("{id:?}"),
        }
    }
}
