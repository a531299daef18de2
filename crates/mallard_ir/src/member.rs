//! Member definitions: methods, properties, events, fields.
//!
//! Shapes (interfaces and delegates) declare members without bodies. Concrete
//! types attach native bodies which the engine invokes when forwarding.
//! Receivers are passed explicitly; static members receive `Value::Null`.

use std::fmt;
use std::sync::Arc;

use crate::value::Heap;
use crate::{CallError, CallResult, TypeId, Value};

/// Native method or getter signature: `(receiver, args) -> result`.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> CallResult + Send + Sync;

/// Native setter signature: `(receiver, index args, value)`.
pub type NativeSetFn = dyn Fn(&Value, &[Value], Value) -> CallResult<()> + Send + Sync;

pub type MethodBody = Heap<NativeFn>;
pub type GetterBody = Heap<NativeFn>;
pub type SetterBody = Heap<NativeSetFn>;

/// Member accessibility. Only public members take part in matching.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Private,
}

/// Kind of a member, as reported in signatures and diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Property,
    Indexer,
    Event,
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Method => "method",
            MemberKind::Property => "property",
            MemberKind::Indexer => "indexer",
            MemberKind::Event => "event",
            MemberKind::Field => "field",
        })
    }
}

/// A method declaration, optionally with a native body.
#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub is_static: bool,
    /// Number of method-level generic parameters (0 for non-generic).
    pub generic_arity: u16,
    pub visibility: Visibility,
    pub body: Option<MethodBody>,
}

impl MethodDef {
    /// Public instance method without a body.
    pub fn new(name: impl Into<String>, params: Vec<TypeId>, ret: TypeId) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            is_static: false,
            generic_arity: 0,
            visibility: Visibility::Public,
            body: None,
        }
    }

    #[must_use]
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn generic(mut self, arity: u16) -> Self {
        self.generic_arity = arity;
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach a native implementation.
    #[must_use]
    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        let body: Arc<NativeFn> = Arc::new(f);
        self.body = Some(Heap::from_arc(body));
        self
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.generic_arity > 0
    }

    /// Invoke the native body.
    ///
    /// # Errors
    /// `MissingBody` if the host supplied none, otherwise whatever the body
    /// reports.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> CallResult {
        match &self.body {
            Some(body) => body(receiver, args),
            None => Err(CallError::MissingBody {
                member: self.name.clone(),
            }),
        }
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .field("is_static", &self.is_static)
            .field("generic_arity", &self.generic_arity)
            .field("visibility", &self.visibility)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// One property accessor (getter or setter).
#[derive(Clone)]
pub struct Accessor<B> {
    pub visibility: Visibility,
    pub body: Option<B>,
}

impl<B> Accessor<B> {
    fn declared() -> Self {
        Self {
            visibility: Visibility::Public,
            body: None,
        }
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// A property declaration. A non-empty `index` makes it an indexer.
#[derive(Clone)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeId,
    pub index: Vec<TypeId>,
    pub getter: Option<Accessor<GetterBody>>,
    pub setter: Option<Accessor<SetterBody>>,
    pub is_static: bool,
}

impl PropertyDef {
    /// Property with no accessors yet.
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            index: Vec::new(),
            getter: None,
            setter: None,
            is_static: false,
        }
    }

    /// Declare a getter without a body (shapes).
    #[must_use]
    pub fn readable(mut self) -> Self {
        self.getter.get_or_insert_with(Accessor::declared);
        self
    }

    /// Declare a setter without a body (shapes).
    #[must_use]
    pub fn writable(mut self) -> Self {
        self.setter.get_or_insert_with(Accessor::declared);
        self
    }

    #[must_use]
    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        let body: Arc<NativeFn> = Arc::new(f);
        self.getter.get_or_insert_with(Accessor::declared).body = Some(Heap::from_arc(body));
        self
    }

    #[must_use]
    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &[Value], Value) -> CallResult<()> + Send + Sync + 'static,
    {
        let body: Arc<NativeSetFn> = Arc::new(f);
        self.setter.get_or_insert_with(Accessor::declared).body = Some(Heap::from_arc(body));
        self
    }

    #[must_use]
    pub fn getter_visibility(mut self, visibility: Visibility) -> Self {
        self.getter.get_or_insert_with(Accessor::declared).visibility = visibility;
        self
    }

    #[must_use]
    pub fn setter_visibility(mut self, visibility: Visibility) -> Self {
        self.setter.get_or_insert_with(Accessor::declared).visibility = visibility;
        self
    }

    #[must_use]
    pub fn indexed(mut self, index: Vec<TypeId>) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[inline]
    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    #[inline]
    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    #[inline]
    pub fn is_indexer(&self) -> bool {
        !self.index.is_empty()
    }

    pub fn kind(&self) -> MemberKind {
        if self.is_indexer() {
            MemberKind::Indexer
        } else {
            MemberKind::Property
        }
    }

    /// Run the getter.
    ///
    /// # Errors
    /// `UnknownMember` if not readable, `MissingBody` if no body.
    pub fn get(&self, receiver: &Value, index: &[Value]) -> CallResult {
        let accessor = self.getter.as_ref().ok_or_else(|| CallError::UnknownMember {
            owner: self.name.clone(),
            member: "get".to_owned(),
        })?;
        match &accessor.body {
            Some(body) => body(receiver, index),
            None => Err(CallError::MissingBody {
                member: format!("{}.get", self.name),
            }),
        }
    }

    /// Run the setter.
    ///
    /// # Errors
    /// `UnknownMember` if not writable, `MissingBody` if no body.
    pub fn set(&self, receiver: &Value, index: &[Value], value: Value) -> CallResult<()> {
        let accessor = self.setter.as_ref().ok_or_else(|| CallError::UnknownMember {
            owner: self.name.clone(),
            member: "set".to_owned(),
        })?;
        match &accessor.body {
            Some(body) => body(receiver, index, value),
            None => Err(CallError::MissingBody {
                member: format!("{}.set", self.name),
            }),
        }
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("index", &self.index)
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// An event declaration. Subscriptions live on the owning instance (or the
/// type's static event table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDef {
    pub name: String,
    /// Delegate type of the handlers.
    pub handler: TypeId,
    pub is_static: bool,
}

impl EventDef {
    pub fn new(name: impl Into<String>, handler: TypeId) -> Self {
        Self {
            name: name.into(),
            handler,
            is_static: false,
        }
    }

    #[must_use]
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A field declaration. Fields never satisfy a shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeId,
    pub is_static: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
        }
    }
}

/// Invoke signature of a delegate type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegateSignature {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
}

impl DelegateSignature {
    pub fn new(params: Vec<TypeId>, ret: TypeId) -> Self {
        Self { params, ret }
    }
}

/// A named constant of an enum type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

impl EnumVariant {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
