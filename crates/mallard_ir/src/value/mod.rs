//! Runtime values.
//!
//! A `Value` is what flows through member calls, property accesses and
//! event raises. Reference-typed values share their allocation through
//! [`Heap`]; value-typed values (`Bool`, `Int`, `Float`, `Enum`, `Struct`)
//! are copied.
//!
//! # Adapters
//!
//! Adapters produced by the cast engine live in this enum as
//! [`Value::Proxy`] (shape adapters) and as [`Callable`]s whose body reports
//! a proxy (delegate adapters). [`Value::uncast`] unwraps either back to the
//! wrapped value. Equality and hashing see through adapters on both sides,
//! so an adapter compares equal to the value it wraps.

mod heap;

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub use heap::Heap;

use crate::event::EventTable;
use crate::{CallResult, TypeId};

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// The null reference.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Heap<String>),
    Enum(EnumValue),
    Struct(StructValue),
    /// Instance of a host-declared class.
    Object(Heap<Instance>),
    /// Instance of a delegate type.
    Callable(Callable),
    /// Shape adapter produced by the cast engine.
    Proxy(Heap<dyn Proxy>),
}

/// Value of an enum type: the enum plus its underlying integer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub ty: TypeId,
    pub value: i64,
}

/// Value of a struct type. Fields are positional in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructValue {
    pub ty: TypeId,
    pub fields: Heap<Vec<Value>>,
}

/// Instance of a class.
///
/// Carries its own mutable field store and the subscriber lists for the
/// instance events its type declares.
#[derive(Debug)]
pub struct Instance {
    ty: TypeId,
    type_name: String,
    fields: Mutex<FxHashMap<String, Value>>,
    events: EventTable,
}

impl Instance {
    pub(crate) fn new(ty: TypeId, type_name: String) -> Self {
        Instance {
            ty,
            type_name,
            fields: Mutex::new(FxHashMap::default()),
            events: EventTable::default(),
        }
    }

    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Read a field; unset fields read as `Null`.
    pub fn field(&self, name: &str) -> Value {
        self.fields.lock().get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.lock().insert(name.to_owned(), value);
    }

    /// Subscriber lists of this instance's events.
    #[inline]
    pub fn events(&self) -> &EventTable {
        &self.events
    }
}

/// Something a [`Callable`] can run.
pub trait Invoke: Send + Sync {
    fn invoke(&self, args: &[Value]) -> CallResult;

    /// The adapter view of this body, if it wraps another callable.
    fn as_proxy(&self) -> Option<&dyn Proxy> {
        None
    }
}

impl fmt::Debug for dyn Invoke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_proxy() {
            Some(proxy) => write!(f, "<delegate adapter {}>", proxy.shape_name()),
            None => f.write_str("<native>"),
        }
    }
}

struct NativeInvoke<F>(F);

impl<F> Invoke for NativeInvoke<F>
where
    F: Fn(&[Value]) -> CallResult + Send + Sync,
{
    fn invoke(&self, args: &[Value]) -> CallResult {
        (self.0)(args)
    }
}

/// An instance of a delegate type.
///
/// Two callables are equal when they share the same body allocation.
#[derive(Clone, Debug)]
pub struct Callable {
    ty: TypeId,
    body: Heap<dyn Invoke>,
}

impl Callable {
    /// Callable backed by a native closure.
    pub fn native<F>(ty: TypeId, f: F) -> Self
    where
        F: Fn(&[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self::from_invoke(ty, NativeInvoke(f))
    }

    /// Callable backed by any [`Invoke`] implementation.
    pub fn from_invoke<I: Invoke + 'static>(ty: TypeId, body: I) -> Self {
        let body: Arc<dyn Invoke> = Arc::new(body);
        Callable {
            ty,
            body: Heap::from_arc(body),
        }
    }

    /// The delegate type.
    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    #[inline]
    pub fn invoke(&self, args: &[Value]) -> CallResult {
        self.body.invoke(args)
    }

    #[inline]
    pub fn body(&self) -> &dyn Invoke {
        &*self.body
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Heap::ptr_eq(&self.body, &other.body)
    }
}

impl Eq for Callable {}

impl Hash for Callable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Heap::addr(&self.body).hash(state);
    }
}

/// A shape adapter: presents a wrapped value under another type.
pub trait Proxy: Send + Sync {
    /// Type the adapter presents.
    fn shape(&self) -> TypeId;

    /// Display name of the presented type.
    fn shape_name(&self) -> &str;

    /// The wrapped value; `Null` for adapters over a type's static members.
    fn unwrap(&self) -> Value;

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} adapter over {:?}>", self.shape_name(), self.unwrap())
    }
}

// Factory methods

impl Value {
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    #[inline]
    pub fn enum_value(ty: TypeId, value: i64) -> Self {
        Value::Enum(EnumValue { ty, value })
    }

    pub fn structure(ty: TypeId, fields: Vec<Value>) -> Self {
        Value::Struct(StructValue {
            ty,
            fields: Heap::new(fields),
        })
    }

    /// Wrap an adapter.
    pub fn proxy<P: Proxy + 'static>(proxy: P) -> Self {
        let proxy: Arc<dyn Proxy> = Arc::new(proxy);
        Value::Proxy(Heap::from_arc(proxy))
    }

    pub(crate) fn object(instance: Instance) -> Self {
        Value::Object(Heap::new(instance))
    }
}

// Accessors

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type of the value, `None` for `Null`.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeId::BOOL),
            Value::Int(_) => Some(TypeId::INT),
            Value::Float(_) => Some(TypeId::FLOAT),
            Value::Str(_) => Some(TypeId::STR),
            Value::Enum(e) => Some(e.ty),
            Value::Struct(s) => Some(s.ty),
            Value::Object(o) => Some(o.ty),
            Value::Callable(c) => Some(c.ty),
            Value::Proxy(p) => Some(p.shape()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// The adapter behind this value, shape or delegate.
    pub fn as_proxy(&self) -> Option<&dyn Proxy> {
        match self {
            Value::Proxy(p) => Some(&**p),
            Value::Callable(c) => c.body.as_proxy(),
            _ => None,
        }
    }

    /// Unwrap adapters until a plain value remains.
    ///
    /// Adapters over static members have nothing to unwrap to and are
    /// returned unchanged.
    pub fn uncast(&self) -> Value {
        let mut current = self.clone();
        loop {
            let inner = match current.as_proxy() {
                Some(proxy) => proxy.unwrap(),
                None => return current,
            };
            if inner.is_null() {
                return current;
            }
            current = inner;
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Enum(e) => write!(f, "{}", e.value),
            Value::Struct(s) => {
                f.write_str("(")?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
            Value::Object(o) => f.write_str(&o.type_name),
            Value::Callable(_) | Value::Proxy(_) => match self.as_proxy() {
                Some(proxy) => {
                    let inner = proxy.unwrap();
                    if inner.is_null() {
                        write!(f, "<{}>", proxy.shape_name())
                    } else {
                        write!(f, "{inner}")
                    }
                }
                None => f.write_str("<callable>"),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.as_proxy().is_some() || other.as_proxy().is_some() {
            let (a, b) = (self.uncast(), other.uncast());
            if a.as_proxy().is_some() || b.as_proxy().is_some() {
                return match (&a, &b) {
                    (Value::Proxy(x), Value::Proxy(y)) => Heap::ptr_eq(x, y),
                    (Value::Callable(x), Value::Callable(y)) => x == y,
                    _ => false,
                };
            }
            return a == b;
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_key(*a) == float_key(*b),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            // Reference types compare by identity
            (Value::Object(a), Value::Object(b)) => Heap::ptr_eq(a, b),
            (Value::Callable(a), Value::Callable(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Bits floats compare and hash by: both zeros are one value, and every NaN
/// is the same NaN.
fn float_key(x: f64) -> u64 {
    if x.is_nan() {
        f64::NAN.to_bits()
    } else if x.to_bits() << 1 == 0 {
        0
    } else {
        x.to_bits()
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.as_proxy().is_some() {
            let inner = self.uncast();
            match &inner {
                Value::Proxy(p) => Heap::addr(p).hash(state),
                Value::Callable(c) if c.body.as_proxy().is_some() => c.hash(state),
                _ => inner.hash(state),
            }
            return;
        }
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(x) => float_key(*x).hash(state),
            Value::Str(s) => s.hash(state),
            Value::Enum(e) => e.hash(state),
            Value::Struct(s) => s.hash(state),
            Value::Object(o) => Heap::addr(o).hash(state),
            Value::Callable(c) => c.hash(state),
            Value::Proxy(p) => Heap::addr(p).hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}
