//! Adapter synthesis.
//!
//! A resolved [`AdapterDescriptor`] becomes an [`AdapterFactory`]: a table of
//! forwarding slots, one per shape member, each holding the bound source
//! member and the conversions planned for its arguments and result. The
//! factory stamps out [`Adapter`]s, which pair the table with one wrapped
//! source value.
//!
//! # Events
//!
//! When the shape's handler type equals the source's, subscriptions are
//! forwarded to the source. Otherwise each adapter keeps its own subscriber
//! list and, when constructed, registers exactly one relay handler of the
//! source's handler type on the source event. The relay converts the
//! source's arguments and calls the adapter's list, if it is non-empty.
//!
//! Relays are never removed: each stays registered for the life of the
//! source. Every adapter over a source adds one relay per relayed event, so
//! a source that is wrapped repeatedly (for example, passed again and again
//! through a `Duck` conversion, which builds a fresh adapter each time) keeps
//! growing its handler lists. Each relay with an empty list still runs on
//! every raise, and does nothing.

mod delegate;

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use mallard_ir::{
    CallError, CallResult, Callable, EventTable, Heap, Invoke, MethodDef, Multicast, PropertyDef,
    Proxy, TypeId, TypeKind, Value,
};

pub use delegate::{DelegateAdapter, DelegateFactory};

use crate::capability::ShapeMember;
use crate::convert::Conversion;
use crate::descriptor::{AdapterDescriptor, SourceMember};
use crate::engine::EngineInner;
use crate::{CastError, CastResult};

/// Forwarding slot for one shape method.
#[derive(Debug)]
pub struct MethodSlot {
    pub name: String,
    /// Shape parameter types.
    pub params: Vec<TypeId>,
    /// Shape return type.
    pub ret: TypeId,
    source: Heap<MethodDef>,
    args: Vec<Conversion>,
    result: Conversion,
}

/// Forwarding slot for one shape property or indexer.
#[derive(Debug)]
pub struct PropertySlot {
    pub name: String,
    pub ty: TypeId,
    pub index: Vec<TypeId>,
    pub readable: bool,
    pub writable: bool,
    source: Heap<PropertyDef>,
    index_args: Vec<Conversion>,
    on_get: Conversion,
    on_set: Conversion,
}

/// Forwarding slot for one shape event.
#[derive(Debug)]
pub struct EventSlot {
    pub name: String,
    /// Shape handler type.
    pub handler: TypeId,
    source_event: String,
    source_handler: TypeId,
    relay: Option<RelayPlan>,
}

/// Conversions for relaying a source event to shape-typed handlers.
#[derive(Clone, Debug)]
struct RelayPlan {
    /// Source handler arguments to shape handler parameters.
    args: Vec<Conversion>,
    /// Shape handler result to source handler result.
    result: Conversion,
}

/// Generated forwarding table for one (shape, source) pair.
pub struct AdapterFactory {
    descriptor: AdapterDescriptor,
    shape_name: String,
    methods: Vec<MethodSlot>,
    properties: Vec<PropertySlot>,
    events: Vec<EventSlot>,
    engine: Weak<EngineInner>,
}

impl AdapterFactory {
    #[inline]
    pub fn shape(&self) -> TypeId {
        self.descriptor.shape
    }

    #[inline]
    pub fn source(&self) -> TypeId {
        self.descriptor.source
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.descriptor.is_static
    }

    pub fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    pub fn methods(&self) -> &[MethodSlot] {
        &self.methods
    }

    pub fn properties(&self) -> &[PropertySlot] {
        &self.properties
    }

    pub fn events(&self) -> &[EventSlot] {
        &self.events
    }

    /// Wrap `source` (`Null` for static factories) in a new adapter.
    ///
    /// # Errors
    /// Fails if a relay handler cannot be registered on the source.
    pub(crate) fn instantiate(self: &Arc<Self>, engine: &EngineInner, source: Value) -> CallResult {
        let mut relays = Vec::with_capacity(self.events.len());
        for slot in &self.events {
            let Some(plan) = &slot.relay else {
                relays.push(None);
                continue;
            };
            let list = Arc::new(Mutex::new(Multicast::default()));
            let relay = Callable::from_invoke(
                slot.source_handler,
                EventRelay {
                    list: Arc::clone(&list),
                    plan: plan.clone(),
                    engine: self.engine.clone(),
                },
            );
            self.with_source_events(engine, &source, &slot.source_event, |events| {
                events.subscribe(&slot.source_event, relay);
            })?;
            relays.push(Some(list));
        }
        Ok(Value::proxy(Adapter {
            factory: Arc::clone(self),
            source,
            relays,
        }))
    }

    /// Run `f` on the event table that owns the source's events.
    fn with_source_events<R>(
        &self,
        engine: &EngineInner,
        source: &Value,
        event: &str,
        f: impl FnOnce(&EventTable) -> R,
    ) -> CallResult<R> {
        if self.is_static() {
            let desc = engine.registry.get(self.source());
            return Ok(f(&desc.static_events));
        }
        match source {
            Value::Object(instance) => Ok(f(instance.events())),
            other => Err(CallError::UnknownMember {
                owner: engine.registry.type_name_of(other),
                member: event.to_owned(),
            }),
        }
    }

    fn engine(&self) -> CallResult<Arc<EngineInner>> {
        self.engine.upgrade().ok_or(CallError::EngineDropped)
    }
}

impl fmt::Debug for AdapterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterFactory")
            .field("shape", &self.shape_name)
            .field("source", &self.descriptor.source)
            .field("is_static", &self.descriptor.is_static)
            .field("methods", &self.methods.len())
            .field("properties", &self.properties.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl EngineInner {
    /// Turn a resolved descriptor into a factory.
    ///
    /// # Errors
    /// `NoConversion` if a bound pair has no conversion plan.
    pub(crate) fn synthesize(&self, mut descriptor: AdapterDescriptor) -> CastResult<AdapterFactory> {
        let mut methods = Vec::new();
        let mut properties = Vec::new();
        let mut events = Vec::new();

        for binding in &descriptor.bindings {
            match (&binding.signature.member, &binding.source) {
                (ShapeMember::Method(target), SourceMember::Method(source)) => {
                    methods.push(MethodSlot {
                        name: target.name.clone(),
                        params: target.params.clone(),
                        ret: target.ret,
                        source: source.clone(),
                        args: self.plan_all(&source.params, &target.params)?,
                        result: self.plan_conversion(target.ret, source.ret)?,
                    });
                }
                (ShapeMember::Property(target), SourceMember::Property(source)) => {
                    properties.push(PropertySlot {
                        name: target.name.clone(),
                        ty: target.ty,
                        index: target.index.clone(),
                        readable: target.can_read(),
                        writable: target.can_write(),
                        source: source.clone(),
                        index_args: self.plan_all(&source.index, &target.index)?,
                        on_get: self.plan_conversion(target.ty, source.ty)?,
                        on_set: self.plan_conversion(source.ty, target.ty)?,
                    });
                }
                (ShapeMember::Event(target), SourceMember::Event(source)) => {
                    let relay = if target.handler == source.handler {
                        None
                    } else {
                        Some(self.plan_relay(target.handler, source.handler)?)
                    };
                    events.push(EventSlot {
                        name: target.name.clone(),
                        handler: target.handler,
                        source_event: source.name.clone(),
                        source_handler: source.handler,
                        relay,
                    });
                }
                _ => {
                    return Err(CastError::NoConversion {
                        from: self.registry.name(descriptor.source),
                        to: binding.signature.describe(&self.registry),
                    })
                }
            }
        }

        descriptor.mark_generated();
        let shape_name = self.registry.name(descriptor.shape);
        debug!(
            shape = %shape_name,
            source = %self.registry.name(descriptor.source),
            is_static = descriptor.is_static,
            "synthesized adapter factory"
        );
        Ok(AdapterFactory {
            descriptor,
            shape_name,
            methods,
            properties,
            events,
            engine: self.this.clone(),
        })
    }

    fn plan_relay(&self, target_handler: TypeId, source_handler: TypeId) -> CastResult<RelayPlan> {
        let target = self.registry.get(target_handler);
        let source = self.registry.get(source_handler);
        match (&target.invoke, &source.invoke) {
            (Some(target_sig), Some(source_sig)) if target_sig.params.len() == source_sig.params.len() => {
                Ok(RelayPlan {
                    args: self.plan_all(&target_sig.params, &source_sig.params)?,
                    result: self.plan_conversion(source_sig.ret, target_sig.ret)?,
                })
            }
            _ => Err(CastError::NoConversion {
                from: source.name.clone(),
                to: target.name.clone(),
            }),
        }
    }

    /// Whether `value` may be passed where the shape declares `param`.
    ///
    /// Generic parameter slots accept anything.
    pub(crate) fn accepts(&self, param: TypeId, value: &Value) -> bool {
        self.registry.kind(param) == TypeKind::GenericParam || self.registry.is_instance_of(param, value)
    }

    /// Check call arguments against shape parameter types.
    pub(crate) fn check_arguments(&self, member: &str, params: &[TypeId], args: &[Value]) -> CallResult<()> {
        if params.len() != args.len() {
            return Err(CallError::ArityMismatch {
                member: member.to_owned(),
                expected: params.len(),
                found: args.len(),
            });
        }
        for (&param, arg) in params.iter().zip(args) {
            if self.accepts(param, arg) {
                continue;
            }
            return Err(if arg.is_null() {
                CallError::NullValue {
                    expected: self.registry.name(param),
                }
            } else {
                CallError::TypeMismatch {
                    expected: self.registry.name(param),
                    found: self.registry.type_name_of(arg),
                }
            });
        }
        Ok(())
    }
}

/// Handler registered on the source for one relayed event.
struct EventRelay {
    list: Arc<Mutex<Multicast>>,
    plan: RelayPlan,
    engine: Weak<EngineInner>,
}

impl Invoke for EventRelay {
    fn invoke(&self, args: &[Value]) -> CallResult {
        let handlers = self.list.lock().clone();
        if handlers.is_empty() {
            return Ok(Value::Null);
        }
        if args.len() != self.plan.args.len() {
            return Err(CallError::ArityMismatch {
                member: "event relay".to_owned(),
                expected: self.plan.args.len(),
                found: args.len(),
            });
        }
        let engine = self.engine.upgrade().ok_or(CallError::EngineDropped)?;
        let converted = engine.apply_all(&self.plan.args, args)?;
        let result = handlers.invoke(&converted)?.unwrap_or(Value::Null);
        engine.apply_conversion(self.plan.result, result)
    }
}

/// An adapter: presents a source value as a shape.
pub struct Adapter {
    factory: Arc<AdapterFactory>,
    source: Value,
    /// Subscriber list per event slot, for relayed events.
    relays: Vec<Option<Arc<Mutex<Multicast>>>>,
}

impl Adapter {
    /// The adapter behind `value`, if it is one.
    pub fn from_value(value: &Value) -> Option<&Adapter> {
        match value {
            Value::Proxy(proxy) => proxy.as_any().downcast_ref::<Adapter>(),
            _ => None,
        }
    }

    pub fn factory(&self) -> &Arc<AdapterFactory> {
        &self.factory
    }

    /// The wrapped value; `Null` for static adapters.
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Call the shape method `name`, choosing among overloads by arity and
    /// runtime argument types, in declaration order.
    ///
    /// # Errors
    /// `UnknownMember`, `ArityMismatch` or `TypeMismatch` when no overload
    /// fits; otherwise whatever forwarding reports.
    pub fn call(&self, name: &str, args: &[Value]) -> CallResult {
        let engine = self.factory.engine()?;
        let mut expected_arity = None;
        let mut arity_matched = false;
        for slot in &self.factory.methods {
            if slot.name != name {
                continue;
            }
            if slot.params.len() != args.len() {
                expected_arity.get_or_insert(slot.params.len());
                continue;
            }
            arity_matched = true;
            if slot.params.iter().zip(args).all(|(&p, a)| engine.accepts(p, a)) {
                return self.forward(&engine, slot, args);
            }
        }
        if arity_matched {
            let found: Vec<String> = args.iter().map(|a| engine.registry.type_name_of(a)).collect();
            return Err(CallError::TypeMismatch {
                expected: format!("an overload of `{name}`"),
                found: found.join(", "),
            });
        }
        Err(match expected_arity {
            Some(expected) => CallError::ArityMismatch {
                member: name.to_owned(),
                expected,
                found: args.len(),
            },
            None => self.unknown(name),
        })
    }

    /// Call the shape method with exactly these parameter types.
    ///
    /// # Errors
    /// `UnknownMember` if no such overload; otherwise see [`call`](Self::call).
    pub fn call_signature(&self, name: &str, params: &[TypeId], args: &[Value]) -> CallResult {
        let engine = self.factory.engine()?;
        let slot = self
            .factory
            .methods
            .iter()
            .find(|slot| slot.name == name && slot.params == params)
            .ok_or_else(|| self.unknown(name))?;
        self.forward(&engine, slot, args)
    }

    /// Call the method in slot `index` (see [`AdapterFactory::methods`]).
    ///
    /// # Errors
    /// `UnknownMember` for an out-of-range slot.
    pub fn call_slot(&self, index: usize, args: &[Value]) -> CallResult {
        let engine = self.factory.engine()?;
        let slot = self
            .factory
            .methods
            .get(index)
            .ok_or_else(|| self.unknown(&format!("#{index}")))?;
        self.forward(&engine, slot, args)
    }

    fn forward(&self, engine: &EngineInner, slot: &MethodSlot, args: &[Value]) -> CallResult {
        engine.check_arguments(&slot.name, &slot.params, args)?;
        let converted = engine.apply_all(&slot.args, args)?;
        let method = self.bind_method(engine, &slot.source);
        // Interface-typed sources are adapters themselves
        let result = match (&method.body, Adapter::from_value(&self.source)) {
            (None, Some(inner)) => inner.call_signature(&method.name, &method.params, &converted)?,
            _ => method.invoke(&self.source, &converted)?,
        };
        if slot.ret == TypeId::VOID {
            return Ok(Value::Null);
        }
        engine.apply_conversion(slot.result, result)
    }

    /// Read the shape property `name`.
    ///
    /// # Errors
    /// `UnknownMember` if the shape declares no readable property `name`.
    pub fn get(&self, name: &str) -> CallResult {
        let slot = self.property_slot(|s| s.name == name && s.index.is_empty() && s.readable, name)?;
        self.read(slot, &[])
    }

    /// Write the shape property `name`.
    ///
    /// # Errors
    /// `UnknownMember` if the shape declares no writable property `name`.
    pub fn set(&self, name: &str, value: Value) -> CallResult<()> {
        let slot = self.property_slot(|s| s.name == name && s.index.is_empty() && s.writable, name)?;
        self.write(slot, &[], value)
    }

    /// Read through the shape's indexer taking `index.len()` arguments.
    ///
    /// # Errors
    /// `UnknownMember` if the shape has no such readable indexer.
    pub fn get_index(&self, index: &[Value]) -> CallResult {
        let slot = self.property_slot(|s| s.index.len() == index.len() && !s.index.is_empty() && s.readable, "this[]")?;
        self.read(slot, index)
    }

    /// Write through the shape's indexer taking `index.len()` arguments.
    ///
    /// # Errors
    /// `UnknownMember` if the shape has no such writable indexer.
    pub fn set_index(&self, index: &[Value], value: Value) -> CallResult<()> {
        let slot = self.property_slot(|s| s.index.len() == index.len() && !s.index.is_empty() && s.writable, "this[]")?;
        self.write(slot, index, value)
    }

    fn property_slot(&self, matches: impl Fn(&PropertySlot) -> bool, name: &str) -> CallResult<&PropertySlot> {
        self.factory
            .properties
            .iter()
            .find(|slot| matches(slot))
            .ok_or_else(|| self.unknown(name))
    }

    fn read(&self, slot: &PropertySlot, index: &[Value]) -> CallResult {
        let engine = self.factory.engine()?;
        engine.check_arguments(&slot.name, &slot.index, index)?;
        let index = engine.apply_all(&slot.index_args, index)?;
        let property = self.bind_property(&engine, &slot.source);
        let value = property.get(&self.source, &index)?;
        engine.apply_conversion(slot.on_get, value)
    }

    fn write(&self, slot: &PropertySlot, index: &[Value], value: Value) -> CallResult<()> {
        let engine = self.factory.engine()?;
        engine.check_arguments(&slot.name, &slot.index, index)?;
        engine.check_arguments(&slot.name, std::slice::from_ref(&slot.ty), std::slice::from_ref(&value))?;
        let index = engine.apply_all(&slot.index_args, index)?;
        let value = engine.apply_conversion(slot.on_set, value)?;
        let property = self.bind_property(&engine, &slot.source);
        property.set(&self.source, &index, value)
    }

    /// Subscribe `handler` to the shape event `name`.
    ///
    /// Subscribing `Null` does nothing.
    ///
    /// # Errors
    /// `UnknownMember` for unknown events, `TypeMismatch` for handlers that
    /// are not of the shape's handler type.
    pub fn subscribe(&self, name: &str, handler: &Value) -> CallResult<()> {
        let engine = self.factory.engine()?;
        let (index, slot) = self.event_slot(name)?;
        let Some(handler) = Self::expect_handler(&engine, slot, handler)? else {
            return Ok(());
        };
        match &self.relays[index] {
            Some(list) => {
                list.lock().add(handler);
                Ok(())
            }
            None => self.factory.with_source_events(&engine, &self.source, &slot.source_event, |events| {
                events.subscribe(&slot.source_event, handler);
            }),
        }
    }

    /// Remove the most recent subscription of `handler` from event `name`.
    ///
    /// # Errors
    /// As for [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, name: &str, handler: &Value) -> CallResult<bool> {
        let engine = self.factory.engine()?;
        let (index, slot) = self.event_slot(name)?;
        let Some(handler) = Self::expect_handler(&engine, slot, handler)? else {
            return Ok(false);
        };
        match &self.relays[index] {
            Some(list) => Ok(list.lock().remove(&handler)),
            None => self.factory.with_source_events(&engine, &self.source, &slot.source_event, |events| {
                events.unsubscribe(&slot.source_event, &handler)
            }),
        }
    }

    fn event_slot(&self, name: &str) -> CallResult<(usize, &EventSlot)> {
        self.factory
            .events
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.name == name)
            .ok_or_else(|| self.unknown(name))
    }

    fn expect_handler(engine: &EngineInner, slot: &EventSlot, handler: &Value) -> CallResult<Option<Callable>> {
        match handler {
            Value::Null => Ok(None),
            Value::Callable(callable) if engine.registry.is_assignable(slot.handler, callable.ty()) => {
                Ok(Some(callable.clone()))
            }
            other => Err(CallError::TypeMismatch {
                expected: engine.registry.name(slot.handler),
                found: engine.registry.type_name_of(other),
            }),
        }
    }

    /// The source method to run: an override declared between the runtime
    /// type and the factory's source type, or the bound one.
    fn bind_method(&self, engine: &EngineInner, bound: &Heap<MethodDef>) -> Heap<MethodDef> {
        let Some(runtime) = self.runtime_type() else {
            return bound.clone();
        };
        for owner in engine.registry.inheritance_chain(runtime) {
            if owner == self.factory.source() {
                break;
            }
            let desc = engine.registry.get(owner);
            let found = desc.methods_named(&bound.name).find(|m| {
                !m.is_static
                    && m.is_public()
                    && m.params == bound.params
                    && m.ret == bound.ret
                    && m.generic_arity == bound.generic_arity
            });
            if let Some(method) = found {
                return method.clone();
            }
        }
        bound.clone()
    }

    fn bind_property(&self, engine: &EngineInner, bound: &Heap<PropertyDef>) -> Heap<PropertyDef> {
        let Some(runtime) = self.runtime_type() else {
            return bound.clone();
        };
        for owner in engine.registry.inheritance_chain(runtime) {
            if owner == self.factory.source() {
                break;
            }
            let desc = engine.registry.get(owner);
            let found = desc
                .properties
                .iter()
                .find(|p| !p.is_static && p.name == bound.name && p.ty == bound.ty && p.index == bound.index);
            if let Some(property) = found {
                return property.clone();
            }
        }
        bound.clone()
    }

    /// Runtime type of the source when it differs from the factory's.
    fn runtime_type(&self) -> Option<TypeId> {
        if self.factory.is_static() {
            return None;
        }
        self.source.type_id().filter(|&ty| ty != self.factory.source())
    }

    fn unknown(&self, member: &str) -> CallError {
        CallError::UnknownMember {
            owner: self.factory.shape_name.clone(),
            member: member.to_owned(),
        }
    }
}

impl Proxy for Adapter {
    fn shape(&self) -> TypeId {
        self.factory.shape()
    }

    fn shape_name(&self) -> &str {
        &self.factory.shape_name
    }

    fn unwrap(&self) -> Value {
        self.source.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
