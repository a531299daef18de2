//! Event subscriber lists.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{CallResult, Callable, Value};

/// An ordered list of handlers, raised in subscription order.
#[derive(Clone, Debug, Default)]
pub struct Multicast {
    handlers: Vec<Callable>,
}

impl Multicast {
    pub fn add(&mut self, handler: Callable) {
        self.handlers.push(handler);
    }

    /// Remove the most recent subscription equal to `handler`.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&mut self, handler: &Callable) -> bool {
        match self.handlers.iter().rposition(|h| h == handler) {
            Some(pos) => {
                self.handlers.remove(pos);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Call every handler in order; the last result wins.
    ///
    /// `Ok(None)` when there are no handlers. Stops at the first error.
    ///
    /// # Errors
    /// Whatever a handler reports.
    pub fn invoke(&self, args: &[Value]) -> CallResult<Option<Value>> {
        let mut last = None;
        for handler in &self.handlers {
            last = Some(handler.invoke(args)?);
        }
        Ok(last)
    }
}

/// Named subscriber lists for one owner (an instance or a type's statics).
#[derive(Debug, Default)]
pub struct EventTable {
    events: Mutex<FxHashMap<String, Multicast>>,
}

impl EventTable {
    pub fn subscribe(&self, event: &str, handler: Callable) {
        self.events
            .lock()
            .entry(event.to_owned())
            .or_default()
            .add(handler);
    }

    pub fn unsubscribe(&self, event: &str, handler: &Callable) -> bool {
        self.events
            .lock()
            .get_mut(event)
            .is_some_and(|list| list.remove(handler))
    }

    /// Raise `event`.
    ///
    /// Handlers run on a snapshot of the list taken before the first call,
    /// outside the lock, so they may subscribe or unsubscribe freely.
    ///
    /// # Errors
    /// Whatever a handler reports.
    pub fn raise(&self, event: &str, args: &[Value]) -> CallResult<Option<Value>> {
        let snapshot = self.events.lock().get(event).cloned();
        match snapshot {
            Some(list) => list.invoke(args),
            None => Ok(None),
        }
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.events.lock().get(event).map_or(0, Multicast::len)
    }
}
