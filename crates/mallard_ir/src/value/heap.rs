//! Shared-ownership wrapper for heap values.
//!
//! `Heap<T>` is an `Arc<T>` whose constructors are crate-private, so values
//! from outside this crate go through the factory methods on
//! [`Value`](super::Value) and [`Callable`](super::Callable).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Reference-counted heap allocation.
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    #[inline]
    pub(crate) fn from_arc(arc: Arc<T>) -> Self {
        Heap(arc)
    }

    /// Whether both handles point at the same allocation.
    ///
    /// Compares addresses only, so trait-object handles created from the
    /// same allocation compare equal regardless of vtable.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&a.0), Arc::as_ptr(&b.0))
    }

    /// Address of the allocation, for identity hashing.
    #[inline]
    pub fn addr(this: &Self) -> usize {
        Arc::as_ptr(&this.0).cast::<()>() as usize
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl<T: ?Sized + Eq> Eq for Heap<T> {}

impl<T: ?Sized + Hash> Hash for Heap<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}
