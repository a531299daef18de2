//! Adapter and verdict caches.
//!
//! Everything here is append-only for the life of the engine.
//!
//! # Factories
//!
//! Factories are keyed by the ordered `(target, source)` pair. The first
//! request for a pair claims a slot under the map lock, then generates under
//! the slot's own generation lock; concurrent requests for the same pair wait
//! on that lock and receive the same factory. A failed generation removes its
//! slot, leaving no trace.
//!
//! Reads never take a generation lock: analysis running inside a generation
//! may ask whether its own pair (or one another thread is building) is ready.
//!
//! # Verdicts
//!
//! Compatibility verdicts live in `DashMap`s, one for instance and one for
//! static compatibility, readable without blocking writers of other pairs.

use std::hash::BuildHasherDefault;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHasher};
use tracing::trace;

use mallard_ir::{TypeId, Value};

use crate::synth::{AdapterFactory, DelegateFactory};
use crate::CastResult;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Ordered (target, source) pair.
pub(crate) type PairKey = (TypeId, TypeId);

/// One cache entry: the generated value, once there is one, and the lock
/// serializing its generation.
struct Slot<T> {
    value: OnceLock<T>,
    generating: Mutex<()>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot {
            value: OnceLock::new(),
            generating: Mutex::new(()),
        }
    }
}

/// Append-only map of lazily generated entries, one generation per key.
pub(crate) struct SlotMap<T> {
    slots: RwLock<FxHashMap<PairKey, Arc<Slot<T>>>>,
}

impl<T: Clone> SlotMap<T> {
    fn new() -> Self {
        SlotMap {
            slots: RwLock::new(FxHashMap::default()),
        }
    }

    /// The entry for `key`, if one has been generated.
    pub(crate) fn get(&self, key: PairKey) -> Option<T> {
        self.slots.read().get(&key)?.value.get().cloned()
    }

    pub(crate) fn contains(&self, key: PairKey) -> bool {
        self.get(key).is_some()
    }

    /// The entry for `key`, generating it on first request.
    ///
    /// `generate` runs at most once per successful key, under the slot's
    /// generation lock.
    pub(crate) fn get_or_generate(
        &self,
        key: PairKey,
        generate: impl FnOnce() -> CastResult<T>,
    ) -> CastResult<T> {
        let slot = self.claim(key);
        if let Some(existing) = slot.value.get() {
            trace!(?key, "adapter cache hit");
            return Ok(existing.clone());
        }
        let _generating = slot.generating.lock();
        if let Some(existing) = slot.value.get() {
            trace!(?key, "adapter generated concurrently");
            return Ok(existing.clone());
        }
        match generate() {
            Ok(generated) => Ok(slot.value.get_or_init(|| generated).clone()),
            Err(err) => {
                let mut slots = self.slots.write();
                if slots.get(&key).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                    slots.remove(&key);
                }
                Err(err)
            }
        }
    }

    fn claim(&self, key: PairKey) -> Arc<Slot<T>> {
        if let Some(slot) = self.slots.read().get(&key) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(key).or_default())
    }

    pub(crate) fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }
}

/// All caches owned by one engine.
pub(crate) struct AdapterCache {
    /// Instance interface adapters.
    pub(crate) interfaces: SlotMap<Arc<AdapterFactory>>,
    /// Delegate adapters.
    pub(crate) delegates: SlotMap<Arc<DelegateFactory>>,
    /// Shared adapters over static members, one per pair.
    pub(crate) statics: SlotMap<Value>,
    verdicts: DashMap<PairKey, bool, FxBuildHasher>,
    static_verdicts: DashMap<PairKey, bool, FxBuildHasher>,
}

impl AdapterCache {
    pub(crate) fn new() -> Self {
        AdapterCache {
            interfaces: SlotMap::new(),
            delegates: SlotMap::new(),
            statics: SlotMap::new(),
            verdicts: DashMap::with_hasher(FxBuildHasher::default()),
            static_verdicts: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    pub(crate) fn verdict(&self, to: TypeId, from: TypeId) -> Option<bool> {
        self.verdicts.get(&(to, from)).map(|v| *v)
    }

    /// Store a verdict. The first stored value for a pair wins.
    pub(crate) fn store_verdict(&self, to: TypeId, from: TypeId, verdict: bool) {
        self.verdicts.entry((to, from)).or_insert(verdict);
    }

    pub(crate) fn static_verdict(&self, to: TypeId, from: TypeId) -> Option<bool> {
        self.static_verdicts.get(&(to, from)).map(|v| *v)
    }

    pub(crate) fn store_static_verdict(&self, to: TypeId, from: TypeId, verdict: bool) {
        self.static_verdicts.entry((to, from)).or_insert(verdict);
    }

    pub(crate) fn verdict_count(&self) -> usize {
        self.verdicts.len() + self.static_verdicts.len()
    }
}
