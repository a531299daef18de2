//! Type compatibility analysis.
//!
//! Answers "could a value of `from` be used as `to`, natively or through an
//! adapter?" and ranks how close two compatible types are.
//!
//! # Cycles
//!
//! Shapes may mention themselves (`INode Next()`), or each other. Before a
//! pair is analyzed it is pushed on a [`GuardStack`]; meeting the same pair
//! again (or its reverse, in bidirectional context) while it is still being
//! analyzed is answered `true` optimistically: the pair holds as long as
//! every other member holds.
//!
//! # Memoization
//!
//! Negative verdicts are always stored. A positive verdict is only stored
//! when it did not rest on an optimistic assumption about a pair further
//! down the stack; such a verdict is only valid inside that outer analysis.

use smallvec::SmallVec;
use tracing::trace;

use mallard_ir::TypeId;

use crate::engine::EngineInner;
use crate::stack::ensure_sufficient_stack;

/// One pair under analysis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Frame {
    to: TypeId,
    from: TypeId,
    /// Lowest stack index this frame's verdict assumed to hold.
    lowest_dependency: usize,
}

/// Pairs currently being analyzed by one top-level query.
///
/// Passed explicitly down the call chain; never shared between threads.
#[derive(Debug, Default)]
pub struct GuardStack {
    frames: SmallVec<[Frame; 8]>,
}

impl GuardStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether `(to, from)` is under analysis, or, when `bidirectional`,
    /// `(from, to)` is.
    pub fn contains(&self, to: TypeId, from: TypeId, bidirectional: bool) -> bool {
        self.find(to, from, bidirectional).is_some()
    }

    fn find(&self, to: TypeId, from: TypeId, bidirectional: bool) -> Option<usize> {
        self.frames.iter().position(|frame| {
            (frame.to == to && frame.from == from)
                || (bidirectional && frame.to == from && frame.from == to)
        })
    }

    /// Record that the innermost frame assumed frame `at` holds.
    fn assume(&mut self, at: usize) {
        if let Some(top) = self.frames.last_mut() {
            top.lowest_dependency = top.lowest_dependency.min(at);
        }
    }

    fn push(&mut self, to: TypeId, from: TypeId) {
        self.frames.push(Frame {
            to,
            from,
            lowest_dependency: usize::MAX,
        });
    }

    /// Pop the innermost frame, handing its assumptions to the parent.
    ///
    /// Returns whether a positive verdict for the popped pair stands on its
    /// own (assumed nothing below itself).
    fn pop(&mut self) -> bool {
        let Some(frame) = self.frames.pop() else {
            return true;
        };
        let index = self.frames.len();
        if frame.lowest_dependency < index {
            self.assume(frame.lowest_dependency);
        }
        frame.lowest_dependency >= index
    }
}

impl EngineInner {
    /// Whether `from` can stand in for `to`, natively or structurally.
    ///
    /// `bidirectional` is used for method parameters and returns, where
    /// either side of the pair may end up being converted: the cycle check
    /// then also matches the reversed pair.
    pub(crate) fn are_compatible(
        &self,
        to: TypeId,
        from: TypeId,
        bidirectional: bool,
        guard: &mut GuardStack,
    ) -> bool {
        if to == from {
            return true;
        }
        if let Some(at) = guard.find(to, from, bidirectional) {
            trace!(?to, ?from, depth = guard.depth(), "assuming compatibility of pair under analysis");
            guard.assume(at);
            return true;
        }
        if let Some(verdict) = self.cache.verdict(to, from) {
            trace!(?to, ?from, verdict, "verdict cache hit");
            return verdict;
        }

        guard.push(to, from);
        let verdict = ensure_sufficient_stack(
            self.config.stack_red_zone,
            self.config.stack_growth,
            || self.analyze(to, from, guard),
        );
        let standalone = guard.pop();
        if !verdict || standalone {
            self.cache.store_verdict(to, from, verdict);
        }
        verdict
    }

    /// Uncached analysis of one pair.
    ///
    /// Native conversion is accepted in either direction: forwarding
    /// applies a checked conversion at call time.
    fn analyze(&self, to: TypeId, from: TypeId, guard: &mut GuardStack) -> bool {
        if self.native_either(to, from) {
            return true;
        }
        if self.casters.can_cast(self, to, from, guard) {
            return true;
        }
        self.casters.could_uncast(self, to, from, guard)
    }

    /// Native assignability in either direction.
    pub(crate) fn native_either(&self, to: TypeId, from: TypeId) -> bool {
        self.registry.is_assignable(to, from) || self.registry.is_assignable(from, to)
    }

    /// How close two compatible types are: 0 for identical, minus the class
    /// chain distance for subclasses, -1 otherwise.
    pub(crate) fn compatibility_score(&self, to: TypeId, from: TypeId) -> i32 {
        if to == from {
            return 0;
        }
        let distance = self
            .registry
            .base_distance(to, from)
            .or_else(|| self.registry.base_distance(from, to));
        match distance {
            Some(d) => i32::try_from(d).map_or(i32::MIN, |d| -d),
            None => -1,
        }
    }
}
