//! Member resolution: pick the source member implementing a shape member.

use mallard_ir::{EventDef, Heap, MethodDef, PropertyDef, TypeId};

use crate::capability::SourceMembers;
use crate::compat::GuardStack;
use crate::engine::EngineInner;

impl EngineInner {
    /// Best source method for `target`.
    ///
    /// A candidate must share the name, be public, match the cast kind's
    /// static-ness, match generic-ness and arity, and have pairwise
    /// compatible parameters and a compatible return type (both checked
    /// bidirectionally). Candidates are ranked by the summed compatibility
    /// scores of parameters and return; the first of equal candidates wins.
    pub(crate) fn find_best_method(
        &self,
        target: &MethodDef,
        source: &SourceMembers,
        is_static: bool,
        guard: &mut GuardStack,
    ) -> Option<Heap<MethodDef>> {
        let mut best: Option<(&Heap<MethodDef>, i32)> = None;

        for candidate in &source.methods {
            if candidate.is_static != is_static
                || !candidate.is_public()
                || candidate.name != target.name
                || candidate.is_generic() != target.is_generic()
                || candidate.generic_arity != target.generic_arity
                || candidate.params.len() != target.params.len()
            {
                continue;
            }

            let Some(score) = self.score_method(target, candidate, guard) else {
                continue;
            };
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }

        best.map(|(method, _)| method.clone())
    }

    fn score_method(
        &self,
        target: &MethodDef,
        candidate: &MethodDef,
        guard: &mut GuardStack,
    ) -> Option<i32> {
        let mut score = 0i32;
        for (&source_param, &target_param) in candidate.params.iter().zip(&target.params) {
            if !self.are_compatible(source_param, target_param, true, guard) {
                return None;
            }
            score = score.saturating_add(self.compatibility_score(source_param, target_param));
        }
        if !self.are_compatible(target.ret, candidate.ret, true, guard) {
            return None;
        }
        Some(score.saturating_add(self.compatibility_score(target.ret, candidate.ret)))
    }

    /// First source property implementing `target`.
    ///
    /// Requires the same name, a compatible type, every accessor the target
    /// declares (public on the source), and pairwise compatible index
    /// parameters.
    pub(crate) fn find_best_property(
        &self,
        target: &PropertyDef,
        source: &SourceMembers,
        is_static: bool,
        guard: &mut GuardStack,
    ) -> Option<Heap<PropertyDef>> {
        source
            .properties
            .iter()
            .find(|candidate| {
                candidate.name == target.name
                    && candidate.is_static == is_static
                    && self.are_compatible(target.ty, candidate.ty, false, guard)
                    && accessors_cover(target, candidate)
                    && self.index_compatible(&target.index, &candidate.index, guard)
            })
            .cloned()
    }

    fn index_compatible(&self, target: &[TypeId], candidate: &[TypeId], guard: &mut GuardStack) -> bool {
        target.len() == candidate.len()
            && target
                .iter()
                .zip(candidate)
                .all(|(&t, &c)| self.are_compatible(t, c, false, guard))
    }

    /// First source event with the same name and a compatible handler type.
    pub(crate) fn find_best_event(
        &self,
        target: &EventDef,
        source: &SourceMembers,
        is_static: bool,
        guard: &mut GuardStack,
    ) -> Option<Heap<EventDef>> {
        source
            .events
            .iter()
            .find(|candidate| {
                candidate.name == target.name
                    && candidate.is_static == is_static
                    && self.are_compatible(target.handler, candidate.handler, false, guard)
            })
            .cloned()
    }
}

/// Source offers every accessor the target needs, publicly.
fn accessors_cover(target: &PropertyDef, candidate: &PropertyDef) -> bool {
    let read_ok = match (&target.getter, &candidate.getter) {
        (None, _) => true,
        (Some(_), Some(getter)) => getter.is_public(),
        (Some(_), None) => false,
    };
    let write_ok = match (&target.setter, &candidate.setter) {
        (None, _) => true,
        (Some(_), Some(setter)) => setter.is_public(),
        (Some(_), None) => false,
    };
    read_ok && write_ok
}
