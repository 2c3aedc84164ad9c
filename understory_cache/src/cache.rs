// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cache ledger.

use alloc::vec::Vec;

use crate::unit::{Unit, UnitSet};

#[derive(Clone, Debug)]
struct Slot<P> {
    unit: Unit,
    valid: bool,
    dependencies: UnitSet,
    dependents: UnitSet,
    payload: P,
}

impl<P: Default> Slot<P> {
    fn new(unit: Unit) -> Self {
        Self {
            unit,
            valid: false,
            dependencies: UnitSet::EMPTY,
            dependents: UnitSet::EMPTY,
            payload: P::default(),
        }
    }
}

/// A set of named cache units with validity flags and dependency edges.
///
/// Each unit owns one payload of type `P`. Readers check validity with
/// [`test`](Self::test) or [`fresh`](Self::fresh); writers recompute through
/// [`get`](Self::get) and then call [`update`](Self::update). A payload must
/// never be trusted while its unit is invalid.
///
/// Edges are static: "`unit` depends on `deps`". Invalidation walks the
/// reverse edges, so invalidating a dependency invalidates every unit that
/// (transitively) depends on it.
#[derive(Clone, Debug)]
pub struct Cache<P> {
    slots: Vec<Option<Slot<P>>>,
    generation: u64,
}

impl<P> Default for Cache<P> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            generation: 0,
        }
    }
}

impl<P: Default> Cache<P> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `unit` with the given dependencies.
    ///
    /// Re-declaring a unit replaces its previous dependency list. Dependencies
    /// that were never declared are created with no dependencies of their own.
    /// A newly created unit starts invalid; re-declaring leaves validity alone.
    pub fn declare(&mut self, unit: Unit, dependencies: &[Unit]) -> &mut Self {
        let old = self.slot_mut(unit).dependencies;
        for index in old {
            if let Some(Some(dep)) = self.slots.get_mut(usize::from(index)) {
                dep.dependents.remove(unit);
            }
        }

        let mut set = UnitSet::EMPTY;
        for &dep in dependencies {
            self.slot_mut(dep).dependents.insert(unit);
            set.insert(dep);
        }
        self.slot_mut(unit).dependencies = set;
        self
    }

    /// Returns the mutable payload of `unit`, creating it (invalid) on first
    /// access.
    ///
    /// This does not change validity. Call [`update`](Self::update) once the
    /// payload has been recomputed.
    pub fn get(&mut self, unit: Unit) -> &mut P {
        &mut self.slot_mut(unit).payload
    }

    /// Marks `unit` valid.
    pub fn update(&mut self, unit: Unit) {
        self.slot_mut(unit).valid = true;
        self.generation += 1;
    }

    /// Invalidates `unit` and everything that depends on it.
    ///
    /// Returns the set of units this pass invalidated, including `unit`.
    pub fn invalidate(&mut self, unit: Unit) -> UnitSet {
        self.invalidate_with(unit, |_| {})
    }

    /// Invalidates `unit` and everything that depends on it, calling
    /// `on_invalidate` once for every unit the pass reaches.
    ///
    /// Units already invalid are still reported, since their dependents may
    /// have been recomputed in the meantime. Events fire in ascending unit
    /// index order of discovery, and each unit fires at most once per pass
    /// even when the dependency graph contains a cycle.
    pub fn invalidate_with(&mut self, unit: Unit, on_invalidate: impl FnMut(Unit)) -> UnitSet {
        self.slot_mut(unit);
        let visited = self.propagate(unit.into_set(), on_invalidate);
        tracing::trace!(
            unit = unit.name(),
            invalidated = visited.len(),
            "cache invalidation pass"
        );
        visited
    }

    /// Invalidates every known unit.
    pub fn invalidate_all(&mut self) -> UnitSet {
        self.invalidate_all_with(|_| {})
    }

    /// Invalidates every known unit, calling `on_invalidate` for each.
    pub fn invalidate_all_with(&mut self, on_invalidate: impl FnMut(Unit)) -> UnitSet {
        let start = self.known();
        let visited = self.propagate(start, on_invalidate);
        tracing::trace!(invalidated = visited.len(), "cache invalidated entirely");
        visited
    }

    fn slot_mut(&mut self, unit: Unit) -> &mut Slot<P> {
        let index = usize::from(unit.index());
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index].get_or_insert_with(|| {
            tracing::trace!(unit = unit.name(), "cache unit created");
            Slot::new(unit)
        })
    }
}

impl<P> Cache<P> {
    /// Returns `true` if `unit` exists and is valid.
    ///
    /// This never recomputes anything.
    #[must_use]
    pub fn test(&self, unit: Unit) -> bool {
        self.slot(unit).is_some_and(|slot| slot.valid)
    }

    /// Returns the payload of `unit` only while it is valid.
    #[must_use]
    pub fn fresh(&self, unit: Unit) -> Option<&P> {
        self.slot(unit)
            .filter(|slot| slot.valid)
            .map(|slot| &slot.payload)
    }

    /// Returns `true` if `unit` has been declared or touched.
    #[must_use]
    pub fn contains(&self, unit: Unit) -> bool {
        self.slot(unit).is_some()
    }

    /// Maps a unit index back to the unit it was created with.
    #[must_use]
    pub fn unit(&self, index: u8) -> Option<Unit> {
        self.slots
            .get(usize::from(index))
            .and_then(Option::as_ref)
            .map(|slot| slot.unit)
    }

    /// Returns the direct dependencies of `unit`.
    #[must_use]
    pub fn dependencies(&self, unit: Unit) -> UnitSet {
        self.slot(unit)
            .map_or(UnitSet::EMPTY, |slot| slot.dependencies)
    }

    /// Returns the units that directly depend on `unit`.
    #[must_use]
    pub fn dependents(&self, unit: Unit) -> UnitSet {
        self.slot(unit).map_or(UnitSet::EMPTY, |slot| slot.dependents)
    }

    /// Returns the set of every known unit.
    #[must_use]
    pub fn known(&self) -> UnitSet {
        self.slots
            .iter()
            .flatten()
            .map(|slot| slot.unit)
            .collect()
    }

    /// Returns a counter that changes on every `update` and every
    /// invalidation pass.
    ///
    /// Comparing generations before and after a read tells whether the read
    /// recomputed anything.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn slot(&self, unit: Unit) -> Option<&Slot<P>> {
        self.slots
            .get(usize::from(unit.index()))
            .and_then(Option::as_ref)
    }

    fn propagate(&mut self, start: UnitSet, mut on_invalidate: impl FnMut(Unit)) -> UnitSet {
        let mut pending = start;
        let mut visited = UnitSet::EMPTY;
        while let Some(index) = pending.pop_lowest() {
            if visited.contains_index(index) {
                continue;
            }
            visited |= UnitSet::from_index(index);
            let Some(Some(slot)) = self.slots.get_mut(usize::from(index)) else {
                continue;
            };
            slot.valid = false;
            pending |= slot.dependents & !visited;
            on_invalidate(slot.unit);
        }
        self.generation += 1;
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const T: Unit = Unit::new(0, "translation");
    const R: Unit = Unit::new(1, "rotation");
    const S: Unit = Unit::new(2, "scaling");
    const LOCAL: Unit = Unit::new(3, "transformations");
    const GLOBAL: Unit = Unit::new(4, "globalTransformations");
    const OTHER: Unit = Unit::new(5, "other");

    fn transform_cache() -> Cache<u32> {
        let mut cache = Cache::new();
        cache
            .declare(T, &[])
            .declare(R, &[])
            .declare(S, &[])
            .declare(LOCAL, &[T, R, S])
            .declare(GLOBAL, &[LOCAL])
            .declare(OTHER, &[]);
        cache
    }

    fn validate_all(cache: &mut Cache<u32>) {
        for unit in [T, R, S, LOCAL, GLOBAL, OTHER] {
            cache.update(unit);
        }
    }

    #[test]
    fn new_units_start_invalid() {
        let cache = transform_cache();
        assert!(!cache.test(LOCAL));
        assert_eq!(cache.fresh(LOCAL), None);
    }

    #[test]
    fn update_marks_valid() {
        let mut cache = transform_cache();
        *cache.get(LOCAL) = 7;
        cache.update(LOCAL);
        assert!(cache.test(LOCAL));
        assert_eq!(cache.fresh(LOCAL), Some(&7));
    }

    #[test]
    fn invalidation_is_transitive() {
        let mut cache = transform_cache();
        validate_all(&mut cache);

        let invalidated = cache.invalidate(T);
        assert!(invalidated.contains(T));
        assert!(invalidated.contains(LOCAL));
        assert!(invalidated.contains(GLOBAL));
        assert!(!invalidated.contains(R));
        assert!(!invalidated.contains(OTHER));

        assert!(!cache.test(GLOBAL));
        assert!(cache.test(R));
        assert!(cache.test(S));
        assert!(cache.test(OTHER));
    }

    #[test]
    fn invalidation_events_fire_once_each() {
        let mut cache = transform_cache();
        validate_all(&mut cache);

        let mut events = vec![];
        cache.invalidate_with(R, |unit| events.push(unit.name()));
        assert_eq!(
            events,
            ["rotation", "transformations", "globalTransformations"]
        );
    }

    #[test]
    fn invalid_units_still_propagate() {
        let mut cache = transform_cache();
        validate_all(&mut cache);
        cache.invalidate(LOCAL);
        cache.update(GLOBAL);

        // LOCAL is already invalid; its dependents must still be reached.
        cache.invalidate(LOCAL);
        assert!(!cache.test(GLOBAL));
    }

    #[test]
    fn cycles_terminate() {
        const A: Unit = Unit::new(0, "a");
        const B: Unit = Unit::new(1, "b");
        const C: Unit = Unit::new(2, "c");

        let mut cache = Cache::<()>::new();
        cache.declare(A, &[C]).declare(B, &[A]).declare(C, &[B]);
        for unit in [A, B, C] {
            cache.update(unit);
        }

        let mut count = 0;
        let invalidated = cache.invalidate_with(B, |_| count += 1);
        assert_eq!(count, 3);
        assert_eq!(invalidated.len(), 3);
        assert!(!cache.test(A));
    }

    #[test]
    fn undeclared_units_are_created_on_demand() {
        const AD_HOC: Unit = Unit::new(40, "ad-hoc");

        let mut cache = transform_cache();
        assert!(!cache.contains(AD_HOC));
        assert!(!cache.test(AD_HOC));

        *cache.get(AD_HOC) = 3;
        assert!(cache.contains(AD_HOC));
        assert!(!cache.test(AD_HOC));
        assert_eq!(cache.dependencies(AD_HOC), UnitSet::EMPTY);

        cache.update(AD_HOC);
        assert_eq!(cache.fresh(AD_HOC), Some(&3));
        assert_eq!(cache.unit(40).map(Unit::name), Some("ad-hoc"));
    }

    #[test]
    fn redeclare_replaces_edges() {
        let mut cache = transform_cache();
        cache.declare(LOCAL, &[T]);
        assert!(!cache.dependents(R).contains(LOCAL));
        assert!(cache.dependents(T).contains(LOCAL));

        validate_all(&mut cache);
        cache.invalidate(R);
        assert!(cache.test(LOCAL));
    }

    #[test]
    fn invalidate_all_reaches_everything() {
        let mut cache = transform_cache();
        validate_all(&mut cache);

        let mut events = 0;
        let invalidated = cache.invalidate_all_with(|_| events += 1);
        assert_eq!(events, 6);
        assert_eq!(invalidated, cache.known());
        assert!(!cache.test(T));
        assert!(!cache.test(OTHER));
    }

    #[test]
    fn generation_tracks_writes_only() {
        let mut cache = transform_cache();
        let start = cache.generation();

        let _ = cache.test(LOCAL);
        let _ = cache.fresh(LOCAL);
        assert_eq!(cache.generation(), start);

        cache.update(LOCAL);
        assert_ne!(cache.generation(), start);

        let after_update = cache.generation();
        cache.invalidate(LOCAL);
        assert_ne!(cache.generation(), after_update);
    }
}
