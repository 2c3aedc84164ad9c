// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Unit handles and compact unit sets.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Maximum number of units a single [`Cache`](crate::Cache) can hold.
pub const MAX_UNITS: usize = 64;

/// Identifies one cache unit.
///
/// A unit is a dense index (below [`MAX_UNITS`]) paired with a static name.
/// Identity is the index alone: two units with the same index compare equal
/// regardless of their names. The name is carried for invalidation events and
/// diagnostics.
///
/// # Example
///
/// ```
/// use understory_cache::Unit;
///
/// const TRANSLATION: Unit = Unit::new(0, "translation");
/// const ROTATION: Unit = Unit::new(1, "rotation");
///
/// assert_eq!(TRANSLATION.name(), "translation");
/// assert_ne!(TRANSLATION, ROTATION);
/// ```
#[derive(Copy, Clone)]
pub struct Unit {
    index: u8,
    name: &'static str,
}

impl Unit {
    /// Creates a unit handle.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 64`, as [`UnitSet`] only supports 64 units.
    #[must_use]
    pub const fn new(index: u8, name: &'static str) -> Self {
        assert!(index < 64, "Unit index must be less than 64");
        Self { index, name }
    }

    /// Returns the dense index of this unit.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.index
    }

    /// Returns the name this unit was declared with.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Converts this unit into a single-element [`UnitSet`].
    #[must_use]
    pub const fn into_set(self) -> UnitSet {
        UnitSet(1_u64 << self.index)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Unit {}

impl Hash for Unit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unit").field(&self.name).finish()
    }
}

/// A compact bitfield of up to 64 unit indices.
///
/// Iteration yields raw indices in ascending order; [`Cache::unit`](crate::Cache::unit)
/// maps an index back to the declared [`Unit`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct UnitSet(u64);

impl UnitSet {
    /// An empty unit set.
    pub const EMPTY: Self = Self(0);

    /// Creates an empty unit set.
    #[must_use]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Returns `true` if this set contains no units.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this set contains the given unit.
    #[must_use]
    pub const fn contains(self, unit: Unit) -> bool {
        self.contains_index(unit.index)
    }

    /// Returns `true` if this set contains the given unit index.
    #[must_use]
    pub const fn contains_index(self, index: u8) -> bool {
        (self.0 & (1_u64 << index)) != 0
    }

    /// Inserts a unit into the set.
    pub fn insert(&mut self, unit: Unit) {
        self.0 |= 1_u64 << unit.index;
    }

    /// Removes a unit from the set.
    pub fn remove(&mut self, unit: Unit) {
        self.0 &= !(1_u64 << unit.index);
    }

    /// Returns the number of units in the set.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub(crate) const fn from_index(index: u8) -> Self {
        Self(1_u64 << index)
    }

    /// Removes and returns the lowest index in the set.
    pub(crate) fn pop_lowest(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        #[expect(clippy::cast_possible_truncation, reason = "trailing_zeros <= 63")]
        let index = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(index)
    }

    /// Returns an iterator over the unit indices in this set, ascending.
    #[must_use]
    pub const fn iter(self) -> UnitSetIter {
        UnitSetIter { bits: self }
    }
}

impl fmt::Debug for UnitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOr for UnitSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for UnitSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for UnitSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Not for UnitSet {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl FromIterator<Unit> for UnitSet {
    fn from_iter<I: IntoIterator<Item = Unit>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for unit in iter {
            set.insert(unit);
        }
        set
    }
}

impl IntoIterator for UnitSet {
    type Item = u8;
    type IntoIter = UnitSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the unit indices in a [`UnitSet`].
#[derive(Clone, Debug)]
pub struct UnitSetIter {
    bits: UnitSet,
}

impl Iterator for UnitSetIter {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        self.bits.pop_lowest()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.bits.len() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for UnitSetIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    const A: Unit = Unit::new(0, "a");
    const B: Unit = Unit::new(1, "b");
    const C: Unit = Unit::new(63, "c");

    #[test]
    #[should_panic(expected = "Unit index must be less than 64")]
    fn unit_new_invalid() {
        let _ = Unit::new(64, "overflow");
    }

    #[test]
    fn identity_is_the_index() {
        let renamed = Unit::new(0, "alias");
        assert_eq!(A, renamed);
        assert_eq!(renamed.name(), "alias");
    }

    #[test]
    fn set_operations() {
        let mut set = UnitSet::empty();
        assert!(set.is_empty());

        set.insert(A);
        set.insert(C);
        assert!(set.contains(A));
        assert!(!set.contains(B));
        assert!(set.contains(C));
        assert_eq!(set.len(), 2);

        set.remove(A);
        assert!(!set.contains(A));
        assert_eq!(set.len(), 1);

        let both = A.into_set() | B.into_set();
        assert_eq!((both & !A.into_set()), B.into_set());
    }

    #[test]
    fn iter_is_ascending() {
        let set: UnitSet = [C, A, B].into_iter().collect();
        let indices: Vec<_> = set.iter().collect();
        assert_eq!(indices, [0, 1, 63]);
        assert_eq!(set.iter().len(), 3);
    }
}
