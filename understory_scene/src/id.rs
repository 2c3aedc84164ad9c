// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational handles and the slot arena behind them.

use alloc::vec::Vec;
use core::marker::PhantomData;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub struct $name(u32, u32);

        impl Key for $name {
            fn from_parts(idx: u32, generation: u32) -> Self {
                Self(idx, generation)
            }

            fn parts(self) -> (u32, u32) {
                (self.0, self.1)
            }
        }
    };
}

define_id! {
    /// Handle of a node in a [`Scene`](crate::Scene).
    ///
    /// A fresh slot starts at generation `1`; reusing a freed slot bumps the
    /// generation, so a handle to a removed node never aliases a later one.
    NodeId
}

define_id! {
    /// Handle of a [`Camera`](crate::Camera) owned by a [`Scene`](crate::Scene).
    CameraId
}

define_id! {
    /// Handle of a [`Canvas`](crate::Canvas) owned by a [`Scene`](crate::Scene).
    CanvasId
}

pub(crate) trait Key: Copy {
    fn from_parts(idx: u32, generation: u32) -> Self;
    fn parts(self) -> (u32, u32);
}

#[derive(Clone, Debug)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with a free list, addressed by generational keys.
#[derive(Clone, Debug)]
pub(crate) struct Arena<K, T> {
    entries: Vec<Entry<T>>,
    free_list: Vec<u32>,
    len: usize,
    _key: PhantomData<K>,
}

impl<K, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            _key: PhantomData,
        }
    }
}

impl<K: Key, T> Arena<K, T> {
    pub(crate) fn insert(&mut self, value: T) -> K {
        self.len += 1;
        if let Some(idx) = self.free_list.pop() {
            let entry = &mut self.entries[idx as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.value = Some(value);
            return K::from_parts(idx, entry.generation);
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "more than u32::MAX live slots is not supported"
        )]
        let idx = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 1,
            value: Some(value),
        });
        K::from_parts(idx, 1)
    }

    pub(crate) fn remove(&mut self, key: K) -> Option<T> {
        let (idx, generation) = key.parts();
        let entry = self.entries.get_mut(idx as usize)?;
        if entry.generation != generation {
            return None;
        }
        let value = entry.value.take()?;
        self.free_list.push(idx);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, key: K) -> Option<&T> {
        let (idx, generation) = key.parts();
        self.entries
            .get(idx as usize)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: K) -> Option<&mut T> {
        let (idx, generation) = key.parts();
        self.entries
            .get_mut(idx as usize)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_mut())
    }

    pub(crate) fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_keys_do_not_alias() {
        let mut arena = Arena::<NodeId, &str>::default();
        let a = arena.insert("a");
        assert_eq!(arena.get(a), Some(&"a"));

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);

        let b = arena.insert("b");
        assert_ne!(a, b);
        assert_eq!(a.parts().0, b.parts().0, "slot should be reused");
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn get_mut_writes_through() {
        let mut arena = Arena::<CameraId, i32>::default();
        let id = arena.insert(1);
        if let Some(value) = arena.get_mut(id) {
            *value = 5;
        }
        assert_eq!(arena.get(id), Some(&5));
        assert!(arena.contains(id));
    }
}
