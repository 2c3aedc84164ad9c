// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed lookup of scene nodes.

use core::hash::Hash;

use hashbrown::HashMap;

use crate::{NodeId, Scene};

/// Maps external keys (serialized ids, names, ...) to live nodes.
///
/// A registry is an ordinary value: create one per loading session and pass
/// it to whatever resolves keys. Entries whose node was removed from the
/// scene are treated as absent and replaced on the next
/// [`get_or_create`](Self::get_or_create).
///
/// ```
/// use understory_scene::{NodeProps, Registry, Scene, Shape};
///
/// let mut scene = Scene::new();
/// let mut registry = Registry::new();
///
/// let a = registry.get_or_create("a", &mut scene, |scene| {
///     scene.create(Shape::rectangle(10.0, 10.0), NodeProps::default())
/// });
/// let again = registry.get_or_create("a", &mut scene, |_| unreachable!());
/// assert_eq!(a, again);
/// assert_eq!(scene.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Registry<K> {
    entries: HashMap<K, NodeId>,
}

impl<K> Default for Registry<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Registry<K> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live node registered under `key`, creating it with
    /// `create` if there is none.
    pub fn get_or_create(
        &mut self,
        key: K,
        scene: &mut Scene,
        create: impl FnOnce(&mut Scene) -> NodeId,
    ) -> NodeId {
        if let Some(id) = self.get(&key, scene) {
            return id;
        }
        let id = create(scene);
        tracing::trace!(node = ?id, "registry entry created");
        self.entries.insert(key, id);
        id
    }

    /// Returns the node registered under `key` if it is still alive in
    /// `scene`.
    #[must_use]
    pub fn get(&self, key: &K, scene: &Scene) -> Option<NodeId> {
        self.entries
            .get(key)
            .copied()
            .filter(|&id| scene.contains(id))
    }

    /// Registers `id` under `key`, returning the previous entry.
    pub fn insert(&mut self, key: K, id: NodeId) -> Option<NodeId> {
        self.entries.insert(key, id)
    }

    /// Forgets `key`. The node itself stays in the scene.
    pub fn remove(&mut self, key: &K) -> Option<NodeId> {
        self.entries.remove(key)
    }

    /// Forgets every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, live or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
