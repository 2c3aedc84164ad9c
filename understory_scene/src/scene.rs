// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene: node tree, cameras, canvases and every cached query.

use alloc::vec::Vec;
use core::mem;

use kurbo::{Affine, BezPath, Point, Rect};
use smallvec::{SmallVec, smallvec};
use understory_cache::Unit;

use crate::id::Arena;
use crate::units::{
    self, GLOBAL_POINT, GLOBAL_TRANSFORMATIONS, GLOBAL_VERTICES, POINT, Payload, SHAPE,
    TREE_VERTICES, VERTICES, VERTICES_REFERENCE, ViewStamp,
};
use crate::{
    Axis, Camera, CameraId, Canvas, CanvasId, Matrix, Node, NodeId, NodeMut, NodeProps, Painter,
    Reference, SceneError, Shape, fit_transform,
};

/// The matrix placed above scene roots, and what it was built from.
#[derive(Copy, Clone, Debug)]
struct Frame {
    matrix: Matrix,
    stamp: ViewStamp,
}

impl Frame {
    /// Plain scene coordinates.
    const SCENE: Self = Self {
        matrix: Matrix::IDENTITY,
        stamp: ViewStamp {
            canvas: None,
            camera: None,
        },
    };
}

/// A retained 2D scene graph.
///
/// The scene owns three arenas (nodes, cameras, canvases) addressed by
/// generational handles. Nodes form a forest; every node keeps a cache of
/// matrices and vertex arrays (see [`units`](crate::units)) that mutations
/// invalidate and queries recompute on demand.
///
/// # Invalidation
///
/// Inside one node, units follow the static dependency table of
/// [`units`](crate::units). Across nodes, the scene adds two runtime rules:
/// - an invalidated `globalTransformations` invalidates the same unit on every
///   child, so descendants never keep a stale global matrix;
/// - an invalidated `treeVertices` invalidates the same unit on the parent, so
///   ancestors never keep stale subtree vertices.
///
/// Both finish before the mutator that triggered them returns. A valid
/// `globalTransformations` implies a valid one on the parent, and a valid
/// `treeVertices` implies valid ones on the children, so propagation stops at
/// the first node whose unit is already invalid.
///
/// # Views
///
/// Global queries take a [`CanvasId`]. A root node's global transform is
/// `fit · view · local`, where `view` is the canvas camera's
/// [`view_matrix`](Camera::view_matrix) and `fit` the canvas
/// [`fit_transform`]. Results record the camera and canvas generations they
/// were computed against, so moving a camera or resizing a canvas is picked up
/// on the next read without any node being touched.
#[derive(Debug, Default)]
pub struct Scene {
    pub(crate) nodes: Arena<NodeId, Node>,
    cameras: Arena<CameraId, Camera>,
    canvases: Arena<CanvasId, Canvas>,
    roots: Vec<NodeId>,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- structure ---

    /// Creates a root node with `shape`, then applies `props` through the
    /// regular setters.
    pub fn create(&mut self, shape: Shape, props: NodeProps) -> NodeId {
        let id = self.nodes.insert(Node::new(shape));
        self.roots.push(id);
        if let Some(mut node) = self.node_mut(id) {
            node.apply(props);
        }
        id
    }

    /// Removes `id` and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains(id) {
            return Err(SceneError::InvalidNode(id));
        }
        self.unlink(id);
        let mut stack: SmallVec<[NodeId; 8]> = smallvec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Appends `child` to `parent`'s children, detaching it from wherever it
    /// was before.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.insert_child(parent, usize::MAX, child)
    }

    /// Inserts `child` at `index` (clamped) among `parent`'s children.
    ///
    /// Fails with [`SceneError::Cycle`] if `child` is `parent` or one of its
    /// ancestors.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), SceneError> {
        if !self.nodes.contains(parent) {
            return Err(SceneError::InvalidNode(parent));
        }
        if !self.nodes.contains(child) {
            return Err(SceneError::InvalidNode(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        self.unlink(child);
        if let Some(node) = self.nodes.get_mut(parent) {
            let index = index.min(node.children.len());
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        self.invalidate(child, GLOBAL_TRANSFORMATIONS);
        self.invalidate(parent, TREE_VERTICES);
        Ok(())
    }

    /// Detaches `child` from its parent and makes it a root.
    ///
    /// Detaching a root is a no-op.
    pub fn detach(&mut self, child: NodeId) -> Result<(), SceneError> {
        let node = self.nodes.get(child).ok_or(SceneError::InvalidNode(child))?;
        if node.parent.is_none() {
            return Ok(());
        }
        self.unlink(child);
        self.roots.push(child);
        self.invalidate(child, GLOBAL_TRANSFORMATIONS);
        Ok(())
    }

    /// Root nodes in creation (and paint) order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Read access to a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access to a node through its invalidating setters.
    pub fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        if self.nodes.contains(id) {
            Some(NodeMut { scene: self, id })
        } else {
            None
        }
    }

    /// Returns `true` if `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the scene has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    /// Returns `true` if `unit` of `id` holds a valid payload.
    #[must_use]
    pub fn is_cached(&self, id: NodeId, unit: Unit) -> bool {
        self.nodes.get(id).is_some_and(|node| node.is_cached(unit))
    }

    // --- cameras and canvases ---

    /// Adds a camera.
    pub fn insert_camera(&mut self, camera: Camera) -> CameraId {
        self.cameras.insert(camera)
    }

    /// Read access to a camera.
    #[must_use]
    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.get(id)
    }

    /// Mutable access to a camera.
    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.get_mut(id)
    }

    /// Removes a camera. Canvases still pointing at it report
    /// [`SceneError::MissingCamera`].
    pub fn remove_camera(&mut self, id: CameraId) -> Option<Camera> {
        self.cameras.remove(id)
    }

    /// Adds a canvas.
    pub fn insert_canvas(&mut self, canvas: Canvas) -> CanvasId {
        self.canvases.insert(canvas)
    }

    /// Read access to a canvas.
    #[must_use]
    pub fn canvas(&self, id: CanvasId) -> Option<&Canvas> {
        self.canvases.get(id)
    }

    /// Mutable access to a canvas.
    pub fn canvas_mut(&mut self, id: CanvasId) -> Option<&mut Canvas> {
        self.canvases.get_mut(id)
    }

    /// Removes a canvas.
    pub fn remove_canvas(&mut self, id: CanvasId) -> Option<Canvas> {
        self.canvases.remove(id)
    }

    // --- queries ---

    /// The local `translation · rotation · scaling` matrix of `id`.
    ///
    /// Repeated calls without a mutation in between return the same cached
    /// matrix and recompute nothing.
    pub fn transformation_matrix(&mut self, id: NodeId) -> Result<&Matrix, SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::InvalidNode(id))?;
        Ok(node.local_matrix())
    }

    /// The matrix mapping `id`'s local coordinates to device pixels of
    /// `canvas`.
    ///
    /// Fails with [`SceneError::MissingCamera`] if the canvas has no live
    /// camera.
    pub fn global_transformation_matrix(
        &mut self,
        id: NodeId,
        canvas: CanvasId,
    ) -> Result<&Matrix, SceneError> {
        let frame = self.canvas_frame(canvas)?;
        self.ensure_global(id, &frame)?;
        Ok(&self.payload(id, GLOBAL_TRANSFORMATIONS)?.matrix)
    }

    /// Maps a point in `id`'s local coordinates to device pixels of `canvas`.
    ///
    /// The last requested point is cached; asking for a different point
    /// invalidates `point` and recomputes.
    pub fn global_point(
        &mut self,
        id: NodeId,
        point: Point,
        canvas: CanvasId,
    ) -> Result<Point, SceneError> {
        let frame = self.canvas_frame(canvas)?;
        self.ensure_global(id, &frame)?;
        let node = self.nodes.get_mut(id).ok_or(SceneError::InvalidNode(id))?;

        let same_point = node
            .cache
            .fresh(POINT)
            .is_some_and(|payload| payload.point == point);
        if !same_point {
            node.cache.invalidate(POINT);
            let payload = node.cache.get(POINT);
            payload.point = point;
            payload.matrix = Matrix::translation(point.x, point.y);
            node.cache.update(POINT);
        }

        if let Some(payload) = units::fresh_for(&node.cache, GLOBAL_POINT, frame.stamp) {
            return Ok(payload.matrix.translation_point());
        }
        let global = node.cache.get(GLOBAL_TRANSFORMATIONS).matrix;
        let local = node.cache.get(POINT).matrix;
        let payload = node.cache.get(GLOBAL_POINT);
        payload.matrix.multiply(&[&global, &local]);
        payload.view = Some(frame.stamp);
        let result = payload.matrix.translation_point();
        node.cache.update(GLOBAL_POINT);
        Ok(result)
    }

    /// Resolves `id`'s origin along `axis` to a number.
    pub fn calculate_origin(&self, id: NodeId, axis: Axis) -> Result<f64, SceneError> {
        let node = self.nodes.get(id).ok_or(SceneError::InvalidNode(id))?;
        let geometry = node.shape.geometry().ok_or(SceneError::NeedsShape(id))?;
        let origin = match axis {
            Axis::X => node.origin_x,
            Axis::Y => node.origin_y,
        };
        Ok(geometry.calculate_origin(axis, origin))
    }

    /// Shape-local bounding vertices of `id`, origin and stroke included.
    ///
    /// Ellipses give their four cardinal extents (top, right, bottom, left);
    /// rectangles their four corners (top-left first, clockwise).
    pub fn vertices(&mut self, id: NodeId) -> Result<&[Point], SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::InvalidNode(id))?;
        let shape = node.shape;
        let geometry = shape.geometry().ok_or(SceneError::NeedsShape(id))?;
        if !node.cache.test(VERTICES) {
            let origin = node.origin_in(geometry);
            let half_stroke = node.stroke.half_width();
            geometry.local_vertices(origin, half_stroke, &mut node.cache.get(VERTICES).vertices);
            node.cache.update(SHAPE);
            node.cache.update(VERTICES);
            tracing::trace!(node = ?id, "recomputed local vertices");
        }
        Ok(node.cache.get(VERTICES).vertices.as_slice())
    }

    /// Shape-local vertices of `id` expressed in `reference`'s frame.
    ///
    /// The result is cached together with the reference it was computed for;
    /// asking for another reference recomputes from scratch. Ellipses give
    /// the exact axis-aligned bounding box of the mapped ellipse; rectangles
    /// their four mapped corners. Both are ordered top-left, top-right,
    /// bottom-right, bottom-left before mapping.
    pub fn vertices_relative_to(
        &mut self,
        id: NodeId,
        reference: Reference,
    ) -> Result<&[Point], SceneError> {
        let frame = match reference {
            Reference::Node(node) => {
                if !self.nodes.contains(node) {
                    return Err(SceneError::InvalidNode(node));
                }
                Frame::SCENE
            }
            Reference::Camera(camera) => self.camera_frame(camera)?,
            Reference::Canvas(canvas) => self.canvas_frame(canvas)?,
        };
        let node = self.nodes.get(id).ok_or(SceneError::InvalidNode(id))?;
        let shape = node.shape;
        let geometry = shape.geometry().ok_or(SceneError::NeedsShape(id))?;
        let fresh = units::fresh_for(&node.cache, VERTICES_REFERENCE, frame.stamp)
            .is_some_and(|payload| payload.reference == Some(reference));

        if !fresh {
            // Cross-node invalidation only reaches descendants of a valid
            // global transform.
            if !node.cache.test(GLOBAL_TRANSFORMATIONS) {
                self.ensure_global(id, &frame)?;
            }
            let mut chain: SmallVec<[NodeId; 8]> = SmallVec::new();
            let mut cursor = Some(id);
            while let Some(current) = cursor {
                if reference == Reference::Node(current) {
                    break;
                }
                chain.push(current);
                cursor = self
                    .nodes
                    .get(current)
                    .ok_or(SceneError::InvalidNode(current))?
                    .parent;
            }

            let mut matrices: SmallVec<[Matrix; 8]> = SmallVec::with_capacity(chain.len() + 2);
            matrices.push(frame.matrix);
            for &current in chain.iter().rev() {
                let node = self
                    .nodes
                    .get_mut(current)
                    .ok_or(SceneError::InvalidNode(current))?;
                matrices.push(*node.local_matrix());
            }

            let node = self.nodes.get_mut(id).ok_or(SceneError::InvalidNode(id))?;
            let origin = node.origin_in(geometry);
            matrices.push(geometry.size_matrix(origin, node.stroke.half_width()));
            let operands: SmallVec<[&Matrix; 8]> = matrices.iter().collect();

            let payload = node.cache.get(VERTICES_REFERENCE);
            payload.matrix.multiply(&operands);
            geometry.vertices_through(&payload.matrix, &mut payload.vertices);
            payload.reference = Some(reference);
            payload.view = Some(frame.stamp);
            node.cache.update(SHAPE);
            node.cache.update(VERTICES_REFERENCE);
            tracing::trace!(node = ?id, ?reference, "recomputed reference vertices");
        }
        Ok(self.payload(id, VERTICES_REFERENCE)?.vertices.as_slice())
    }

    /// Local vertices of `id` mapped to device pixels of `canvas`.
    pub fn global_vertices(&mut self, id: NodeId, canvas: CanvasId) -> Result<&[Point], SceneError> {
        let frame = self.canvas_frame(canvas)?;
        self.ensure_global_vertices(id, &frame)?;
        Ok(self.payload(id, GLOBAL_VERTICES)?.vertices.as_slice())
    }

    /// Global vertices of `id` followed by those of its subtree, depth-first
    /// in child order.
    ///
    /// Shapeless nodes contribute nothing themselves but their children are
    /// still visited.
    pub fn global_vertices_for_tree(
        &mut self,
        id: NodeId,
        canvas: CanvasId,
    ) -> Result<&[Point], SceneError> {
        let frame = self.canvas_frame(canvas)?;
        self.ensure_tree(id, &frame)?;
        Ok(self.payload(id, TREE_VERTICES)?.vertices.as_slice())
    }

    /// Axis-aligned device-pixel bounds of `id`'s subtree, or `None` if
    /// nothing in it has a shape.
    pub fn tree_bounds(&mut self, id: NodeId, canvas: CanvasId) -> Result<Option<Rect>, SceneError> {
        let vertices = self.global_vertices_for_tree(id, canvas)?;
        Ok(vertices.split_first().map(|(&first, rest)| {
            rest.iter()
                .fold(Rect::from_points(first, first), |bounds, &p| bounds.union_pt(p))
        }))
    }

    /// The outline of `id`'s shape in its local frame.
    pub fn render_path(&self, id: NodeId) -> Result<BezPath, SceneError> {
        let node = self.nodes.get(id).ok_or(SceneError::InvalidNode(id))?;
        let geometry = node.shape.geometry().ok_or(SceneError::NeedsShape(id))?;
        Ok(geometry.outline(node.origin_in(geometry)))
    }

    /// Paints every shaped node, roots first and children in order, through
    /// `canvas`'s camera.
    ///
    /// A camera zoom of zero or less paints nothing.
    pub fn paint(&mut self, canvas: CanvasId, painter: &mut impl Painter) -> Result<(), SceneError> {
        let frame = self.canvas_frame(canvas)?;
        let zoom = frame
            .stamp
            .camera
            .and_then(|(camera, _)| self.cameras.get(camera))
            .map_or(0.0, |camera| camera.zoom().max(0.0));
        if zoom <= 0.0 {
            tracing::trace!(?canvas, "camera zoom clamps to zero; nothing to paint");
            return Ok(());
        }

        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            self.ensure_global(id, &frame)?;
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            stack.extend(node.children.iter().rev().copied());
            let (Some(geometry), Some(global)) =
                (node.shape.geometry(), node.cache.fresh(GLOBAL_TRANSFORMATIONS))
            else {
                continue;
            };
            let path = geometry.outline(node.origin_in(geometry));
            let stroke = node.stroke.is_visible().then_some(&node.stroke);
            painter.draw_path(Affine::from(global.matrix), &path, stroke);
        }
        Ok(())
    }

    // --- internals ---

    /// Invalidates `unit` on `id` and propagates across nodes: global
    /// transforms down to children, tree vertices up to the parent.
    ///
    /// `id` is always invalidated. Any other node is skipped if its unit is
    /// already invalid, since everything beyond it in that direction is
    /// invalid as well.
    pub(crate) fn invalidate(&mut self, id: NodeId, unit: Unit) {
        tracing::trace!(node = ?id, unit = unit.name(), "invalidating");
        let mut pending: SmallVec<[(NodeId, Unit); 8]> = smallvec![(id, unit)];
        let mut origin = true;
        while let Some((current, unit)) = pending.pop() {
            let first = mem::replace(&mut origin, false);
            let Some(node) = self.nodes.get_mut(current) else {
                continue;
            };
            if !first && !node.cache.test(unit) {
                continue;
            }
            let Node {
                cache,
                children,
                parent,
                ..
            } = node;
            cache.invalidate_with(unit, |event| {
                if event == GLOBAL_TRANSFORMATIONS {
                    pending.extend(children.iter().map(|&child| (child, GLOBAL_TRANSFORMATIONS)));
                } else if event == TREE_VERTICES {
                    pending.extend(parent.map(|parent| (parent, TREE_VERTICES)));
                }
            });
        }
    }

    /// Removes `id` from its parent's children (or from the roots) without
    /// making it a root.
    fn unlink(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(id).and_then(|node| node.parent.take());
        match parent {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(parent) {
                    node.children.retain(|child| *child != id);
                }
                self.invalidate(parent, TREE_VERTICES);
            }
            None => self.roots.retain(|&root| root != id),
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self
            .nodes
            .get(ancestor)
            .is_some_and(|candidate| candidate.children.is_empty())
        {
            return ancestor == node;
        }
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(current).and_then(|node| node.parent);
        }
        false
    }

    fn payload(&mut self, id: NodeId, unit: Unit) -> Result<&Payload, SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::InvalidNode(id))?;
        Ok(node.cache.get(unit))
    }

    fn camera_frame(&mut self, id: CameraId) -> Result<Frame, SceneError> {
        let camera = self
            .cameras
            .get_mut(id)
            .ok_or(SceneError::InvalidCamera(id))?;
        Ok(Frame {
            matrix: *camera.view_matrix(),
            stamp: ViewStamp {
                canvas: None,
                camera: Some((id, camera.generation())),
            },
        })
    }

    fn canvas_frame(&mut self, id: CanvasId) -> Result<Frame, SceneError> {
        let canvas = self.canvases.get(id).ok_or(SceneError::InvalidCanvas(id))?;
        let (width, height, mode, generation) = (
            canvas.width(),
            canvas.height(),
            canvas.view_mode(),
            canvas.generation(),
        );
        let Some((camera_id, camera)) = canvas.camera().and_then(|camera_id| {
            self.cameras
                .get_mut(camera_id)
                .map(|camera| (camera_id, camera))
        }) else {
            tracing::debug!(canvas = ?id, "no live camera attached to canvas");
            return Err(SceneError::MissingCamera(id));
        };
        let fit = fit_transform(width, height, camera.width(), camera.height(), mode).to_matrix();
        let view = *camera.view_matrix();
        Ok(Frame {
            matrix: fit * view,
            stamp: ViewStamp {
                canvas: Some((id, generation)),
                camera: Some((camera_id, camera.generation())),
            },
        })
    }

    /// Recomputes global transforms from the nearest up-to-date ancestor
    /// down to `id`.
    fn ensure_global(&mut self, id: NodeId, frame: &Frame) -> Result<(), SceneError> {
        let mut stale: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self
                .nodes
                .get(current)
                .ok_or(SceneError::InvalidNode(current))?;
            if units::fresh_for(&node.cache, GLOBAL_TRANSFORMATIONS, frame.stamp).is_some() {
                break;
            }
            stale.push(current);
            cursor = node.parent;
        }

        for &current in stale.iter().rev() {
            let parent = self.nodes.get(current).and_then(|node| node.parent);
            let above = match parent {
                Some(parent) => {
                    self.nodes
                        .get(parent)
                        .and_then(|node| node.cache.fresh(GLOBAL_TRANSFORMATIONS))
                        .ok_or(SceneError::InvalidNode(parent))?
                        .matrix
                }
                None => frame.matrix,
            };
            let node = self
                .nodes
                .get_mut(current)
                .ok_or(SceneError::InvalidNode(current))?;
            let local = *node.local_matrix();
            let payload = node.cache.get(GLOBAL_TRANSFORMATIONS);
            payload.matrix.multiply(&[&above, &local]);
            payload.view = Some(frame.stamp);
            node.cache.update(GLOBAL_TRANSFORMATIONS);
            tracing::trace!(node = ?current, "recomputed global transform");
        }
        Ok(())
    }

    fn ensure_global_vertices(&mut self, id: NodeId, frame: &Frame) -> Result<(), SceneError> {
        self.vertices(id)?;
        self.ensure_global(id, frame)?;
        let node = self.nodes.get_mut(id).ok_or(SceneError::InvalidNode(id))?;
        if units::fresh_for(&node.cache, GLOBAL_VERTICES, frame.stamp).is_some() {
            return Ok(());
        }
        let global = node.cache.get(GLOBAL_TRANSFORMATIONS).matrix;
        let mut out = mem::take(&mut node.cache.get(GLOBAL_VERTICES).vertices);
        out.clear();
        out.extend(
            node.cache
                .get(VERTICES)
                .vertices
                .iter()
                .map(|&p| global.transform_point(p)),
        );
        let payload = node.cache.get(GLOBAL_VERTICES);
        payload.vertices = out;
        payload.view = Some(frame.stamp);
        node.cache.update(GLOBAL_VERTICES);
        tracing::trace!(node = ?id, "recomputed global vertices");
        Ok(())
    }

    /// Rebuilds the stale part of `id`'s subtree vertices, children before
    /// parents.
    fn ensure_tree(&mut self, id: NodeId, frame: &Frame) -> Result<(), SceneError> {
        // Pre-order, so every stale node precedes its stale descendants.
        let mut stale: Vec<NodeId> = Vec::new();
        let mut stack: SmallVec<[NodeId; 8]> = smallvec![id];
        while let Some(current) = stack.pop() {
            let node = self
                .nodes
                .get(current)
                .ok_or(SceneError::InvalidNode(current))?;
            if units::fresh_for(&node.cache, TREE_VERTICES, frame.stamp).is_some() {
                continue;
            }
            stale.push(current);
            stack.extend(node.children.iter().copied());
        }

        // Top-down, each global walk stops at the parent refreshed just before.
        for &current in &stale {
            let shaped = self
                .nodes
                .get(current)
                .is_some_and(|node| node.shape.geometry().is_some());
            if shaped {
                self.ensure_global_vertices(current, frame)?;
            } else {
                self.ensure_global(current, frame)?;
            }
        }

        for &current in stale.iter().rev() {
            let node = self
                .nodes
                .get_mut(current)
                .ok_or(SceneError::InvalidNode(current))?;
            let mut out = mem::take(&mut node.cache.get(TREE_VERTICES).vertices);
            out.clear();
            if node.shape.geometry().is_some() {
                out.extend_from_slice(&node.cache.get(GLOBAL_VERTICES).vertices);
            }
            let node = self
                .nodes
                .get(current)
                .ok_or(SceneError::InvalidNode(current))?;
            for &child in &node.children {
                let payload = self
                    .nodes
                    .get(child)
                    .and_then(|node| node.cache.fresh(TREE_VERTICES))
                    .ok_or(SceneError::InvalidNode(child))?;
                out.extend_from_slice(&payload.vertices);
            }

            let node = self
                .nodes
                .get_mut(current)
                .ok_or(SceneError::InvalidNode(current))?;
            let payload = node.cache.get(TREE_VERTICES);
            payload.vertices = out;
            payload.view = Some(frame.stamp);
            node.cache.update(TREE_VERTICES);
            tracing::trace!(node = ?current, "recomputed subtree vertices");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{ROTATION, SCALING, TRANSFORMATIONS, TRANSLATION};

    fn scene_with_canvas() -> (Scene, CanvasId) {
        let mut scene = Scene::new();
        let camera = scene.insert_camera(Camera::new());
        let canvas = scene.insert_canvas(Canvas::new(300.0, 150.0).with_camera(camera));
        (scene, canvas)
    }

    #[test]
    fn create_applies_props() {
        let mut scene = Scene::new();
        let id = scene.create(
            Shape::rectangle(10.0, 20.0),
            NodeProps {
                x: Some(5.0),
                width: Some(30.0),
                radius_x: Some(99.0),
                ..NodeProps::default()
            },
        );
        let node = scene.node(id).expect("node exists");
        assert_eq!(node.x(), 5.0);
        assert_eq!(*node.shape(), Shape::rectangle(30.0, 20.0));
        assert_eq!(scene.roots(), [id]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut scene = Scene::new();
        let a = scene.create(Shape::None, NodeProps::default());
        let b = scene.create(Shape::None, NodeProps::default());
        scene.add_child(a, b).unwrap();
        assert_eq!(
            scene.add_child(b, a),
            Err(SceneError::Cycle {
                parent: b,
                child: a
            })
        );
        assert_eq!(
            scene.add_child(a, a),
            Err(SceneError::Cycle {
                parent: a,
                child: a
            })
        );
    }

    #[test]
    fn reparenting_moves_between_lists() {
        let mut scene = Scene::new();
        let a = scene.create(Shape::None, NodeProps::default());
        let b = scene.create(Shape::None, NodeProps::default());
        let c = scene.create(Shape::None, NodeProps::default());
        scene.add_child(a, c).unwrap();
        assert_eq!(scene.roots(), [a, b]);

        scene.insert_child(b, 0, c).unwrap();
        assert!(scene.node(a).unwrap().children().is_empty());
        assert_eq!(scene.node(b).unwrap().children(), [c]);
        assert_eq!(scene.node(c).unwrap().parent(), Some(b));

        scene.detach(c).unwrap();
        assert_eq!(scene.roots(), [a, b, c]);
        assert_eq!(scene.node(c).unwrap().parent(), None);
    }

    #[test]
    fn remove_drops_the_subtree() {
        let mut scene = Scene::new();
        let a = scene.create(Shape::None, NodeProps::default());
        let b = scene.create(Shape::None, NodeProps::default());
        let c = scene.create(Shape::None, NodeProps::default());
        scene.add_child(a, b).unwrap();
        scene.add_child(b, c).unwrap();

        scene.remove(b).unwrap();
        assert!(scene.contains(a));
        assert!(!scene.contains(b));
        assert!(!scene.contains(c));
        assert!(scene.node(a).unwrap().children().is_empty());
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.remove(b), Err(SceneError::InvalidNode(b)));
    }

    #[test]
    fn setters_invalidate_only_their_leaf() {
        let mut scene = Scene::new();
        let id = scene.create(Shape::None, NodeProps::default());
        let _ = scene.transformation_matrix(id).unwrap();
        scene.node_mut(id).unwrap().set_rotation(30.0);
        assert!(scene.is_cached(id, TRANSLATION));
        assert!(!scene.is_cached(id, ROTATION));
        assert!(scene.is_cached(id, SCALING));
        assert!(!scene.is_cached(id, TRANSFORMATIONS));
    }

    #[test]
    fn missing_camera_is_an_error() {
        let mut scene = Scene::new();
        let canvas = scene.insert_canvas(Canvas::new(100.0, 100.0));
        let id = scene.create(Shape::None, NodeProps::default());
        assert_eq!(
            scene.global_transformation_matrix(id, canvas).err(),
            Some(SceneError::MissingCamera(canvas))
        );

        let camera = scene.insert_camera(Camera::new());
        scene.canvas_mut(canvas).unwrap().set_camera(Some(camera));
        assert!(scene.global_transformation_matrix(id, canvas).is_ok());

        scene.remove_camera(camera);
        assert_eq!(
            scene.global_transformation_matrix(id, canvas).err(),
            Some(SceneError::MissingCamera(canvas))
        );
    }

    #[test]
    fn shapeless_queries_need_a_shape() {
        let (mut scene, canvas) = scene_with_canvas();
        let id = scene.create(Shape::None, NodeProps::default());
        assert_eq!(scene.vertices(id).err(), Some(SceneError::NeedsShape(id)));
        assert_eq!(
            scene.global_vertices(id, canvas).err(),
            Some(SceneError::NeedsShape(id))
        );
        assert_eq!(
            scene.calculate_origin(id, Axis::X),
            Err(SceneError::NeedsShape(id))
        );
        assert_eq!(scene.render_path(id).err(), Some(SceneError::NeedsShape(id)));
        // The subtree query tolerates shapeless nodes.
        assert!(scene.global_vertices_for_tree(id, canvas).unwrap().is_empty());
        assert_eq!(scene.tree_bounds(id, canvas).unwrap(), None);
    }

    #[test]
    fn global_point_caches_by_point() {
        let (mut scene, canvas) = scene_with_canvas();
        let id = scene.create(
            Shape::None,
            NodeProps {
                x: Some(10.0),
                y: Some(20.0),
                ..NodeProps::default()
            },
        );
        let p = scene
            .global_point(id, Point::new(1.0, 2.0), canvas)
            .unwrap();
        assert_eq!(p, Point::new(11.0, 22.0));

        let generation = scene.node(id).unwrap().cache_generation();
        let again = scene
            .global_point(id, Point::new(1.0, 2.0), canvas)
            .unwrap();
        assert_eq!(again, p);
        assert_eq!(scene.node(id).unwrap().cache_generation(), generation);

        let other = scene
            .global_point(id, Point::new(0.0, 0.0), canvas)
            .unwrap();
        assert_eq!(other, Point::new(10.0, 20.0));
    }
}
