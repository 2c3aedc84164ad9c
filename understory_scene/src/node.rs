// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene nodes and their mutators.

use kurbo::Point;
use smallvec::SmallVec;
use understory_cache::{Cache, Unit};

use crate::units::{self, Payload, ROTATION, SCALING, SHAPE, TRANSLATION};
use crate::{Axis, Matrix, NodeId, Origin, Scene, Shape, ShapeGeometry, Stroke};

/// Construction-time node properties.
///
/// Unset fields keep their defaults: position `0, 0`, no rotation, unit
/// scale, origin offset `0`, no stroke. Shape sizes only apply to the
/// matching shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeProps {
    /// Position x relative to the parent.
    pub x: Option<f64>,
    /// Position y relative to the parent.
    pub y: Option<f64>,
    /// Rotation in degrees, clockwise.
    pub rotation: Option<f64>,
    /// Horizontal scale.
    pub scaling_x: Option<f64>,
    /// Vertical scale.
    pub scaling_y: Option<f64>,
    /// Horizontal origin.
    pub origin_x: Option<Origin>,
    /// Vertical origin.
    pub origin_y: Option<Origin>,
    /// Stroke.
    pub stroke: Option<Stroke>,
    /// Rectangle width.
    pub width: Option<f64>,
    /// Rectangle height.
    pub height: Option<f64>,
    /// Ellipse horizontal radius.
    pub radius_x: Option<f64>,
    /// Ellipse vertical radius.
    pub radius_y: Option<f64>,
}

/// A positioned, rotated, scaled node of a [`Scene`].
///
/// Read access only; mutate through [`Scene::node_mut`] so that every change
/// invalidates the right cache units.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) rotation: f64,
    pub(crate) scaling_x: f64,
    pub(crate) scaling_y: f64,
    pub(crate) origin_x: Origin,
    pub(crate) origin_y: Origin,
    pub(crate) stroke: Stroke,
    pub(crate) shape: Shape,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) cache: Cache<Payload>,
}

impl Node {
    pub(crate) fn new(shape: Shape) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scaling_x: 1.0,
            scaling_y: 1.0,
            origin_x: Origin::default(),
            origin_y: Origin::default(),
            stroke: Stroke::none(),
            shape,
            parent: None,
            children: SmallVec::new(),
            cache: units::node_cache(),
        }
    }

    /// Position x relative to the parent.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Position y relative to the parent.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Rotation in degrees.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Horizontal scale.
    #[must_use]
    pub fn scaling_x(&self) -> f64 {
        self.scaling_x
    }

    /// Vertical scale.
    #[must_use]
    pub fn scaling_y(&self) -> f64 {
        self.scaling_y
    }

    /// Horizontal origin, unresolved.
    #[must_use]
    pub fn origin_x(&self) -> Origin {
        self.origin_x
    }

    /// Vertical origin, unresolved.
    #[must_use]
    pub fn origin_y(&self) -> Origin {
        self.origin_y
    }

    /// The stroke.
    #[must_use]
    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    /// The shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The parent, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in paint order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns `true` if `unit` currently holds a valid payload.
    ///
    /// View-dependent units may still be recomputed on the next read if the
    /// camera or canvas changed since.
    #[must_use]
    pub fn is_cached(&self, unit: Unit) -> bool {
        self.cache.test(unit)
    }

    /// Counter that moves whenever this node's cache recomputes or
    /// invalidates anything.
    #[must_use]
    pub fn cache_generation(&self) -> u64 {
        self.cache.generation()
    }

    pub(crate) fn local_matrix(&mut self) -> &Matrix {
        units::local_matrix(
            &mut self.cache,
            self.x,
            self.y,
            self.rotation,
            self.scaling_x,
            self.scaling_y,
        )
    }

    /// The origin offsets resolved against `geometry`.
    pub(crate) fn origin_in(&self, geometry: &dyn ShapeGeometry) -> Point {
        Point::new(
            geometry.calculate_origin(Axis::X, self.origin_x),
            geometry.calculate_origin(Axis::Y, self.origin_y),
        )
    }
}

/// Mutable access to one node.
///
/// Each setter documents the cache unit it invalidates. Invalidation always
/// runs, even when the new value equals the old one, and it finishes
/// (descendants and ancestors included) before the setter returns.
#[derive(Debug)]
pub struct NodeMut<'a> {
    pub(crate) scene: &'a mut Scene,
    pub(crate) id: NodeId,
}

impl NodeMut<'_> {
    /// The handle of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Sets x. Invalidates `translation`.
    pub fn set_x(&mut self, x: f64) -> &mut Self {
        self.edit(TRANSLATION, |node| node.x = x)
    }

    /// Sets y. Invalidates `translation`.
    pub fn set_y(&mut self, y: f64) -> &mut Self {
        self.edit(TRANSLATION, |node| node.y = y)
    }

    /// Sets x and y. Invalidates `translation`.
    pub fn set_position(&mut self, x: f64, y: f64) -> &mut Self {
        self.edit(TRANSLATION, |node| {
            node.x = x;
            node.y = y;
        })
    }

    /// Sets the rotation in degrees. Invalidates `rotation`.
    pub fn set_rotation(&mut self, rotation: f64) -> &mut Self {
        self.edit(ROTATION, |node| node.rotation = rotation)
    }

    /// Sets the horizontal scale. Invalidates `scaling`.
    pub fn set_scaling_x(&mut self, scaling_x: f64) -> &mut Self {
        self.edit(SCALING, |node| node.scaling_x = scaling_x)
    }

    /// Sets the vertical scale. Invalidates `scaling`.
    pub fn set_scaling_y(&mut self, scaling_y: f64) -> &mut Self {
        self.edit(SCALING, |node| node.scaling_y = scaling_y)
    }

    /// Sets both scale factors. Invalidates `scaling`.
    pub fn set_scaling(&mut self, scaling_x: f64, scaling_y: f64) -> &mut Self {
        self.edit(SCALING, |node| {
            node.scaling_x = scaling_x;
            node.scaling_y = scaling_y;
        })
    }

    /// Sets the horizontal origin. Invalidates `shape`.
    pub fn set_origin_x(&mut self, origin: impl Into<Origin>) -> &mut Self {
        let origin = origin.into();
        self.edit(SHAPE, |node| node.origin_x = origin)
    }

    /// Sets the vertical origin. Invalidates `shape`.
    pub fn set_origin_y(&mut self, origin: impl Into<Origin>) -> &mut Self {
        let origin = origin.into();
        self.edit(SHAPE, |node| node.origin_y = origin)
    }

    /// Sets the stroke. Invalidates `shape`.
    pub fn set_stroke(&mut self, stroke: Stroke) -> &mut Self {
        self.edit(SHAPE, |node| node.stroke = stroke)
    }

    /// Replaces the shape. Invalidates `shape`.
    pub fn set_shape(&mut self, shape: Shape) -> &mut Self {
        self.edit(SHAPE, |node| node.shape = shape)
    }

    /// Sets the rectangle width. Invalidates `shape`; ignored for other shapes.
    pub fn set_width(&mut self, width: f64) -> &mut Self {
        self.edit_shape("width", |shape| match shape {
            Shape::Rectangle(rectangle) => {
                rectangle.width = width;
                true
            }
            _ => false,
        })
    }

    /// Sets the rectangle height. Invalidates `shape`; ignored for other shapes.
    pub fn set_height(&mut self, height: f64) -> &mut Self {
        self.edit_shape("height", |shape| match shape {
            Shape::Rectangle(rectangle) => {
                rectangle.height = height;
                true
            }
            _ => false,
        })
    }

    /// Sets the ellipse horizontal radius. Invalidates `shape`; ignored for
    /// other shapes.
    pub fn set_radius_x(&mut self, radius_x: f64) -> &mut Self {
        self.edit_shape("radius_x", |shape| match shape {
            Shape::Ellipse(ellipse) => {
                ellipse.radius_x = radius_x;
                true
            }
            _ => false,
        })
    }

    /// Sets the ellipse vertical radius. Invalidates `shape`; ignored for
    /// other shapes.
    pub fn set_radius_y(&mut self, radius_y: f64) -> &mut Self {
        self.edit_shape("radius_y", |shape| match shape {
            Shape::Ellipse(ellipse) => {
                ellipse.radius_y = radius_y;
                true
            }
            _ => false,
        })
    }

    /// Applies every set field of `props` through the setters above.
    pub fn apply(&mut self, props: NodeProps) -> &mut Self {
        let NodeProps {
            x,
            y,
            rotation,
            scaling_x,
            scaling_y,
            origin_x,
            origin_y,
            stroke,
            width,
            height,
            radius_x,
            radius_y,
        } = props;
        if let Some(x) = x {
            self.set_x(x);
        }
        if let Some(y) = y {
            self.set_y(y);
        }
        if let Some(rotation) = rotation {
            self.set_rotation(rotation);
        }
        if let Some(scaling_x) = scaling_x {
            self.set_scaling_x(scaling_x);
        }
        if let Some(scaling_y) = scaling_y {
            self.set_scaling_y(scaling_y);
        }
        if let Some(origin_x) = origin_x {
            self.set_origin_x(origin_x);
        }
        if let Some(origin_y) = origin_y {
            self.set_origin_y(origin_y);
        }
        if let Some(stroke) = stroke {
            self.set_stroke(stroke);
        }
        if let Some(width) = width {
            self.set_width(width);
        }
        if let Some(height) = height {
            self.set_height(height);
        }
        if let Some(radius_x) = radius_x {
            self.set_radius_x(radius_x);
        }
        if let Some(radius_y) = radius_y {
            self.set_radius_y(radius_y);
        }
        self
    }

    fn edit(&mut self, unit: Unit, f: impl FnOnce(&mut Node)) -> &mut Self {
        if let Some(node) = self.scene.nodes.get_mut(self.id) {
            f(node);
        }
        self.scene.invalidate(self.id, unit);
        self
    }

    fn edit_shape(&mut self, property: &str, f: impl FnOnce(&mut Shape) -> bool) -> &mut Self {
        let applied = self
            .scene
            .nodes
            .get_mut(self.id)
            .is_some_and(|node| f(&mut node.shape));
        if applied {
            self.scene.invalidate(self.id, SHAPE);
        } else {
            tracing::debug!(node = ?self.id, property, "shape setter ignored for mismatched shape");
        }
        self
    }
}
