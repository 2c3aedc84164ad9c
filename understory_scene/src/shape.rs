// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape variants, origins and strokes.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{BezPath, Point, Rect, Shape as _};

use crate::Matrix;

/// Tolerance used when flattening ellipse outlines into paths.
const PATH_TOLERANCE: f64 = 0.1;

/// A coordinate axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

/// Where a node's origin sits along one axis.
///
/// Keywords resolve per shape: a rectangle spans `0..width`, an ellipse spans
/// `-radius..radius`. A keyword that does not belong to the axis it is used
/// on (`Top` on X, `Left` on Y) resolves to `0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Origin {
    /// Left edge (X only).
    Left,
    /// Center of the shape.
    Center,
    /// Right edge (X only).
    Right,
    /// Top edge (Y only).
    Top,
    /// Bottom edge (Y only).
    Bottom,
    /// Pixel offset from the shape's default origin.
    Offset(f64),
}

impl Origin {
    /// Parses `left`, `center`, `right`, `top`, `bottom` or a number.
    ///
    /// Anything else gives `Offset(0.0)`.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim() {
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            other => Self::Offset(other.parse().unwrap_or(0.0)),
        }
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self::Offset(0.0)
    }
}

impl From<f64> for Origin {
    fn from(offset: f64) -> Self {
        Self::Offset(offset)
    }
}

/// A stroke description: width in pixels and a color string.
///
/// The color is kept verbatim; interpreting it is up to the painter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stroke {
    /// Stroke width in pixels.
    pub width: f64,
    /// Color, as written.
    pub color: String,
}

impl Stroke {
    /// Creates a stroke.
    #[must_use]
    pub fn new(width: f64, color: impl Into<String>) -> Self {
        Self {
            width,
            color: color.into(),
        }
    }

    /// A zero-width stroke.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses `"<width>px <color>"`.
    ///
    /// Empty or malformed input yields a zero-width stroke. The `px` suffix
    /// is optional.
    ///
    /// ```
    /// use understory_scene::Stroke;
    ///
    /// let stroke = Stroke::parse("2px #ff0000");
    /// assert_eq!(stroke.width, 2.0);
    /// assert_eq!(stroke.color, "#ff0000");
    ///
    /// assert_eq!(Stroke::parse("").width, 0.0);
    /// assert_eq!(Stroke::parse("thick red").width, 0.0);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split_whitespace();
        let Some(width) = parts.next() else {
            return Self::none();
        };
        let width = width.strip_suffix("px").unwrap_or(width);
        match width.parse::<f64>() {
            Ok(width) if width.is_finite() && width >= 0.0 => {
                let color = parts.collect::<Vec<_>>().join(" ");
                Self::new(width, color)
            }
            _ => Self::none(),
        }
    }

    /// Half the stroke width; how far the stroke reaches past the outline.
    #[must_use]
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    /// Returns `true` if the stroke would paint anything.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.width > 0.0
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_visible() {
            write!(f, "{}px {}", self.width, self.color)
        } else {
            Ok(())
        }
    }
}

/// Shape-specific geometry shared by every drawable variant.
///
/// `origin` arguments are the resolved origin offsets of the node (see
/// [`calculate_origin`](Self::calculate_origin)); `half_stroke` is half the
/// node's stroke width.
pub trait ShapeGeometry {
    /// Resolves an origin keyword or offset to a number along `axis`.
    fn calculate_origin(&self, axis: Axis, origin: Origin) -> f64;

    /// Writes the shape-local bounding vertices into `out`.
    fn local_vertices(&self, origin: Point, half_stroke: f64, out: &mut Vec<Point>);

    /// Matrix mapping the unit primitive (unit square or unit circle) onto
    /// the stroked shape in local coordinates.
    fn size_matrix(&self, origin: Point, half_stroke: f64) -> Matrix;

    /// Writes the vertices of the unit primitive mapped through `matrix`.
    fn vertices_through(&self, matrix: &Matrix, out: &mut Vec<Point>);

    /// The outline in local coordinates.
    fn outline(&self, origin: Point) -> BezPath;
}

/// An axis-aligned rectangle spanning `0..width`, `0..height` before origin.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rectangle {
    /// Width in local units.
    pub width: f64,
    /// Height in local units.
    pub height: f64,
}

impl Rectangle {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl ShapeGeometry for Rectangle {
    fn calculate_origin(&self, axis: Axis, origin: Origin) -> f64 {
        match (axis, origin) {
            (_, Origin::Offset(offset)) => offset,
            (Axis::X, Origin::Left) | (Axis::Y, Origin::Top) => 0.0,
            (Axis::X, Origin::Center) => self.width / 2.0,
            (Axis::Y, Origin::Center) => self.height / 2.0,
            (Axis::X, Origin::Right) => self.width,
            (Axis::Y, Origin::Bottom) => self.height,
            _ => 0.0,
        }
    }

    fn local_vertices(&self, origin: Point, half_stroke: f64, out: &mut Vec<Point>) {
        let left = -half_stroke - origin.x;
        let top = -half_stroke - origin.y;
        let right = self.width + half_stroke - origin.x;
        let bottom = self.height + half_stroke - origin.y;
        out.clear();
        out.extend([
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ]);
    }

    fn size_matrix(&self, origin: Point, half_stroke: f64) -> Matrix {
        Matrix::translation(-origin.x - half_stroke, -origin.y - half_stroke)
            * Matrix::scaling(
                self.width + 2.0 * half_stroke,
                self.height + 2.0 * half_stroke,
            )
    }

    fn vertices_through(&self, matrix: &Matrix, out: &mut Vec<Point>) {
        out.clear();
        out.extend(
            [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
                .map(|(x, y)| matrix.transform_point(Point::new(x, y))),
        );
    }

    fn outline(&self, origin: Point) -> BezPath {
        Rect::new(
            -origin.x,
            -origin.y,
            self.width - origin.x,
            self.height - origin.y,
        )
        .to_path(PATH_TOLERANCE)
    }
}

/// An axis-aligned ellipse centered on `0, 0` before origin.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ellipse {
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
}

impl Ellipse {
    /// Creates an ellipse.
    #[must_use]
    pub const fn new(radius_x: f64, radius_y: f64) -> Self {
        Self { radius_x, radius_y }
    }
}

impl ShapeGeometry for Ellipse {
    fn calculate_origin(&self, axis: Axis, origin: Origin) -> f64 {
        match (axis, origin) {
            (_, Origin::Offset(offset)) => offset,
            (_, Origin::Center) => 0.0,
            (Axis::X, Origin::Left) => -self.radius_x,
            (Axis::X, Origin::Right) => self.radius_x,
            (Axis::Y, Origin::Top) => -self.radius_y,
            (Axis::Y, Origin::Bottom) => self.radius_y,
            _ => 0.0,
        }
    }

    /// Cardinal extents: top, right, bottom, left.
    fn local_vertices(&self, origin: Point, half_stroke: f64, out: &mut Vec<Point>) {
        let rx = self.radius_x + half_stroke;
        let ry = self.radius_y + half_stroke;
        let (cx, cy) = (-origin.x, -origin.y);
        out.clear();
        out.extend([
            Point::new(cx, cy - ry),
            Point::new(cx + rx, cy),
            Point::new(cx, cy + ry),
            Point::new(cx - rx, cy),
        ]);
    }

    fn size_matrix(&self, origin: Point, half_stroke: f64) -> Matrix {
        Matrix::translation(-origin.x, -origin.y)
            * Matrix::scaling(self.radius_x + half_stroke, self.radius_y + half_stroke)
    }

    /// Exact bounding box of the mapped unit circle, as TL, TR, BR, BL.
    ///
    /// The image of the unit circle under `[a b tx; c d ty]` reaches
    /// `tx ± sqrt(a² + b²)` horizontally and `ty ± sqrt(c² + d²)` vertically.
    fn vertices_through(&self, matrix: &Matrix, out: &mut Vec<Point>) {
        let [a, b, tx, c, d, ty, ..] = matrix.to_array();
        let half_x = (a * a + b * b).sqrt();
        let half_y = (c * c + d * d).sqrt();
        out.clear();
        out.extend([
            Point::new(tx - half_x, ty - half_y),
            Point::new(tx + half_x, ty - half_y),
            Point::new(tx + half_x, ty + half_y),
            Point::new(tx - half_x, ty + half_y),
        ]);
    }

    fn outline(&self, origin: Point) -> BezPath {
        kurbo::Ellipse::new(
            Point::new(-origin.x, -origin.y),
            (self.radius_x, self.radius_y),
            0.0,
        )
        .to_path(PATH_TOLERANCE)
    }
}

/// The drawable variant of a node.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Shape {
    /// Not drawable; only contributes its transform to descendants.
    #[default]
    None,
    /// A rectangle.
    Rectangle(Rectangle),
    /// An ellipse.
    Ellipse(Ellipse),
}

impl Shape {
    /// Shorthand for a rectangle shape.
    #[must_use]
    pub const fn rectangle(width: f64, height: f64) -> Self {
        Self::Rectangle(Rectangle::new(width, height))
    }

    /// Shorthand for an ellipse shape.
    #[must_use]
    pub const fn ellipse(radius_x: f64, radius_y: f64) -> Self {
        Self::Ellipse(Ellipse::new(radius_x, radius_y))
    }

    /// The geometry of this shape, or `None` for [`Shape::None`].
    #[must_use]
    pub fn geometry(&self) -> Option<&dyn ShapeGeometry> {
        match self {
            Self::None => None,
            Self::Rectangle(rectangle) => Some(rectangle),
            Self::Ellipse(ellipse) => Some(ellipse),
        }
    }
}
