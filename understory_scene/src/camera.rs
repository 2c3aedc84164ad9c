// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The viewpoint at the root of every global transform chain.

use kurbo::Point;
use understory_cache::{Cache, Unit};

use crate::Matrix;
use crate::units::{
    self, Payload, REVERSE_TRANSLATION, ROTATION, SCALING, SIZE, TRANSLATION, VERTICES, VIEW,
};

/// Construction-time camera properties.
///
/// Unset fields keep the defaults of [`Camera::new`]. When applied,
/// `aspect_ratio` goes first, then `width`, then `height`, then the rest, so
/// the coupled setters never see a half-applied size.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CameraProps {
    /// Center x in scene coordinates.
    pub x: Option<f64>,
    /// Center y in scene coordinates.
    pub y: Option<f64>,
    /// Rotation in degrees, clockwise.
    pub rotation: Option<f64>,
    /// Zoom factor.
    pub zoom: Option<f64>,
    /// Width in camera pixels.
    pub width: Option<f64>,
    /// Height in camera pixels.
    pub height: Option<f64>,
    /// Width over height.
    pub aspect_ratio: Option<f64>,
}

/// A camera: a `width × height` pixel window centered on `(x, y)`.
///
/// # Coupled size
///
/// `width`, `height` and `aspect_ratio` are linked:
/// - [`set_width`](Self::set_width) recomputes the aspect ratio from the
///   height and moves `x` by half the change, keeping the top-left corner in
///   place.
/// - [`set_height`](Self::set_height) does the same vertically.
/// - [`set_aspect_ratio`](Self::set_aspect_ratio) derives the width from
///   `height * aspect_ratio`.
///
/// While the height is `0` the aspect ratio keeps its last value.
///
/// Zoom is used as-is in the transform matrix, negative values included;
/// painting clamps it to `0`.
#[derive(Clone, Debug)]
pub struct Camera {
    x: f64,
    y: f64,
    rotation: f64,
    zoom: f64,
    width: f64,
    height: f64,
    aspect_ratio: f64,
    cache: Cache<Payload>,
    generation: u64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Creates a 300×150 camera looking at the center of that rectangle.
    ///
    /// With the default camera, scene coordinates and camera pixels coincide.
    #[must_use]
    pub fn new() -> Self {
        Self {
            x: 150.0,
            y: 75.0,
            rotation: 0.0,
            zoom: 1.0,
            width: 300.0,
            height: 150.0,
            aspect_ratio: 2.0,
            cache: units::camera_cache(),
            generation: 0,
        }
    }

    /// Creates a camera and applies `props` through the normal setters.
    #[must_use]
    pub fn with_props(props: CameraProps) -> Self {
        let mut camera = Self::new();
        camera.apply(props);
        camera
    }

    /// Applies every set field of `props`.
    pub fn apply(&mut self, props: CameraProps) -> &mut Self {
        if let Some(aspect_ratio) = props.aspect_ratio {
            self.set_aspect_ratio(aspect_ratio);
        }
        if let Some(width) = props.width {
            self.set_width(width);
        }
        if let Some(height) = props.height {
            self.set_height(height);
        }
        if let Some(x) = props.x {
            self.set_x(x);
        }
        if let Some(y) = props.y {
            self.set_y(y);
        }
        if let Some(rotation) = props.rotation {
            self.set_rotation(rotation);
        }
        if let Some(zoom) = props.zoom {
            self.set_zoom(zoom);
        }
        self
    }

    /// Center x.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Center y.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Rotation in degrees.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Zoom factor, unclamped.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Width in camera pixels.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height in camera pixels.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Width over height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Counter bumped by every mutation.
    ///
    /// Node payloads computed through this camera remember it and recompute
    /// once it moves on.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if `unit` currently holds a valid payload.
    #[must_use]
    pub fn is_cached(&self, unit: Unit) -> bool {
        self.cache.test(unit)
    }

    /// Sets the center x. Invalidates `translation`.
    pub fn set_x(&mut self, x: f64) -> &mut Self {
        self.x = x;
        self.touch(TRANSLATION)
    }

    /// Sets the center y. Invalidates `translation`.
    pub fn set_y(&mut self, y: f64) -> &mut Self {
        self.y = y;
        self.touch(TRANSLATION)
    }

    /// Sets the rotation in degrees. Invalidates `rotation`.
    pub fn set_rotation(&mut self, rotation: f64) -> &mut Self {
        self.rotation = rotation;
        self.touch(ROTATION)
    }

    /// Sets the zoom factor. Invalidates `scaling`.
    pub fn set_zoom(&mut self, zoom: f64) -> &mut Self {
        self.zoom = zoom;
        self.touch(SCALING)
    }

    /// Sets the width, keeping the left edge in place.
    ///
    /// Invalidates `size` and `translation`.
    pub fn set_width(&mut self, width: f64) -> &mut Self {
        let delta = width - self.width;
        self.width = width;
        self.x += delta / 2.0;
        if self.height != 0.0 {
            self.aspect_ratio = self.width / self.height;
        }
        self.touch(SIZE).touch(TRANSLATION)
    }

    /// Sets the height, keeping the top edge in place.
    ///
    /// Invalidates `size` and `translation`.
    pub fn set_height(&mut self, height: f64) -> &mut Self {
        let delta = height - self.height;
        self.height = height;
        self.y += delta / 2.0;
        if self.height != 0.0 {
            self.aspect_ratio = self.width / self.height;
        }
        self.touch(SIZE).touch(TRANSLATION)
    }

    /// Sets the aspect ratio and derives the width from the height.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f64) -> &mut Self {
        self.aspect_ratio = aspect_ratio;
        self.set_width(self.height * aspect_ratio)
    }

    /// `translation · rotation · scaling` from position, rotation and zoom.
    pub fn transformation_matrix(&mut self) -> &Matrix {
        units::local_matrix(
            &mut self.cache,
            self.x,
            self.y,
            self.rotation,
            self.zoom,
            self.zoom,
        )
    }

    /// Translation by `(-x, -y)`.
    pub fn reverse_translation_matrix(&mut self) -> &Matrix {
        if !self.cache.test(REVERSE_TRANSLATION) {
            self.cache.get(REVERSE_TRANSLATION).matrix = Matrix::translation(-self.x, -self.y);
            self.cache.update(REVERSE_TRANSLATION);
        }
        &self.cache.get(REVERSE_TRANSLATION).matrix
    }

    /// Maps scene coordinates to camera pixels.
    ///
    /// The world is zoomed and rotated about `(x, y)`, which then lands in the
    /// middle of the `width × height` pixel window.
    pub fn view_matrix(&mut self) -> &Matrix {
        if !self.cache.test(VIEW) {
            let transformations = *self.transformation_matrix();
            let reverse = *self.reverse_translation_matrix();
            let center = Matrix::translation(self.width / 2.0 - self.x, self.height / 2.0 - self.y);
            self.cache
                .get(VIEW)
                .matrix
                .multiply(&[&center, &transformations, &reverse]);
            self.cache.update(SIZE);
            self.cache.update(VIEW);
            tracing::trace!(x = self.x, y = self.y, zoom = self.zoom, "recomputed camera view");
        }
        &self.cache.get(VIEW).matrix
    }

    /// Corners of the camera rectangle around its own center, ignoring zoom:
    /// top-left, top-right, bottom-right, bottom-left.
    pub fn vertices(&mut self) -> &[Point] {
        if !self.cache.test(VERTICES) {
            let (hw, hh) = (self.width / 2.0, self.height / 2.0);
            let vertices = &mut self.cache.get(VERTICES).vertices;
            vertices.clear();
            vertices.extend([
                Point::new(-hw, -hh),
                Point::new(hw, -hh),
                Point::new(hw, hh),
                Point::new(-hw, hh),
            ]);
            self.cache.update(SIZE);
            self.cache.update(VERTICES);
        }
        &self.cache.get(VERTICES).vertices
    }

    fn touch(&mut self, unit: Unit) -> &mut Self {
        self.cache.invalidate(unit);
        self.generation += 1;
        self
    }
}
