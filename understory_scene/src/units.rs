// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache units of nodes and cameras.
//!
//! Node caches use the units up to [`VERTICES_REFERENCE`]; camera caches
//! share the transform units and add [`REVERSE_TRANSLATION`], [`VIEW`] and
//! [`SIZE`]. Use these with [`Node::is_cached`](crate::Node::is_cached) and
//! [`Camera::is_cached`](crate::Camera::is_cached) to observe invalidation.

use alloc::vec::Vec;

use kurbo::Point;
use understory_cache::{Cache, Unit};

use crate::{CameraId, CanvasId, Matrix, Reference};

/// Translation matrix built from `x`/`y`.
pub const TRANSLATION: Unit = Unit::new(0, "translation");
/// Rotation matrix built from `rotation`.
pub const ROTATION: Unit = Unit::new(1, "rotation");
/// Scaling matrix built from the scale factors (or the camera zoom).
pub const SCALING: Unit = Unit::new(2, "scaling");
/// Local `translation · rotation · scaling`.
pub const TRANSFORMATIONS: Unit = Unit::new(3, "transformations");
/// Local transform composed with every ancestor and the view.
pub const GLOBAL_TRANSFORMATIONS: Unit = Unit::new(4, "globalTransformations");
/// Last requested point for [`Scene::global_point`](crate::Scene::global_point).
pub const POINT: Unit = Unit::new(5, "point");
/// Last result of [`Scene::global_point`](crate::Scene::global_point).
pub const GLOBAL_POINT: Unit = Unit::new(6, "globalPoint");
/// Shape parameters: size, origin and stroke.
pub const SHAPE: Unit = Unit::new(7, "shape");
/// Shape-local vertices.
pub const VERTICES: Unit = Unit::new(8, "vertices");
/// Vertices in global coordinates.
pub const GLOBAL_VERTICES: Unit = Unit::new(9, "globalVertices");
/// Global vertices of the node and its whole subtree.
pub const TREE_VERTICES: Unit = Unit::new(10, "treeVertices");
/// Vertices relative to the last requested reference frame.
pub const VERTICES_REFERENCE: Unit = Unit::new(11, "vertices-reference");

/// Camera translation by `(-x, -y)`.
pub const REVERSE_TRANSLATION: Unit = Unit::new(12, "reverseTranslation");
/// Camera world-to-pixel matrix.
pub const VIEW: Unit = Unit::new(13, "view");
/// Camera width and height.
pub const SIZE: Unit = Unit::new(14, "size");

/// What a view-dependent payload was computed against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ViewStamp {
    pub(crate) canvas: Option<(CanvasId, u64)>,
    pub(crate) camera: Option<(CameraId, u64)>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Payload {
    pub(crate) matrix: Matrix,
    pub(crate) vertices: Vec<Point>,
    pub(crate) point: Point,
    pub(crate) reference: Option<Reference>,
    pub(crate) view: Option<ViewStamp>,
}

pub(crate) fn node_cache() -> Cache<Payload> {
    let mut cache = Cache::new();
    cache
        .declare(TRANSLATION, &[])
        .declare(ROTATION, &[])
        .declare(SCALING, &[])
        .declare(TRANSFORMATIONS, &[TRANSLATION, ROTATION, SCALING])
        .declare(GLOBAL_TRANSFORMATIONS, &[TRANSFORMATIONS])
        .declare(POINT, &[])
        .declare(
            GLOBAL_POINT,
            &[POINT, TRANSLATION, ROTATION, SCALING, GLOBAL_TRANSFORMATIONS],
        )
        .declare(SHAPE, &[])
        .declare(VERTICES, &[SHAPE])
        .declare(GLOBAL_VERTICES, &[VERTICES, GLOBAL_TRANSFORMATIONS])
        .declare(TREE_VERTICES, &[GLOBAL_VERTICES])
        .declare(VERTICES_REFERENCE, &[SHAPE, GLOBAL_TRANSFORMATIONS]);
    cache
}

pub(crate) fn camera_cache() -> Cache<Payload> {
    let mut cache = Cache::new();
    cache
        .declare(TRANSLATION, &[])
        .declare(ROTATION, &[])
        .declare(SCALING, &[])
        .declare(SIZE, &[])
        .declare(TRANSFORMATIONS, &[TRANSLATION, ROTATION, SCALING])
        .declare(REVERSE_TRANSLATION, &[TRANSLATION])
        .declare(VIEW, &[TRANSFORMATIONS, REVERSE_TRANSLATION, SIZE])
        .declare(VERTICES, &[SIZE]);
    cache
}

/// Returns a view-dependent payload only if it is valid and was computed
/// against `stamp`.
pub(crate) fn fresh_for(cache: &Cache<Payload>, unit: Unit, stamp: ViewStamp) -> Option<&Payload> {
    cache
        .fresh(unit)
        .filter(|payload| payload.view == Some(stamp))
}

/// Rebuilds whichever of translation, rotation, scaling and their product are
/// stale, and returns the local transform.
pub(crate) fn local_matrix(
    cache: &mut Cache<Payload>,
    x: f64,
    y: f64,
    rotation: f64,
    scaling_x: f64,
    scaling_y: f64,
) -> &Matrix {
    if !cache.test(TRANSFORMATIONS) {
        if !cache.test(TRANSLATION) {
            cache.get(TRANSLATION).matrix = Matrix::translation(x, y);
            cache.update(TRANSLATION);
        }
        if !cache.test(ROTATION) {
            cache.get(ROTATION).matrix = Matrix::rotation(rotation);
            cache.update(ROTATION);
        }
        if !cache.test(SCALING) {
            cache.get(SCALING).matrix = Matrix::scaling(scaling_x, scaling_y);
            cache.update(SCALING);
        }
        let t = cache.get(TRANSLATION).matrix;
        let r = cache.get(ROTATION).matrix;
        let s = cache.get(SCALING).matrix;
        cache
            .get(TRANSFORMATIONS)
            .matrix
            .set_identity_data()
            .multiply(&[&t, &r, &s]);
        cache.update(TRANSFORMATIONS);
        tracing::trace!(x, y, rotation, scaling_x, scaling_y, "recomputed local transform");
    }
    &cache.get(TRANSFORMATIONS).matrix
}
