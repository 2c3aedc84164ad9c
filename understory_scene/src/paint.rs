// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing-surface boundary.

use kurbo::{Affine, BezPath};

use crate::Stroke;

/// Receives resolved geometry from [`Scene::paint`](crate::Scene::paint).
///
/// Transforms are already in device pixels of the painted canvas; a painter
/// never needs to know about the scene hierarchy.
pub trait Painter {
    /// Draws `path`, given in the node's local frame, under `transform`.
    ///
    /// `stroke` is `None` when the node has no visible stroke.
    fn draw_path(&mut self, transform: Affine, path: &BezPath, stroke: Option<&Stroke>);
}
