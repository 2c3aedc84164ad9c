// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scene: a retained 2D scene graph with cached transforms.
//!
//! This crate keeps a tree of positioned, rotated and scaled nodes, observed
//! through cameras and fitted onto canvases. It focuses on the coordinate
//! engine underneath rendering and hit testing:
//! - Local `translation · rotation · scaling` matrices per node.
//! - Global matrices composed through every ancestor, the camera view and the
//!   canvas fit.
//! - Vertex sets: shape-local, global, per subtree, and relative to an
//!   arbitrary ancestor, camera or canvas.
//! - Incremental recomputation: every node owns an
//!   [`understory_cache::Cache`]; mutators invalidate, queries recompute only
//!   what is stale.
//!
//! It does **not** rasterize. [`Scene::paint`] hands resolved device-pixel
//! transforms and outlines to a [`Painter`] supplied by the caller.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Point;
//! use understory_scene::{Camera, Canvas, NodeProps, Scene, Shape};
//!
//! let mut scene = Scene::new();
//! let camera = scene.insert_camera(Camera::new());
//! let canvas = scene.insert_canvas(Canvas::new(300.0, 150.0).with_camera(camera));
//!
//! let node = scene.create(
//!     Shape::rectangle(20.0, 10.0),
//!     NodeProps {
//!         x: Some(10.0),
//!         rotation: Some(90.0),
//!         scaling_x: Some(2.0),
//!         ..NodeProps::default()
//!     },
//! );
//!
//! // Scale, then rotate, then translate: (1, 0) -> (2, 0) -> (0, 2) -> (10, 2).
//! let local = scene.transformation_matrix(node)?.transform_point(Point::new(1.0, 0.0));
//! assert!((local - Point::new(10.0, 2.0)).hypot() < 1e-9);
//!
//! // The default camera maps scene coordinates 1:1 onto a 300×150 canvas.
//! let global = scene.global_point(node, Point::new(1.0, 0.0), canvas)?;
//! assert!((global - local).hypot() < 1e-9);
//!
//! // Moving the node invalidates everything derived from its translation.
//! scene.node_mut(node).unwrap().set_x(20.0);
//! let moved = scene.global_point(node, Point::new(1.0, 0.0), canvas)?;
//! assert!((moved - Point::new(20.0, 2.0)).hypot() < 1e-9);
//! # Ok::<(), understory_scene::SceneError>(())
//! ```
//!
//! ## Reference frames
//!
//! [`Scene::vertices_relative_to`] expresses a node's bounds in the frame of
//! an ancestor ([`Reference::Node`]), in camera pixels
//! ([`Reference::Camera`]) or in device pixels ([`Reference::Canvas`]).
//! Ellipses report the exact bounding box of the transformed ellipse.
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std`.
//! - `libm`: forwards to `kurbo/libm` for `no_std` builds.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod camera;
mod canvas;
mod error;
mod id;
mod matrix;
mod node;
mod paint;
mod reference;
mod registry;
mod scene;
mod shape;
pub mod units;

pub use camera::{Camera, CameraProps};
pub use canvas::{Canvas, FitTransform, ViewMode, fit_transform};
pub use error::SceneError;
pub use id::{CameraId, CanvasId, NodeId};
pub use matrix::Matrix;
pub use node::{Node, NodeMut, NodeProps};
pub use paint::Painter;
pub use reference::Reference;
pub use registry::Registry;
pub use scene::Scene;
pub use shape::{Axis, Ellipse, Origin, Rectangle, Shape, ShapeGeometry, Stroke};
