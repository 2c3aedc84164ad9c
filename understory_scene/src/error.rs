// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene errors.

use crate::{CameraId, CanvasId, NodeId};

/// Errors reported by [`Scene`](crate::Scene) operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// A global computation went through a canvas with no live camera.
    #[error("canvas {0:?} has no camera")]
    MissingCamera(CanvasId),
    /// Shape-specific data was requested from a node without a shape.
    #[error("node {0:?} has no shape")]
    NeedsShape(NodeId),
    /// The node handle is stale or was never issued by this scene.
    #[error("node {0:?} is not in the scene")]
    InvalidNode(NodeId),
    /// The camera handle is stale or was never issued by this scene.
    #[error("camera {0:?} is not in the scene")]
    InvalidCamera(CameraId),
    /// The canvas handle is stale or was never issued by this scene.
    #[error("canvas {0:?} is not in the scene")]
    InvalidCanvas(CanvasId),
    /// Attaching `child` below `parent` would make a node its own ancestor.
    #[error("attaching {child:?} below {parent:?} would create a cycle")]
    Cycle {
        /// The would-be parent.
        parent: NodeId,
        /// The would-be child, an ancestor of (or equal to) `parent`.
        child: NodeId,
    },
}
