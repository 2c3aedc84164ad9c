// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference frames for [`Scene::vertices_relative_to`](crate::Scene::vertices_relative_to).

use crate::{CameraId, CanvasId, NodeId};

/// A coordinate frame in which node geometry can be expressed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    /// The local frame of a node, normally an ancestor.
    ///
    /// Every node strictly between the queried node and this one contributes
    /// its local transform. If the reference is not an ancestor, the walk
    /// runs up to the root and the result is in scene coordinates.
    Node(NodeId),
    /// Camera pixels: scene coordinates seen through the camera's view.
    Camera(CameraId),
    /// Device pixels of a canvas: camera pixels fitted to the canvas.
    Canvas(CanvasId),
}

impl From<NodeId> for Reference {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<CameraId> for Reference {
    fn from(id: CameraId) -> Self {
        Self::Camera(id)
    }
}

impl From<CanvasId> for Reference {
    fn from(id: CanvasId) -> Self {
        Self::Canvas(id)
    }
}
