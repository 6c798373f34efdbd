//! Render snapshot handed to the host after every change.

use crate::{
    geometry::{Point, Rect},
    graph::{
        connection::{ConnectionPath, Endpoint},
        node::{NodeId, NodeStatus},
    },
};

/// Viewport transform applied to the canvas layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub offset: Point,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: Point::ORIGIN,
            scale: 1.0,
        }
    }
}

impl Transform {
    /// `translate(Xpx, Ypx) scale(S)`
    pub fn to_css(&self) -> String {
        format!("translate({}px, {}px) scale({})", self.offset.x, self.offset.y, self.scale)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub id: NodeId,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub status: NodeStatus,
    /// canvas-space box
    pub bounds: Rect,
    pub selected: bool,
}

/// Everything the host needs to paint one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub transform: Transform,
    pub nodes: Vec<RenderNode>,
    pub connections: Vec<ConnectionPath>,
    pub selected: Option<NodeId>,
    /// empty-canvas guide visibility
    pub show_guide: bool,
    /// endpoint a connection is being drawn from
    pub pending: Option<Endpoint>,
}
