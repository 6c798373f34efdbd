//! Directed connections and the geometry of the curves drawn for them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FlowCanvasError, geometry::Point, graph::node::NodeId, model::ConnectionModel};

/// Unique identifier for a connection.
pub type ConnectionId = String;

/// A directed edge from `source`'s output to `target`'s input.
///
/// Holds no geometry: endpoints are recomputed from the current node positions
/// on every render pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: NodeId,
    pub target: NodeId,
}

impl From<ConnectionModel> for Connection {
    fn from(model: ConnectionModel) -> Self {
        Self {
            id: model.id,
            source: model.source,
            target: model.target,
        }
    }
}

impl From<&Connection> for ConnectionModel {
    fn from(conn: &Connection) -> Self {
        Self {
            id: conn.id.clone(),
            source: conn.source.clone(),
            target: conn.target.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndpointKind {
    Input,
    Output,
}

/// One clickable connection point on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node_id: NodeId,
    pub kind: EndpointKind,
}

impl Endpoint {
    pub fn new(
        node_id: impl Into<NodeId>,
        is_output: bool,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            kind: if is_output {
                EndpointKind::Output
            } else {
                EndpointKind::Input
            },
        }
    }

    pub fn output(node_id: impl Into<NodeId>) -> Self {
        Self::new(node_id, true)
    }

    pub fn input(node_id: impl Into<NodeId>) -> Self {
        Self::new(node_id, false)
    }

    pub fn is_output(&self) -> bool {
        self.kind == EndpointKind::Output
    }
}

/// Why a pair of endpoints cannot be wired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectRejection {
    SelfLoop,
    SameKind(EndpointKind),
    Duplicate {
        source: NodeId,
        target: NodeId,
    },
    MissingNode(NodeId),
}

impl fmt::Display for ConnectRejection {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConnectRejection::SelfLoop => write!(f, "a node cannot connect to itself"),
            ConnectRejection::SameKind(kind) => write!(f, "cannot connect {} to {}", kind.as_ref(), kind.as_ref()),
            ConnectRejection::Duplicate {
                source,
                target,
            } => write!(f, "connection {} -> {} already exists", source, target),
            ConnectRejection::MissingNode(id) => write!(f, "node {} not found", id),
        }
    }
}

impl From<ConnectRejection> for FlowCanvasError {
    fn from(rejection: ConnectRejection) -> Self {
        FlowCanvasError::Connection(rejection.to_string())
    }
}

/// Resolve `(source, target)`: whichever endpoint is the output is the source.
pub fn resolve_direction(
    start: &Endpoint,
    end: &Endpoint,
) -> (NodeId, NodeId) {
    if start.is_output() {
        (start.node_id.clone(), end.node_id.clone())
    } else {
        (end.node_id.clone(), start.node_id.clone())
    }
}

/// Cubic curve from a source's right-center to a target's left-center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePath {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl CurvePath {
    /// Both control points sit half the horizontal distance in from their endpoint,
    /// which flattens to a straight segment as the endpoints line up vertically.
    pub fn between(
        start: Point,
        end: Point,
    ) -> Self {
        let offset = Self::control_offset(start, end);
        Self {
            start,
            control1: Point::new(start.x + offset, start.y),
            control2: Point::new(end.x - offset, end.y),
            end,
        }
    }

    pub fn control_offset(
        start: Point,
        end: Point,
    ) -> f64 {
        (end.x - start.x).abs() * 0.5
    }

    /// SVG path data, `M sx sy C c1x c1y, c2x c2y, ex ey`.
    pub fn to_svg(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x, self.start.y, self.control1.x, self.control1.y, self.control2.x, self.control2.y, self.end.x, self.end.y
        )
    }

    /// Point on the curve at parameter `t` in `[0, 1]`.
    pub fn point_at(
        &self,
        t: f64,
    ) -> Point {
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }
}

/// A connection's curve, recomputed every render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPath {
    pub id: ConnectionId,
    pub source: NodeId,
    pub target: NodeId,
    pub curve: CurvePath,
}
