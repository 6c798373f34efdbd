//! Workflow graph: nodes, connections, the connection-draw state machine and
//! the model that owns them.

mod confirm;
mod connection;
mod draw;
mod inspector;
mod model;
mod node;
mod render;
mod topology;

pub use confirm::Confirmation;
pub use connection::{ConnectRejection, Connection, ConnectionId, ConnectionPath, CurvePath, Endpoint, EndpointKind, resolve_direction};
pub use draw::{ConnectionDraw, DrawOutcome};
pub use inspector::Inspector;
pub use model::GraphModel;
pub use node::{Node, NodeId, NodeStatus};
pub use render::{RenderFrame, RenderNode, Transform};
pub use topology::Graph;
