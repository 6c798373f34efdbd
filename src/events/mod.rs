//! Events broadcast by the editor.
//!
//! Graph mutations, viewport changes, selection changes and user-facing
//! notifications all travel over one [`Channel`] so the host and the layout
//! sync monitor can react without the components knowing about each other.

mod channel;
mod notification;

pub use channel::{Channel, EventHandle, NotificationHandle};
pub use notification::{Notification, NotificationLevel};

use crate::{
    geometry::Point,
    graph::{ConnectionId, NodeId},
};

/// Snapshot of the transform carried by [`EditorEvent::ViewportChanged`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportEvent {
    pub offset: Point,
    pub scale: f64,
    /// false while an animation is still interpolating
    pub settled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    NodeCreated(NodeId),
    NodeUpdated(NodeId),
    NodeDeleted {
        id: NodeId,
        connections: Vec<ConnectionId>,
    },
    ConnectionCreated(ConnectionId),
    ConnectionDeleted(ConnectionId),
    GraphCleared,
    WorkflowLoaded {
        nodes: usize,
        connections: usize,
    },
    /// The `{nodes, connections}` pair was written to the local cache.
    GraphPersisted,
    SelectionChanged(Option<NodeId>),
    /// Whether the empty-canvas guide should be shown.
    CanvasGuide(bool),
    ViewportChanged(ViewportEvent),
    /// Panel visibility or workflow name changed.
    PanelChanged,
    Notification(Notification),
}

impl EditorEvent {
    /// Events after which the server layout record is pushed.
    pub fn affects_layout(&self) -> bool {
        match self {
            EditorEvent::GraphPersisted | EditorEvent::PanelChanged => true,
            EditorEvent::ViewportChanged(v) => v.settled,
            _ => false,
        }
    }
}
