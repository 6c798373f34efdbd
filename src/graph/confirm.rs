//! Destructive actions as an explicit request → confirm transition.

use crate::graph::{connection::ConnectionId, node::NodeId};

/// A destructive action awaiting the user's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    DeleteNode(NodeId),
    DeleteConnection(ConnectionId),
    ClearCanvas {
        nodes: usize,
    },
    DeleteWorkflow(String),
}

impl Confirmation {
    /// Question to put in front of the user.
    pub fn prompt(&self) -> String {
        match self {
            Confirmation::DeleteNode(_) => "Are you sure you want to delete this node?".to_string(),
            Confirmation::DeleteConnection(_) => "Delete this connection?".to_string(),
            Confirmation::ClearCanvas {
                nodes,
            } => format!("Are you sure you want to clear the entire canvas? This will remove all {} nodes and their connections.", nodes),
            Confirmation::DeleteWorkflow(name) => format!("Are you sure you want to delete the workflow \"{}\"?", name),
        }
    }
}
