use crate::graph::Node;

/// Property-inspector collaborator notified on selection changes.
///
/// The inspector renders and validates a node's configuration form. It reads
/// nodes and writes back through the graph model; it never owns topology.
pub trait Inspector: Send + Sync {
    fn show_node(
        &self,
        node: &Node,
    );

    fn hide_node(&self);
}
