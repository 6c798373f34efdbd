//! Node/connection store backed by a directed graph.
//!
//! Uses petgraph's `StableDiGraph` so indices survive removals, with id maps on
//! the side for lookups by node or connection id.

use std::collections::HashMap;

use petgraph::{
    Direction,
    stable_graph::{EdgeIndex, NodeIndex, StableDiGraph},
    visit::EdgeRef,
};
use tracing::warn;

use crate::{
    FlowCanvasError, Result,
    geometry::Size,
    graph::{
        connection::{ConnectRejection, Connection, ConnectionId, Endpoint, resolve_direction},
        node::{Node, NodeId},
    },
    model::{ConnectionModel, WorkflowDocument},
    utils,
};

const NODE_ID_PREFIX: &str = "node_";
const CONNECTION_ID_PREFIX: &str = "conn_";

/// The workflow graph: nodes, directed connections and the id counters.
///
/// Invariants kept by every method:
/// - node and connection ids are unique
/// - every connection references two existing, distinct nodes
/// - at most one connection per ordered `(source, target)` pair
#[derive(Debug, Clone)]
pub struct Graph {
    graph: StableDiGraph<Node, Connection>,
    nodes: HashMap<NodeId, NodeIndex>,
    connections: HashMap<ConnectionId, EdgeIndex>,
    next_node_id: u64,
    next_connection_id: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            nodes: HashMap::new(),
            connections: HashMap::new(),
            next_node_id: 1,
            next_connection_id: 1,
        }
    }

    /// Build a graph from a document.
    ///
    /// Duplicate node ids reject the whole document. Connections that would break
    /// an invariant (dangling, self-loop, duplicate pair or id) are dropped and
    /// reported in the returned list.
    pub fn from_document(
        doc: &WorkflowDocument,
        node_size: Size,
    ) -> Result<(Self, Vec<String>)> {
        let mut graph = Graph::new();
        let mut dropped = Vec::new();

        for model in doc.nodes.iter() {
            graph.add_node(Node::from_model(model.clone(), node_size))?;
        }

        for model in doc.connections.iter() {
            if let Err(reason) = graph.insert_loaded_connection(model) {
                warn!("dropping connection {}: {}", model.id, reason);
                dropped.push(model.id.clone());
            }
        }

        graph.next_node_id = utils::next_counter(graph.nodes.keys().map(String::as_str));
        graph.next_connection_id = utils::next_counter(graph.connections.keys().map(String::as_str));

        Ok((graph, dropped))
    }

    fn insert_loaded_connection(
        &mut self,
        model: &ConnectionModel,
    ) -> std::result::Result<(), String> {
        if self.connections.contains_key(&model.id) {
            return Err("duplicate connection id".to_string());
        }
        self.check_connection(&Endpoint::output(model.source.clone()), &Endpoint::input(model.target.clone())).map_err(|r| r.to_string())?;
        self.insert_connection(Connection::from(model.clone()));
        Ok(())
    }

    /// Serialize to the `{nodes, connections}` pair; name and meta are left to the caller.
    pub fn to_document(&self) -> WorkflowDocument {
        WorkflowDocument {
            nodes: self.nodes().map(Node::to_model).collect(),
            connections: self.connections().map(ConnectionModel::from).collect(),
            ..Default::default()
        }
    }

    /// Allocate a fresh `node_<n>` id.
    pub fn allocate_node_id(&mut self) -> NodeId {
        loop {
            let id = format!("{}{}", NODE_ID_PREFIX, self.next_node_id);
            self.next_node_id = self.next_node_id.wrapping_add(1);
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    /// Allocate a fresh `conn_<n>` id.
    pub fn allocate_connection_id(&mut self) -> ConnectionId {
        loop {
            let id = format!("{}{}", CONNECTION_ID_PREFIX, self.next_connection_id);
            self.next_connection_id = self.next_connection_id.wrapping_add(1);
            if !self.connections.contains_key(&id) {
                return id;
            }
        }
    }

    /// The value the next `allocate_node_id` will start from.
    pub fn node_counter(&self) -> u64 {
        self.next_node_id
    }

    /// add node to graph
    pub fn add_node(
        &mut self,
        node: Node,
    ) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(FlowCanvasError::Workflow(format!("duplicate node id {}", node.id)));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.nodes.insert(id, idx);
        Ok(())
    }

    /// Remove a node together with every connection touching it.
    pub fn remove_node(
        &mut self,
        id: &NodeId,
    ) -> Option<(Node, Vec<Connection>)> {
        let idx = self.nodes.remove(id)?;

        let incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect();

        let mut removed = Vec::with_capacity(incident.len());
        for edge in incident {
            if let Some(conn) = self.graph.remove_edge(edge) {
                self.connections.remove(&conn.id);
                removed.push(conn);
            }
        }

        let node = self.graph.remove_node(idx)?;
        Some((node, removed))
    }

    /// get node by id
    pub fn node(
        &self,
        id: &str,
    ) -> Option<&Node> {
        self.nodes.get(id).and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn node_mut(
        &mut self,
        id: &str,
    ) -> Option<&mut Node> {
        let idx = *self.nodes.get(id)?;
        self.graph.node_weight_mut(idx)
    }

    pub fn contains_node(
        &self,
        id: &str,
    ) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in index order; slots freed by removal are reused.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().filter_map(|idx| self.graph.node_weight(idx))
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.graph.node_weights_mut()
    }

    /// get connection by id
    pub fn connection(
        &self,
        id: &str,
    ) -> Option<&Connection> {
        self.connections.get(id).and_then(|idx| self.graph.edge_weight(*idx))
    }

    /// All connections in index order; slots freed by removal are reused.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.graph.edge_indices().filter_map(|idx| self.graph.edge_weight(idx))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Check whether `start` and `end` may be wired, resolving the direction.
    pub fn check_connection(
        &self,
        start: &Endpoint,
        end: &Endpoint,
    ) -> std::result::Result<(NodeId, NodeId), ConnectRejection> {
        if start.node_id == end.node_id {
            return Err(ConnectRejection::SelfLoop);
        }
        if start.kind == end.kind {
            return Err(ConnectRejection::SameKind(start.kind));
        }

        let (source, target) = resolve_direction(start, end);
        let source_idx = *self.nodes.get(&source).ok_or_else(|| ConnectRejection::MissingNode(source.clone()))?;
        let target_idx = *self.nodes.get(&target).ok_or_else(|| ConnectRejection::MissingNode(target.clone()))?;

        if self.graph.find_edge(source_idx, target_idx).is_some() {
            return Err(ConnectRejection::Duplicate {
                source,
                target,
            });
        }
        Ok((source, target))
    }

    /// Wire `start` and `end` under a fresh id.
    pub fn add_connection(
        &mut self,
        start: &Endpoint,
        end: &Endpoint,
    ) -> std::result::Result<ConnectionId, ConnectRejection> {
        let (source, target) = self.check_connection(start, end)?;
        let id = self.allocate_connection_id();
        self.insert_connection(Connection {
            id: id.clone(),
            source,
            target,
        });
        Ok(id)
    }

    fn insert_connection(
        &mut self,
        conn: Connection,
    ) {
        let (Some(source), Some(target)) = (self.nodes.get(&conn.source).copied(), self.nodes.get(&conn.target).copied()) else {
            return;
        };
        let id = conn.id.clone();
        let idx = self.graph.add_edge(source, target, conn);
        self.connections.insert(id, idx);
    }

    pub fn remove_connection(
        &mut self,
        id: &str,
    ) -> Option<Connection> {
        let idx = self.connections.remove(id)?;
        self.graph.remove_edge(idx)
    }

    /// Drop every node and connection. Counters keep running, so freed ids are not handed out again.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.nodes.clear();
        self.connections.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::geometry::Point;

    fn node(id: &str) -> Node {
        Node::from_model(
            crate::model::NodeModel {
                id: id.to_string(),
                kind: "delay".to_string(),
                position: Point::ORIGIN,
                ..Default::default()
            },
            Size::new(100.0, 50.0),
        )
    }

    fn graph_with(ids: &[&str]) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            graph.add_node(node(id)).unwrap();
        }
        graph
    }

    #[test]
    fn test_rejects_self_same_kind_and_duplicates() {
        let mut graph = graph_with(&["a", "b"]);
        assert_eq!(graph.check_connection(&Endpoint::output("a"), &Endpoint::input("a")), Err(ConnectRejection::SelfLoop));
        assert!(matches!(graph.check_connection(&Endpoint::output("a"), &Endpoint::output("b")), Err(ConnectRejection::SameKind(_))));
        assert!(matches!(graph.check_connection(&Endpoint::input("a"), &Endpoint::input("b")), Err(ConnectRejection::SameKind(_))));

        graph.add_connection(&Endpoint::output("a"), &Endpoint::input("b")).unwrap();
        assert!(matches!(graph.check_connection(&Endpoint::input("b"), &Endpoint::output("a")), Err(ConnectRejection::Duplicate { .. })));
        // the reverse direction is a distinct ordered pair
        assert!(graph.check_connection(&Endpoint::output("b"), &Endpoint::input("a")).is_ok());
    }

    #[test]
    fn test_check_is_symmetric_in_click_order() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_connection(&Endpoint::output("a"), &Endpoint::input("b")).unwrap();

        let pairs = [
            (Endpoint::output("a"), Endpoint::input("b")),
            (Endpoint::output("b"), Endpoint::input("a")),
            (Endpoint::output("c"), Endpoint::input("b")),
            (Endpoint::output("a"), Endpoint::output("c")),
            (Endpoint::input("c"), Endpoint::input("c")),
        ];
        for (x, y) in pairs.iter() {
            assert_eq!(graph.check_connection(x, y).is_ok(), graph.check_connection(y, x).is_ok(), "{:?} / {:?}", x, y);
        }
    }

    #[test]
    fn test_multiple_inbound_edges_allowed() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_connection(&Endpoint::output("a"), &Endpoint::input("c")).unwrap();
        graph.add_connection(&Endpoint::output("b"), &Endpoint::input("c")).unwrap();
        assert_eq!(graph.connection_count(), 2);
    }

    #[test]
    fn test_remove_node_cascades_exactly() {
        let mut graph = graph_with(&["a", "b", "c", "d"]);
        let ab = graph.add_connection(&Endpoint::output("a"), &Endpoint::input("b")).unwrap();
        let cb = graph.add_connection(&Endpoint::output("c"), &Endpoint::input("b")).unwrap();
        let bd = graph.add_connection(&Endpoint::output("b"), &Endpoint::input("d")).unwrap();
        let cd = graph.add_connection(&Endpoint::output("c"), &Endpoint::input("d")).unwrap();

        let (removed, conns) = graph.remove_node(&"b".to_string()).unwrap();
        assert_eq!(removed.id, "b");
        let mut ids: Vec<_> = conns.into_iter().map(|c| c.id).collect();
        ids.sort();
        let mut expected = vec![ab, cb, bd];
        expected.sort();
        assert_eq!(ids, expected);

        assert_eq!(graph.connection_count(), 1);
        assert!(graph.connection(&cd).is_some());
        assert!(graph.connections().all(|c| graph.contains_node(&c.source) && graph.contains_node(&c.target)));
    }

    #[test]
    fn test_ids_never_repeat_after_delete() {
        let mut graph = Graph::new();
        let first = graph.allocate_node_id();
        graph.add_node(node(&first)).unwrap();
        graph.remove_node(&first);
        let second = graph.allocate_node_id();
        assert_ne!(first, second);
        assert_eq!(second, "node_2");
    }

    #[test]
    fn test_from_document_recomputes_counters_and_drops_bad_connections() {
        let doc = WorkflowDocument::from_value(json!({
            "nodes": [
                {"id": "node_3", "position": {"x": 0, "y": 0}},
                {"id": "node_9", "position": {"x": 200, "y": 0}},
                {"id": "start", "position": {"x": 400, "y": 0}}
            ],
            "connections": [
                {"id": "conn_4", "source": "node_3", "target": "node_9"},
                {"id": "conn_5", "source": "node_3", "target": "node_9"},
                {"id": "conn_6", "source": "node_9", "target": "ghost"},
                {"id": "conn_7", "source": "start", "target": "start"}
            ]
        }))
        .unwrap();

        let (mut graph, dropped) = Graph::from_document(&doc, Size::new(100.0, 50.0)).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.connection_count(), 1);
        assert_eq!(dropped, vec!["conn_5".to_string(), "conn_6".to_string(), "conn_7".to_string()]);
        assert_eq!(graph.node_counter(), 10);
        assert_eq!(graph.allocate_node_id(), "node_10");
        assert_eq!(graph.allocate_connection_id(), "conn_5");
    }

    #[test]
    fn test_from_document_rejects_duplicate_node_ids() {
        let doc = WorkflowDocument::from_value(json!({
            "nodes": [{"id": "node_1"}, {"id": "node_1"}],
            "connections": []
        }))
        .unwrap();
        assert!(Graph::from_document(&doc, Size::new(100.0, 50.0)).is_err());
    }

    #[test]
    fn test_nodes_follow_index_order_after_slot_reuse() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.remove_node(&"b".to_string());
        graph.add_node(node("d")).unwrap();
        let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d", "c"]);
    }

    #[test]
    fn test_counters_wrap_past_max_without_reusing_ids() {
        let doc = WorkflowDocument::from_value(json!({
            "nodes": [
                {"id": "node_18446744073709551615"},
                {"id": "node_0"}
            ],
            "connections": [
                {"id": "conn_18446744073709551615", "source": "node_18446744073709551615", "target": "node_0"}
            ]
        }))
        .unwrap();

        let (mut graph, dropped) = Graph::from_document(&doc, Size::new(100.0, 50.0)).unwrap();
        assert!(dropped.is_empty());

        let first = graph.allocate_node_id();
        assert!(!graph.contains_node(&first));
        assert_eq!(first, "node_1");
        let second = graph.allocate_node_id();
        assert_ne!(first, second);

        let conn = graph.allocate_connection_id();
        assert!(graph.connection(&conn).is_none());
        assert_eq!(conn, "conn_0");
    }
}
