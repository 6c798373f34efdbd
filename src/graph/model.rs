use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{
    Result,
    config::GraphConfig,
    events::{Channel, EditorEvent, Notification},
    geometry::{Point, Rect, Size},
    graph::{
        Inspector,
        confirm::Confirmation,
        connection::{ConnectRejection, ConnectionId, ConnectionPath, CurvePath, Endpoint},
        draw::{ConnectionDraw, DrawOutcome},
        topology::Graph,
        node::{Node, NodeId, NodeStatus},
        render::{RenderFrame, RenderNode, Transform},
    },
    model::{ToolTemplate, WorkflowDocument},
    store::LocalStore,
};

const DUPLICATE_OFFSET: Point = Point {
    x: 200.0,
    y: 50.0,
};
const COPY_SUFFIX: &str = " (Copy)";

/// Owner of the workflow graph and of everything the user does to it.
///
/// Every structural mutation is written through to the local store and
/// announced on the channel. Geometry comes from the nodes themselves; the
/// viewport only pushes its transform in through [`GraphModel::apply_transform`].
pub struct GraphModel {
    graph: Graph,
    draw: ConnectionDraw,
    selected: Option<NodeId>,
    pending: Option<Confirmation>,
    paths: Vec<ConnectionPath>,
    transform: Transform,

    node_size: Size,
    cache_key: String,

    local: Arc<dyn LocalStore>,
    channel: Arc<Channel>,
    inspector: Option<Arc<dyn Inspector>>,
}

impl GraphModel {
    pub fn new(
        config: &GraphConfig,
        local: Arc<dyn LocalStore>,
        channel: Arc<Channel>,
    ) -> Self {
        Self {
            graph: Graph::new(),
            draw: ConnectionDraw::default(),
            selected: None,
            pending: None,
            paths: Vec::new(),
            transform: Transform::default(),
            node_size: Size::new(config.node_width, config.node_height),
            cache_key: config.cache_key.clone(),
            local,
            channel,
            inspector: None,
        }
    }

    pub fn set_inspector(
        &mut self,
        inspector: Arc<dyn Inspector>,
    ) {
        self.inspector = Some(inspector);
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node(
        &self,
        id: &str,
    ) -> Option<&Node> {
        self.graph.node(id)
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn draw_state(&self) -> &ConnectionDraw {
        &self.draw
    }

    pub fn pending_confirmation(&self) -> Option<&Confirmation> {
        self.pending.as_ref()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Canvas-space boxes of every node, as fed to fit-to-content.
    pub fn node_bounds(&self) -> Vec<Rect> {
        self.graph.nodes().map(Node::bounds).collect()
    }

    /// Size a dropped node is centered with before the host measures it.
    pub fn default_node_size(&self) -> Size {
        self.node_size
    }

    /// Curves as of the last [`GraphModel::update_connections`].
    pub fn connection_paths(&self) -> &[ConnectionPath] {
        &self.paths
    }

    /// Instantiate a tool template at a canvas position.
    pub fn create_node(
        &mut self,
        tool: &ToolTemplate,
        position: Point,
    ) -> Result<NodeId> {
        let id = self.graph.allocate_node_id();
        let node = Node::from_template(id.clone(), tool, position, self.node_size);
        let was_empty = self.graph.is_empty();
        self.graph.add_node(node)?;
        debug!("created node {} from tool {}", id, tool.id);

        self.channel.emit(EditorEvent::NodeCreated(id.clone()));
        if was_empty {
            self.channel.emit(EditorEvent::CanvasGuide(false));
        }
        self.save_to_cache();
        Ok(id)
    }

    /// Remove a node and every connection touching it. Unknown ids are a no-op.
    pub fn delete_node(
        &mut self,
        id: &str,
    ) -> bool {
        let Some((node, removed)) = self.graph.remove_node(&id.to_string()) else {
            return false;
        };
        debug!("deleted node {} with {} connections", node.id, removed.len());

        self.draw.forget_node(&node.id);
        if self.selected.as_deref() == Some(node.id.as_str()) {
            self.deselect_all();
        }
        self.update_connections();

        self.channel.emit(EditorEvent::NodeDeleted {
            id: node.id,
            connections: removed.into_iter().map(|c| c.id).collect(),
        });
        if self.graph.is_empty() {
            self.channel.emit(EditorEvent::CanvasGuide(true));
        }
        self.save_to_cache();
        true
    }

    /// Overwrite a node's position.
    ///
    /// Connection paths are left stale so a continuous drag does not recompute
    /// them per pointer event; call [`GraphModel::update_connections`] when needed
    /// and [`GraphModel::finish_move`] when the drag ends.
    pub fn update_node_position(
        &mut self,
        id: &str,
        position: Point,
    ) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.position = position;
        self.channel.emit(EditorEvent::NodeUpdated(id.to_string()));
        true
    }

    /// Drag end: refresh the paths and persist.
    pub fn finish_move(&mut self) {
        self.update_connections();
        self.save_to_cache();
    }

    /// Measured size reported by the host; anchors move with it.
    pub fn set_node_size(
        &mut self,
        id: &str,
        size: Size,
    ) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.size = size;
        self.update_connections();
        true
    }

    pub fn update_node_property(
        &mut self,
        id: &str,
        key: &str,
        value: Value,
    ) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.properties.insert(key.to_string(), value);
        self.channel.emit(EditorEvent::NodeUpdated(id.to_string()));
        self.save_to_cache();
        true
    }

    pub fn node_property(
        &self,
        id: &str,
        key: &str,
    ) -> Option<&Value> {
        self.graph.node(id).and_then(|node| node.properties.get(key))
    }

    /// Edit the display name and/or description.
    pub fn update_node_details(
        &mut self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        if let Some(name) = name {
            node.name = name.to_string();
        }
        if let Some(description) = description {
            node.description = description.to_string();
        }
        self.channel.emit(EditorEvent::NodeUpdated(id.to_string()));
        self.save_to_cache();
        true
    }

    /// Execution feedback for one node. Not persisted.
    pub fn set_node_status(
        &mut self,
        id: &str,
        status: NodeStatus,
    ) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.status = status;
        self.channel.emit(EditorEvent::NodeUpdated(id.to_string()));
        true
    }

    pub fn set_all_statuses(
        &mut self,
        status: NodeStatus,
    ) {
        let mut updated = Vec::new();
        for node in self.graph.nodes_mut() {
            node.status = status;
            updated.push(node.id.clone());
        }
        for id in updated {
            self.channel.emit(EditorEvent::NodeUpdated(id));
        }
    }

    /// Copy a node next to the original and select the copy.
    pub fn duplicate_node(
        &mut self,
        id: &str,
    ) -> Result<Option<NodeId>> {
        let Some(mut copy) = self.graph.node(id).cloned() else {
            return Ok(None);
        };

        copy.id = self.graph.allocate_node_id();
        copy.position = copy.position.offset(DUPLICATE_OFFSET.x, DUPLICATE_OFFSET.y);
        copy.name.push_str(COPY_SUFFIX);
        copy.status = NodeStatus::Idle;

        let copy_id = copy.id.clone();
        self.graph.add_node(copy)?;
        debug!("duplicated node {} as {}", id, copy_id);

        self.channel.emit(EditorEvent::NodeCreated(copy_id.clone()));
        self.save_to_cache();
        self.select_node(&copy_id);
        Ok(Some(copy_id))
    }

    pub fn select_node(
        &mut self,
        id: &str,
    ) -> bool {
        let Some(node) = self.graph.node(id) else {
            return false;
        };
        if let Some(inspector) = self.inspector.as_ref() {
            inspector.show_node(node);
        }
        self.selected = Some(id.to_string());
        self.channel.emit(EditorEvent::SelectionChanged(self.selected.clone()));
        true
    }

    pub fn deselect_all(&mut self) {
        let previous = self.selected.take();
        if let Some(inspector) = self.inspector.as_ref() {
            inspector.hide_node();
        }
        if previous.is_some() {
            self.channel.emit(EditorEvent::SelectionChanged(None));
        }
    }

    fn request(
        &mut self,
        confirmation: Confirmation,
    ) -> Confirmation {
        debug!("confirmation requested: {:?}", confirmation);
        self.pending = Some(confirmation.clone());
        confirmation
    }

    pub fn request_delete_node(
        &mut self,
        id: &str,
    ) -> Option<Confirmation> {
        self.graph.contains_node(id).then(|| self.request(Confirmation::DeleteNode(id.to_string())))
    }

    /// Delete-key handler: asks to delete the selected node, if any.
    pub fn request_delete_selected(&mut self) -> Option<Confirmation> {
        let id = self.selected.clone()?;
        self.request_delete_node(&id)
    }

    pub fn request_delete_connection(
        &mut self,
        id: &str,
    ) -> Option<Confirmation> {
        self.graph.connection(id).is_some().then(|| self.request(Confirmation::DeleteConnection(id.to_string())))
    }

    /// Nothing to confirm on an empty canvas; the user is told so instead.
    pub fn request_clear_canvas(&mut self) -> Option<Confirmation> {
        if self.graph.is_empty() {
            self.channel.notify(Notification::info("Canvas is already empty"));
            return None;
        }
        Some(self.request(Confirmation::ClearCanvas {
            nodes: self.graph.node_count(),
        }))
    }

    pub fn request_delete_workflow(
        &mut self,
        name: &str,
    ) -> Confirmation {
        self.request(Confirmation::DeleteWorkflow(name.to_string()))
    }

    /// Consume the pending confirmation if it is `confirmation`.
    pub fn take_confirmation(
        &mut self,
        confirmation: &Confirmation,
    ) -> bool {
        if self.pending.as_ref() != Some(confirmation) {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn cancel_confirmation(&mut self) -> Option<Confirmation> {
        self.pending.take()
    }

    /// Carry out a pending local confirmation.
    ///
    /// `DeleteWorkflow` needs the remote service and is confirmed through the
    /// editor; here it is left pending and `false` is returned.
    pub fn confirm(
        &mut self,
        confirmation: &Confirmation,
    ) -> bool {
        if matches!(confirmation, Confirmation::DeleteWorkflow(_)) || !self.take_confirmation(confirmation) {
            return false;
        }

        match confirmation {
            Confirmation::DeleteNode(id) => self.delete_node(id),
            Confirmation::DeleteConnection(id) => self.delete_connection(id),
            Confirmation::ClearCanvas {
                ..
            } => {
                self.clear_canvas();
                self.channel.notify(Notification::success("Canvas cleared successfully"));
                true
            }
            Confirmation::DeleteWorkflow(_) => false,
        }
    }

    /// Feed one endpoint click into the connection-draw state machine.
    pub fn handle_endpoint_click(
        &mut self,
        node_id: &str,
        is_output: bool,
    ) -> DrawOutcome {
        if !self.graph.contains_node(node_id) {
            return DrawOutcome::Rejected(ConnectRejection::MissingNode(node_id.to_string()));
        }

        match self.draw.click(Endpoint::new(node_id, is_output)) {
            Err(outcome) => {
                debug!("connection draw: {:?}", outcome);
                outcome
            }
            Ok((start, end)) => match self.create_connection(&start, &end) {
                Ok(id) => {
                    self.channel.notify(Notification::success("Connection created successfully!"));
                    DrawOutcome::Created(id)
                }
                Err(rejection) => {
                    debug!("connection rejected: {}", rejection);
                    self.channel.notify(Notification::error("Cannot create this connection"));
                    DrawOutcome::Rejected(rejection)
                }
            },
        }
    }

    /// Abort a half-drawn connection.
    pub fn cancel_connection(&mut self) -> bool {
        self.draw.cancel()
    }

    pub fn can_create_connection(
        &self,
        start: &Endpoint,
        end: &Endpoint,
    ) -> bool {
        self.graph.check_connection(start, end).is_ok()
    }

    pub fn create_connection(
        &mut self,
        start: &Endpoint,
        end: &Endpoint,
    ) -> std::result::Result<ConnectionId, ConnectRejection> {
        let id = self.graph.add_connection(start, end)?;
        debug!("created connection {}", id);

        self.update_connections();
        self.channel.emit(EditorEvent::ConnectionCreated(id.clone()));
        self.save_to_cache();
        Ok(id)
    }

    /// Wire `source`'s output to `target`'s input.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<ConnectionId> {
        Ok(self.create_connection(&Endpoint::output(source), &Endpoint::input(target))?)
    }

    pub fn delete_connection(
        &mut self,
        id: &str,
    ) -> bool {
        if self.graph.remove_connection(id).is_none() {
            return false;
        }
        debug!("deleted connection {}", id);

        self.update_connections();
        self.channel.emit(EditorEvent::ConnectionDeleted(id.to_string()));
        self.save_to_cache();
        true
    }

    /// Recompute every connection curve from the current node geometry.
    pub fn update_connections(&mut self) {
        self.paths = self
            .graph
            .connections()
            .filter_map(|conn| {
                let source = self.graph.node(&conn.source)?;
                let target = self.graph.node(&conn.target)?;
                Some(ConnectionPath {
                    id: conn.id.clone(),
                    source: conn.source.clone(),
                    target: conn.target.clone(),
                    curve: CurvePath::between(source.output_anchor(), target.input_anchor()),
                })
            })
            .collect();
    }

    /// Take a new viewport transform; applied before the next frame.
    pub fn apply_transform(
        &mut self,
        transform: Transform,
    ) {
        trace!("GraphModel::apply_transform({})", transform.to_css());
        self.transform = transform;
        self.update_connections();
    }

    pub fn clear_canvas(&mut self) {
        self.graph.clear();
        self.draw.cancel();
        self.pending = None;
        self.deselect_all();
        self.update_connections();

        self.channel.emit(EditorEvent::GraphCleared);
        self.channel.emit(EditorEvent::CanvasGuide(true));
        self.save_to_cache();
    }

    /// Replace the graph with a document.
    ///
    /// On error the current graph is left exactly as it was.
    pub fn load_workflow_data(
        &mut self,
        doc: &WorkflowDocument,
    ) -> Result<()> {
        let (graph, dropped) = Graph::from_document(doc, self.node_size)?;
        self.install(graph);

        if !dropped.is_empty() {
            self.channel.notify(Notification::warning(format!("Skipped {} invalid connection(s)", dropped.len())));
        }
        self.save_to_cache();
        Ok(())
    }

    fn install(
        &mut self,
        graph: Graph,
    ) {
        self.graph = graph;
        self.draw.cancel();
        self.pending = None;
        self.deselect_all();
        self.update_connections();

        self.channel.emit(EditorEvent::WorkflowLoaded {
            nodes: self.graph.node_count(),
            connections: self.graph.connection_count(),
        });
        self.channel.emit(EditorEvent::CanvasGuide(self.graph.is_empty()));
    }

    /// Current `{nodes, connections}` pair.
    pub fn to_document(&self) -> WorkflowDocument {
        self.graph.to_document()
    }

    /// Write the `{nodes, connections}` pair to the local store.
    ///
    /// Failures are logged; the in-memory graph stays authoritative.
    pub fn save_to_cache(&self) {
        match self.to_document().to_json() {
            Ok(json) => {
                if let Err(err) = self.local.set(&self.cache_key, &json) {
                    warn!("failed to write local cache '{}': {}", self.cache_key, err);
                }
            }
            Err(err) => warn!("failed to serialize workflow for local cache: {}", err),
        }
        self.channel.emit(EditorEvent::GraphPersisted);
    }

    /// Restore the in-progress session, if one was cached.
    pub fn restore_from_cache(&mut self) -> bool {
        let data = match self.local.get(&self.cache_key) {
            Ok(Some(data)) => data,
            Ok(None) => return false,
            Err(err) => {
                warn!("failed to read local cache '{}': {}", self.cache_key, err);
                return false;
            }
        };

        let graph = WorkflowDocument::from_json(&data).and_then(|doc| Graph::from_document(&doc, self.node_size));
        match graph {
            Ok((graph, _)) => {
                debug!("restored {} nodes from local cache", graph.node_count());
                self.install(graph);
                true
            }
            Err(err) => {
                warn!("ignoring unreadable local cache '{}': {}", self.cache_key, err);
                false
            }
        }
    }

    /// Snapshot for the host to paint.
    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            transform: self.transform,
            nodes: self
                .graph
                .nodes()
                .map(|node| RenderNode {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    icon: node.icon.clone(),
                    description: node.description.clone(),
                    status: node.status,
                    bounds: node.bounds(),
                    selected: self.selected.as_deref() == Some(node.id.as_str()),
                })
                .collect(),
            connections: self.paths.clone(),
            selected: self.selected.clone(),
            show_guide: self.graph.is_empty(),
            pending: self.draw.pending().cloned(),
        }
    }
}
