mod sync;

use std::{
    path::Path,
    sync::{
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::{
    Config, FlowCanvasError, Result, ShareLock,
    common::{MemCache, Shutdown},
    events::{Channel, EditorEvent, Notification, ViewportEvent},
    geometry::{Point, Rect},
    graph::{Confirmation, GraphModel, Inspector, NodeId, NodeStatus, RenderFrame},
    model::{LayoutModel, PanelState, TemplateRecord, ToolTemplate, WorkflowDocument, WorkflowMeta},
    store::{LocalStore, WorkflowService},
    utils,
    viewport::{ViewportCommand, ViewportEngine, command_for_key, wheel_factor},
};

use sync::LayoutSync;

const UNTITLED_WORKFLOW: &str = "Untitled Workflow";
const WORKFLOW_VERSION: &str = "1.0";
const WORKFLOW_KEY_PREFIX: &str = "workflow_";

/// What a key press ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// A viewport shortcut ran; false when it changed nothing.
    Viewport(bool),
    /// Delete was pressed on a selected node and now awaits confirmation.
    Confirm(Confirmation),
    ConnectionCancelled,
    Ignored,
}

/// The editor: one viewport, one graph, the panel chrome and the two stores.
///
/// Every interaction goes through here so the viewport transform is pushed into
/// the graph synchronously and every mutation is announced on the channel.
pub struct Editor {
    id: String,

    viewport: ShareLock<ViewportEngine>,
    graph: ShareLock<GraphModel>,
    panel: ShareLock<PanelState>,
    tools: MemCache<String, ToolTemplate>,

    local: Arc<dyn LocalStore>,
    service: Arc<dyn WorkflowService>,
    channel: Arc<Channel>,
    sync: LayoutSync,

    running: Arc<AtomicBool>,
    runtime: Arc<Runtime>,
    shutdown: Arc<Shutdown>,
}

impl Editor {
    pub(crate) fn new(
        config: &Config,
        local: Arc<dyn LocalStore>,
        service: Arc<dyn WorkflowService>,
        inspector: Option<Arc<dyn Inspector>>,
        runtime: Arc<Runtime>,
    ) -> Self {
        let channel = Arc::new(Channel::new());
        let shutdown = Arc::new(Shutdown::new());

        let viewport = Arc::new(RwLock::new(ViewportEngine::new(&config.viewport)));
        let mut graph = GraphModel::new(&config.graph, local.clone(), channel.clone());
        if let Some(inspector) = inspector {
            graph.set_inspector(inspector);
        }
        let graph = Arc::new(RwLock::new(graph));
        let panel = Arc::new(RwLock::new(PanelState::default()));

        let sync = LayoutSync::new(viewport.clone(), panel.clone(), service.clone(), channel.clone(), runtime.clone(), shutdown.clone());

        Self {
            id: utils::longid(),
            viewport,
            graph,
            panel,
            tools: MemCache::new(config.cache.capacity.max(1)),
            local,
            service,
            channel,
            sync,
            running: Arc::new(AtomicBool::new(false)),
            runtime,
            shutdown,
        }
    }

    /// Start the event dispatcher and the layout sync, then restore the cached session.
    pub fn launch(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(editor = %self.id, "launch editor");

        self.sync.monitor();
        self.channel.listen(&self.runtime);

        if self.graph.write().unwrap().restore_from_cache() {
            debug!(editor = %self.id, "resumed cached session");
        }
    }

    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!(editor = %self.id, "shutdown editor");
        self.shutdown.shutdown();
        self.channel.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    pub fn runtime(&self) -> Arc<Runtime> {
        self.runtime.clone()
    }

    pub fn graph(&self) -> RwLockReadGuard<'_, GraphModel> {
        self.graph.read().unwrap()
    }

    /// Direct access for node edits, selection and connection drawing.
    ///
    /// Viewport changes must go through the editor instead.
    pub fn graph_mut(&self) -> RwLockWriteGuard<'_, GraphModel> {
        self.graph.write().unwrap()
    }

    pub fn viewport(&self) -> RwLockReadGuard<'_, ViewportEngine> {
        self.viewport.read().unwrap()
    }

    pub fn frame(&self) -> RenderFrame {
        self.graph().frame()
    }

    /// Run a viewport mutation, then push the resulting transform into the graph.
    fn with_viewport<F>(
        &self,
        settled: bool,
        f: F,
    ) -> bool
    where
        F: FnOnce(&mut ViewportEngine) -> bool,
    {
        let (changed, transform, animating) = {
            let mut viewport = self.viewport.write().unwrap();
            let changed = f(&mut *viewport);
            (changed, viewport.transform(), viewport.is_animating())
        };
        if !changed {
            return false;
        }

        self.graph.write().unwrap().apply_transform(transform);
        self.channel.emit(EditorEvent::ViewportChanged(ViewportEvent {
            offset: transform.offset,
            scale: transform.scale,
            settled: settled && !animating,
        }));
        true
    }

    pub fn set_screen(
        &self,
        screen: Rect,
    ) -> Result<()> {
        self.viewport.write().unwrap().set_screen(screen)
    }

    pub fn pan(
        &self,
        dx: f64,
        dy: f64,
    ) {
        self.with_viewport(true, |viewport| {
            viewport.pan(dx, dy);
            true
        });
    }

    pub fn zoom_at_point(
        &self,
        x: f64,
        y: f64,
        factor: f64,
    ) -> bool {
        self.with_viewport(true, |viewport| viewport.zoom_at_point(x, y, factor))
    }

    pub fn zoom_at_center(
        &self,
        factor: f64,
    ) -> bool {
        self.with_viewport(true, |viewport| viewport.zoom_at_center(factor))
    }

    pub fn zoom_in(&self) -> bool {
        self.with_viewport(true, ViewportEngine::zoom_in)
    }

    pub fn zoom_out(&self) -> bool {
        self.with_viewport(true, ViewportEngine::zoom_out)
    }

    pub fn reset_view(&self) {
        self.with_viewport(true, |viewport| {
            viewport.reset_view();
            true
        });
    }

    pub fn fit_to_content(&self) {
        let bounds = self.graph().node_bounds();
        self.with_viewport(true, |viewport| {
            viewport.fit_to_content(&bounds);
            true
        });
    }

    /// Wheel zoom around the pointer, given in client coordinates.
    pub fn wheel(
        &self,
        client_x: f64,
        client_y: f64,
        delta_y: f64,
    ) -> bool {
        self.with_viewport(true, |viewport| {
            let screen = viewport.screen();
            viewport.zoom_at_point(client_x - screen.left(), client_y - screen.top(), wheel_factor(delta_y))
        })
    }

    pub fn begin_pan(
        &self,
        pointer: Point,
    ) {
        self.viewport.write().unwrap().begin_pan(pointer);
    }

    pub fn drag_pan(
        &self,
        pointer: Point,
    ) -> bool {
        self.with_viewport(false, |viewport| viewport.drag_pan(pointer))
    }

    pub fn end_pan(&self) -> bool {
        self.with_viewport(true, ViewportEngine::end_pan)
    }

    pub fn animate_to(
        &self,
        offset: Point,
        scale: f64,
        duration: Option<Duration>,
    ) {
        self.with_viewport(true, |viewport| {
            viewport.animate_to(offset, scale, duration);
            true
        });
    }

    /// Animate toward a node. False when the node does not exist.
    pub fn focus_on_node(
        &self,
        id: &str,
    ) -> bool {
        let Some(bounds) = self.graph().node(id).map(|node| node.bounds()) else {
            return false;
        };
        self.viewport.write().unwrap().focus_on_node(bounds);
        true
    }

    /// Step a running animation by one frame. False when nothing is animating.
    pub fn tick(
        &self,
        dt: Duration,
    ) -> bool {
        self.with_viewport(true, |viewport| viewport.advance(dt).is_some())
    }

    pub fn handle_command(
        &self,
        command: ViewportCommand,
    ) -> bool {
        let bounds = self.graph().node_bounds();
        self.with_viewport(true, |viewport| viewport.apply_command(command, &bounds))
    }

    pub fn handle_key(
        &self,
        key: &str,
        ctrl: bool,
    ) -> KeyOutcome {
        let pan_step = self.viewport().pan_step();
        if let Some(command) = command_for_key(key, ctrl, pan_step) {
            return KeyOutcome::Viewport(self.handle_command(command));
        }

        match key {
            "Delete" | "Backspace" => match self.graph_mut().request_delete_selected() {
                Some(confirmation) => KeyOutcome::Confirm(confirmation),
                None => KeyOutcome::Ignored,
            },
            "Escape" if self.graph_mut().cancel_connection() => KeyOutcome::ConnectionCancelled,
            _ => KeyOutcome::Ignored,
        }
    }

    /// Drop a tool at a client-space pointer position, centered under the pointer.
    pub fn drop_tool(
        &self,
        tool: &ToolTemplate,
        pointer: Point,
    ) -> Result<NodeId> {
        let canvas = self.viewport().screen_to_canvas(pointer);
        let mut graph = self.graph_mut();
        let size = graph.default_node_size();
        graph.create_node(tool, canvas.offset(-size.width / 2.0, -size.height / 2.0))
    }

    /// Drop a tool from the fetched catalog by its id.
    pub fn drop_tool_by_id(
        &self,
        tool_id: &str,
        pointer: Point,
    ) -> Result<NodeId> {
        let tool = self.tools.get(&tool_id.to_string()).ok_or_else(|| FlowCanvasError::Node(format!("unknown tool '{}'", tool_id)))?;
        self.drop_tool(&tool, pointer)
    }

    /// Fetch the tool catalog and keep it for `drop_tool_by_id`.
    pub async fn fetch_tools(&self) -> Result<Vec<ToolTemplate>> {
        match self.service.fetch_tools().await {
            Ok(tools) => {
                for tool in &tools {
                    self.tools.set(tool.id.clone(), tool.clone());
                }
                Ok(tools)
            }
            Err(err) => {
                warn!("failed to fetch tools: {}", err);
                self.channel.notify(Notification::error("Failed to load tools"));
                Err(err)
            }
        }
    }

    pub fn workflow_name(&self) -> Option<String> {
        self.panel.read().unwrap().workflow_name.clone()
    }

    pub fn set_workflow_name(
        &self,
        name: impl Into<String>,
    ) {
        self.panel.write().unwrap().workflow_name = Some(name.into());
        self.channel.emit(EditorEvent::PanelChanged);
    }

    pub fn left_panel_visible(&self) -> bool {
        self.panel.read().unwrap().left_panel_visible
    }

    pub fn set_left_panel_visible(
        &self,
        visible: bool,
    ) {
        self.panel.write().unwrap().left_panel_visible = visible;
        self.channel.emit(EditorEvent::PanelChanged);
    }

    pub fn toggle_left_panel(&self) -> bool {
        let visible = !self.left_panel_visible();
        self.set_left_panel_visible(visible);
        visible
    }

    /// `Workflow N`, N being one more than the workflows held in the local store.
    pub fn generate_default_workflow_name(&self) -> String {
        let count = match self.local.keys() {
            Ok(keys) => keys.iter().filter(|key| key.starts_with(WORKFLOW_KEY_PREFIX)).count(),
            Err(err) => {
                warn!("failed to list local keys: {}", err);
                0
            }
        };
        let name = format!("Workflow {}", count + 1);
        self.set_workflow_name(name.clone());
        name
    }

    /// Current layout: panel chrome plus the viewport transform.
    pub fn layout(&self) -> LayoutModel {
        LayoutSync::snapshot(&self.viewport, &self.panel)
    }

    /// Apply the server layout record. Without one a default workflow name is generated.
    pub async fn restore_layout(&self) {
        let layout = match self.service.load_layout().await {
            Ok(layout) => layout,
            Err(err) => {
                warn!("failed to load layout: {}", err);
                None
            }
        };

        let Some(layout) = layout else {
            self.generate_default_workflow_name();
            return;
        };

        let panel = layout.panel_state.unwrap_or_default();
        match panel.workflow_name.filter(|name| !name.is_empty()) {
            Some(name) => self.set_workflow_name(name),
            None => {
                self.generate_default_workflow_name();
            }
        }
        self.set_left_panel_visible(panel.left_panel_visible);

        if let Some(canvas) = layout.canvas_state {
            self.with_viewport(true, |viewport| {
                viewport.set_state(canvas.offset, canvas.zoom);
                true
            });
        }
        debug!(editor = %self.id, "layout restored");
    }

    /// Graph plus name and metadata, as sent to the server and exported.
    fn named_document(&self) -> WorkflowDocument {
        let mut doc = self.graph().to_document();
        doc.name = Some(self.workflow_name().unwrap_or_else(|| UNTITLED_WORKFLOW.to_string()));
        doc.meta = Some(WorkflowMeta {
            created: Some(utils::time::iso_now().into()),
            version: Some(WORKFLOW_VERSION.into()),
            ..Default::default()
        });
        doc
    }

    /// Pretty-printed workflow JSON, also written to the log.
    pub fn export_workflow(&self) -> Result<String> {
        let doc = self.named_document();
        let json = doc.to_json_pretty()?;
        info!("workflow '{}':\n{}", doc.name.as_deref().unwrap_or(UNTITLED_WORKFLOW), json);
        Ok(json)
    }

    pub async fn save_workflow(&self) -> Result<()> {
        if self.graph().graph().is_empty() {
            self.channel.notify(Notification::warning("Cannot save empty workflow. Add some nodes first."));
            return Ok(());
        }

        let doc = self.named_document();
        match doc.to_json_pretty() {
            Ok(json) => info!("saving workflow:\n{}", json),
            Err(err) => warn!("failed to print workflow: {}", err),
        }

        match self.service.save_workflow(&doc).await {
            Ok(reply) => {
                let message = reply.message.unwrap_or_else(|| "Workflow saved successfully".to_string());
                self.channel.notify(Notification::success(format!("{} (JSON also printed to console)", message)));
                self.graph().save_to_cache();
                Ok(())
            }
            Err(err) => {
                warn!("failed to save workflow: {}", err);
                self.channel.notify(Notification::error(err.server_message().unwrap_or("Failed to save workflow")));
                Err(err)
            }
        }
    }

    pub async fn list_templates(&self) -> Result<Vec<TemplateRecord>> {
        self.service.list_templates().await.inspect_err(|err| {
            warn!("failed to list templates: {}", err);
            self.channel.notify(Notification::error("Failed to load templates"));
        })
    }

    /// Replace the canvas with a template; the workflow is renamed `<name> - Copy`.
    pub async fn load_template(
        &self,
        template_id: &str,
    ) -> Result<()> {
        let loaded = match self.service.load_template(template_id).await {
            Ok(template) => self.graph_mut().load_workflow_data(&template.workflow_data).map(|_| template),
            Err(err) => Err(err),
        };

        match loaded {
            Ok(template) => {
                self.set_workflow_name(format!("{} - Copy", template.name));
                self.channel.notify(Notification::success(format!("Template \"{}\" loaded successfully", template.name)));
                Ok(())
            }
            Err(err) => {
                warn!("failed to load template '{}': {}", template_id, err);
                self.channel.notify(Notification::error("Failed to load template"));
                Err(err)
            }
        }
    }

    /// Load pasted workflow JSON. On any error the canvas is left as it was.
    pub fn load_from_json(
        &self,
        text: &str,
    ) -> Result<()> {
        if text.trim().is_empty() {
            self.channel.notify(Notification::warning("Please provide JSON data to load"));
            return Err(FlowCanvasError::Workflow("empty workflow JSON".to_string()));
        }

        let loaded = WorkflowDocument::from_json(text).and_then(|doc| self.graph_mut().load_workflow_data(&doc).map(|_| doc));
        let doc = match loaded {
            Ok(doc) => doc,
            Err(err) => {
                self.channel.notify(Notification::error(format!("Failed to load workflow: {}", err)));
                return Err(err);
            }
        };

        if let Some(name) = &doc.name {
            self.set_workflow_name(name.clone());
        }
        info!("loaded workflow with {} nodes and {} connections", doc.nodes.len(), doc.connections.len());
        self.channel.notify(Notification::success(format!("Workflow \"{}\" loaded successfully!", doc.name.as_deref().unwrap_or("Untitled"))));
        Ok(())
    }

    /// Load a workflow file from disk.
    pub fn load_from_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<()> {
        let loaded = std::fs::read_to_string(path.as_ref())
            .map_err(FlowCanvasError::from)
            .and_then(|text| WorkflowDocument::from_json(&text))
            .and_then(|doc| self.graph_mut().load_workflow_data(&doc));

        match loaded {
            Ok(()) => {
                self.channel.notify(Notification::success("Workflow loaded successfully!"));
                Ok(())
            }
            Err(err) => {
                warn!("failed to load workflow file {}: {}", path.as_ref().display(), err);
                self.channel.notify(Notification::error("Failed to load workflow: Invalid file format"));
                Err(err)
            }
        }
    }

    /// Hand the graph to the server for execution and mark every node running.
    pub async fn execute_workflow(&self) -> Result<()> {
        let doc = self.graph().to_document();
        match self.service.execute_workflow(&doc).await {
            Ok(_) => {
                self.channel.notify(Notification::success("Workflow execution started!"));
                self.graph_mut().set_all_statuses(NodeStatus::Running);
                Ok(())
            }
            Err(err) => {
                let message = err.server_message().map(str::to_string).unwrap_or_else(|| err.to_string());
                self.channel.notify(Notification::error(format!("Failed to execute workflow: {}", message)));
                Err(err)
            }
        }
    }

    /// Ask to delete the saved workflow named in the panel.
    pub fn request_delete_workflow(&self) -> Confirmation {
        let name = self.workflow_name().unwrap_or_else(|| UNTITLED_WORKFLOW.to_string());
        self.graph_mut().request_delete_workflow(&name)
    }

    /// Carry out the pending confirmation. Returns false when it was not pending.
    pub async fn confirm(
        &self,
        confirmation: &Confirmation,
    ) -> Result<bool> {
        let Confirmation::DeleteWorkflow(name) = confirmation else {
            return Ok(self.graph_mut().confirm(confirmation));
        };
        if !self.graph_mut().take_confirmation(confirmation) {
            return Ok(false);
        }

        match self.service.delete_workflow(name).await {
            Ok(reply) => {
                let cache_key = {
                    let mut graph = self.graph_mut();
                    graph.clear_canvas();
                    graph.cache_key().to_string()
                };
                if let Err(err) = self.local.remove(&cache_key) {
                    warn!("failed to drop local cache '{}': {}", cache_key, err);
                }
                self.generate_default_workflow_name();
                self.channel.notify(Notification::success(reply.message.unwrap_or_else(|| "Workflow deleted successfully".to_string())));
                Ok(true)
            }
            Err(err) => {
                warn!("failed to delete workflow '{}': {}", name, err);
                self.channel.notify(Notification::error(err.server_message().unwrap_or("Failed to delete workflow")));
                Err(err)
            }
        }
    }

    pub fn cancel_confirmation(&self) -> Option<Confirmation> {
        self.graph_mut().cancel_confirmation()
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::Receiver;

    use super::*;
    use crate::{
        EditorBuilder,
        events::NotificationLevel,
        model::CanvasState,
        store::{MemLocalStore, MemWorkflowService},
    };

    struct Fixture {
        editor: Editor,
        local: Arc<MemLocalStore>,
        service: Arc<MemWorkflowService>,
        runtime: Arc<Runtime>,
    }

    fn fixture() -> Fixture {
        let runtime = Arc::new(Runtime::new().unwrap());
        let local = Arc::new(MemLocalStore::default());
        let service = Arc::new(MemWorkflowService::new().unwrap());
        let editor = EditorBuilder::new().local_store(local.clone()).service(service.clone()).runtime(runtime.clone()).build().unwrap();
        Fixture {
            editor,
            local,
            service,
            runtime,
        }
    }

    fn notifications(rx: &mut Receiver<EditorEvent>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let EditorEvent::Notification(n) = event {
                out.push(n);
            }
        }
        out
    }

    fn tool(
        f: &Fixture,
        id: &str,
    ) -> ToolTemplate {
        let tools = f.runtime.block_on(f.editor.fetch_tools()).unwrap();
        tools.into_iter().find(|t| t.id == id).unwrap()
    }

    #[test]
    fn test_zoom_pushes_transform_into_graph() {
        let f = fixture();
        let mut rx = f.editor.channel().subscribe();

        assert!(f.editor.zoom_at_point(100.0, 100.0, 2.0));
        let transform = f.editor.graph().transform();
        assert_eq!(transform.scale, 2.0);
        assert_eq!(transform.offset, Point::new(-100.0, -100.0));
        assert_eq!(
            rx.try_recv().unwrap(),
            EditorEvent::ViewportChanged(ViewportEvent {
                offset: Point::new(-100.0, -100.0),
                scale: 2.0,
                settled: true,
            })
        );

        assert!(f.editor.zoom_at_point(0.0, 0.0, 100.0));
        assert_eq!(f.editor.graph().transform().scale, 3.0);
        let _ = rx.try_recv();
        // already at the upper bound
        assert!(!f.editor.zoom_at_point(0.0, 0.0, 100.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_animation_settles_through_ticks() {
        let f = fixture();
        f.editor.animate_to(Point::new(200.0, 0.0), 1.0, Some(Duration::from_millis(100)));
        assert!(f.editor.viewport().is_animating());

        let mut rx = f.editor.channel().subscribe();
        assert!(f.editor.tick(Duration::from_millis(50)));
        assert!(f.editor.tick(Duration::from_millis(60)));
        assert!(!f.editor.tick(Duration::from_millis(16)));

        let settled: Vec<bool> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                EditorEvent::ViewportChanged(v) => Some(v.settled),
                _ => None,
            })
            .collect();
        assert_eq!(settled, vec![false, true]);
        assert_eq!(f.editor.graph().transform().offset, Point::new(200.0, 0.0));
    }

    #[test]
    fn test_drop_tool_centers_node_under_pointer() {
        let f = fixture();
        f.editor.pan(100.0, 0.0);
        let id = f.editor.drop_tool(&tool(&f, "delay"), Point::new(500.0, 300.0)).unwrap();

        let graph = f.editor.graph();
        let node = graph.node(&id).unwrap();
        assert_eq!(node.bounds().center(), Point::new(400.0, 300.0));
        assert_eq!(node.kind, "delay");
    }

    #[test]
    fn test_drop_unknown_tool() {
        let f = fixture();
        assert!(f.editor.drop_tool_by_id("teleport", Point::ORIGIN).is_err());
        f.runtime.block_on(f.editor.fetch_tools()).unwrap();
        assert!(f.editor.drop_tool_by_id("webhook", Point::ORIGIN).is_ok());
    }

    #[test]
    fn test_fit_to_content_uses_node_bounds() {
        let f = fixture();
        f.editor.drop_tool(&tool(&f, "delay"), Point::new(5000.0, 5000.0)).unwrap();
        f.editor.fit_to_content();
        let viewport = f.editor.viewport();
        let node = f.editor.graph().node_bounds()[0];
        assert!(viewport.get_viewport_bounds().contains(node.center()));
    }

    #[test]
    fn test_save_empty_workflow_warns() {
        let f = fixture();
        let mut rx = f.editor.channel().subscribe();
        f.runtime.block_on(f.editor.save_workflow()).unwrap();

        let n = notifications(&mut rx);
        assert_eq!(n, vec![Notification::warning("Cannot save empty workflow. Add some nodes first.")]);
    }

    #[test]
    fn test_save_workflow_sends_name_and_meta() {
        let f = fixture();
        f.editor.drop_tool(&tool(&f, "http_request"), Point::new(200.0, 200.0)).unwrap();
        f.editor.set_workflow_name("Billing Flow");

        let mut rx = f.editor.channel().subscribe();
        f.runtime.block_on(f.editor.save_workflow()).unwrap();

        let saved = f.service.saved_workflow("Billing_Flow.json").unwrap();
        assert_eq!(saved.name.as_deref(), Some("Billing Flow"));
        assert_eq!(saved.nodes.len(), 1);
        assert_eq!(saved.meta.unwrap().version, Some(serde_json::Value::from("1.0")));
        assert!(notifications(&mut rx).contains(&Notification::success("Workflow saved as Billing_Flow.json (JSON also printed to console)")));
    }

    #[test]
    fn test_save_failure_keeps_graph() {
        let f = fixture();
        f.editor.drop_tool(&tool(&f, "delay"), Point::ORIGIN).unwrap();
        f.service.set_available(false);

        let mut rx = f.editor.channel().subscribe();
        assert!(f.runtime.block_on(f.editor.save_workflow()).is_err());
        assert_eq!(notifications(&mut rx), vec![Notification::error("Failed to save workflow")]);
        assert_eq!(f.editor.graph().graph().node_count(), 1);
    }

    #[test]
    fn test_invalid_json_leaves_canvas_untouched() {
        let f = fixture();
        let id = f.editor.drop_tool(&tool(&f, "delay"), Point::ORIGIN).unwrap();

        let mut rx = f.editor.channel().subscribe();
        assert!(f.editor.load_from_json(r#"{"nodes":"oops"}"#).is_err());
        assert!(f.editor.load_from_json("   ").is_err());

        let n = notifications(&mut rx);
        assert_eq!(n.len(), 2);
        assert_eq!(n[0].level, NotificationLevel::Error);
        assert!(n[0].message.starts_with("Failed to load workflow:"));
        assert_eq!(n[1], Notification::warning("Please provide JSON data to load"));

        let graph = f.editor.graph();
        assert_eq!(graph.graph().node_count(), 1);
        assert!(graph.node(&id).is_some());
    }

    #[test]
    fn test_load_from_json_sets_name() {
        let f = fixture();
        let text = r#"{
            "name": "Imported",
            "nodes": [
                {"id": "node_1", "type": "webhook", "name": "Hook", "position": {"x": 0, "y": 0}},
                {"id": "node_2", "type": "delay", "name": "Wait", "position": {"x": 300, "y": 0}}
            ],
            "connections": [{"id": "conn_1", "from": "node_1", "to": "node_2"}]
        }"#;

        let mut rx = f.editor.channel().subscribe();
        f.editor.load_from_json(text).unwrap();
        assert_eq!(f.editor.workflow_name().as_deref(), Some("Imported"));
        assert!(notifications(&mut rx).contains(&Notification::success("Workflow \"Imported\" loaded successfully!")));
        assert_eq!(f.editor.graph().graph().connection_count(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let f = fixture();
        let path = std::env::temp_dir().join(format!("flowcanvas-{}.json", utils::longid()));
        std::fs::write(&path, r#"{"nodes": [{"id": "node_3", "type": "delay", "name": "Wait", "position": {"x": 10, "y": 20}}], "connections": []}"#).unwrap();

        f.editor.load_from_file(&path).unwrap();
        assert!(f.editor.graph().node("node_3").is_some());
        std::fs::remove_file(&path).unwrap();

        assert!(f.editor.load_from_file(&path).is_err());
        assert!(f.editor.graph().node("node_3").is_some());
    }

    #[test]
    fn test_load_template_replaces_canvas() {
        let f = fixture();
        f.editor.drop_tool(&tool(&f, "delay"), Point::ORIGIN).unwrap();

        let mut rx = f.editor.channel().subscribe();
        f.runtime.block_on(f.editor.load_template("template2")).unwrap();

        let graph = f.editor.graph();
        assert_eq!(graph.graph().node_count(), 3);
        assert_eq!(graph.graph().connection_count(), 2);
        drop(graph);
        assert_eq!(f.editor.workflow_name().as_deref(), Some("Data Processing Pipeline - Copy"));
        assert!(notifications(&mut rx).contains(&Notification::success("Template \"Data Processing Pipeline\" loaded successfully")));

        assert!(f.runtime.block_on(f.editor.load_template("template404")).is_err());
        assert_eq!(f.editor.graph().graph().node_count(), 3);
    }

    #[test]
    fn test_execute_marks_nodes_running() {
        let f = fixture();
        let id = f.editor.drop_tool(&tool(&f, "delay"), Point::ORIGIN).unwrap();
        f.runtime.block_on(f.editor.execute_workflow()).unwrap();

        assert_eq!(f.service.execution_count(), 1);
        assert_eq!(f.editor.graph().node(&id).unwrap().status, NodeStatus::Running);
    }

    #[test]
    fn test_delete_workflow_clears_session() {
        let f = fixture();
        f.editor.drop_tool(&tool(&f, "delay"), Point::ORIGIN).unwrap();
        f.editor.set_workflow_name("Billing Flow");
        f.runtime.block_on(f.editor.save_workflow()).unwrap();
        assert!(f.local.get("workflow_data").unwrap().is_some());

        let confirmation = f.editor.request_delete_workflow();
        assert_eq!(confirmation, Confirmation::DeleteWorkflow("Billing Flow".to_string()));
        assert!(f.runtime.block_on(f.editor.confirm(&confirmation)).unwrap());

        assert!(f.editor.graph().graph().is_empty());
        assert!(f.local.get("workflow_data").unwrap().is_none());
        assert!(f.service.saved_workflow("Billing_Flow.json").is_none());
        assert_eq!(f.editor.workflow_name().as_deref(), Some("Workflow 1"));

        // already consumed
        assert!(!f.runtime.block_on(f.editor.confirm(&confirmation)).unwrap());
    }

    #[test]
    fn test_delete_missing_workflow_reports_server_message() {
        let f = fixture();
        f.editor.set_workflow_name("Nowhere");
        let confirmation = f.editor.request_delete_workflow();

        let mut rx = f.editor.channel().subscribe();
        assert!(f.runtime.block_on(f.editor.confirm(&confirmation)).is_err());
        assert_eq!(notifications(&mut rx), vec![Notification::error("Workflow file not found")]);
    }

    #[test]
    fn test_handle_key() {
        let f = fixture();
        let id = f.editor.drop_tool(&tool(&f, "delay"), Point::ORIGIN).unwrap();

        assert_eq!(f.editor.handle_key("Delete", false), KeyOutcome::Ignored);
        f.editor.graph_mut().select_node(&id);
        let outcome = f.editor.handle_key("Delete", false);
        assert_eq!(outcome, KeyOutcome::Confirm(Confirmation::DeleteNode(id.clone())));
        f.editor.cancel_confirmation();

        assert_eq!(f.editor.handle_key("=", true), KeyOutcome::Viewport(true));
        assert_eq!(f.editor.viewport().zoom_percentage(), 120);
        assert_eq!(f.editor.handle_key("ArrowLeft", false), KeyOutcome::Viewport(true));
        assert_eq!(f.editor.graph().transform().offset.x, f.editor.viewport().offset().x);

        f.editor.graph_mut().handle_endpoint_click(&id, true);
        assert_eq!(f.editor.handle_key("Escape", false), KeyOutcome::ConnectionCancelled);
        assert_eq!(f.editor.handle_key("Escape", false), KeyOutcome::Ignored);
    }

    #[test]
    fn test_launch_restores_cached_session() {
        let f = fixture();
        f.editor.drop_tool(&tool(&f, "delay"), Point::ORIGIN).unwrap();

        let editor = EditorBuilder::new().local_store(f.local.clone()).service(f.service.clone()).runtime(f.runtime.clone()).build().unwrap();
        assert!(editor.graph().graph().is_empty());
        editor.launch();
        assert_eq!(editor.graph().graph().node_count(), 1);
        editor.shutdown();
        assert!(!editor.is_running());
    }

    #[test]
    fn test_restore_layout() {
        let f = fixture();
        let layout = LayoutModel {
            panel_state: Some(PanelState {
                left_panel_visible: false,
                workflow_name: Some("Saved Flow".to_string()),
            }),
            canvas_state: Some(CanvasState {
                zoom: 9.0,
                offset: Point::new(30.0, 40.0),
            }),
        };
        f.runtime.block_on(f.service.save_layout(&layout)).unwrap();

        f.runtime.block_on(f.editor.restore_layout());
        assert_eq!(f.editor.workflow_name().as_deref(), Some("Saved Flow"));
        assert!(!f.editor.left_panel_visible());
        assert_eq!(f.editor.viewport().scale(), 3.0);
        assert_eq!(f.editor.graph().transform().offset, Point::new(30.0, 40.0));
    }

    #[test]
    fn test_default_name_without_layout() {
        let f = fixture();
        f.local.set("workflow_data", "{}").unwrap();
        f.local.set("workflow_draft", "{}").unwrap();
        f.local.set("theme", "dark").unwrap();

        f.runtime.block_on(f.editor.restore_layout());
        assert_eq!(f.editor.workflow_name().as_deref(), Some("Workflow 3"));
        assert!(f.editor.left_panel_visible());
    }

    #[test]
    fn test_layout_sync_pushes_panel_changes() {
        let f = fixture();
        f.editor.launch();
        f.editor.set_left_panel_visible(false);
        f.editor.set_workflow_name("Synced");

        let service = f.service.clone();
        let layout = f.runtime.block_on(async move {
            for _ in 0..100 {
                if let Ok(Some(layout)) = service.load_layout().await {
                    let panel = layout.panel_state.clone().unwrap_or_default();
                    if panel.workflow_name.as_deref() == Some("Synced") {
                        return Some(layout);
                    }
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            None
        });

        let layout = layout.unwrap();
        assert!(!layout.panel_state.unwrap().left_panel_visible);
        assert_eq!(layout.canvas_state.unwrap().zoom, 1.0);
        f.editor.shutdown();
    }

    #[test]
    fn test_layout_sync_failure_is_silent_and_not_retried() {
        let f = fixture();
        f.editor.launch();
        let mut rx = f.editor.channel().subscribe();
        f.service.set_available(false);

        f.editor.set_left_panel_visible(false);
        f.editor.set_workflow_name("Offline");
        f.runtime.block_on(async { tokio::time::sleep(Duration::from_millis(200)).await });

        assert!(notifications(&mut rx).is_empty());
        assert_eq!(f.editor.workflow_name().as_deref(), Some("Offline"));
        assert!(!f.editor.left_panel_visible());

        f.service.set_available(true);
        let service = f.service.clone();
        let stored = f.runtime.block_on(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            service.load_layout().await
        });
        let stored_name = stored.unwrap().and_then(|layout| layout.panel_state).and_then(|panel| panel.workflow_name);
        assert_ne!(stored_name.as_deref(), Some("Offline"));
        f.editor.shutdown();
    }
}
