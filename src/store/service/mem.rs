use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::{
    FlowCanvasError, Result,
    common::MemCache,
    model::{LayoutModel, ServiceReply, TemplateRecord, ToolTemplate, WorkflowDocument},
    store::{WorkflowService, service::sanitize_name},
    utils,
};

const WORKFLOWS_DIR: &str = "workflows";
const CAPACITY: usize = 1024;

/// In-process [`WorkflowService`] answering the way the workflow server does.
///
/// Seeded with the stock tool catalog and templates. Saved workflows live in
/// memory under their sanitized file name.
pub struct MemWorkflowService {
    tools: Vec<ToolTemplate>,
    templates: Vec<TemplateRecord>,
    workflows: MemCache<String, WorkflowDocument>,
    layouts: MemCache<String, LayoutModel>,
    session: String,
    executions: AtomicUsize,
    available: AtomicBool,
}

impl MemWorkflowService {
    /// Service seeded with the stock catalog and templates.
    pub fn new() -> Result<Self> {
        let tools = serde_json::from_str::<Vec<ToolTemplate>>(include_str!("assets/tools.json"))?;
        let templates = serde_json::from_str::<Vec<TemplateRecord>>(include_str!("assets/templates.json"))?;
        Ok(Self::with_catalog(tools, templates))
    }

    pub fn with_catalog(
        tools: Vec<ToolTemplate>,
        templates: Vec<TemplateRecord>,
    ) -> Self {
        Self {
            tools,
            templates,
            workflows: MemCache::new(CAPACITY),
            layouts: MemCache::new(CAPACITY),
            session: uuid::Uuid::new_v4().to_string(),
            executions: AtomicUsize::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the server going away; every call then fails with a transport error.
    pub fn set_available(
        &self,
        available: bool,
    ) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// A saved workflow by file name, e.g. `Billing_Flow.json`.
    pub fn saved_workflow(
        &self,
        filename: &str,
    ) -> Option<WorkflowDocument> {
        self.workflows.get(&filename.to_string())
    }

    pub fn execution_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FlowCanvasError::Http("workflow service unavailable".to_string()))
        }
    }
}

#[async_trait]
impl WorkflowService for MemWorkflowService {
    async fn fetch_tools(&self) -> Result<Vec<ToolTemplate>> {
        self.check_available()?;
        Ok(self.tools.clone())
    }

    async fn save_workflow(
        &self,
        doc: &WorkflowDocument,
    ) -> Result<ServiceReply> {
        self.check_available()?;
        let name = doc.name.clone().unwrap_or_else(|| format!("Workflow {}", self.workflows.keys().len() + 1));

        let mut safe = sanitize_name(&name);
        if safe.is_empty() {
            safe = format!("Workflow_{}", utils::time::stamp_now());
        }
        let filename = format!("{}.json", safe);
        let file_path = format!("{}/{}", WORKFLOWS_DIR, filename);
        trace!("MemWorkflowService::save_workflow({})", file_path);

        let mut stored = doc.clone();
        stored.name = Some(name);
        stored.meta.get_or_insert_with(Default::default);
        stored.extra.insert("saved_at".to_string(), Value::String(utils::time::iso_now()));
        stored.extra.insert("file_path".to_string(), Value::String(file_path.clone()));
        self.workflows.set(filename.clone(), stored);

        let mut reply = ServiceReply::success(format!("Workflow saved as {}", filename));
        reply.extra.insert("file_path".to_string(), json!(file_path));
        reply.extra.insert("filename".to_string(), json!(filename));
        Ok(reply)
    }

    async fn delete_workflow(
        &self,
        name: &str,
    ) -> Result<ServiceReply> {
        self.check_available()?;
        let safe = sanitize_name(name);
        if safe.is_empty() {
            return Err(FlowCanvasError::Service {
                code: 400,
                message: "Invalid workflow name".to_string(),
            });
        }

        let filename = format!("{}.json", safe);
        if self.workflows.remove(&filename).is_none() {
            return Err(FlowCanvasError::Service {
                code: 404,
                message: "Workflow file not found".to_string(),
            });
        }

        let mut reply = ServiceReply::success(format!("Workflow '{}' deleted successfully", name));
        reply.extra.insert("deleted_file".to_string(), json!(filename));
        Ok(reply)
    }

    async fn execute_workflow(
        &self,
        doc: &WorkflowDocument,
    ) -> Result<ServiceReply> {
        self.check_available()?;
        debug!("execute workflow with {} nodes", doc.nodes.len());
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(ServiceReply::success("Workflow execution started"))
    }

    async fn load_template(
        &self,
        id: &str,
    ) -> Result<TemplateRecord> {
        self.check_available()?;
        self.templates.iter().find(|t| t.id == id).cloned().ok_or_else(|| FlowCanvasError::Service {
            code: 404,
            message: "Workflow not found".to_string(),
        })
    }

    async fn list_templates(&self) -> Result<Vec<TemplateRecord>> {
        self.check_available()?;
        Ok(self.templates.clone())
    }

    async fn save_layout(
        &self,
        layout: &LayoutModel,
    ) -> Result<ServiceReply> {
        self.check_available()?;
        let mut stored = self.layouts.get(&self.session).unwrap_or_default();
        if layout.panel_state.is_some() {
            stored.panel_state = layout.panel_state.clone();
        }
        if layout.canvas_state.is_some() {
            stored.canvas_state = layout.canvas_state;
        }
        self.layouts.set(self.session.clone(), stored);
        Ok(ServiceReply::success("Layout saved successfully"))
    }

    async fn load_layout(&self) -> Result<Option<LayoutModel>> {
        self.check_available()?;
        Ok(self.layouts.get(&self.session))
    }
}

#[cfg(test)]
mod tests {
    use tokio::runtime::Runtime;

    use super::*;
    use crate::model::{CanvasState, PanelState};

    #[test]
    fn test_stock_catalog() {
        let runtime = Runtime::new().unwrap();
        let service = MemWorkflowService::new().unwrap();

        let tools = runtime.block_on(service.fetch_tools()).unwrap();
        assert_eq!(tools.len(), 8);
        assert!(tools.iter().any(|t| t.id == "http_request"));

        let templates = runtime.block_on(service.list_templates()).unwrap();
        assert_eq!(templates.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["template1", "template2", "template3"]);

        let template = runtime.block_on(service.load_template("template2")).unwrap();
        assert_eq!(template.name, "Data Processing Pipeline");
        assert_eq!(template.workflow_data.connections[1].source, "node2");

        let err = runtime.block_on(service.load_template("nope")).unwrap_err();
        assert_eq!(err.server_message(), Some("Workflow not found"));
    }

    #[test]
    fn test_save_then_delete() {
        let runtime = Runtime::new().unwrap();
        let service = MemWorkflowService::new().unwrap();
        let doc = WorkflowDocument {
            name: Some("Billing Flow!".to_string()),
            ..Default::default()
        };

        let reply = runtime.block_on(service.save_workflow(&doc)).unwrap();
        assert_eq!(reply.message.as_deref(), Some("Workflow saved as Billing_Flow.json"));
        let saved = service.saved_workflow("Billing_Flow.json").unwrap();
        assert_eq!(saved.extra.get("file_path"), Some(&json!("workflows/Billing_Flow.json")));
        assert!(saved.extra.contains_key("saved_at"));

        let reply = runtime.block_on(service.delete_workflow("Billing Flow!")).unwrap();
        assert_eq!(reply.message.as_deref(), Some("Workflow 'Billing Flow!' deleted successfully"));

        let err = runtime.block_on(service.delete_workflow("Billing Flow!")).unwrap_err();
        assert_eq!(
            err,
            FlowCanvasError::Service {
                code: 404,
                message: "Workflow file not found".to_string()
            }
        );
        let err = runtime.block_on(service.delete_workflow("!!")).unwrap_err();
        assert_eq!(err.server_message(), Some("Invalid workflow name"));
    }

    #[test]
    fn test_layout_merges_partial_records() {
        let runtime = Runtime::new().unwrap();
        let service = MemWorkflowService::new().unwrap();
        assert_eq!(runtime.block_on(service.load_layout()).unwrap(), None);

        let panel = LayoutModel {
            panel_state: Some(PanelState {
                left_panel_visible: false,
                workflow_name: Some("Workflow 1".to_string()),
            }),
            canvas_state: None,
        };
        runtime.block_on(service.save_layout(&panel)).unwrap();
        let canvas = LayoutModel {
            panel_state: None,
            canvas_state: Some(CanvasState {
                zoom: 2.0,
                ..Default::default()
            }),
        };
        runtime.block_on(service.save_layout(&canvas)).unwrap();

        let layout = runtime.block_on(service.load_layout()).unwrap().unwrap();
        assert!(!layout.panel_state.unwrap().left_panel_visible);
        assert_eq!(layout.canvas_state.unwrap().zoom, 2.0);
    }

    #[test]
    fn test_unavailable() {
        let runtime = Runtime::new().unwrap();
        let service = MemWorkflowService::new().unwrap();
        service.set_available(false);
        assert!(matches!(runtime.block_on(service.fetch_tools()), Err(FlowCanvasError::Http(_))));
        service.set_available(true);
        runtime.block_on(service.execute_workflow(&WorkflowDocument::default())).unwrap();
        assert_eq!(service.execution_count(), 1);
    }
}
