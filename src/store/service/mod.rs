mod http;
mod mem;

use async_trait::async_trait;

use crate::{
    Result,
    model::{LayoutModel, ServiceReply, TemplateRecord, ToolTemplate, WorkflowDocument},
};

pub use http::HttpWorkflowService;
pub use mem::MemWorkflowService;

/// Remote workflow endpoints.
///
/// Every call is one request/response pair. Non-2xx replies come back as
/// [`FlowCanvasError::Service`](crate::FlowCanvasError::Service) carrying the
/// server's message when it sent one.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// `GET /api/tools`
    async fn fetch_tools(&self) -> Result<Vec<ToolTemplate>>;

    /// `POST /api/workflow/save`
    async fn save_workflow(
        &self,
        doc: &WorkflowDocument,
    ) -> Result<ServiceReply>;

    /// `POST /api/workflow/delete`
    async fn delete_workflow(
        &self,
        name: &str,
    ) -> Result<ServiceReply>;

    /// `POST /api/workflow/execute`
    async fn execute_workflow(
        &self,
        doc: &WorkflowDocument,
    ) -> Result<ServiceReply>;

    /// `GET /api/workflow/load/{id}`
    async fn load_template(
        &self,
        id: &str,
    ) -> Result<TemplateRecord>;

    /// `GET /api/workflow/templates`
    async fn list_templates(&self) -> Result<Vec<TemplateRecord>>;

    /// `POST /api/layout/save`
    async fn save_layout(
        &self,
        layout: &LayoutModel,
    ) -> Result<ServiceReply>;

    /// `GET /api/layout/load`; `None` when nothing was saved for this session.
    async fn load_layout(&self) -> Result<Option<LayoutModel>>;
}

/// File-name-safe form of a workflow name: alphanumerics, space, `-` and `_`
/// kept, trailing whitespace trimmed, spaces turned into underscores.
pub(crate) fn sanitize_name(name: &str) -> String {
    let kept: String = name.chars().filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_')).collect();
    kept.trim_end().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("My Flow: v2!"), "My_Flow_v2");
        assert_eq!(sanitize_name("  data-sync_1  "), "__data-sync_1");
        assert_eq!(sanitize_name("???"), "");
    }
}
