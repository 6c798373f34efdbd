use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, trace};

use crate::{
    FlowCanvasError, Result,
    model::{LayoutModel, ServiceReply, TemplateRecord, ToolTemplate, WorkflowDocument},
    store::WorkflowService,
};

/// `{status, data}` envelope of the layout load endpoint.
#[derive(Debug, Deserialize)]
struct LayoutReply {
    #[serde(default)]
    data: Option<LayoutModel>,
}

/// [`WorkflowService`] over HTTP.
///
/// Keeps a cookie store so the server can key layout records by session.
#[derive(Debug, Clone)]
pub struct HttpWorkflowService {
    client: Client,
    base_url: String,
}

impl HttpWorkflowService {
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(
        &self,
        path: &str,
    ) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        trace!("HttpWorkflowService reply {}: {}", status, body);

        if !status.is_success() {
            let message = serde_json::from_str::<ServiceReply>(&body).ok().and_then(|r| r.message).unwrap_or_default();
            debug!("service replied {} ({})", status, message);
            return Err(FlowCanvasError::Service {
                code: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| FlowCanvasError::Convert(format!("malformed service reply: {}", e)))
    }
}

#[async_trait]
impl WorkflowService for HttpWorkflowService {
    async fn fetch_tools(&self) -> Result<Vec<ToolTemplate>> {
        self.send(self.client.get(self.url("/api/tools"))).await
    }

    async fn save_workflow(
        &self,
        doc: &WorkflowDocument,
    ) -> Result<ServiceReply> {
        self.send(self.client.post(self.url("/api/workflow/save")).json(doc)).await
    }

    async fn delete_workflow(
        &self,
        name: &str,
    ) -> Result<ServiceReply> {
        self.send(self.client.post(self.url("/api/workflow/delete")).json(&json!({ "name": name }))).await
    }

    async fn execute_workflow(
        &self,
        doc: &WorkflowDocument,
    ) -> Result<ServiceReply> {
        self.send(self.client.post(self.url("/api/workflow/execute")).json(doc)).await
    }

    async fn load_template(
        &self,
        id: &str,
    ) -> Result<TemplateRecord> {
        self.send(self.client.get(self.url(&format!("/api/workflow/load/{}", id)))).await
    }

    async fn list_templates(&self) -> Result<Vec<TemplateRecord>> {
        self.send(self.client.get(self.url("/api/workflow/templates"))).await
    }

    async fn save_layout(
        &self,
        layout: &LayoutModel,
    ) -> Result<ServiceReply> {
        self.send(self.client.post(self.url("/api/layout/save")).json(layout)).await
    }

    async fn load_layout(&self) -> Result<Option<LayoutModel>> {
        let reply: LayoutReply = self.send(self.client.get(self.url("/api/layout/load"))).await?;
        Ok(reply.data.filter(|layout| layout.panel_state.is_some() || layout.canvas_state.is_some()))
    }
}
