use std::{sync::Arc, time::Duration};

use tokio::runtime::{Builder, Runtime};

use crate::{
    CacheType, Config, Editor, FlowCanvasError, Result, ServiceType,
    graph::Inspector,
    store::{FileLocalStore, HttpWorkflowService, LocalStore, MemLocalStore, MemWorkflowService, WorkflowService},
};

/// Assembles an [`Editor`]; anything not injected is created from the [`Config`].
pub struct EditorBuilder {
    config: Config,
    local: Option<Arc<dyn LocalStore>>,
    service: Option<Arc<dyn WorkflowService>>,
    inspector: Option<Arc<dyn Inspector>>,
    async_worker_thread_number: u16,
    rt: Option<Arc<Runtime>>,
}

impl Default for EditorBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            local: None,
            service: None,
            inspector: None,
            async_worker_thread_number: 2,
            rt: None,
        }
    }
}

impl EditorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn local_store(
        mut self,
        local: Arc<dyn LocalStore>,
    ) -> Self {
        self.local = Some(local);
        self
    }

    pub fn service(
        mut self,
        service: Arc<dyn WorkflowService>,
    ) -> Self {
        self.service = Some(service);
        self
    }

    pub fn inspector(
        mut self,
        inspector: Arc<dyn Inspector>,
    ) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.async_worker_thread_number = n;
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    fn build_local(&self) -> Result<Arc<dyn LocalStore>> {
        let cache = &self.config.cache;
        Ok(match cache.cache_type {
            CacheType::Mem => Arc::new(MemLocalStore::new(cache.capacity)),
            CacheType::File => {
                let path = cache.path.as_deref().ok_or_else(|| FlowCanvasError::Config("cache.path is required for the file cache".to_string()))?;
                Arc::new(FileLocalStore::new(path)?)
            }
        })
    }

    fn build_service(&self) -> Result<Arc<dyn WorkflowService>> {
        let service = &self.config.service;
        Ok(match service.service_type {
            ServiceType::Mem => Arc::new(MemWorkflowService::new()?),
            ServiceType::Http => Arc::new(HttpWorkflowService::new(&service.base_url, Duration::from_millis(service.timeout_ms))?),
        })
    }

    pub fn build(self) -> Result<Editor> {
        let runtime = match &self.rt {
            Some(rt) => rt.clone(),
            None => Arc::new(
                Builder::new_multi_thread()
                    .worker_threads(self.async_worker_thread_number.max(1).into())
                    .enable_all()
                    .build()
                    .map_err(|e| FlowCanvasError::Editor(format!("failed to start runtime: {}", e)))?,
            ),
        };
        let local = match &self.local {
            Some(local) => local.clone(),
            None => self.build_local()?,
        };
        let service = match &self.service {
            Some(service) => service.clone(),
            None => self.build_service()?,
        };

        Ok(Editor::new(&self.config, local, service, self.inspector, runtime))
    }
}
