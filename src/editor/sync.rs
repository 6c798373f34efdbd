use std::sync::Arc;

use tokio::{runtime::Runtime, sync::broadcast::error::RecvError};
use tracing::{debug, warn};

use crate::{
    ShareLock,
    common::Shutdown,
    events::Channel,
    model::{CanvasState, LayoutModel, PanelState},
    store::WorkflowService,
    viewport::ViewportEngine,
};

/// Background task pushing the layout record after layout-affecting events.
///
/// Best effort: requests go out one at a time in event order, failures are
/// logged and never retried.
pub struct LayoutSync {
    viewport: ShareLock<ViewportEngine>,
    panel: ShareLock<PanelState>,
    service: Arc<dyn WorkflowService>,
    channel: Arc<Channel>,

    runtime: Arc<Runtime>,
    shutdown: Arc<Shutdown>,
}

impl LayoutSync {
    pub fn new(
        viewport: ShareLock<ViewportEngine>,
        panel: ShareLock<PanelState>,
        service: Arc<dyn WorkflowService>,
        channel: Arc<Channel>,
        runtime: Arc<Runtime>,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            viewport,
            panel,
            service,
            channel,
            runtime,
            shutdown,
        }
    }

    /// Current layout: panel chrome plus the viewport transform.
    pub fn snapshot(
        viewport: &ShareLock<ViewportEngine>,
        panel: &ShareLock<PanelState>,
    ) -> LayoutModel {
        let canvas_state = {
            let viewport = viewport.read().unwrap();
            CanvasState {
                zoom: viewport.scale(),
                offset: viewport.offset(),
            }
        };
        LayoutModel {
            panel_state: Some(panel.read().unwrap().clone()),
            canvas_state: Some(canvas_state),
        }
    }

    pub fn monitor(&self) {
        // subscribe before spawning so nothing emitted after launch is missed
        let mut event_queue = self.channel.subscribe();
        let viewport = self.viewport.clone();
        let panel = self.panel.clone();
        let service = self.service.clone();
        let shutdown = self.shutdown.clone();

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    received = event_queue.recv() => match received {
                        Ok(event) if event.affects_layout() => {
                            let layout = Self::snapshot(&viewport, &panel);
                            match service.save_layout(&layout).await {
                                Ok(_) => debug!("layout saved after {:?}", event),
                                Err(err) => warn!("failed to save layout: {}", err),
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(n)) => debug!("layout sync skipped {} events", n),
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });
    }
}
