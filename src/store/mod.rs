//! Persistence backends.
//!
//! Two channels:
//! - [`LocalStore`]: client-local key-value cache holding the in-progress session
//! - [`WorkflowService`]: remote request/response endpoints (tools, named workflows,
//!   templates, layout)

mod local;
mod service;

use std::error::Error;

use crate::FlowCanvasError;

pub use local::{FileLocalStore, LocalStore, MemLocalStore};
pub use service::{HttpWorkflowService, MemWorkflowService, WorkflowService};

/// Maps backend errors to FlowCanvasError.
fn map_store_err(err: impl Error) -> FlowCanvasError {
    FlowCanvasError::Store(err.to_string())
}
