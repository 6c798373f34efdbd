//! Error types for FlowCanvas.
//!
//! All errors in FlowCanvas are represented by the `FlowCanvasError` enum,
//! which provides specific variants for different error categories.

use std::{io::ErrorKind, string::FromUtf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all FlowCanvas operations.
///
/// Nothing here is fatal: every variant is caught by the editor and turned into a
/// notification or a log line while the in-memory graph stays as it was.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum FlowCanvasError {
    /// Editor lifecycle errors (startup, shutdown, wiring).
    #[error("{0}")]
    Editor(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Workflow document errors (malformed JSON, missing keys).
    #[error("{0}")]
    Workflow(String),

    /// Node lookup or mutation errors.
    #[error("{0}")]
    Node(String),

    /// Connection rule violations.
    #[error("{0}")]
    Connection(String),

    /// Viewport geometry errors (degenerate screen rect).
    #[error("{0}")]
    Viewport(String),

    /// Local cache errors.
    #[error("{0}")]
    Store(String),

    /// Transport-level failures talking to the workflow service.
    #[error("{0}")]
    Http(String),

    /// Non-2xx replies from the workflow service.
    #[error("service error {code}: {message}")]
    Service {
        code: u16,
        message: String,
    },

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// Event queue errors.
    #[error("{0}")]
    Queue(String),
}

impl FlowCanvasError {
    /// The message a remote service attached to its error reply, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            FlowCanvasError::Service {
                message,
                ..
            } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

impl From<FlowCanvasError> for String {
    fn from(val: FlowCanvasError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for FlowCanvasError {
    fn from(error: std::io::Error) -> Self {
        FlowCanvasError::IoError(error.to_string())
    }
}

impl From<FlowCanvasError> for std::io::Error {
    fn from(val: FlowCanvasError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<FromUtf8Error> for FlowCanvasError {
    fn from(_: FromUtf8Error) -> Self {
        FlowCanvasError::Convert("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for FlowCanvasError {
    fn from(error: serde_json::Error) -> Self {
        FlowCanvasError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for FlowCanvasError {
    fn from(error: toml::de::Error) -> Self {
        FlowCanvasError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for FlowCanvasError {
    fn from(error: reqwest::Error) -> Self {
        FlowCanvasError::Http(error.to_string())
    }
}
