//! # FlowCanvas
//!
//! FlowCanvas is the engine behind a node-and-wire workflow editor. It owns
//! everything a browser-style canvas needs except the painting itself.
//!
//! ## Core Features
//!
//! - **Viewport**: pan, cursor-anchored zoom, fit-to-content and eased animations with exact screen/canvas mapping
//! - **Graph Model**: nodes, directed connections, a click-to-connect state machine and two-phase confirmations
//! - **Persistence**: a local cache of the in-progress session plus a remote workflow service for saves, templates and layout
//! - **Event-Driven**: every mutation and user-facing message is broadcast on one channel
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowcanvas::{EditorBuilder, geometry::Point};
//!
//! let editor = EditorBuilder::new().build()?;
//! editor.channel().on_notification(|n| println!("{:?}: {}", n.level, n.message));
//! editor.launch();
//!
//! let rt = editor.runtime();
//! rt.block_on(editor.restore_layout());
//! rt.block_on(editor.fetch_tools())?;
//! let node = editor.drop_tool_by_id("http_request", Point::new(400.0, 300.0))?;
//! editor.graph_mut().select_node(&node);
//! rt.block_on(editor.save_workflow())?;
//! ```

mod builder;
mod common;
mod config;
mod editor;
mod error;
mod utils;

pub mod events;
pub mod geometry;
pub mod graph;
pub mod model;
pub mod store;
pub mod viewport;

use std::sync::{Arc, RwLock};

pub use builder::EditorBuilder;
pub use config::{CacheConfig, CacheType, Config, GraphConfig, ServiceConfig, ServiceType, ViewportConfig};
pub use editor::{Editor, KeyOutcome};
pub use error::FlowCanvasError;
pub use events::{Channel, EditorEvent, Notification, NotificationLevel, ViewportEvent};
pub use geometry::{Point, Rect, Size};
pub use graph::{Confirmation, DrawOutcome, GraphModel, NodeId, NodeStatus, RenderFrame};
pub use model::*;
pub use viewport::ViewportEngine;

/// Result type alias for FlowCanvas operations.
pub type Result<T> = std::result::Result<T, FlowCanvasError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
