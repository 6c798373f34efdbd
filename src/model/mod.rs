//! Wire documents exchanged with the local cache, files, pasted text and the workflow service.

mod connection;
mod layout;
mod node;
mod template;
mod workflow;

pub use connection::ConnectionModel;
pub use layout::{CanvasState, LayoutModel, PanelState};
pub use node::NodeModel;
pub use template::{PropertyDef, ServiceReply, TemplateRecord, ToolTemplate};
pub use workflow::{WorkflowDocument, WorkflowMeta};
