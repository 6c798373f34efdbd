use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    geometry::{Point, Rect, Size},
    model::{NodeModel, ToolTemplate},
};

/// node id, `node_<counter>` for nodes created on the canvas
pub type NodeId = String;

/// Execution feedback shown on a node. Set by test/execution results, never by the graph itself.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

/// A configurable workflow step placed on the canvas.
///
/// Position and size are authoritative here; whatever the host paints is rebuilt
/// from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// node id, immutable after creation
    pub id: NodeId,
    /// tool schema id this node was created from
    pub kind: String,
    /// display name
    pub name: String,
    /// icon name from the tool catalog
    pub icon: String,
    /// display description
    pub description: String,
    /// schema-defined configuration values
    pub properties: Map<String, Value>,
    /// top-left corner in canvas space
    pub position: Point,
    /// execution feedback
    pub status: NodeStatus,
    /// rendered size, measured by the host or the configured default
    pub size: Size,
}

impl Node {
    /// Seed a node from a catalog template.
    pub fn from_template(
        id: NodeId,
        tool: &ToolTemplate,
        position: Point,
        size: Size,
    ) -> Self {
        Self {
            id,
            kind: tool.id.clone(),
            name: tool.name.clone(),
            icon: tool.icon.clone(),
            description: tool.description.clone(),
            properties: tool.default_properties(),
            position,
            status: NodeStatus::Idle,
            size,
        }
    }

    pub fn from_model(
        model: NodeModel,
        size: Size,
    ) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            name: model.name,
            icon: model.icon,
            description: model.description,
            properties: model.properties,
            position: model.position,
            status: model.status,
            size,
        }
    }

    pub fn to_model(&self) -> NodeModel {
        NodeModel {
            id: self.id.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            description: self.description.clone(),
            properties: self.properties.clone(),
            position: self.position,
            status: self.status,
        }
    }

    /// Canvas-space rectangle the node occupies.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Right-center anchor where outgoing connections start.
    pub fn output_anchor(&self) -> Point {
        Point::new(self.position.x + self.size.width, self.position.y + self.size.height / 2.0)
    }

    /// Left-center anchor where incoming connections end.
    pub fn input_anchor(&self) -> Point {
        Point::new(self.position.x, self.position.y + self.size.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_anchors() {
        let model = NodeModel {
            id: "node_1".to_string(),
            position: Point::new(300.0, 0.0),
            ..Default::default()
        };
        let node = Node::from_model(model, Size::new(100.0, 50.0));
        assert_eq!(node.output_anchor(), Point::new(400.0, 25.0));
        assert_eq!(node.input_anchor(), Point::new(300.0, 25.0));
        assert_eq!(node.bounds(), Rect::new(300.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_from_template_starts_idle_with_defaults() {
        let tool: ToolTemplate = serde_json::from_value(json!({
            "id": "delay",
            "name": "Delay",
            "icon": "clock",
            "description": "Add delay between actions",
            "properties": {
                "duration": {"type": "number", "default": 5},
                "unit": {"type": "select", "options": ["seconds", "minutes"], "default": "seconds"}
            }
        }))
        .unwrap();
        let node = Node::from_template("node_4".to_string(), &tool, Point::new(1.0, 2.0), Size::new(180.0, 80.0));
        assert_eq!(node.kind, "delay");
        assert_eq!(node.status, NodeStatus::Idle);
        assert_eq!(node.properties.get("duration"), Some(&json!(5)));
        assert_eq!(node.properties.get("unit"), Some(&json!("seconds")));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(NodeStatus::Running.as_ref(), "running");
        assert_eq!("error".parse::<NodeStatus>().unwrap(), NodeStatus::Error);
    }
}
