use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{geometry::Point, graph::NodeStatus};

/// `{id, type, name, icon, description, properties, position, status}`.
///
/// Display fields default to empty so template documents that only carry
/// `id`, `type`, `position` and `properties` still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeModel {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub status: NodeStatus,
}
