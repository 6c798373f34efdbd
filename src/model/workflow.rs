use std::sync::LazyLock;

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};

use crate::{
    FlowCanvasError, Result,
    model::{ConnectionModel, NodeModel},
};

/// Structural schema every incoming document is checked against before it may replace the graph.
static WORKFLOW_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    serde_json::json!({
        "type": "object",
        "required": ["nodes", "connections"],
        "properties": {
            "name": { "type": ["string", "null"] },
            "nodes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {
                        "id": { "type": "string", "minLength": 1 },
                        "type": { "type": "string" },
                        "name": { "type": "string" },
                        "icon": { "type": "string" },
                        "description": { "type": "string" },
                        "properties": { "type": "object" },
                        "position": {
                            "type": "object",
                            "required": ["x", "y"],
                            "properties": {
                                "x": { "type": "number" },
                                "y": { "type": "number" }
                            }
                        },
                        "status": { "enum": ["idle", "running", "success", "error"] }
                    }
                }
            },
            "connections": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {
                        "id": { "type": "string" },
                        "source": { "type": "string" },
                        "target": { "type": "string" },
                        "from": { "type": "string" },
                        "to": { "type": "string" }
                    },
                    "anyOf": [
                        { "required": ["source", "target"] },
                        { "required": ["from", "to"] }
                    ]
                }
            },
            "meta": { "type": ["object", "null"] }
        }
    })
});

/// `{name, nodes, connections, meta}`.
///
/// The local cache stores the same type with `name` and `meta` left out.
/// Unrecognised top-level keys (the server adds `saved_at`, `file_path`) are kept
/// so a save → load cycle is lossless.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub nodes: Vec<NodeModel>,
    pub connections: Vec<ConnectionModel>,
    #[serde(default)]
    pub meta: Option<WorkflowMeta>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// `name` / `meta` keys that arrived as an explicit `null` and are written back as one
    #[serde(skip)]
    pub explicit_nulls: Vec<String>,
}

/// Metadata is passed through as-is apart from the two keys the editor stamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const NULLABLE_KEYS: [&str; 2] = ["name", "meta"];

impl Serialize for WorkflowDocument {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match &self.name {
            Some(name) => map.serialize_entry("name", name)?,
            None if self.is_explicit_null("name") => map.serialize_entry("name", &Value::Null)?,
            None => {}
        }
        map.serialize_entry("nodes", &self.nodes)?;
        map.serialize_entry("connections", &self.connections)?;
        match &self.meta {
            Some(meta) => map.serialize_entry("meta", meta)?,
            None if self.is_explicit_null("meta") => map.serialize_entry("meta", &Value::Null)?,
            None => {}
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl WorkflowDocument {
    /// Parse and validate a document from text (file contents or pasted JSON).
    pub fn from_json(s: &str) -> Result<Self> {
        let value = serde_json::from_str::<Value>(s).map_err(|e| FlowCanvasError::Workflow(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Validate an already-parsed value and convert it.
    pub fn from_value(value: Value) -> Result<Self> {
        jsonschema::validate(&WORKFLOW_SCHEMA, &value).map_err(|e| FlowCanvasError::Workflow(format!("invalid workflow format: {}", e)))?;
        let explicit_nulls = NULLABLE_KEYS.iter().filter(|key| value.get(**key).is_some_and(Value::is_null)).map(|key| key.to_string()).collect();

        let mut doc = serde_json::from_value::<Self>(value).map_err(|e| FlowCanvasError::Workflow(format!("invalid workflow format: {}", e)))?;
        doc.explicit_nulls = explicit_nulls;
        Ok(doc)
    }

    fn is_explicit_null(
        &self,
        key: &str,
    ) -> bool {
        self.explicit_nulls.iter().any(|k| k == key)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
