use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::WorkflowDocument;

/// A tool offered by the catalog; consumed only to seed new nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDef>,
}

impl ToolTemplate {
    /// Property map a fresh node starts with: declared default, or an empty string.
    pub fn default_properties(&self) -> Map<String, Value> {
        self.properties.iter().map(|(key, def)| (key.clone(), def.default.clone().unwrap_or_else(|| Value::String(String::new())))).collect()
    }
}

/// `{type, default, ...}`; the remaining keys belong to the property inspector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named workflow template served by `/api/workflow/load/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub workflow_data: WorkflowDocument,
}

/// `{status, message}` envelope every mutating endpoint replies with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceReply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.into()),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_properties() {
        let tool: ToolTemplate = serde_json::from_value(json!({
            "id": "email_send",
            "name": "Send Email",
            "icon": "envelope",
            "description": "Send email notifications",
            "properties": {
                "to": {"type": "text", "placeholder": "recipient@example.com"},
                "smtp_port": {"type": "number", "default": 587}
            }
        }))
        .unwrap();

        let props = tool.default_properties();
        assert_eq!(props.get("to"), Some(&json!("")));
        assert_eq!(props.get("smtp_port"), Some(&json!(587)));
        assert_eq!(tool.properties["to"].extra.get("placeholder"), Some(&json!("recipient@example.com")));
    }
}
