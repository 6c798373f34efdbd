use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Server-synced layout record: panel chrome plus the viewport transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutModel {
    #[serde(default)]
    pub panel_state: Option<PanelState>,
    #[serde(default)]
    pub canvas_state: Option<CanvasState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    #[serde(default = "default_visible")]
    pub left_panel_visible: bool,
    #[serde(default)]
    pub workflow_name: Option<String>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            left_panel_visible: true,
            workflow_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub offset: Point,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Point::ORIGIN,
        }
    }
}

fn default_visible() -> bool {
    true
}

fn default_zoom() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_layout_wire_shape() {
        let layout = LayoutModel {
            panel_state: Some(PanelState {
                left_panel_visible: false,
                workflow_name: Some("Workflow 2".to_string()),
            }),
            canvas_state: Some(CanvasState {
                zoom: 1.5,
                offset: Point::new(10.0, -20.0),
            }),
        };
        let value = serde_json::to_value(&layout).unwrap();
        assert_eq!(
            value,
            json!({
                "panel_state": {"left_panel_visible": false, "workflow_name": "Workflow 2"},
                "canvas_state": {"zoom": 1.5, "offset": {"x": 10, "y": -20}}
            })
        );
    }

    #[test]
    fn test_layout_partial_payload() {
        let layout: LayoutModel = serde_json::from_value(json!({"canvas_state": {"offset": {"x": 1, "y": 2}}})).unwrap();
        assert!(layout.panel_state.is_none());
        let canvas = layout.canvas_state.unwrap();
        assert_eq!(canvas.zoom, 1.0);
        assert_eq!(canvas.offset, Point::new(1.0, 2.0));
    }
}
