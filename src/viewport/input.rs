//! Keyboard and wheel input mapped to viewport commands.

use crate::geometry::Point;

const WHEEL_ZOOM_OUT: f64 = 0.9;
const WHEEL_ZOOM_IN: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportCommand {
    ZoomIn,
    ZoomOut,
    ResetView,
    FitToContent,
    /// screen-space pan delta
    Pan(Point),
}

/// Map a key press to a viewport command.
///
/// `key` follows DOM `KeyboardEvent.key` naming. `ctrl` is Ctrl or Meta. Arrow
/// keys move the content, so the canvas shifts opposite to the arrow.
pub fn command_for_key(
    key: &str,
    ctrl: bool,
    pan_step: f64,
) -> Option<ViewportCommand> {
    if ctrl {
        return match key {
            "+" | "=" => Some(ViewportCommand::ZoomIn),
            "-" => Some(ViewportCommand::ZoomOut),
            "0" => Some(ViewportCommand::ResetView),
            "1" => Some(ViewportCommand::FitToContent),
            _ => None,
        };
    }

    match key {
        "ArrowUp" => Some(ViewportCommand::Pan(Point::new(0.0, pan_step))),
        "ArrowDown" => Some(ViewportCommand::Pan(Point::new(0.0, -pan_step))),
        "ArrowLeft" => Some(ViewportCommand::Pan(Point::new(pan_step, 0.0))),
        "ArrowRight" => Some(ViewportCommand::Pan(Point::new(-pan_step, 0.0))),
        _ => None,
    }
}

/// Zoom factor for one wheel notch: scrolling down zooms out.
pub fn wheel_factor(delta_y: f64) -> f64 {
    if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN }
}
