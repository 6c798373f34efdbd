//! Pan/zoom transform between screen space and the canvas.
//!
//! The engine owns a uniform-scale-plus-translate map. `offset` is in pixels
//! relative to the canvas element's top-left corner; `screen` locates that element
//! in screen space. Nothing here knows about the graph: fit and focus take plain
//! rectangles.

mod animation;
mod input;

use std::time::Duration;

use tracing::{debug, trace};

use crate::{
    FlowCanvasError, Result,
    config::ViewportConfig,
    geometry::{Point, Rect},
    graph::Transform,
};

pub use animation::{Animation, ease_out_cubic};
pub use input::{ViewportCommand, command_for_key, wheel_factor};

#[derive(Debug, Clone)]
pub struct ViewportEngine {
    offset: Point,
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    fit_padding: f64,
    focus_scale: f64,
    zoom_step: f64,
    pan_step: f64,
    default_duration: Duration,
    /// canvas element in screen space
    screen: Rect,
    animation: Option<Animation>,
    /// last pointer position of an in-progress drag pan
    drag_from: Option<Point>,
}

impl ViewportEngine {
    pub fn new(config: &ViewportConfig) -> Self {
        Self {
            offset: Point::ORIGIN,
            scale: 1.0,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            fit_padding: config.fit_padding,
            focus_scale: config.focus_scale,
            zoom_step: config.zoom_step,
            pan_step: config.pan_step,
            default_duration: Duration::from_millis(config.animation_ms),
            screen: Rect::new(config.left, config.top, config.width, config.height),
            animation: None,
            drag_from: None,
        }
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn transform(&self) -> Transform {
        Transform {
            offset: self.offset,
            scale: self.scale,
        }
    }

    pub fn screen(&self) -> Rect {
        self.screen
    }

    pub fn pan_step(&self) -> f64 {
        self.pan_step
    }

    /// Zoom level as shown by the zoom indicator, e.g. `120` for 1.2×.
    pub fn zoom_percentage(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    /// Resize or move the canvas element.
    pub fn set_screen(
        &mut self,
        screen: Rect,
    ) -> Result<()> {
        if !(screen.width > 0.0 && screen.height > 0.0) {
            return Err(FlowCanvasError::Viewport(format!("canvas size must be positive, got {}x{}", screen.width, screen.height)));
        }
        self.screen = screen;
        Ok(())
    }

    /// Overwrite the transform, clamping the scale. Used when restoring a saved layout.
    pub fn set_state(
        &mut self,
        offset: Point,
        scale: f64,
    ) {
        self.offset = offset;
        self.scale = self.clamp_scale(scale);
    }

    fn clamp_scale(
        &self,
        scale: f64,
    ) -> f64 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            self.scale
        }
    }

    /// Shift by a raw screen-space delta.
    pub fn pan(
        &mut self,
        dx: f64,
        dy: f64,
    ) {
        trace!("ViewportEngine::pan({}, {})", dx, dy);
        self.offset = self.offset.offset(dx, dy);
    }

    /// Zoom by `factor` keeping the canvas-local point `(x, y)` fixed.
    ///
    /// Returns false when the clamped scale equals the current one.
    pub fn zoom_at_point(
        &mut self,
        x: f64,
        y: f64,
        factor: f64,
    ) -> bool {
        let new_scale = self.clamp_scale(self.scale * factor);
        if new_scale == self.scale {
            return false;
        }

        let ratio = new_scale / self.scale;
        self.offset = Point::new(x - (x - self.offset.x) * ratio, y - (y - self.offset.y) * ratio);
        self.scale = new_scale;
        debug!("zoom to {} around ({}, {})", self.scale, x, y);
        true
    }

    pub fn zoom_at_center(
        &mut self,
        factor: f64,
    ) -> bool {
        self.zoom_at_point(self.screen.width / 2.0, self.screen.height / 2.0, factor)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom_at_center(self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom_at_center(2.0 - self.zoom_step)
    }

    pub fn reset_view(&mut self) {
        self.offset = Point::ORIGIN;
        self.scale = 1.0;
    }

    /// Fit every rectangle, plus padding, inside the canvas and center it.
    ///
    /// An empty slice resets the view.
    pub fn fit_to_content(
        &mut self,
        rects: &[Rect],
    ) {
        let Some(content) = Rect::union_all(rects.iter()) else {
            self.reset_view();
            return;
        };
        let content = content.expand(self.fit_padding);

        let scale_x = self.screen.width / content.width;
        let scale_y = self.screen.height / content.height;
        let scale = scale_x.min(scale_y).min(self.max_scale).max(self.min_scale);

        self.offset = Point::new(
            (self.screen.width - content.width * scale) / 2.0 - content.x * scale,
            (self.screen.height - content.height * scale) / 2.0 - content.y * scale,
        );
        self.scale = scale;
        debug!("fit {} rects at scale {}", rects.len(), scale);
    }

    pub fn screen_to_canvas(
        &self,
        p: Point,
    ) -> Point {
        Point::new((p.x - self.screen.left() - self.offset.x) / self.scale, (p.y - self.screen.top() - self.offset.y) / self.scale)
    }

    pub fn canvas_to_screen(
        &self,
        p: Point,
    ) -> Point {
        Point::new(p.x * self.scale + self.offset.x + self.screen.left(), p.y * self.scale + self.offset.y + self.screen.top())
    }

    /// Canvas-space rectangle currently visible.
    pub fn get_viewport_bounds(&self) -> Rect {
        let top_left = self.screen_to_canvas(Point::new(self.screen.left(), self.screen.top()));
        let bottom_right = self.screen_to_canvas(Point::new(self.screen.right(), self.screen.bottom()));
        Rect::from_corners(top_left, bottom_right)
    }

    pub fn is_point_visible(
        &self,
        p: Point,
    ) -> bool {
        self.get_viewport_bounds().contains(p)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Start interpolating toward a target transform.
    ///
    /// A call while another animation runs restarts from the current live
    /// state; nothing is queued. A zero duration jumps straight to the target.
    pub fn animate_to(
        &mut self,
        target_offset: Point,
        target_scale: f64,
        duration: Option<Duration>,
    ) {
        let duration = duration.unwrap_or(self.default_duration);
        let target_scale = self.clamp_scale(target_scale);
        debug!("animate to {:?} x{} over {:?}", target_offset, target_scale, duration);

        if duration.is_zero() {
            self.animation = None;
            self.offset = target_offset;
            self.scale = target_scale;
            return;
        }
        self.animation = Some(Animation::new(self.offset, self.scale, target_offset, target_scale, duration));
    }

    /// Advance a running animation by one frame.
    ///
    /// Returns `None` when idle, otherwise whether the animation has settled.
    pub fn advance(
        &mut self,
        dt: Duration,
    ) -> Option<bool> {
        let animation = self.animation.as_mut()?;
        let (offset, scale) = animation.step(dt);
        let finished = animation.is_finished();
        self.offset = offset;
        self.scale = scale;
        if finished {
            self.animation = None;
        }
        Some(finished)
    }

    /// Animate so the node's center lands in the middle of the canvas.
    pub fn focus_on_node(
        &mut self,
        bounds: Rect,
    ) {
        let target_scale = self.focus_scale.min(self.max_scale);
        let center = bounds.center();
        let target_offset = Point::new(self.screen.width / 2.0 - center.x * target_scale, self.screen.height / 2.0 - center.y * target_scale);
        self.animate_to(target_offset, target_scale, None);
    }

    /// Start a drag pan at a screen-space pointer position.
    pub fn begin_pan(
        &mut self,
        pointer: Point,
    ) {
        self.drag_from = Some(pointer);
    }

    /// Pan by the pointer movement since the previous call. False when no drag is active.
    pub fn drag_pan(
        &mut self,
        pointer: Point,
    ) -> bool {
        let Some(from) = self.drag_from.replace(pointer) else {
            return false;
        };
        self.pan(pointer.x - from.x, pointer.y - from.y);
        true
    }

    pub fn end_pan(&mut self) -> bool {
        self.drag_from.take().is_some()
    }

    pub fn is_panning(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Run a keyboard command. `content` feeds fit-to-content.
    pub fn apply_command(
        &mut self,
        command: ViewportCommand,
        content: &[Rect],
    ) -> bool {
        match command {
            ViewportCommand::ZoomIn => self.zoom_in(),
            ViewportCommand::ZoomOut => self.zoom_out(),
            ViewportCommand::ResetView => {
                self.reset_view();
                true
            }
            ViewportCommand::FitToContent => {
                self.fit_to_content(content);
                true
            }
            ViewportCommand::Pan(delta) => {
                self.pan(delta.x, delta.y);
                true
            }
        }
    }
}
