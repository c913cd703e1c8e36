//! Entry points for browser notifications.
//!
//! Each notification names the canvas it belongs to and is delivered to that
//! instance only; the animation frame tick is the exception and reaches every
//! connected canvas.

use glam::Vec2;

use crate::bridge::Bridge;
use crate::error::{InteropError, Result};
use crate::interop::CanvasInterop;
use crate::pointer::{
    CanvasResizedEvent, KeyboardModifiers, MouseButton, PinchEvent, PointerButtonEvent,
    PointerButtons, PointerMoveEvent, WheelEvent,
};

impl Bridge {
    /// Resolve the target of a browser event. A missing id is an error; an
    /// unknown id usually means the canvas was disposed while the browser
    /// still had the event queued.
    fn event_target(&self, canvas_id: Option<&str>) -> Result<Option<CanvasInterop>> {
        let canvas_id = canvas_id.ok_or(InteropError::MissingCanvasId)?;
        let canvas = self.find(canvas_id);
        if canvas.is_none() {
            log::warn!("CanvasInterop with canvas id '{canvas_id}' not found. Probably it was disposed while a browser request was not yet finished.");
        }
        Ok(canvas)
    }

    pub fn dispatch_pointer_down(
        &self,
        canvas_id: Option<&str>,
        changed_button: i32,
        pressed_buttons: i32,
        pointer_id: i32,
        modifiers: i32,
    ) -> Result<()> {
        log::debug!("pointer down '{}': button {changed_button}, modifiers {modifiers}", canvas_id.unwrap_or_default());
        if let Some(canvas) = self.event_target(canvas_id)? {
            let event = button_event(changed_button, pressed_buttons, pointer_id, modifiers);
            canvas.events().pointer_down.emit(&canvas, &event);
        }
        Ok(())
    }

    pub fn dispatch_pointer_up(
        &self,
        canvas_id: Option<&str>,
        changed_button: i32,
        pressed_buttons: i32,
        pointer_id: i32,
        modifiers: i32,
    ) -> Result<()> {
        log::debug!("pointer up '{}': button {changed_button}, modifiers {modifiers}", canvas_id.unwrap_or_default());
        if let Some(canvas) = self.event_target(canvas_id)? {
            let event = button_event(changed_button, pressed_buttons, pointer_id, modifiers);
            canvas.events().pointer_up.emit(&canvas, &event);
        }
        Ok(())
    }

    pub fn dispatch_pointer_moved(
        &self,
        canvas_id: Option<&str>,
        x: f32,
        y: f32,
        pressed_buttons: i32,
        modifiers: i32,
    ) -> Result<()> {
        if let Some(canvas) = self.event_target(canvas_id)? {
            let event = PointerMoveEvent {
                position: Vec2::new(x, y),
                pressed_buttons: PointerButtons::from_bits_truncate(pressed_buttons),
                modifiers: KeyboardModifiers::from_bits_truncate(modifiers),
            };
            canvas.events().pointer_moved.emit(&canvas, &event);
        }
        Ok(())
    }

    pub fn dispatch_wheel(&self, canvas_id: Option<&str>, delta_x: f32, delta_y: f32, modifiers: i32) -> Result<()> {
        log::debug!("wheel '{}': {delta_x} {delta_y}", canvas_id.unwrap_or_default());
        if let Some(canvas) = self.event_target(canvas_id)? {
            let event = WheelEvent {
                delta: Vec2::new(delta_x, delta_y),
                modifiers: KeyboardModifiers::from_bits_truncate(modifiers),
            };
            canvas.events().wheel.emit(&canvas, &event);
        }
        Ok(())
    }

    pub fn dispatch_pinch_started(&self, canvas_id: Option<&str>, distance: f32, center_x: f32, center_y: f32) -> Result<()> {
        log::debug!("pinch started '{}': distance {distance} around ({center_x} {center_y})", canvas_id.unwrap_or_default());
        if let Some(canvas) = self.event_target(canvas_id)? {
            let event = PinchEvent {
                distance,
                center: Vec2::new(center_x, center_y),
            };
            canvas.events().pinch_started.emit(&canvas, &event);
        }
        Ok(())
    }

    pub fn dispatch_pinch_updated(&self, canvas_id: Option<&str>, distance: f32, center_x: f32, center_y: f32) -> Result<()> {
        if let Some(canvas) = self.event_target(canvas_id)? {
            let event = PinchEvent {
                distance,
                center: Vec2::new(center_x, center_y),
            };
            canvas.events().pinch_updated.emit(&canvas, &event);
        }
        Ok(())
    }

    pub fn dispatch_pinch_ended(&self, canvas_id: Option<&str>) -> Result<()> {
        log::debug!("pinch ended '{}'", canvas_id.unwrap_or_default());
        if let Some(canvas) = self.event_target(canvas_id)? {
            canvas.events().pinch_ended.emit(&canvas, &());
        }
        Ok(())
    }

    /// Stores the new size before notifying, so handlers read current values.
    pub fn dispatch_resized(&self, canvas_id: Option<&str>, width: f32, height: f32, dpi_scale: f32) -> Result<()> {
        log::debug!("canvas resized '{}': {width} x {height} @ {dpi_scale}", canvas_id.unwrap_or_default());
        if let Some(canvas) = self.event_target(canvas_id)? {
            canvas.apply_resize(width, height, dpi_scale);
            let event = CanvasResizedEvent {
                width,
                height,
                dpi_scale,
            };
            canvas.events().resized.emit(&canvas, &event);
        }
        Ok(())
    }

    pub fn dispatch_context_lost(&self, canvas_id: Option<&str>) -> Result<()> {
        log::warn!("WebGL context lost for '{}'", canvas_id.unwrap_or_default());
        if let Some(canvas) = self.event_target(canvas_id)? {
            canvas.events().context_lost.emit(&canvas, &());
        }
        Ok(())
    }

    /// One `requestAnimationFrame` tick, shared by every connected canvas.
    pub fn dispatch_animation_frame(&self) {
        for canvas in self.canvases() {
            canvas.events().animation_frame.emit(&canvas, &());
        }
    }
}

fn button_event(changed_button: i32, pressed_buttons: i32, pointer_id: i32, modifiers: i32) -> PointerButtonEvent {
    PointerButtonEvent {
        changed_button: MouseButton::from_dom(changed_button),
        pressed_buttons: PointerButtons::from_bits_truncate(pressed_buttons),
        pointer_id,
        modifiers: KeyboardModifiers::from_bits_truncate(modifiers),
    }
}
