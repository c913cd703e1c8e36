use canvas_interop_core::{
    KeyboardModifiers, PinchEvent, PointerButtonEvent, PointerButtons, PointerMoveEvent, WheelEvent,
};
use glam::Vec2;

/// Pointer, wheel and pinch state collected from canvas events.
#[derive(Debug, Clone)]
pub struct InputState {
    pub position: Vec2,
    /// Movement since the last [`update`](Self::update).
    pub delta: Vec2,
    pub buttons: PointerButtons,
    pub modifiers: KeyboardModifiers,
    /// Wheel movement since the last update.
    pub wheel: Vec2,
    pub zoom: f32,
    pinch: Option<Pinch>,
    has_position: bool,
}

#[derive(Debug, Clone, Copy)]
struct Pinch {
    start_distance: f32,
    start_zoom: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            delta: Vec2::ZERO,
            buttons: PointerButtons::NONE,
            modifiers: KeyboardModifiers::NONE,
            wheel: Vec2::ZERO,
            zoom: 1.0,
            pinch: None,
            has_position: false,
        }
    }

    /// Reset per-frame deltas.
    pub fn update(&mut self) {
        self.delta = Vec2::ZERO;
        self.wheel = Vec2::ZERO;
    }

    pub fn is_button_down(&self, button: PointerButtons) -> bool {
        self.buttons.contains(button)
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    pub fn on_pointer_button(&mut self, e: &PointerButtonEvent) {
        self.buttons = e.pressed_buttons;
        self.modifiers = e.modifiers;
    }

    pub fn on_pointer_moved(&mut self, e: &PointerMoveEvent) {
        // The first position has nothing to be relative to.
        if self.has_position {
            self.delta += e.position - self.position;
        }
        self.position = e.position;
        self.has_position = true;
        self.buttons = e.pressed_buttons;
        self.modifiers = e.modifiers;
    }

    pub fn on_wheel(&mut self, e: &WheelEvent) {
        self.wheel += e.delta;
        self.modifiers = e.modifiers;
    }

    pub fn on_pinch_started(&mut self, e: &PinchEvent) {
        self.pinch = Some(Pinch {
            start_distance: e.distance,
            start_zoom: self.zoom,
        });
        self.position = e.center;
    }

    pub fn on_pinch_updated(&mut self, e: &PinchEvent) {
        if let Some(pinch) = self.pinch {
            if pinch.start_distance > 0.0 {
                self.zoom = pinch.start_zoom * e.distance / pinch.start_distance;
            }
        }
        self.position = e.center;
    }

    pub fn on_pinch_ended(&mut self) {
        self.pinch = None;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
