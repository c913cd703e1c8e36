use glam::Vec2;
use std::ops::{BitOr, BitOrAssign};

/// Keyboard modifier bitmask as encoded by the browser side:
/// bit0 = Alt, bit1 = Control, bit2 = Shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyboardModifiers(u8);

impl KeyboardModifiers {
    pub const NONE: Self = Self(0);
    pub const ALT: Self = Self(1);
    pub const CONTROL: Self = Self(2);
    pub const SHIFT: Self = Self(4);

    const ALL_BITS: u8 = 0b111;

    /// Unknown bits are dropped.
    pub fn from_bits_truncate(bits: i32) -> Self {
        Self((bits & Self::ALL_BITS as i32) as u8)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for KeyboardModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeyboardModifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The button whose state changed, from the DOM `PointerEvent.button` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
    Other(i32),
}

impl MouseButton {
    pub fn from_dom(button: i32) -> Self {
        match button {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            3 => Self::Back,
            4 => Self::Forward,
            other => Self::Other(other),
        }
    }
}

/// All currently pressed buttons, from the DOM `buttons` bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerButtons(u8);

impl PointerButtons {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1);
    pub const RIGHT: Self = Self(2);
    pub const MIDDLE: Self = Self(4);
    pub const BACK: Self = Self(8);
    pub const FORWARD: Self = Self(16);

    pub fn from_bits_truncate(bits: i32) -> Self {
        Self((bits & 0b1_1111) as u8)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PointerButtons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerButtonEvent {
    pub changed_button: MouseButton,
    pub pressed_buttons: PointerButtons,
    pub pointer_id: i32,
    pub modifiers: KeyboardModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMoveEvent {
    /// Position relative to the canvas, in CSS pixels.
    pub position: Vec2,
    pub pressed_buttons: PointerButtons,
    pub modifiers: KeyboardModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub delta: Vec2,
    pub modifiers: KeyboardModifiers,
}

/// Two-finger pinch gesture, computed by the browser side from the touch points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchEvent {
    pub distance: f32,
    pub center: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasResizedEvent {
    pub width: f32,
    pub height: f32,
    pub dpi_scale: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_encoding() {
        assert_eq!(KeyboardModifiers::ALT.bits(), 1);
        assert_eq!(KeyboardModifiers::CONTROL.bits(), 2);
        assert_eq!(KeyboardModifiers::SHIFT.bits(), 4);

        let combo = KeyboardModifiers::from_bits_truncate(5);
        assert!(combo.contains(KeyboardModifiers::ALT));
        assert!(combo.contains(KeyboardModifiers::SHIFT));
        assert!(!combo.contains(KeyboardModifiers::CONTROL));
        assert_eq!(combo, KeyboardModifiers::ALT | KeyboardModifiers::SHIFT);
    }

    #[test]
    fn test_modifier_unknown_bits_dropped() {
        let m = KeyboardModifiers::from_bits_truncate(0xFA);
        assert_eq!(m.bits(), 2);
        assert!(KeyboardModifiers::from_bits_truncate(0).is_empty());
    }

    #[test]
    fn test_mouse_button_from_dom() {
        assert_eq!(MouseButton::from_dom(0), MouseButton::Left);
        assert_eq!(MouseButton::from_dom(2), MouseButton::Right);
        assert_eq!(MouseButton::from_dom(-1), MouseButton::Other(-1));
    }

    #[test]
    fn test_pointer_buttons() {
        let b = PointerButtons::from_bits_truncate(5);
        assert!(b.contains(PointerButtons::LEFT));
        assert!(b.contains(PointerButtons::MIDDLE));
        assert!(!b.contains(PointerButtons::RIGHT));
    }
}
