//! Canvas Interop Core
//!
//! Connects a rendering engine to browser canvas elements: owns the set of
//! live canvases, routes browser input and resize notifications to the right
//! one, coalesces text, binary and image fetches, and enforces the
//! initialize, connect, dispose ordering. The browser itself sits behind the
//! [`BrowserHost`] trait, so everything here runs natively under test.

pub mod bridge;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod handshake;
pub mod host;
pub mod image;
pub mod interop;
pub mod ledger;
pub mod loader;
pub mod options;
pub mod pointer;
pub mod registry;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, InteropStage};
pub use error::{InteropError, LifecycleStage, Result};
pub use events::{CanvasEvents, EventHandlers, HandlerId, OneShot};
pub use handshake::{CanvasHandshake, HandshakeError, WebGlVersion};
pub use host::{BrowserHost, ResourceKind};
pub use image::{PixelFormat, RawImageData};
pub use interop::CanvasInterop;
pub use options::{InteropOptions, WebGlOptions};
pub use pointer::{
    CanvasResizedEvent, KeyboardModifiers, MouseButton, PinchEvent, PointerButtonEvent,
    PointerButtons, PointerMoveEvent, WheelEvent,
};
