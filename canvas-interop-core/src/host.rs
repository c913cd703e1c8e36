use futures::future::LocalBoxFuture;

use crate::options::WebGlOptions;

/// The three resource kinds the browser can fetch for a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Text,
    Binary,
    Image,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text file",
            Self::Binary => "binary file",
            Self::Image => "texture",
        }
    }
}

/// The browser side of the bridge.
///
/// Every call is fire-and-forget except the handshakes. Fetch results come
/// back later through `Bridge::complete_*`, events through `Bridge::dispatch_*`.
/// Implemented with wasm-bindgen imports in the web crate and by a recording
/// double in tests.
pub trait BrowserHost {
    /// Import the browser module that implements the interop functions.
    fn import_module(&self, url: &str) -> LocalBoxFuture<'static, Result<(), String>>;

    /// Load a classic script that registers globals.
    fn import_script(&self, url: &str) -> LocalBoxFuture<'static, Result<(), String>>;

    /// Hand the Rust callback surface to the imported module.
    fn init_interop(&self) -> LocalBoxFuture<'static, Result<(), String>>;

    /// Create a WebGL context for the canvas; returns the handshake result string.
    fn init_webgl_canvas(
        &self,
        canvas_id: &str,
        options: &WebGlOptions,
        subscribe_pointer_events: bool,
        log_javascript: bool,
    ) -> String;

    fn subscribe_browser_events(&self, canvas_id: &str, pointer_events: bool, animation_frame: bool);

    fn unsubscribe_browser_events(&self, canvas_id: &str, pointer_events: bool, animation_frame: bool);

    /// Remove every listener and observer attached to the canvas.
    fn disconnect_webgl_canvas(&self, canvas_id: &str);

    fn load_resource(&self, canvas_id: &str, kind: ResourceKind, url: &str);

    /// Decode an encoded image held in memory; the result arrives as an image
    /// completion keyed by `image_name`.
    fn decode_image_bytes(&self, canvas_id: &str, bytes: &[u8], mime_type: &str, image_name: &str);

    fn set_cursor_style(&self, canvas_id: &str, cursor_style: &str);

    fn set_pointer_capture(&self, canvas_id: &str, pointer_id: i32);

    fn release_pointer_capture(&self, canvas_id: &str, pointer_id: i32);

    fn show_raw_bitmap(&self, canvas_id: &str, width: u32, height: u32, pixels: &[u8]);

    /// Start a GPU command capture; false when the capture library is missing.
    fn start_frame_capture(&self, canvas_id: &str) -> bool;

    fn stop_frame_capture(&self);
}
