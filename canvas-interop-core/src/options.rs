use serde::{Deserialize, Serialize};

use crate::error::InteropError;

/// Bridge-wide settings, usually passed from the host page as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteropOptions {
    /// URL of `canvas-interop.js`, relative to the page.
    pub module_url: String,
    /// Forwarded to the browser module to enable its console logging.
    pub log_javascript: bool,
    /// How many disposed-instance request URLs to remember.
    pub disposed_ledger_capacity: usize,
    /// Script imported on the first frame capture request.
    pub frame_capture_script_url: String,
}

impl Default for InteropOptions {
    fn default() -> Self {
        Self {
            module_url: "../canvas-interop.js".to_string(),
            log_javascript: false,
            disposed_ledger_capacity: 64,
            frame_capture_script_url:
                "https://cdn.jsdelivr.net/npm/spectorjs@0.9.30/dist/spector.bundle.js".to_string(),
        }
    }
}

impl InteropOptions {
    pub fn from_json(json: &str) -> Result<Self, InteropError> {
        serde_json::from_str(json).map_err(|e| InteropError::Config(e.to_string()))
    }
}

/// Per-canvas WebGL context settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebGlOptions {
    pub use_msaa: bool,
    pub preserve_drawing_buffer: bool,
    pub subscribe_animation_frame: bool,
}

impl Default for WebGlOptions {
    fn default() -> Self {
        Self {
            use_msaa: true,
            preserve_drawing_buffer: false,
            subscribe_animation_frame: true,
        }
    }
}
