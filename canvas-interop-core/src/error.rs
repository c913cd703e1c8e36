use std::fmt;

/// Lifecycle stage an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Uninitialized,
    InteropReady,
    CanvasConnected,
    Disposed,
}

impl LifecycleStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::InteropReady => "InteropReady",
            Self::CanvasConnected => "CanvasConnected",
            Self::Disposed => "Disposed",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type Result<T> = std::result::Result<T, InteropError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InteropError {
    #[error("cannot call {method} because the {required} stage was not reached")]
    NotReady {
        method: &'static str,
        required: LifecycleStage,
    },
    #[error("cannot call {method} because the canvas interop was already disposed")]
    Disposed { method: &'static str },

    #[error(
        "cannot load the interop module from '{url}': make sure canvas-interop.js is deployed next to the wasm bundle ({message})"
    )]
    ModuleNotFound { url: String, message: String },
    #[error("error parsing the interop module '{url}', revert local changes or check the syntax: {message}")]
    ModuleParse { url: String, message: String },
    #[error("error loading the interop module '{url}': {message}")]
    ModuleLoad { url: String, message: String },
    #[error("error initializing the javascript interop: {0}")]
    InitializationFailed(String),

    #[error("browser notification did not provide a canvas id")]
    MissingCanvasId,
    #[error("canvas id '{0}' is already registered")]
    DuplicateCanvasId(String),

    #[error("loading '{url}' failed: {message}")]
    LoadFailed { url: String, message: String },
    #[error("request for '{url}' was abandoned because its canvas interop was disposed")]
    RequestAbandoned { url: String },

    #[error("invalid interop options: {0}")]
    Config(String),
}

impl InteropError {
    /// Classify an error raised while importing the interop module.
    pub(crate) fn from_module_import(url: &str, message: String) -> Self {
        let url = url.to_string();
        if message.contains("Failed to fetch dynamically imported module") {
            InteropError::ModuleNotFound { url, message }
        } else if message.starts_with("SyntaxError:") {
            InteropError::ModuleParse { url, message }
        } else {
            InteropError::ModuleLoad { url, message }
        }
    }

    /// True for the errors produced by a failed `Bridge::initialize`.
    pub fn is_initialization_error(&self) -> bool {
        matches!(
            self,
            Self::ModuleNotFound { .. }
                | Self::ModuleParse { .. }
                | Self::ModuleLoad { .. }
                | Self::InitializationFailed(_)
        )
    }
}
