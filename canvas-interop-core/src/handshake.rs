//! Parser for the string returned by the browser when a WebGL context is
//! created for a canvas.
//!
//! Success is reported as `OK:v{1|2};{width};{height};{dpiScale}`. Any string
//! without the `OK:` prefix is the browser's error message.

const OK_PREFIX: &str = "OK:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebGlVersion {
    WebGl1,
    WebGl2,
}

impl WebGlVersion {
    pub fn major(&self) -> u32 {
        match self {
            Self::WebGl1 => 1,
            Self::WebGl2 => 2,
        }
    }
}

/// Geometry reported by a successful context creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasHandshake {
    pub version: WebGlVersion,
    pub width: u32,
    pub height: u32,
    pub dpi_scale: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    /// The browser could not create a context (canvas missing, no WebGL).
    #[error("{0}")]
    Rejected(String),
    #[error("malformed handshake result '{result}': {reason}")]
    Malformed { result: String, reason: &'static str },
}

impl CanvasHandshake {
    pub fn parse(result: &str) -> Result<Self, HandshakeError> {
        let Some(payload) = result.strip_prefix(OK_PREFIX) else {
            let message = if result.is_empty() {
                "empty result from initWebGLCanvas".to_string()
            } else {
                result.to_string()
            };
            return Err(HandshakeError::Rejected(message));
        };

        let malformed = |reason| HandshakeError::Malformed {
            result: result.to_string(),
            reason,
        };

        let mut parts = payload.split(';');
        let version = match parts.next() {
            Some("v1") => WebGlVersion::WebGl1,
            Some("v2") => WebGlVersion::WebGl2,
            _ => return Err(malformed("unknown WebGL version")),
        };
        let width = parts
            .next()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(|| malformed("invalid width"))?;
        let height = parts
            .next()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(|| malformed("invalid height"))?;
        // f32::from_str always uses '.' as the decimal separator.
        let dpi_scale = parts
            .next()
            .and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or_else(|| malformed("invalid dpi scale"))?;
        if parts.next().is_some() {
            return Err(malformed("unexpected trailing fields"));
        }

        Ok(CanvasHandshake {
            version,
            width,
            height,
            dpi_scale,
        })
    }
}
