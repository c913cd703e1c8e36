use bytemuck::{Pod, Zeroable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::Rgba8 => 4,
        }
    }
}

/// One RGBA8 pixel, used to view decoded buffers without copying.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Rgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// Decoded image pixels as delivered by the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImageData {
    pub width: u32,
    pub height: u32,
    /// Bytes per row; always `width * 4`.
    pub stride: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
    /// True when at least one pixel has alpha below 255.
    pub has_transparency: bool,
}

impl RawImageData {
    /// Wrap an RGBA8 buffer, checking its length and scanning the alpha channel.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, String> {
        let too_large = || format!("{width} x {height} RGBA image is too large");
        let stride = width
            .checked_mul(PixelFormat::Rgba8.bytes_per_pixel())
            .ok_or_else(too_large)?;
        let expected = (stride as usize)
            .checked_mul(height as usize)
            .ok_or_else(too_large)?;
        if pixels.len() != expected {
            return Err(format!(
                "decoded image has {} bytes but {width} x {height} RGBA needs {expected}",
                pixels.len()
            ));
        }

        let has_transparency = bytemuck::cast_slice::<u8, Rgba8>(&pixels)
            .iter()
            .any(|p| p.a < u8::MAX);

        Ok(Self {
            width,
            height,
            stride,
            format: PixelFormat::Rgba8,
            pixels,
            has_transparency,
        })
    }
}
