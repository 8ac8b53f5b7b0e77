//! Export collaborator: flattens the surface into a PNG download.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use canvas::surface::SurfaceRect;
use image::{ImageBuffer, ImageFormat, Rgba};

pub const PNG_MIME: &str = "image/png";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("rasterization failed: {0}")]
    Rasterize(String),
    #[error("export is only available in the design view")]
    WrongView,
    #[error("surface geometry is not available")]
    SurfaceUnavailable,
}

impl ExportError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Rasterize(_) => "E_EXPORT_RASTERIZE",
            Self::WrongView => "E_EXPORT_VIEW",
            Self::SurfaceUnavailable => "E_SURFACE_UNAVAILABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    pub transparent_background: bool,
}

/// The finished file, ready for the host to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Turns a screen region into encoded PNG bytes.
#[async_trait(?Send)]
pub trait Rasterizer {
    /// Wait for pending visual updates (such as a deselect) to be painted.
    async fn settle(&self, delay: Duration);

    /// Rasterize `region` (screen coordinates) into PNG bytes.
    async fn rasterize(&self, region: SurfaceRect, options: RasterOptions) -> Result<Vec<u8>, ExportError>;
}

/// Encode RGBA8 pixels (for example from `getImageData`) as PNG.
///
/// # Errors
///
/// Returns `Rasterize` if the buffer length does not match the size or the
/// encoder fails.
pub fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let buf: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, pixels)
        .ok_or_else(|| ExportError::Rasterize(format!("pixel buffer does not match {width}x{height}")))?;
    let mut out = Cursor::new(Vec::new());
    buf.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ExportError::Rasterize(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[path = "export_test.rs"]
pub(crate) mod export_test;
