//! Custom asset import: turns an uploaded image file into a catalog template.
//!
//! The host reads the file (bytes plus an object URL the browser can display);
//! this module checks the type, decodes it to learn the natural size, and
//! clamps that size so the longer side fits the configured maximum.

use canvas::doc::{ImageSource, ObjectTemplate};
use uuid::Uuid;

use crate::config::PlannerConfig;

/// Prefix of custom template ids.
pub const CUSTOM_ID_PREFIX: &str = "custom_";

/// Name used when the file name has nothing before its first `.`.
const FALLBACK_NAME: &str = "Custom";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("unsupported asset type: {0}")]
    UnsupportedType(String),
    #[error("uploaded file is empty")]
    EmptyFile,
}

impl AssetError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_ASSET_DECODE",
            Self::UnsupportedType(_) => "E_ASSET_TYPE",
            Self::EmptyFile => "E_ASSET_EMPTY",
        }
    }
}

/// A file picked by the user, as handed over by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// URL the browser can render the file from (usually `blob:`).
    pub object_url: String,
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub trait AssetDecoder {
    /// Decode encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns `Decode` when the bytes are not a readable image.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, AssetError>;
}

/// Decoder backed by the `image` crate (PNG and JPEG).
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl AssetDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, AssetError> {
        let img = image::load_from_memory(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::Decode(format!("image has no pixels ({width}x{height})")));
        }
        Ok(DecodedImage { pixels: rgba.into_raw(), width, height })
    }
}

/// Display name for a custom template: the file name up to its first `.`.
#[must_use]
pub fn template_name(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or_default().trim();
    if stem.is_empty() { FALLBACK_NAME.to_string() } else { stem.to_string() }
}

/// Scale `(width, height)` down so the longer side is at most `max_side`.
///
/// Images already within bounds keep their natural size.
#[must_use]
pub fn clamp_to_max_side(width: f64, height: f64, max_side: f64) -> (f64, f64) {
    let longer = width.max(height);
    if longer <= max_side {
        return (width, height);
    }
    let scale = max_side / longer;
    (width * scale, height * scale)
}

/// Build a custom template from an uploaded file.
///
/// # Errors
///
/// Returns `UnsupportedType` for a MIME type the config does not accept,
/// `EmptyFile` for a zero-byte upload, and `Decode` for unreadable data.
pub fn import_custom_asset(
    file: &UploadedFile,
    decoder: &dyn AssetDecoder,
    config: &PlannerConfig,
) -> Result<ObjectTemplate, AssetError> {
    if !config.accepts(&file.mime_type) {
        return Err(AssetError::UnsupportedType(file.mime_type.clone()));
    }
    if file.bytes.is_empty() {
        return Err(AssetError::EmptyFile);
    }
    let decoded = decoder.decode(&file.bytes)?;
    let (width, height) = clamp_to_max_side(
        f64::from(decoded.width),
        f64::from(decoded.height),
        config.custom_asset_max_side,
    );
    Ok(ObjectTemplate {
        id: format!("{CUSTOM_ID_PREFIX}{}", Uuid::new_v4()),
        name: template_name(&file.name),
        source: ImageSource::url(file.object_url.clone()),
        width,
        height,
    })
}

#[cfg(test)]
#[path = "assets_test.rs"]
mod assets_test;
