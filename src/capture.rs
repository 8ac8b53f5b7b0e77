//! Camera capture collaborator and the exclusive stream slot.
//!
//! DESIGN
//! ======
//! The browser camera is a single shared device. [`CameraSlot`] owns at most
//! one stream at a time: acquiring while one is held fails with `Busy`, and
//! the stream goes back to the provider before it can be requested again.
//! Releasing is async, so the owner must call [`CameraSlot::release`] on
//! teardown; there is no release-on-drop.

use async_trait::async_trait;
use canvas::doc::ImageSource;

/// User-visible message shown when the camera cannot be opened.
pub const CAMERA_ERROR_MESSAGE: &str = "Could not access camera. Please check permissions and try again.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera device unavailable")]
    DeviceUnavailable,
    #[error("camera stream already held")]
    Busy,
}

impl CaptureError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "E_CAPTURE_PERMISSION",
            Self::DeviceUnavailable => "E_CAPTURE_DEVICE",
            Self::Busy => "E_CAPTURE_BUSY",
        }
    }
}

/// A still frame grabbed from the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
}

/// Access to a camera device. Browser streams are not `Send`.
#[async_trait(?Send)]
pub trait CaptureProvider {
    type Stream;

    /// Ask for a live stream.
    async fn request_stream(&self) -> Result<Self::Stream, CaptureError>;

    /// Grab the current frame of a live stream.
    async fn capture_frame(&self, stream: &Self::Stream) -> Result<CapturedFrame, CaptureError>;

    /// Stop every track of the stream.
    async fn release_stream(&self, stream: Self::Stream);
}

// =============================================================================
// SLOT
// =============================================================================

pub struct CameraSlot<P: CaptureProvider> {
    provider: P,
    stream: Option<P::Stream>,
}

impl<P: CaptureProvider> CameraSlot<P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider, stream: None }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.stream.is_some()
    }

    /// Request a stream and hold it.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if a stream is already held, otherwise whatever the
    /// provider reports.
    pub async fn acquire(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Err(CaptureError::Busy);
        }
        let stream = self.provider.request_stream().await?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Grab a frame from the held stream.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if no stream is held, otherwise whatever
    /// the provider reports.
    pub async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        let Some(stream) = &self.stream else {
            return Err(CaptureError::DeviceUnavailable);
        };
        self.provider.capture_frame(stream).await
    }

    /// Hand the stream back to the provider. Returns `false` if none was held.
    pub async fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(stream) => {
                self.provider.release_stream(stream).await;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "capture_test.rs"]
pub(crate) mod capture_test;
