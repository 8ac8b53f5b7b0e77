//! Editing session: camera view, design view, and the flows between them.
//!
//! DESIGN
//! ======
//! A session starts in the camera view. Opening the camera acquires the one
//! stream the session may hold; capturing grabs a frame, releases the stream,
//! installs the frame as the background and switches to the design view.
//! Retake goes back: the scene is cleared and the camera reopened. Layout
//! editing itself lives in [`EngineCore`]; the session only sequences the
//! collaborators around it and logs what happens.

use canvas::doc::ObjectTemplate;
use canvas::engine::{Action, EngineCore};
use canvas::surface::Point;
use tracing::{debug, info, warn};

use crate::assets::{self, AssetDecoder, UploadedFile};
use crate::capture::{CAMERA_ERROR_MESSAGE, CameraSlot, CaptureError, CaptureProvider};
use crate::catalog::Catalog;
use crate::config::PlannerConfig;
use crate::export::{ExportError, ExportedImage, PNG_MIME, RasterOptions, Rasterizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppView {
    #[default]
    Camera,
    Design,
}

pub struct Session<P: CaptureProvider> {
    config: PlannerConfig,
    catalog: Catalog,
    engine: EngineCore,
    camera: CameraSlot<P>,
    view: AppView,
    camera_error: Option<&'static str>,
}

impl<P: CaptureProvider> Session<P> {
    #[must_use]
    pub fn new(config: PlannerConfig, provider: P) -> Self {
        Self {
            config,
            catalog: Catalog::new(),
            engine: EngineCore::new(),
            camera: CameraSlot::new(provider),
            view: AppView::Camera,
            camera_error: None,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn engine(&self) -> &EngineCore {
        &self.engine
    }

    /// Mutable engine access for pointer and surface events.
    pub fn engine_mut(&mut self) -> &mut EngineCore {
        &mut self.engine
    }

    #[must_use]
    pub fn view(&self) -> AppView {
        self.view
    }

    /// Inline message to show in the camera view, if opening it failed.
    #[must_use]
    pub fn camera_error(&self) -> Option<&'static str> {
        self.camera_error
    }

    #[must_use]
    pub fn camera_is_open(&self) -> bool {
        self.camera.is_held()
    }

    /// Whether the capture button is enabled.
    #[must_use]
    pub fn can_capture(&self) -> bool {
        self.view == AppView::Camera && self.camera.is_held() && self.camera_error.is_none()
    }

    // --- Camera flow ---

    /// Open the camera. Also the user's retry after a failure.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; the session records
    /// [`CAMERA_ERROR_MESSAGE`] and keeps capture disabled.
    pub async fn open_camera(&mut self) -> Result<(), CaptureError> {
        if self.camera.is_held() {
            return Ok(());
        }
        match self.camera.acquire().await {
            Ok(()) => {
                self.camera_error = None;
                info!("camera: stream opened");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "camera: could not open stream");
                self.camera_error = Some(CAMERA_ERROR_MESSAGE);
                Err(e)
            }
        }
    }

    /// Capture the background photo and switch to the design view.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` when capture is disabled, otherwise the
    /// provider's frame error. The view does not change on failure.
    pub async fn capture(&mut self) -> Result<Vec<Action>, CaptureError> {
        if !self.can_capture() {
            return Err(CaptureError::DeviceUnavailable);
        }
        let frame = match self.camera.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "camera: frame capture failed");
                return Err(e);
            }
        };
        self.camera.release().await;
        let actions = self.engine.set_background(frame.source);
        self.view = AppView::Design;
        info!(width = frame.width, height = frame.height, "camera: background captured");
        Ok(actions)
    }

    /// Drop the photo and layout and return to the camera.
    ///
    /// A failure to reopen the camera is recorded in [`Session::camera_error`].
    pub async fn retake(&mut self) -> Vec<Action> {
        let actions = self.engine.retake();
        self.view = AppView::Camera;
        self.camera.release().await;
        info!("session: retake");
        if let Err(e) = self.open_camera().await {
            debug!(code = e.error_code(), "session: camera not reopened after retake");
        }
        actions
    }

    /// Clear placed objects and selection, keeping the photo.
    pub fn reset(&mut self) -> Vec<Action> {
        info!(removed = self.engine.scene.len(), "session: reset layout");
        self.engine.reset()
    }

    /// Teardown: release the camera and any active gesture.
    pub async fn close(&mut self) -> Vec<Action> {
        if self.camera.release().await {
            debug!("camera: stream released on close");
        }
        self.engine.teardown()
    }

    // --- Catalog ---

    /// Import an uploaded image as a custom template.
    ///
    /// Failures are logged and skipped; the catalog never receives a broken
    /// entry.
    pub fn import_custom_asset(&mut self, file: &UploadedFile, decoder: &dyn AssetDecoder) -> Option<ObjectTemplate> {
        let template = match assets::import_custom_asset(file, decoder, &self.config) {
            Ok(template) => template,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), file = %file.name, "assets: import skipped");
                return None;
            }
        };
        if !self.catalog.add_custom(template.clone()) {
            warn!(id = %template.id, file = %file.name, "assets: catalog rejected template");
            return None;
        }
        info!(id = %template.id, name = %template.name, width = template.width, height = template.height, "assets: imported");
        Some(template)
    }

    /// Forward a palette drop to the engine. A bad drop is logged and ignored.
    pub fn drop_template(&mut self, screen_pt: Point, payload: &str) -> Vec<Action> {
        match self.engine.on_drop(screen_pt, payload) {
            Ok(actions) => actions,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "surface: drop ignored");
                Vec::new()
            }
        }
    }

    // --- Export ---

    /// Flatten the design surface into a PNG.
    ///
    /// The selection is cleared first and `apply` receives the resulting
    /// actions so the host can repaint without affordances; the rasterizer
    /// then waits `export_settle_ms` before capturing.
    ///
    /// # Errors
    ///
    /// Returns `WrongView` outside the design view, `SurfaceUnavailable` when
    /// the surface is not mounted, and the rasterizer's error otherwise.
    pub async fn export<R: Rasterizer + ?Sized>(
        &mut self,
        rasterizer: &R,
        apply: impl FnOnce(Vec<Action>),
    ) -> Result<ExportedImage, ExportError> {
        if self.view != AppView::Design {
            return Err(ExportError::WrongView);
        }
        let region = self.engine.surface.rect().ok_or(ExportError::SurfaceUnavailable)?;

        apply(self.engine.select(None));
        rasterizer.settle(self.config.settle_delay()).await;

        let options = RasterOptions { transparent_background: self.config.transparent_background };
        let bytes = match rasterizer.rasterize(region, options).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "export: rasterization failed");
                return Err(e);
            }
        };
        info!(file = %self.config.export_file_name, bytes = bytes.len(), "export: done");
        Ok(ExportedImage { file_name: self.config.export_file_name.clone(), mime_type: PNG_MIME, bytes })
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
