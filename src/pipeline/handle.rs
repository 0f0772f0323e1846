use super::service::Command;
use super::{PipelineState, PipelineStats};
use crate::camera::CameraDevice;
use crate::error::{Result, ScanError};
use crate::geometry::{Point, ScanRect, ViewSize};
use crate::orientation::Rotation;
use crate::viewfinder::SharedGeometry;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Host-side entry point to a running scanner service.
///
/// Cheap to clone. Orientation and size notifications update shared
/// geometry directly and never wait on the camera.
#[derive(Clone)]
pub struct ScannerHandle {
    commands: mpsc::UnboundedSender<Command>,
    geometry: SharedGeometry,
    stats: Arc<Mutex<PipelineStats>>,
    state: watch::Receiver<PipelineState>,
    cancel: CancellationToken,
}

impl ScannerHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        geometry: SharedGeometry,
        stats: Arc<Mutex<PipelineStats>>,
        state: watch::Receiver<PipelineState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            commands,
            geometry,
            stats,
            state,
            cancel,
        }
    }

    fn post(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| ScanError::ServiceClosed)
    }

    /// Hand an opened camera to the scanner and begin streaming.
    ///
    /// If the preview surface is not ready yet the camera is kept and
    /// streaming begins once it is.
    pub async fn start(&self, camera: Box<dyn CameraDevice>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.post(Command::Start { camera, reply })?;
        rx.await.map_err(|_| ScanError::ServiceClosed)?
    }

    /// Stop scanning and release the camera; returns once it is released
    pub async fn stop(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.post(Command::Stop { reply })?;
        rx.await.map_err(|_| ScanError::ServiceClosed)
    }

    /// Report that the preview surface became ready or went away
    pub fn on_surface_changed(&self, ready: bool) -> Result<()> {
        self.post(Command::SurfaceChanged { ready, reply: None })
    }

    /// Like [`on_surface_changed`](Self::on_surface_changed), but waits for
    /// any deferred start to finish and reports its outcome
    pub async fn surface_changed(&self, ready: bool) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.post(Command::SurfaceChanged {
            ready,
            reply: Some(reply),
        })?;
        rx.await.map_err(|_| ScanError::ServiceClosed)?
    }

    /// Record a new host view size; returns the resulting scan rectangle
    pub fn on_view_resized(&self, view: ViewSize) -> Option<ScanRect> {
        let rect = self.geometry.on_view_resized(view);
        if self.post(Command::ViewResized).is_err() {
            debug!("View resize after scanner shutdown");
        }
        rect
    }

    /// Record a device rotation report from the orientation sensor
    pub fn on_rotation_changed(&self, rotation: Rotation) {
        let Some(compensation) = self.geometry.on_rotation_changed(rotation) else {
            return;
        };
        debug!(
            "Device rotation {} degrees, compensation {} degrees",
            rotation.degrees(),
            compensation.degrees()
        );
        if self.post(Command::RotationChanged(compensation)).is_err() {
            debug!("Rotation change after scanner shutdown");
        }
    }

    /// Focus now; with a point, aim the focus areas there first
    pub fn on_touch(&self, point: Option<Point>) -> Result<()> {
        self.post(Command::Touch(point))
    }

    pub fn set_autofocus(&self, enabled: bool) -> Result<()> {
        self.post(Command::SetAutofocus(enabled))
    }

    pub fn framing_rect(&self) -> Option<ScanRect> {
        self.geometry.framing_rect()
    }

    /// Scan rectangle updates for drawing a viewfinder overlay
    pub fn subscribe_framing(&self) -> watch::Receiver<Option<ScanRect>> {
        self.geometry.subscribe()
    }

    /// View size that shows the chosen preview without distortion
    pub fn preview_layout(&self) -> Option<ViewSize> {
        self.geometry.preview_layout()
    }

    pub fn compensation(&self) -> Rotation {
        self.geometry.compensation()
    }

    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state.clone()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats.lock().clone()
    }

    /// Wait until the pipeline reaches `target`
    pub async fn wait_for_state(&self, target: PipelineState) -> Result<()> {
        let mut state = self.state.clone();
        state
            .wait_for(|current| *current == target)
            .await
            .map(|_| ())
            .map_err(|_| ScanError::ServiceClosed)
    }

    /// Stop the service task; the camera is released on the way out
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
