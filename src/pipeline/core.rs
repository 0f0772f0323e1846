use super::{PipelineState, PipelineStats};
use crate::autofocus::{AutofocusMode, AutofocusScheduler, FocusEvent};
use crate::camera::{CameraDevice, FrameConsumer};
use crate::config::ScannerConfig;
use crate::decode::{DecodeEngine, DecodeResult, DecodeResultSink, FormatSet};
use crate::error::{CameraError, Result, ScanError};
use crate::frame::{rotate_luminance, LuminanceSource, PreviewFrame};
use crate::geometry::{Point, ViewSize};
use crate::orientation::Rotation;
use crate::preview_size::{fit_view_to_preview, PreviewSize, PreviewSizeSelector};
use crate::viewfinder::SharedGeometry;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// A delivered frame tagged with the session that armed it
#[derive(Debug)]
pub struct SessionFrame {
    pub session: u64,
    pub frame: PreviewFrame,
}

/// One-shot consumer handed to the camera; forwards into the owning task
struct FrameTap {
    session: u64,
    frames: mpsc::UnboundedSender<SessionFrame>,
}

impl FrameConsumer for FrameTap {
    fn on_preview_frame(self: Box<Self>, frame: PreviewFrame) {
        let session = self.session;
        if self.frames.send(SessionFrame { session, frame }).is_err() {
            trace!("Frame for session {} dropped, pipeline gone", session);
        }
    }
}

enum FrameOutcome {
    Hit(DecodeResult),
    Miss,
    Skipped,
}

/// Single-shot capture loop: rotate, crop, decode, re-arm on miss.
///
/// Owns the camera for the lifetime of a session. All methods run on the
/// scanner service task.
pub struct FramePipeline {
    geometry: SharedGeometry,
    selector: PreviewSizeSelector,
    formats: FormatSet,
    engine: Box<dyn DecodeEngine>,
    sink: Box<dyn DecodeResultSink>,
    autofocus: AutofocusScheduler,
    camera: Option<Box<dyn CameraDevice>>,
    preview_size: Option<PreviewSize>,
    surface_ready: bool,
    start_requested: bool,
    session: u64,
    scan_id: Option<Uuid>,
    frames_tx: mpsc::UnboundedSender<SessionFrame>,
    rotated: Vec<u8>,
    stats: Arc<Mutex<PipelineStats>>,
    state_tx: watch::Sender<PipelineState>,
}

impl FramePipeline {
    pub fn new(
        config: &ScannerConfig,
        geometry: SharedGeometry,
        engine: Box<dyn DecodeEngine>,
        sink: Box<dyn DecodeResultSink>,
        frames_tx: mpsc::UnboundedSender<SessionFrame>,
        focus_tx: mpsc::UnboundedSender<FocusEvent>,
    ) -> Self {
        let (state_tx, _) = watch::channel(PipelineState::Idle);

        Self {
            geometry,
            selector: PreviewSizeSelector::new(config.preview.aspect_tolerance),
            formats: config.decode.format_set(),
            engine,
            sink,
            autofocus: AutofocusScheduler::new(config.autofocus.clone(), focus_tx),
            camera: None,
            preview_size: None,
            surface_ready: false,
            start_requested: false,
            session: 0,
            scan_id: None,
            frames_tx,
            rotated: Vec::new(),
            stats: Arc::new(Mutex::new(PipelineStats::default())),
            state_tx,
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state_tx.subscribe()
    }

    pub fn stats_handle(&self) -> Arc<Mutex<PipelineStats>> {
        Arc::clone(&self.stats)
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn preview_size(&self) -> Option<PreviewSize> {
        self.preview_size
    }

    pub fn autofocus(&self) -> &AutofocusScheduler {
        &self.autofocus
    }

    fn set_state(&mut self, state: PipelineState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!("Pipeline state {} -> {}", previous, state);
        }
    }

    /// Take ownership of an opened camera, releasing any previous one
    pub fn attach(&mut self, camera: Box<dyn CameraDevice>) {
        if self.camera.is_some() {
            warn!("Attaching a camera while another is held, releasing the old one");
            self.shutdown();
        }
        self.camera = Some(camera);
        self.set_state(PipelineState::Idle);
    }

    /// Begin streaming, or defer until the surface is ready.
    ///
    /// Calling while already streaming is a no-op. Configuration failures
    /// release the camera and leave the pipeline Stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.state().is_active() {
            debug!("Pipeline already streaming, start ignored");
            return Ok(());
        }
        if self.camera.is_none() {
            return Err(ScanError::Camera(CameraError::NotAvailable));
        }
        if !self.surface_ready {
            debug!("Preview surface not ready, streaming deferred");
            self.start_requested = true;
            return Ok(());
        }

        self.start_requested = false;
        if let Err(e) = self.begin_session() {
            error!("Failed to start camera preview: {}", e);
            self.shutdown();
            return Err(e);
        }
        Ok(())
    }

    fn begin_session(&mut self) -> Result<()> {
        let view = self.geometry.view_size();
        let compensation = self.geometry.compensation();
        let Some(camera) = self.camera.as_deref_mut() else {
            return Err(ScanError::Camera(CameraError::NotAvailable));
        };

        let params = camera.parameters()?;
        let size = self
            .selector
            .select(&params.supported_preview_sizes, view.to_landscape())?;
        camera.set_preview_size(size)?;
        self.preview_size = Some(size);
        if !view.is_empty() {
            self.geometry
                .set_preview_layout(Some(fit_view_to_preview(view, size, compensation)));
        }

        self.autofocus.attach(&params);
        if let Some(mode) = params.triggered_focus_mode() {
            camera.set_focus_mode(mode)?;
        }
        if let Some(rect) = self.geometry.framing_rect() {
            self.autofocus.aim_at(camera, rect.center(), view);
        }
        camera.set_display_orientation(compensation)?;

        self.session += 1;
        let scan_id = Uuid::new_v4();
        self.scan_id = Some(scan_id);
        self.stats.lock().record_session();
        info!(
            "Scan {} streaming at {}x{}, rotation {} degrees",
            scan_id,
            size.width,
            size.height,
            compensation.degrees()
        );

        camera.start_preview()?;
        self.set_state(PipelineState::Streaming);
        self.arm()?;

        if let Some(camera) = self.camera.as_deref_mut() {
            self.autofocus.start(camera, self.surface_ready);
        }
        Ok(())
    }

    /// Request exactly one more frame for the current session
    fn arm(&mut self) -> std::result::Result<(), CameraError> {
        let Some(camera) = self.camera.as_deref_mut() else {
            return Err(CameraError::NotAvailable);
        };

        let tap = FrameTap {
            session: self.session,
            frames: self.frames_tx.clone(),
        };
        camera.set_one_shot_callback(Some(Box::new(tap)))?;
        self.stats.lock().record_request();
        Ok(())
    }

    pub fn on_surface_changed(&mut self, ready: bool) -> Result<()> {
        if ready == self.surface_ready {
            return Ok(());
        }
        self.surface_ready = ready;

        if ready {
            debug!("Preview surface ready");
            if self.start_requested {
                return self.start();
            }
        } else if self.state().is_active() {
            info!("Preview surface destroyed, stopping scan");
            self.stop();
        }
        Ok(())
    }

    pub fn on_view_resized(&mut self) {
        let view = self.geometry.view_size();
        if let Some(size) = self.preview_size {
            if !view.is_empty() {
                let layout = fit_view_to_preview(view, size, self.geometry.compensation());
                self.geometry.set_preview_layout(Some(layout));
            }
        }

        if !self.state().is_active() {
            return;
        }
        if let (Some(rect), Some(camera)) = (self.geometry.framing_rect(), self.camera.as_deref_mut()) {
            self.autofocus.aim_at(camera, rect.center(), view);
        }
    }

    /// Apply a new compensation angle to the hardware preview
    pub fn on_rotation_changed(&mut self, compensation: Rotation) {
        if let Some(size) = self.preview_size {
            let view = self.geometry.view_size();
            if !view.is_empty() {
                self.geometry
                    .set_preview_layout(Some(fit_view_to_preview(view, size, compensation)));
            }
        }

        let Some(camera) = self.camera.as_deref_mut() else {
            return;
        };
        if let Err(e) = camera.set_display_orientation(compensation) {
            warn!("Failed to apply display rotation {}: {}", compensation.degrees(), e);
        }
    }

    pub fn on_touch(&mut self, point: Option<Point>) {
        if !self.state().is_active() {
            return;
        }
        let view = self.geometry.view_size();
        if let Some(camera) = self.camera.as_deref_mut() {
            self.autofocus.on_touch(point, view, camera, self.surface_ready);
        }
    }

    pub fn set_autofocus(&mut self, enabled: bool) {
        let mode = if enabled {
            AutofocusMode::Continuous
        } else {
            AutofocusMode::Paused
        };
        match self.camera.as_deref_mut() {
            Some(camera) => self.autofocus.set_mode(mode, Some(camera), self.surface_ready),
            None => self.autofocus.set_mode(mode, None, self.surface_ready),
        }
    }

    pub fn on_focus_event(&mut self, event: FocusEvent) {
        if !self.state().is_active() {
            trace!("Focus event {:?} after stop ignored", event);
            return;
        }
        if let Some(camera) = self.camera.as_deref_mut() {
            self.autofocus.on_event(event, camera, self.surface_ready);
        }
    }

    /// Decode one delivered frame, then re-arm or finish
    pub fn handle_frame(&mut self, delivered: SessionFrame) {
        if delivered.session != self.session || self.state() != PipelineState::Streaming {
            trace!(
                "Dropping frame {} from session {} (current {}, {})",
                delivered.frame.id,
                delivered.session,
                self.session,
                self.state()
            );
            self.stats.lock().record_stale_frame();
            return;
        }

        self.stats.lock().record_frame();
        self.set_state(PipelineState::Decoding);

        match self.decode_frame(&delivered.frame) {
            FrameOutcome::Hit(result) => {
                info!(
                    "Scan {} decoded {} ({} chars) from frame {}",
                    self.scan_id.map(|id| id.to_string()).unwrap_or_default(),
                    result.format,
                    result.text.len(),
                    delivered.frame.id
                );
                self.shutdown();
                self.sink.handle_result(result);
            }
            FrameOutcome::Miss | FrameOutcome::Skipped => {
                self.set_state(PipelineState::Streaming);
                if let Err(e) = self.arm() {
                    error!("Failed to request next frame: {}", e);
                    self.shutdown();
                }
            }
        }
    }

    fn decode_frame(&mut self, frame: &PreviewFrame) -> FrameOutcome {
        let luminance = match frame.luminance() {
            Ok(luminance) => luminance,
            Err(e) => {
                warn!("Skipping frame {}: {}", frame.id, e);
                self.stats.lock().record_skip();
                return FrameOutcome::Skipped;
            }
        };

        let (compensation, rect) = self.geometry.frame_geometry(frame.size());
        let Some(rect) = rect else {
            debug!("Scan geometry unavailable, skipping frame {}", frame.id);
            self.stats.lock().record_skip();
            return FrameOutcome::Skipped;
        };

        let (data, width, height) = if compensation == Rotation::Rotate0 {
            (luminance, frame.width, frame.height)
        } else {
            match rotate_luminance(luminance, frame.width, frame.height, compensation, &mut self.rotated)
            {
                Ok((width, height)) => (&self.rotated[..], width, height),
                Err(e) => {
                    warn!("Skipping frame {}: {}", frame.id, e);
                    self.stats.lock().record_skip();
                    return FrameOutcome::Skipped;
                }
            }
        };

        let source = match LuminanceSource::from_rect(data, width, height, &rect) {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping frame {}: {}", frame.id, e);
                self.stats.lock().record_skip();
                return FrameOutcome::Skipped;
            }
        };

        self.stats.lock().begin_decode();
        let started = Instant::now();
        let decoded = self.engine.decode(&source, &self.formats);
        self.engine.reset();

        let mut stats = self.stats.lock();
        stats.end_decode(started.elapsed());
        match decoded {
            Ok(Some(result)) => {
                stats.record_hit();
                FrameOutcome::Hit(result)
            }
            Ok(None) => {
                stats.record_miss();
                FrameOutcome::Miss
            }
            Err(e) => {
                warn!("Decode engine failed on frame {}: {}", frame.id, e);
                stats.record_engine_error();
                stats.record_miss();
                FrameOutcome::Miss
            }
        }
    }

    /// End the session and release the camera. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.camera.is_none() && self.state() == PipelineState::Stopped {
            return;
        }
        info!("Stopping scan pipeline");
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.start_requested = false;
        if let Some(mut camera) = self.camera.take() {
            // timers go first so nothing touches the released handle
            self.autofocus.stop(camera.as_mut());
            if let Err(e) = camera.set_one_shot_callback(None) {
                debug!("Clearing frame callback failed: {}", e);
            }
            if let Err(e) = camera.stop_preview() {
                debug!("Stopping preview failed: {}", e);
            }
            camera.release();
            debug!("Camera released");
        }
        self.preview_size = None;
        self.scan_id = None;
        self.set_state(PipelineState::Stopped);
    }

    pub fn view_size(&self) -> ViewSize {
        self.geometry.view_size()
    }
}
