use super::interface::{
    CameraDevice, CameraParameters, FocusCallback, FocusMode, FrameConsumer, MeteringArea,
};
use crate::error::CameraError;
use crate::frame::{FrameFormat, PreviewFrame};
use crate::orientation::Rotation;
use crate::preview_size::PreviewSize;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Synthetic frames for a mock camera that delivers on its own
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    pub interval: Duration,
    pub format: FrameFormat,
}

impl MockFrameSource {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_millis(1000 / fps.max(1) as u64),
            format: FrameFormat::Nv21,
        }
    }

    fn generate(&self, id: u64, size: PreviewSize) -> PreviewFrame {
        let len = self.format.frame_size(size.width, size.height);
        let shade = (id % 64) as u8 + 96;
        PreviewFrame::new(id, vec![shade; len], size.width, size.height, self.format)
    }
}

#[derive(Default)]
struct MockState {
    params: CameraParameters,
    display_orientation: Option<Rotation>,
    focus_areas: Option<(Option<MeteringArea>, Option<MeteringArea>)>,
    previewing: bool,
    released: bool,
    pending_frame: Option<Box<dyn FrameConsumer>>,
    pending_focus: Option<FocusCallback>,
    frame_requests: u64,
    focus_requests: u64,
    focus_cancels: u64,
    autofocus_faults: u32,
    fail_configuration: bool,
    next_frame_id: u64,
}

impl MockState {
    fn ensure_open(&self) -> Result<(), CameraError> {
        if self.released {
            Err(CameraError::Released)
        } else {
            Ok(())
        }
    }
}

/// In-memory camera for tests and soak runs.
///
/// Without a frame source, frames and focus completions are delivered by
/// hand through a [`MockCameraProbe`]. With one, each armed request is
/// answered after the source interval on the current tokio runtime.
pub struct MockCamera {
    state: Arc<Mutex<MockState>>,
    source: Option<MockFrameSource>,
}

impl MockCamera {
    pub fn new(params: CameraParameters) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                params,
                ..MockState::default()
            })),
            source: None,
        }
    }

    /// Typical phone camera: three preview sizes and triggerable autofocus
    pub fn with_default_parameters() -> Self {
        Self::new(CameraParameters {
            supported_preview_sizes: vec![
                PreviewSize::new(640, 480),
                PreviewSize::new(1280, 720),
                PreviewSize::new(1920, 1080),
            ],
            preview_size: Some(PreviewSize::new(640, 480)),
            supported_focus_modes: vec![FocusMode::Auto, FocusMode::ContinuousPicture],
            focus_mode: None,
            max_focus_areas: 1,
            max_metering_areas: 1,
        })
    }

    pub fn with_frame_source(mut self, source: MockFrameSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn probe(&self) -> MockCameraProbe {
        MockCameraProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn schedule_frame(&self) {
        let Some(source) = self.source.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Mock camera has a frame source but no tokio runtime");
            return;
        };

        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            tokio::time::sleep(source.interval).await;
            let (consumer, frame) = {
                let mut state = state.lock();
                let Some(size) = state.params.preview_size else {
                    return;
                };
                // start_preview reschedules whatever is still armed
                if !state.previewing {
                    return;
                }
                let Some(consumer) = state.pending_frame.take() else {
                    return;
                };
                let id = state.next_frame_id;
                state.next_frame_id += 1;
                (consumer, source.generate(id, size))
            };
            trace!("Mock camera delivering frame {}", frame.id);
            consumer.on_preview_frame(frame);
        });
    }

    fn schedule_focus(&self) {
        let Some(source) = self.source.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            tokio::time::sleep(source.interval).await;
            let done = state.lock().pending_focus.take();
            if let Some(done) = done {
                done(true);
            }
        });
    }
}

impl CameraDevice for MockCamera {
    fn parameters(&self) -> Result<CameraParameters, CameraError> {
        let state = self.state.lock();
        state.ensure_open()?;
        Ok(state.params.clone())
    }

    fn set_preview_size(&mut self, size: PreviewSize) -> Result<(), CameraError> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        if state.fail_configuration {
            return Err(CameraError::Configuration {
                details: "mock configuration failure".to_string(),
            });
        }
        if !state.params.supported_preview_sizes.contains(&size) {
            return Err(CameraError::Configuration {
                details: format!("unsupported preview size {}x{}", size.width, size.height),
            });
        }
        state.params.preview_size = Some(size);
        Ok(())
    }

    fn set_focus_mode(&mut self, mode: FocusMode) -> Result<(), CameraError> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.params.focus_mode = Some(mode);
        Ok(())
    }

    fn set_focus_areas(
        &mut self,
        focus: Option<MeteringArea>,
        metering: Option<MeteringArea>,
    ) -> Result<(), CameraError> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.focus_areas = Some((focus, metering));
        Ok(())
    }

    fn set_display_orientation(&mut self, rotation: Rotation) -> Result<(), CameraError> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.display_orientation = Some(rotation);
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        let armed = {
            let mut state = self.state.lock();
            state.ensure_open()?;
            state.previewing = true;
            state.pending_frame.is_some()
        };
        if armed {
            self.schedule_frame();
        }
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), CameraError> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.previewing = false;
        Ok(())
    }

    fn set_one_shot_callback(
        &mut self,
        consumer: Option<Box<dyn FrameConsumer>>,
    ) -> Result<(), CameraError> {
        let previewing = {
            let mut state = self.state.lock();
            state.ensure_open()?;
            if consumer.is_some() {
                state.frame_requests += 1;
            }
            state.pending_frame = consumer;
            state.previewing && state.pending_frame.is_some()
        };
        if previewing {
            self.schedule_frame();
        }
        Ok(())
    }

    fn auto_focus(&mut self, done: FocusCallback) -> Result<(), CameraError> {
        {
            let mut state = self.state.lock();
            state.ensure_open()?;
            state.focus_requests += 1;
            if state.autofocus_faults > 0 {
                state.autofocus_faults -= 1;
                return Err(CameraError::fault("auto_focus", "injected fault"));
            }
            state.pending_focus = Some(done);
        }
        self.schedule_focus();
        Ok(())
    }

    fn cancel_auto_focus(&mut self) -> Result<(), CameraError> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.focus_cancels += 1;
        state.pending_focus = None;
        Ok(())
    }

    fn release(&mut self) {
        let mut state = self.state.lock();
        debug!("Mock camera released after {} frame requests", state.frame_requests);
        state.released = true;
        state.previewing = false;
        state.pending_frame = None;
        state.pending_focus = None;
    }
}

/// Test-side view of a [`MockCamera`] that outlives the boxed device
#[derive(Clone)]
pub struct MockCameraProbe {
    state: Arc<Mutex<MockState>>,
}

impl MockCameraProbe {
    /// Hand a frame to the armed consumer; false if nothing was armed
    pub fn deliver_frame(&self, frame: PreviewFrame) -> bool {
        let consumer = self.state.lock().pending_frame.take();
        match consumer {
            Some(consumer) => {
                consumer.on_preview_frame(frame);
                true
            }
            None => false,
        }
    }

    /// Finish the outstanding autofocus pass; false if none was pending
    pub fn complete_focus(&self, success: bool) -> bool {
        let done = self.state.lock().pending_focus.take();
        match done {
            Some(done) => {
                done(success);
                true
            }
            None => false,
        }
    }

    /// Make the next `count` autofocus requests fail with a hardware fault
    pub fn inject_autofocus_faults(&self, count: u32) {
        self.state.lock().autofocus_faults = count;
    }

    pub fn fail_configuration(&self, fail: bool) {
        self.state.lock().fail_configuration = fail;
    }

    pub fn frame_requests(&self) -> u64 {
        self.state.lock().frame_requests
    }

    pub fn has_pending_frame(&self) -> bool {
        self.state.lock().pending_frame.is_some()
    }

    pub fn focus_requests(&self) -> u64 {
        self.state.lock().focus_requests
    }

    pub fn focus_cancels(&self) -> u64 {
        self.state.lock().focus_cancels
    }

    pub fn has_pending_focus(&self) -> bool {
        self.state.lock().pending_focus.is_some()
    }

    pub fn is_previewing(&self) -> bool {
        self.state.lock().previewing
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    pub fn preview_size(&self) -> Option<PreviewSize> {
        self.state.lock().params.preview_size
    }

    pub fn focus_mode(&self) -> Option<FocusMode> {
        self.state.lock().params.focus_mode
    }

    pub fn display_orientation(&self) -> Option<Rotation> {
        self.state.lock().display_orientation
    }

    pub fn focus_areas(&self) -> Option<(Option<MeteringArea>, Option<MeteringArea>)> {
        self.state.lock().focus_areas
    }
}
