use super::area::FocusTarget;
use super::timer::DeferredTask;
use crate::camera::{CameraDevice, CameraParameters};
use crate::config::AutofocusConfig;
use crate::geometry::{Point, ViewSize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

/// Whether focus passes repeat on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutofocusMode {
    Continuous,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Disabled,
    WaitingForSurface,
    Focusing,
    Cooldown,
}

/// Messages the scheduler posts to the task that owns the camera.
///
/// Each carries the generation it was issued under; anything older than the
/// scheduler's current generation is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Retry { generation: u64 },
    Completed { generation: u64, success: bool },
}

/// Drives periodic autofocus on a camera it borrows per call
pub struct AutofocusScheduler {
    settings: AutofocusConfig,
    mode: AutofocusMode,
    state: FocusState,
    active: bool,
    supported: bool,
    max_focus_areas: u32,
    max_metering_areas: u32,
    generation: u64,
    timer: Option<DeferredTask>,
    events: mpsc::UnboundedSender<FocusEvent>,
}

impl AutofocusScheduler {
    pub fn new(settings: AutofocusConfig, events: mpsc::UnboundedSender<FocusEvent>) -> Self {
        let mode = if settings.enabled {
            AutofocusMode::Continuous
        } else {
            AutofocusMode::Paused
        };

        Self {
            settings,
            mode,
            state: FocusState::Disabled,
            active: false,
            supported: false,
            max_focus_areas: 0,
            max_metering_areas: 0,
            generation: 0,
            timer: None,
            events,
        }
    }

    pub fn mode(&self) -> AutofocusMode {
        self.mode
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_cancelled())
    }

    /// Record the capabilities of a freshly attached camera
    pub fn attach(&mut self, params: &CameraParameters) {
        self.supported = params.supports_autofocus();
        self.max_focus_areas = params.max_focus_areas;
        self.max_metering_areas = params.max_metering_areas;
        if !self.supported {
            debug!("Camera has no triggerable focus mode, autofocus disabled");
        }
    }

    /// Begin focusing for a new streaming session
    pub fn start(&mut self, camera: &mut dyn CameraDevice, surface_ready: bool) {
        self.active = true;
        if self.mode == AutofocusMode::Paused || !self.supported {
            self.state = FocusState::Disabled;
            return;
        }

        if surface_ready {
            self.trigger_focus(camera);
        } else {
            self.wait_for_surface();
        }
    }

    pub fn set_mode(
        &mut self,
        mode: AutofocusMode,
        camera: Option<&mut dyn CameraDevice>,
        surface_ready: bool,
    ) {
        if self.mode == mode {
            return;
        }
        debug!("Autofocus mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;

        let Some(camera) = camera else {
            return;
        };
        if !self.active {
            return;
        }

        match mode {
            AutofocusMode::Continuous => self.start(camera, surface_ready),
            AutofocusMode::Paused => self.halt(camera),
        }
    }

    /// Cancel whatever pass is running and issue a new one
    pub fn trigger_focus(&mut self, camera: &mut dyn CameraDevice) {
        self.cancel_timer();
        if !self.supported {
            return;
        }

        if let Err(e) = camera.cancel_auto_focus() {
            debug!("Cancelling previous autofocus failed: {}", e);
        }

        self.generation += 1;
        let generation = self.generation;
        let events = self.events.clone();
        let done = Box::new(move |success: bool| {
            let _ = events.send(FocusEvent::Completed {
                generation,
                success,
            });
        });

        match camera.auto_focus(done) {
            Ok(()) => {
                trace!("Autofocus pass {} started", generation);
                self.state = FocusState::Focusing;
            }
            Err(e) if e.is_transient() => {
                // some devices fault intermittently; wait like a missing surface
                warn!("Autofocus request failed, retrying: {}", e);
                self.state = FocusState::WaitingForSurface;
                self.schedule_retry(self.settings.retry_delay());
            }
            Err(e) => {
                error!("Autofocus unavailable: {}", e);
                self.state = FocusState::Disabled;
            }
        }
    }

    /// Handle a message posted by a timer or a completion callback
    pub fn on_event(
        &mut self,
        event: FocusEvent,
        camera: &mut dyn CameraDevice,
        surface_ready: bool,
    ) {
        match event {
            FocusEvent::Retry { generation } => {
                if !self.is_current(generation) {
                    trace!("Ignoring stale autofocus retry {}", generation);
                    return;
                }
                self.timer = None;
                if surface_ready {
                    self.trigger_focus(camera);
                } else {
                    self.wait_for_surface();
                }
            }
            FocusEvent::Completed {
                generation,
                success,
            } => {
                if !self.is_current(generation) {
                    trace!("Ignoring stale autofocus completion {}", generation);
                    return;
                }
                debug!("Autofocus pass {} finished, success: {}", generation, success);

                if self.mode == AutofocusMode::Continuous {
                    self.state = FocusState::Cooldown;
                    self.schedule_retry(self.settings.cooldown());
                } else {
                    self.state = FocusState::Disabled;
                }
            }
        }
    }

    /// Focus now, optionally re-aiming the focus areas at a touched point
    pub fn on_touch(
        &mut self,
        point: Option<Point>,
        view: ViewSize,
        camera: &mut dyn CameraDevice,
        surface_ready: bool,
    ) {
        if !self.active || !self.supported {
            return;
        }

        if let Some(point) = point {
            self.aim_at(camera, point, view);
        }

        if !surface_ready {
            debug!("Touch focus ignored until the preview surface is ready");
            return;
        }
        self.trigger_focus(camera);
    }

    /// Point the focus and metering areas at a view location
    pub fn aim_at(&self, camera: &mut dyn CameraDevice, point: Point, view: ViewSize) {
        if !self.supported {
            return;
        }
        let Some(target) = FocusTarget::at(point, view, &self.settings) else {
            return;
        };

        let focus = (self.max_focus_areas > 0).then_some(target.focus);
        let metering = (self.max_metering_areas > 0).then_some(target.metering);
        if focus.is_none() && metering.is_none() {
            return;
        }

        debug!("Focus area {:?}", target.focus.rect);
        if let Err(e) = camera.set_focus_areas(focus, metering) {
            warn!("Failed to set focus areas: {}", e);
        }
    }

    /// Cancel timers and any in-flight pass; the session ends
    pub fn stop(&mut self, camera: &mut dyn CameraDevice) {
        self.halt(camera);
        self.active = false;
    }

    fn halt(&mut self, camera: &mut dyn CameraDevice) {
        self.cancel_timer();
        // outstanding completions belong to the old generation
        self.generation += 1;
        if self.supported {
            if let Err(e) = camera.cancel_auto_focus() {
                debug!("Cancelling autofocus failed: {}", e);
            }
        }
        self.state = FocusState::Disabled;
    }

    fn wait_for_surface(&mut self) {
        debug!("Preview surface not ready, deferring autofocus");
        self.state = FocusState::WaitingForSurface;
        self.schedule_retry(self.settings.retry_delay());
    }

    fn schedule_retry(&mut self, delay: Duration) {
        self.cancel_timer();
        self.generation += 1;
        let generation = self.generation;
        let events = self.events.clone();

        self.timer = Some(DeferredTask::schedule(delay, move || {
            let _ = events.send(FocusEvent::Retry { generation });
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active && generation == self.generation
    }
}
