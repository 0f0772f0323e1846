use crate::error::CameraError;
use crate::frame::PreviewFrame;
use crate::orientation::Rotation;
use crate::preview_size::PreviewSize;
use serde::{Deserialize, Serialize};

/// Focus modes a device may advertise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    Auto,
    Macro,
    ContinuousPicture,
    ContinuousVideo,
    Infinity,
    Fixed,
}

impl FocusMode {
    /// Modes that respond to explicit autofocus requests, in preference order
    pub const TRIGGERED: [FocusMode; 2] = [FocusMode::Auto, FocusMode::Macro];
}

/// Rectangle in normalized sensor coordinates, `[-1000, 1000]` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// A weighted focus or metering region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeteringArea {
    pub rect: SensorRect,
    /// 1..=1000
    pub weight: u16,
}

/// Capabilities and current settings reported by a camera
#[derive(Debug, Clone, Default)]
pub struct CameraParameters {
    pub supported_preview_sizes: Vec<PreviewSize>,
    pub preview_size: Option<PreviewSize>,
    pub supported_focus_modes: Vec<FocusMode>,
    pub focus_mode: Option<FocusMode>,
    pub max_focus_areas: u32,
    pub max_metering_areas: u32,
}

impl CameraParameters {
    /// First triggerable focus mode the device supports
    pub fn triggered_focus_mode(&self) -> Option<FocusMode> {
        FocusMode::TRIGGERED
            .into_iter()
            .find(|mode| self.supported_focus_modes.contains(mode))
    }

    pub fn supports_autofocus(&self) -> bool {
        self.triggered_focus_mode().is_some()
    }
}

/// Receives the single frame produced by one armed capture request
pub trait FrameConsumer: Send {
    fn on_preview_frame(self: Box<Self>, frame: PreviewFrame);
}

/// Invoked once when an autofocus pass finishes, with its success flag
pub type FocusCallback = Box<dyn FnOnce(bool) + Send>;

/// Hardware boundary of an opened camera.
///
/// All calls are made from the scanner's capture task. Callbacks handed to
/// the device may be invoked from any thread.
pub trait CameraDevice: Send {
    fn parameters(&self) -> Result<CameraParameters, CameraError>;

    fn set_preview_size(&mut self, size: PreviewSize) -> Result<(), CameraError>;

    fn set_focus_mode(&mut self, mode: FocusMode) -> Result<(), CameraError>;

    fn set_focus_areas(
        &mut self,
        focus: Option<MeteringArea>,
        metering: Option<MeteringArea>,
    ) -> Result<(), CameraError>;

    /// Rotation the device applies to its own preview display
    fn set_display_orientation(&mut self, rotation: Rotation) -> Result<(), CameraError>;

    fn start_preview(&mut self) -> Result<(), CameraError>;

    fn stop_preview(&mut self) -> Result<(), CameraError>;

    /// Arm (or with `None`, disarm) delivery of exactly one preview frame
    fn set_one_shot_callback(
        &mut self,
        consumer: Option<Box<dyn FrameConsumer>>,
    ) -> Result<(), CameraError>;

    fn auto_focus(&mut self, done: FocusCallback) -> Result<(), CameraError>;

    fn cancel_auto_focus(&mut self) -> Result<(), CameraError>;

    /// Give the hardware back; the handle is unusable afterwards
    fn release(&mut self);
}
