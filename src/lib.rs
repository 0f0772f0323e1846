pub mod autofocus;
pub mod camera;
pub mod config;
pub mod decode;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod orientation;
pub mod pipeline;
pub mod preview_size;
pub mod viewfinder;

pub use autofocus::{AutofocusMode, AutofocusScheduler, FocusState, FocusTarget};
pub use camera::{CameraDevice, CameraParameters, FocusMode, FrameConsumer, MockCamera};
pub use config::ScannerConfig;
pub use decode::{BarcodeFormat, DecodeEngine, DecodeResult, DecodeResultSink, FormatSet};
pub use error::{CameraError, DecodeError, FrameError, Result, ScanError};
pub use frame::{FrameFormat, LuminanceSource, PreviewFrame};
pub use geometry::{Point, ScanRect, ViewSize};
pub use orientation::{CameraFacing, OrientationTracker, Rotation};
pub use pipeline::{FramePipeline, PipelineState, PipelineStats, ScannerHandle, ScannerService};
pub use preview_size::{PreviewSize, PreviewSizeSelector};
pub use viewfinder::SharedGeometry;

#[cfg(feature = "qr")]
pub use decode::QrDecodeEngine;
