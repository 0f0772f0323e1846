use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Camera reported no supported preview sizes")]
    NoSupportedSize,

    #[error("Scanner service is not running")]
    ServiceClosed,
}

/// Failures reported by the camera device boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("Camera not available")]
    NotAvailable,

    #[error("Camera configuration failed: {details}")]
    Configuration { details: String },

    #[error("Camera hardware fault during {operation}: {details}")]
    HardwareFault { operation: String, details: String },

    #[error("Camera handle already released")]
    Released,
}

impl CameraError {
    pub fn fault<S: Into<String>>(operation: S, details: S) -> Self {
        Self::HardwareFault {
            operation: operation.into(),
            details: details.into(),
        }
    }

    /// Faults that some devices raise intermittently and that clear on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, CameraError::HardwareFault { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Decode engine failure: {details}")]
    Engine { details: String },

    #[error("Checksum or format error: {details}")]
    Format { details: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Frame buffer too small: expected at least {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("Crop {width}x{height}+{left}+{top} does not fit in {data_width}x{data_height} frame")]
    CropOutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        data_width: u32,
        data_height: u32,
    },
}

pub type Result<T> = std::result::Result<T, ScanError>;
