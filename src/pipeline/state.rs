use serde::Serialize;
use std::fmt;

/// Lifecycle of the capture/decode loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PipelineState {
    #[default]
    Idle,
    Streaming,
    Decoding,
    Stopped,
}

impl PipelineState {
    /// True while the camera is streaming frames
    pub fn is_active(&self) -> bool {
        matches!(self, PipelineState::Streaming | PipelineState::Decoding)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Streaming => "streaming",
            PipelineState::Decoding => "decoding",
            PipelineState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
