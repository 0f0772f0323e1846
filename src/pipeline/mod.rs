mod core;
mod handle;
mod service;
mod state;
mod stats;

pub use self::core::{FramePipeline, SessionFrame};
pub use handle::ScannerHandle;
pub use service::ScannerService;
pub use state::PipelineState;
pub use stats::PipelineStats;
