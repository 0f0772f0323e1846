mod interface;
mod mock;
#[cfg(test)]
mod tests;

pub use interface::{
    CameraDevice, CameraParameters, FocusCallback, FocusMode, FrameConsumer, MeteringArea,
    SensorRect,
};
pub use mock::{MockCamera, MockCameraProbe, MockFrameSource};
