mod cache;
mod framing;
mod shared;
#[cfg(test)]
mod tests;

pub use cache::FramingCache;
pub use framing::{framing_rect, map_to_preview, map_to_view, ViewOrientation, MIN_FRAME_SIZE};
pub use shared::SharedGeometry;
