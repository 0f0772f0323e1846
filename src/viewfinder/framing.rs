use crate::geometry::{ScanRect, ViewSize};
use crate::preview_size::PreviewSize;

/// Smallest scan rectangle side, in view pixels
pub const MIN_FRAME_SIZE: u32 = 240;

// Maxima are the ratios applied to a 1920x1080 reference display
const LANDSCAPE_WIDTH_RATIO: (u32, u32) = (5, 8);
const LANDSCAPE_HEIGHT_RATIO: (u32, u32) = (5, 8);
const LANDSCAPE_MAX_FRAME_WIDTH: u32 = 1200;
const LANDSCAPE_MAX_FRAME_HEIGHT: u32 = 675;

const PORTRAIT_WIDTH_RATIO: (u32, u32) = (7, 8);
const PORTRAIT_HEIGHT_RATIO: (u32, u32) = (3, 8);
const PORTRAIT_MAX_FRAME_WIDTH: u32 = 945;
const PORTRAIT_MAX_FRAME_HEIGHT: u32 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOrientation {
    Landscape,
    Portrait,
}

impl ViewOrientation {
    pub fn of(view: ViewSize) -> Self {
        if view.is_portrait() {
            ViewOrientation::Portrait
        } else {
            ViewOrientation::Landscape
        }
    }

    /// Largest allowed scan rectangle `(width, height)`
    pub fn max_frame(&self) -> (u32, u32) {
        match self {
            ViewOrientation::Landscape => (LANDSCAPE_MAX_FRAME_WIDTH, LANDSCAPE_MAX_FRAME_HEIGHT),
            ViewOrientation::Portrait => (PORTRAIT_MAX_FRAME_WIDTH, PORTRAIT_MAX_FRAME_HEIGHT),
        }
    }
}

/// Scan rectangle in view space, or `None` before the view has been laid out.
///
/// Landscape boxes sit in the upper part of the view (one eighth of the
/// spare height above them). Portrait boxes use the horizontal margin as
/// their top margin as well.
pub fn framing_rect(view: ViewSize) -> Option<ScanRect> {
    if view.is_empty() {
        return None;
    }

    let orientation = ViewOrientation::of(view);
    let (max_width, max_height) = orientation.max_frame();

    let (width, height) = match orientation {
        ViewOrientation::Landscape => (
            desired_dimension(LANDSCAPE_WIDTH_RATIO, view.width, max_width),
            desired_dimension(LANDSCAPE_HEIGHT_RATIO, view.height, max_height),
        ),
        ViewOrientation::Portrait => (
            desired_dimension(PORTRAIT_WIDTH_RATIO, view.width, max_width),
            desired_dimension(PORTRAIT_HEIGHT_RATIO, view.height, max_height),
        ),
    };

    let left = (view.width - width) / 2;
    let top = match orientation {
        ViewOrientation::Landscape => (view.height - height) / 8,
        ViewOrientation::Portrait => left,
    };

    Some(ScanRect::new(
        left as f32,
        top as f32,
        (left + width) as f32,
        (top + height) as f32,
    ))
}

/// `ratio * resolution`, truncated and clamped to the hard bounds.
/// The minimum never exceeds the view itself.
fn desired_dimension((num, den): (u32, u32), resolution: u32, hard_max: u32) -> u32 {
    let hard_min = MIN_FRAME_SIZE.min(resolution);
    let dim = (resolution as u64 * num as u64 / den as u64) as u32;
    dim.clamp(hard_min, hard_max.max(hard_min))
}

/// Scale a view-space rectangle into preview-buffer coordinates
pub fn map_to_preview(rect: &ScanRect, view: ViewSize, preview: PreviewSize) -> Option<ScanRect> {
    if view.is_empty() || preview.is_empty() {
        return None;
    }

    Some(ScanRect::new(
        rect.left * preview.width as f32 / view.width as f32,
        rect.top * preview.height as f32 / view.height as f32,
        rect.right * preview.width as f32 / view.width as f32,
        rect.bottom * preview.height as f32 / view.height as f32,
    ))
}

/// Inverse of [`map_to_preview`]
pub fn map_to_view(rect: &ScanRect, preview: PreviewSize, view: ViewSize) -> Option<ScanRect> {
    map_to_preview(rect, preview, view)
}
