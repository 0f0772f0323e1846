use crate::error::{Result, ScanError};
use crate::geometry::ViewSize;
use crate::orientation::Rotation;
use tracing::debug;

/// Capture resolution of the camera preview stream
pub type PreviewSize = ViewSize;

pub const DEFAULT_ASPECT_TOLERANCE: f64 = 0.1;

/// Picks the capture resolution that best matches the host view
#[derive(Debug, Clone)]
pub struct PreviewSizeSelector {
    aspect_tolerance: f64,
}

impl Default for PreviewSizeSelector {
    fn default() -> Self {
        Self::new(DEFAULT_ASPECT_TOLERANCE)
    }
}

impl PreviewSizeSelector {
    pub fn new(aspect_tolerance: f64) -> Self {
        Self { aspect_tolerance }
    }

    /// Select a preview size for a landscape-oriented target.
    ///
    /// Sizes within the aspect tolerance of the target ratio are preferred;
    /// among them the one with the closest height wins. When no size matches
    /// the ratio, the closest height overall wins. Ties go to the earlier
    /// entry. A target with a zero dimension has no usable ratio, so the
    /// first supported size is returned.
    pub fn select(&self, supported: &[PreviewSize], target: ViewSize) -> Result<PreviewSize> {
        let first = supported.first().copied().ok_or(ScanError::NoSupportedSize)?;

        if target.is_empty() {
            debug!("View not laid out yet, using first supported preview size {:?}", first);
            return Ok(first);
        }

        let target_ratio = target.width as f64 / target.height as f64;

        let aspect_match = closest_height(
            supported
                .iter()
                .filter(|size| (aspect_ratio(size) - target_ratio).abs() <= self.aspect_tolerance),
            target.height,
        );

        let selected = match aspect_match {
            Some(size) => size,
            None => {
                debug!(
                    "No preview size within {} of aspect ratio {:.3}, matching height only",
                    self.aspect_tolerance, target_ratio
                );
                closest_height(supported.iter(), target.height).unwrap_or(first)
            }
        };

        debug!(
            "Selected preview size {}x{} for target {}x{}",
            selected.width, selected.height, target.width, target.height
        );

        Ok(selected)
    }
}

fn aspect_ratio(size: &PreviewSize) -> f64 {
    if size.height == 0 {
        return f64::INFINITY;
    }
    size.width as f64 / size.height as f64
}

fn closest_height<'a>(
    candidates: impl Iterator<Item = &'a PreviewSize>,
    target_height: u32,
) -> Option<PreviewSize> {
    // min_by_key keeps the first of equal minima
    candidates
        .min_by_key(|size| size.height.abs_diff(target_height))
        .copied()
}

/// Resize the host view so it shows the preview without distortion.
///
/// Works in landscape terms: the view keeps the dimension that already fits
/// the camera aspect ratio and overflows the other one. The result is
/// transposed back when the display compensation is a quarter turn.
pub fn fit_view_to_preview(view: ViewSize, preview: PreviewSize, compensation: Rotation) -> ViewSize {
    if view.is_empty() || preview.is_empty() {
        return view;
    }

    let landscape = if compensation.swaps_axes() {
        view.transposed()
    } else {
        view
    };

    let (lw, lh) = (landscape.width as u64, landscape.height as u64);
    let (pw, ph) = (preview.width as u64, preview.height as u64);

    // compare lw/lh < pw/ph without float rounding
    let fitted = if lw * ph < pw * lh {
        ViewSize::new((lh * pw / ph) as u32, landscape.height)
    } else {
        ViewSize::new(landscape.width, (lw * ph / pw) as u32)
    };

    if compensation.swaps_axes() {
        fitted.transposed()
    } else {
        fitted
    }
}
