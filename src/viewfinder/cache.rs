use super::framing::{framing_rect, map_to_preview};
use crate::geometry::{ScanRect, ViewSize};
use crate::preview_size::PreviewSize;
use tracing::trace;

/// Scan rectangle in view space plus its lazily mapped preview-space copy.
///
/// The preview-space rectangle is computed on first use and kept until
/// [`FramingCache::invalidate`] runs, which happens on view resize and on
/// orientation changes.
#[derive(Debug, Clone, Default)]
pub struct FramingCache {
    view: ViewSize,
    view_rect: Option<ScanRect>,
    preview_rect: Option<(PreviewSize, ScanRect)>,
}

impl FramingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the view-space rectangle for a new host view size
    pub fn on_view_resized(&mut self, view: ViewSize) -> Option<ScanRect> {
        self.view = view;
        self.view_rect = framing_rect(view);
        self.invalidate();
        self.view_rect
    }

    pub fn invalidate(&mut self) {
        if self.preview_rect.take().is_some() {
            trace!("Preview-space scan rectangle invalidated");
        }
    }

    pub fn view_size(&self) -> ViewSize {
        self.view
    }

    pub fn view_rect(&self) -> Option<ScanRect> {
        self.view_rect
    }

    /// Scan rectangle in the coordinates of a `preview`-sized buffer
    pub fn rect_in_preview(&mut self, preview: PreviewSize) -> Option<ScanRect> {
        if let Some((size, rect)) = self.preview_rect {
            if size == preview {
                return Some(rect);
            }
        }

        let rect = map_to_preview(&self.view_rect?, self.view, preview)?;
        trace!(
            "Mapped scan rectangle to {}x{} preview: {:?}",
            preview.width,
            preview.height,
            rect
        );
        self.preview_rect = Some((preview, rect));
        Some(rect)
    }

    pub fn is_cached(&self) -> bool {
        self.preview_rect.is_some()
    }
}
