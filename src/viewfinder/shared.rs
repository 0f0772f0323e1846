use super::cache::FramingCache;
use crate::geometry::{ScanRect, ViewSize};
use crate::orientation::{CameraFacing, OrientationState, OrientationTracker, Rotation};
use crate::preview_size::PreviewSize;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

struct GeometryState {
    tracker: OrientationTracker,
    framing: FramingCache,
    preview_layout: Option<ViewSize>,
}

/// Orientation and scan-rectangle state shared between the host-side
/// listeners and the capture task.
///
/// One lock guards both the orientation tracker and the geometry cache, so
/// a reader never sees a new compensation angle paired with a stale
/// preview-space rectangle. No camera call is ever made while it is held.
#[derive(Clone)]
pub struct SharedGeometry {
    state: Arc<Mutex<GeometryState>>,
    framing_tx: Arc<watch::Sender<Option<ScanRect>>>,
}

impl SharedGeometry {
    pub fn new(sensor_mount_degrees: u16, facing: CameraFacing) -> Self {
        let (framing_tx, _) = watch::channel(None);

        Self {
            state: Arc::new(Mutex::new(GeometryState {
                tracker: OrientationTracker::new(sensor_mount_degrees, facing),
                framing: FramingCache::new(),
                preview_layout: None,
            })),
            framing_tx: Arc::new(framing_tx),
        }
    }

    /// Apply a rotation report; returns the new compensation when it changed
    pub fn on_rotation_changed(&self, rotation: Rotation) -> Option<Rotation> {
        let mut state = self.state.lock();
        let changed = state.tracker.on_rotation_changed(rotation);
        if changed.is_some() {
            state.framing.invalidate();
        }
        changed
    }

    /// Recompute the view-space scan rectangle and notify overlay subscribers
    pub fn on_view_resized(&self, view: ViewSize) -> Option<ScanRect> {
        let rect = {
            let mut state = self.state.lock();
            if state.framing.view_size() == view && state.framing.view_rect().is_some() {
                return state.framing.view_rect();
            }
            state.framing.on_view_resized(view)
        };

        debug!("View resized to {}x{}, scan rectangle {:?}", view.width, view.height, rect);
        self.framing_tx.send_replace(rect);
        rect
    }

    pub fn compensation(&self) -> Rotation {
        self.state.lock().tracker.compensation()
    }

    pub fn orientation(&self) -> OrientationState {
        self.state.lock().tracker.state()
    }

    pub fn view_size(&self) -> ViewSize {
        self.state.lock().framing.view_size()
    }

    pub fn framing_rect(&self) -> Option<ScanRect> {
        self.state.lock().framing.view_rect()
    }

    /// Compensation angle and preview-space rectangle read under one lock.
    ///
    /// `raw` is the buffer size as delivered by the sensor; the rectangle is
    /// mapped into the buffer after rotation normalization.
    pub fn frame_geometry(&self, raw: PreviewSize) -> (Rotation, Option<ScanRect>) {
        let mut state = self.state.lock();
        let compensation = state.tracker.compensation();
        let normalized = if compensation.swaps_axes() {
            raw.transposed()
        } else {
            raw
        };
        (compensation, state.framing.rect_in_preview(normalized))
    }

    pub fn set_preview_layout(&self, layout: Option<ViewSize>) {
        self.state.lock().preview_layout = layout;
    }

    /// View size the host should adopt to show the preview undistorted
    pub fn preview_layout(&self) -> Option<ViewSize> {
        self.state.lock().preview_layout
    }

    /// Watch scan rectangle changes, e.g. to redraw a viewfinder overlay
    pub fn subscribe(&self) -> watch::Receiver<Option<ScanRect>> {
        self.framing_tx.subscribe()
    }
}
