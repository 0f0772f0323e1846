use super::*;
use crate::geometry::{ScanRect, ViewSize};
use crate::orientation::{CameraFacing, Rotation};

const EPSILON: f32 = 1e-3;

fn assert_rect_close(a: &ScanRect, b: &ScanRect) {
    assert!((a.left - b.left).abs() < EPSILON, "{:?} != {:?}", a, b);
    assert!((a.top - b.top).abs() < EPSILON, "{:?} != {:?}", a, b);
    assert!((a.right - b.right).abs() < EPSILON, "{:?} != {:?}", a, b);
    assert!((a.bottom - b.bottom).abs() < EPSILON, "{:?} != {:?}", a, b);
}

#[test]
fn test_portrait_example() {
    let rect = framing_rect(ViewSize::new(1080, 1920)).unwrap();
    assert_eq!(rect.width(), 945.0);
    assert_eq!(rect.height(), 720.0);
    assert_eq!(rect.left, 67.0);
    // portrait reuses the horizontal margin for the top
    assert_eq!(rect.top, 67.0);
}

#[test]
fn test_landscape_example() {
    let rect = framing_rect(ViewSize::new(1920, 1080)).unwrap();
    assert_eq!(rect.width(), 1200.0);
    assert_eq!(rect.height(), 675.0);
    assert_eq!(rect.left, 360.0);
    assert_eq!(rect.top, 50.0);
}

#[test]
fn test_small_view_clamps_to_minimum() {
    let rect = framing_rect(ViewSize::new(320, 300)).unwrap();
    assert_eq!(rect.width(), MIN_FRAME_SIZE as f32);
    assert_eq!(rect.height(), MIN_FRAME_SIZE as f32);
}

#[test]
fn test_large_view_clamps_to_maximum() {
    let rect = framing_rect(ViewSize::new(3840, 2160)).unwrap();
    assert_eq!(rect.width(), 1200.0);
    assert_eq!(rect.height(), 675.0);

    let rect = framing_rect(ViewSize::new(2160, 3840)).unwrap();
    assert_eq!(rect.width(), 945.0);
    assert_eq!(rect.height(), 720.0);
}

#[test]
fn test_unlaid_view_has_no_rect() {
    assert!(framing_rect(ViewSize::new(0, 1920)).is_none());
    assert!(framing_rect(ViewSize::default()).is_none());
}

#[test]
fn test_rect_bounds_hold_across_view_sizes() {
    for width in (240..=2600).step_by(37) {
        for height in (240..=2600).step_by(41) {
            let view = ViewSize::new(width, height);
            let rect = framing_rect(view).unwrap();
            let (max_width, max_height) = ViewOrientation::of(view).max_frame();

            assert!(rect.is_valid(), "{:?} for {:?}", rect, view);
            assert!(rect.width() >= MIN_FRAME_SIZE as f32, "{:?} for {:?}", rect, view);
            assert!(rect.height() >= MIN_FRAME_SIZE as f32, "{:?} for {:?}", rect, view);
            assert!(rect.width() <= max_width as f32, "{:?} for {:?}", rect, view);
            assert!(rect.height() <= max_height as f32, "{:?} for {:?}", rect, view);
            assert!(rect.contained_in(view), "{:?} outside {:?}", rect, view);
        }
    }
}

#[test]
fn test_tiny_view_rect_stays_inside() {
    let view = ViewSize::new(120, 90);
    let rect = framing_rect(view).unwrap();
    assert!(rect.contained_in(view));
    assert_eq!(rect.width(), 120.0);
    assert_eq!(rect.height(), 90.0);
}

#[test]
fn test_preview_mapping_round_trip() {
    let views = [ViewSize::new(1080, 1920), ViewSize::new(1920, 1080), ViewSize::new(777, 333)];
    let previews = [ViewSize::new(1280, 720), ViewSize::new(480, 640), ViewSize::new(1, 3)];

    for view in views {
        let rect = framing_rect(view).unwrap();
        for preview in previews {
            let mapped = map_to_preview(&rect, view, preview).unwrap();
            let back = map_to_view(&mapped, preview, view).unwrap();
            assert_rect_close(&rect, &back);
        }
    }
}

#[test]
fn test_preview_mapping_scales_per_axis() {
    let rect = ScanRect::new(100.0, 200.0, 300.0, 400.0);
    let mapped = map_to_preview(&rect, ViewSize::new(1000, 2000), ViewSize::new(500, 500)).unwrap();
    assert_rect_close(&mapped, &ScanRect::new(50.0, 50.0, 150.0, 100.0));

    assert!(map_to_preview(&rect, ViewSize::new(0, 2000), ViewSize::new(500, 500)).is_none());
}

#[test]
fn test_cache_invalidation() {
    let mut cache = FramingCache::new();
    assert!(cache.rect_in_preview(ViewSize::new(640, 480)).is_none());

    cache.on_view_resized(ViewSize::new(1920, 1080));
    let first = cache.rect_in_preview(ViewSize::new(640, 480)).unwrap();
    assert!(cache.is_cached());

    cache.invalidate();
    assert!(!cache.is_cached());
    assert_eq!(cache.rect_in_preview(ViewSize::new(640, 480)), Some(first));

    // a different buffer size is never served from the old entry
    let other = cache.rect_in_preview(ViewSize::new(1280, 960)).unwrap();
    assert_rect_close(&other, &first.scaled(2.0, 2.0));
}

#[test]
fn test_shared_geometry_rotation_invalidates_cache() {
    let shared = SharedGeometry::new(90, CameraFacing::Back);
    shared.on_view_resized(ViewSize::new(1080, 1920));

    // sensor buffers arrive landscape; compensation 90 turns them portrait
    let (compensation, rect) = shared.frame_geometry(ViewSize::new(1920, 1080));
    assert_eq!(compensation, Rotation::Rotate90);
    let rect = rect.unwrap();
    assert_rect_close(&rect, &framing_rect(ViewSize::new(1080, 1920)).unwrap());

    assert_eq!(shared.on_rotation_changed(Rotation::Rotate90), Some(Rotation::Rotate0));
    assert!(shared.on_rotation_changed(Rotation::Rotate90).is_none());

    shared.on_view_resized(ViewSize::new(1920, 1080));
    let (compensation, rect) = shared.frame_geometry(ViewSize::new(1920, 1080));
    assert_eq!(compensation, Rotation::Rotate0);
    assert_rect_close(&rect.unwrap(), &framing_rect(ViewSize::new(1920, 1080)).unwrap());
}

#[tokio::test]
async fn test_framing_subscription_sees_resize() {
    let shared = SharedGeometry::new(90, CameraFacing::Back);
    let mut rx = shared.subscribe();
    assert!(rx.borrow().is_none());

    shared.on_view_resized(ViewSize::new(1920, 1080));
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), framing_rect(ViewSize::new(1920, 1080)));
}
