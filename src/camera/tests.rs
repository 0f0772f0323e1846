use super::*;
use crate::error::CameraError;
use crate::frame::{FrameFormat, PreviewFrame};
use crate::orientation::Rotation;
use crate::preview_size::PreviewSize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct ChannelConsumer(mpsc::UnboundedSender<u64>);

impl FrameConsumer for ChannelConsumer {
    fn on_preview_frame(self: Box<Self>, frame: PreviewFrame) {
        let _ = self.0.send(frame.id);
    }
}

fn gray_frame(id: u64) -> PreviewFrame {
    PreviewFrame::new(id, vec![0u8; 16], 4, 4, FrameFormat::Gray8)
}

#[test]
fn test_triggered_focus_mode_preference() {
    let mut params = CameraParameters {
        supported_focus_modes: vec![FocusMode::Macro, FocusMode::Auto],
        ..CameraParameters::default()
    };
    assert_eq!(params.triggered_focus_mode(), Some(FocusMode::Auto));

    params.supported_focus_modes = vec![FocusMode::Fixed, FocusMode::Macro];
    assert_eq!(params.triggered_focus_mode(), Some(FocusMode::Macro));

    params.supported_focus_modes = vec![FocusMode::Fixed, FocusMode::ContinuousVideo];
    assert!(!params.supports_autofocus());
}

#[tokio::test]
async fn test_mock_one_shot_delivers_once() {
    let mut camera = MockCamera::with_default_parameters();
    let probe = camera.probe();
    let (tx, mut rx) = mpsc::unbounded_channel();

    assert!(!probe.deliver_frame(gray_frame(0)));

    camera
        .set_one_shot_callback(Some(Box::new(ChannelConsumer(tx))))
        .unwrap();
    assert_eq!(probe.frame_requests(), 1);
    assert!(probe.has_pending_frame());

    assert!(probe.deliver_frame(gray_frame(7)));
    assert!(!probe.deliver_frame(gray_frame(8)));
    assert_eq!(rx.recv().await, Some(7));
    assert!(!probe.has_pending_frame());
}

#[test]
fn test_mock_rejects_unsupported_preview_size() {
    let mut camera = MockCamera::with_default_parameters();
    let probe = camera.probe();

    camera.set_preview_size(PreviewSize::new(1280, 720)).unwrap();
    assert_eq!(probe.preview_size(), Some(PreviewSize::new(1280, 720)));

    assert!(matches!(
        camera.set_preview_size(PreviewSize::new(333, 333)),
        Err(CameraError::Configuration { .. })
    ));

    probe.fail_configuration(true);
    assert!(camera.set_preview_size(PreviewSize::new(640, 480)).is_err());
}

#[test]
fn test_mock_autofocus_fault_injection() {
    let mut camera = MockCamera::with_default_parameters();
    let probe = camera.probe();
    probe.inject_autofocus_faults(1);

    let err = camera.auto_focus(Box::new(|_| {})).unwrap_err();
    assert!(err.is_transient());
    assert!(!probe.has_pending_focus());

    let completed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&completed);
    camera
        .auto_focus(Box::new(move |ok| flag.store(ok, Ordering::SeqCst)))
        .unwrap();
    assert_eq!(probe.focus_requests(), 2);
    assert!(probe.complete_focus(true));
    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn test_mock_release_blocks_further_calls() {
    let mut camera = MockCamera::with_default_parameters();
    let probe = camera.probe();
    camera.set_display_orientation(Rotation::Rotate90).unwrap();
    camera.start_preview().unwrap();
    assert!(probe.is_previewing());
    assert_eq!(probe.display_orientation(), Some(Rotation::Rotate90));

    camera.release();
    assert!(probe.is_released());
    assert!(!probe.is_previewing());
    assert_eq!(camera.start_preview(), Err(CameraError::Released));
    assert!(camera.parameters().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_mock_frame_source_delivers_after_interval() {
    let mut camera = MockCamera::with_default_parameters().with_frame_source(MockFrameSource {
        interval: Duration::from_millis(40),
        format: FrameFormat::Nv21,
    });
    let (tx, mut rx) = mpsc::unbounded_channel();

    camera
        .set_one_shot_callback(Some(Box::new(ChannelConsumer(tx))))
        .unwrap();
    // armed before preview start: nothing flows yet
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());

    camera.start_preview().unwrap();
    let id = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap();
    assert_eq!(id, Some(0));
}
