use super::core::{FramePipeline, SessionFrame};
use super::handle::ScannerHandle;
use crate::autofocus::FocusEvent;
use crate::camera::CameraDevice;
use crate::config::ScannerConfig;
use crate::decode::{DecodeEngine, DecodeResultSink};
use crate::error::Result;
use crate::geometry::Point;
use crate::orientation::Rotation;
use crate::viewfinder::SharedGeometry;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Requests from host-side handles to the task that owns the camera
pub(crate) enum Command {
    Start {
        camera: Box<dyn CameraDevice>,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SurfaceChanged {
        ready: bool,
        reply: Option<oneshot::Sender<Result<()>>>,
    },
    ViewResized,
    RotationChanged(Rotation),
    Touch(Option<Point>),
    SetAutofocus(bool),
}

/// The capture context: one task that runs every camera call.
///
/// Frame deliveries and autofocus callbacks arrive on their own channels and
/// are handled in order with host commands, so the camera is never touched
/// from two places at once.
pub struct ScannerService {
    pipeline: FramePipeline,
    commands: mpsc::UnboundedReceiver<Command>,
    frames: mpsc::UnboundedReceiver<SessionFrame>,
    focus_events: mpsc::UnboundedReceiver<FocusEvent>,
    cancel: CancellationToken,
}

impl ScannerService {
    /// Spawn the service on the current runtime
    pub fn spawn(
        config: &ScannerConfig,
        engine: Box<dyn DecodeEngine>,
        sink: Box<dyn DecodeResultSink>,
    ) -> (ScannerHandle, JoinHandle<()>) {
        let geometry = SharedGeometry::new(config.camera.sensor_orientation, config.camera.facing);
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (focus_tx, focus_events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let pipeline = FramePipeline::new(
            config,
            geometry.clone(),
            engine,
            sink,
            frames_tx,
            focus_tx,
        );
        let handle = ScannerHandle::new(
            commands_tx,
            geometry,
            pipeline.stats_handle(),
            pipeline.subscribe_state(),
            cancel.clone(),
        );

        let service = Self {
            pipeline,
            commands,
            frames,
            focus_events,
            cancel,
        };
        let task = tokio::spawn(service.run());

        (handle, task)
    }

    async fn run(mut self) {
        info!("Scanner service started");

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("Scanner service cancelled");
                    break;
                }
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            debug!("All scanner handles dropped");
                            break;
                        }
                    }
                }
                Some(frame) = self.frames.recv() => {
                    self.pipeline.handle_frame(frame);
                }
                Some(event) = self.focus_events.recv() => {
                    self.pipeline.on_focus_event(event);
                }
            }
        }

        self.pipeline.stop();
        info!("Scanner service stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { camera, reply } => {
                self.pipeline.attach(camera);
                let result = self.pipeline.start();
                if reply.send(result).is_err() {
                    warn!("Start requester went away");
                }
            }
            Command::Stop { reply } => {
                self.pipeline.stop();
                let _ = reply.send(());
            }
            Command::SurfaceChanged { ready, reply } => {
                let result = self.pipeline.on_surface_changed(ready);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!("Deferred start failed: {}", e);
                        }
                    }
                }
            }
            Command::ViewResized => self.pipeline.on_view_resized(),
            Command::RotationChanged(compensation) => {
                self.pipeline.on_rotation_changed(compensation)
            }
            Command::Touch(point) => self.pipeline.on_touch(point),
            Command::SetAutofocus(enabled) => self.pipeline.set_autofocus(enabled),
        }
    }
}
