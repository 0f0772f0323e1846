use serde::Serialize;
use std::time::Duration;

/// Capture loop counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub sessions_started: u64,
    pub frames_requested: u64,
    pub frames_received: u64,
    /// Frames that arrived for an ended session
    pub stale_frames: u64,
    pub decode_attempts: u64,
    pub decode_hits: u64,
    pub decode_misses: u64,
    pub engine_errors: u64,
    /// Frames dropped before decoding: no geometry, bad buffer or crop
    pub frames_skipped: u64,
    pub decodes_in_flight: u32,
    pub max_decodes_in_flight: u32,
    pub last_decode_micros: Option<u64>,
}

impl PipelineStats {
    pub fn record_session(&mut self) {
        self.sessions_started += 1;
    }

    pub fn record_request(&mut self) {
        self.frames_requested += 1;
    }

    pub fn record_frame(&mut self) {
        self.frames_received += 1;
    }

    pub fn record_stale_frame(&mut self) {
        self.stale_frames += 1;
    }

    pub fn record_skip(&mut self) {
        self.frames_skipped += 1;
    }

    pub fn begin_decode(&mut self) {
        self.decode_attempts += 1;
        self.decodes_in_flight += 1;
        self.max_decodes_in_flight = self.max_decodes_in_flight.max(self.decodes_in_flight);
    }

    pub fn end_decode(&mut self, elapsed: Duration) {
        self.decodes_in_flight = self.decodes_in_flight.saturating_sub(1);
        self.last_decode_micros = Some(elapsed.as_micros() as u64);
    }

    pub fn record_hit(&mut self) {
        self.decode_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.decode_misses += 1;
    }

    pub fn record_engine_error(&mut self) {
        self.engine_errors += 1;
    }

    pub fn hit_rate(&self) -> f64 {
        if self.decode_attempts == 0 {
            0.0
        } else {
            self.decode_hits as f64 / self.decode_attempts as f64
        }
    }
}
