use serde::{Deserialize, Serialize};
use tracing::debug;

/// Quarter-turn rotation, clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// Normalize any angle to the nearest quarter turn
    pub fn from_degrees(degrees: i32) -> Self {
        let normalized = degrees.rem_euclid(360);
        match ((normalized + 45) / 90) % 4 {
            0 => Rotation::Rotate0,
            1 => Rotation::Rotate90,
            2 => Rotation::Rotate180,
            _ => Rotation::Rotate270,
        }
    }

    /// True for 90 and 270, where width and height trade places
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }

    /// The rotation that undoes this one
    pub fn inverse(&self) -> Self {
        Rotation::from_degrees(360 - self.degrees() as i32)
    }

    /// Exact `(cos, sin)` of the angle
    pub fn cos_sin(&self) -> (i64, i64) {
        match self {
            Rotation::Rotate0 => (1, 0),
            Rotation::Rotate90 => (0, 1),
            Rotation::Rotate180 => (-1, 0),
            Rotation::Rotate270 => (0, -1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

/// Inputs that determine how sensor output lines up with the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationState {
    pub device_rotation: Rotation,
    pub sensor_mount_degrees: u16,
    pub facing: CameraFacing,
}

impl OrientationState {
    /// Rotation that aligns the sensor buffer with the current display orientation
    pub fn display_compensation(&self) -> Rotation {
        let sensor = self.sensor_mount_degrees as i32;
        let device = self.device_rotation.degrees() as i32;

        let degrees = match self.facing {
            // front cameras are mirrored, so the rotation runs the other way
            CameraFacing::Front => (360 - (sensor + device) % 360) % 360,
            CameraFacing::Back => (sensor - device + 360) % 360,
        };

        Rotation::from_degrees(degrees)
    }
}

/// Tracks device rotation and derives the display compensation angle
#[derive(Debug, Clone)]
pub struct OrientationTracker {
    state: OrientationState,
    compensation: Rotation,
}

impl OrientationTracker {
    pub fn new(sensor_mount_degrees: u16, facing: CameraFacing) -> Self {
        let state = OrientationState {
            device_rotation: Rotation::Rotate0,
            sensor_mount_degrees,
            facing,
        };

        Self {
            compensation: state.display_compensation(),
            state,
        }
    }

    /// Record a platform rotation report.
    ///
    /// Returns the new compensation angle when the rotation actually changed,
    /// `None` for a redundant report.
    pub fn on_rotation_changed(&mut self, rotation: Rotation) -> Option<Rotation> {
        if rotation == self.state.device_rotation {
            return None;
        }

        self.state.device_rotation = rotation;
        self.compensation = self.state.display_compensation();

        debug!(
            "Device rotation now {}°, display compensation {}°",
            rotation.degrees(),
            self.compensation.degrees()
        );

        Some(self.compensation)
    }

    pub fn compensation(&self) -> Rotation {
        self.compensation
    }

    pub fn state(&self) -> OrientationState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::Rotate0.degrees(), 0);
        assert_eq!(Rotation::Rotate90.degrees(), 90);
        assert_eq!(Rotation::Rotate180.degrees(), 180);
        assert_eq!(Rotation::Rotate270.degrees(), 270);
    }

    #[test]
    fn test_rotation_from_degrees_normalizes() {
        assert_eq!(Rotation::from_degrees(360), Rotation::Rotate0);
        assert_eq!(Rotation::from_degrees(-90), Rotation::Rotate270);
        assert_eq!(Rotation::from_degrees(450), Rotation::Rotate90);
        assert_eq!(Rotation::from_degrees(170), Rotation::Rotate180);
        assert_eq!(Rotation::Rotate90.inverse(), Rotation::Rotate270);
        assert_eq!(Rotation::Rotate0.inverse(), Rotation::Rotate0);
    }

    #[test]
    fn test_back_camera_compensation() {
        let mut tracker = OrientationTracker::new(90, CameraFacing::Back);
        assert_eq!(tracker.compensation(), Rotation::Rotate90);

        assert_eq!(tracker.on_rotation_changed(Rotation::Rotate90), Some(Rotation::Rotate0));
        assert_eq!(tracker.on_rotation_changed(Rotation::Rotate180), Some(Rotation::Rotate270));
        assert_eq!(tracker.on_rotation_changed(Rotation::Rotate270), Some(Rotation::Rotate180));
    }

    #[test]
    fn test_front_camera_mirrors() {
        let mut tracker = OrientationTracker::new(270, CameraFacing::Front);
        // (360 - 270) % 360
        assert_eq!(tracker.compensation(), Rotation::Rotate90);
        // 270 + 90 wraps to 0, which must stay 0 rather than become 360
        assert_eq!(tracker.on_rotation_changed(Rotation::Rotate90), Some(Rotation::Rotate0));
        assert_eq!(tracker.on_rotation_changed(Rotation::Rotate180), Some(Rotation::Rotate270));
    }

    #[test]
    fn test_redundant_rotation_is_ignored() {
        let mut tracker = OrientationTracker::new(90, CameraFacing::Back);
        assert!(tracker.on_rotation_changed(Rotation::Rotate0).is_none());
        assert!(tracker.on_rotation_changed(Rotation::Rotate90).is_some());
        assert!(tracker.on_rotation_changed(Rotation::Rotate90).is_none());
        assert_eq!(tracker.state().device_rotation, Rotation::Rotate90);
    }
}
