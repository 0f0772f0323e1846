use crate::camera::{MeteringArea, SensorRect};
use crate::config::AutofocusConfig;
use crate::geometry::{Point, ViewSize};

const SENSOR_EXTENT: f32 = 1000.0;

/// Map a view coordinate onto the sensor's `[-1000, 1000]` axis
pub fn to_sensor_coordinate(value: f32, dimension: u32) -> i32 {
    let scaled = value * 2.0 * SENSOR_EXTENT / dimension as f32 - SENSOR_EXTENT;
    scaled.round().clamp(-SENSOR_EXTENT, SENSOR_EXTENT) as i32
}

/// Focus and metering areas centred on one view point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTarget {
    pub focus: MeteringArea,
    pub metering: MeteringArea,
}

impl FocusTarget {
    /// `None` until the view has been laid out
    pub fn at(point: Point, view: ViewSize, settings: &AutofocusConfig) -> Option<Self> {
        if view.is_empty() {
            return None;
        }

        let side = settings.area_size as f32;
        Some(Self {
            focus: area_around(point, side, view, settings.weight),
            metering: area_around(point, side * settings.metering_scale, view, settings.weight),
        })
    }
}

fn area_around(center: Point, side: f32, view: ViewSize, weight: u16) -> MeteringArea {
    let (left, right) = span(center.x, side, view.width as f32);
    let (top, bottom) = span(center.y, side, view.height as f32);

    MeteringArea {
        rect: SensorRect {
            left: to_sensor_coordinate(left, view.width),
            top: to_sensor_coordinate(top, view.height),
            right: to_sensor_coordinate(right, view.width),
            bottom: to_sensor_coordinate(bottom, view.height),
        },
        weight,
    }
}

/// Interval of length `side` around `center`, shifted to lie within `[0, limit]`
fn span(center: f32, side: f32, limit: f32) -> (f32, f32) {
    let side = side.min(limit);
    let start = (center - side / 2.0).clamp(0.0, limit - side);
    (start, start + side)
}
