use serde::{Deserialize, Serialize};

/// Pixel dimensions of the host view or a capture buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ViewSize {
    pub width: u32,
    pub height: u32,
}

impl ViewSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Swap the axes
    pub fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn is_portrait(self) -> bool {
        self.width < self.height
    }

    /// Return the size with its longer side horizontal
    pub fn to_landscape(self) -> Self {
        if self.is_portrait() {
            self.transposed()
        } else {
            self
        }
    }
}

/// A point in view space, e.g. a touch location
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with floating point bounds.
///
/// Used both in view space (pixels of the host widget) and in preview space
/// (pixels of the raw capture buffer). Which space a value lives in is a
/// property of where it came from, not of the type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ScanRect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.left < self.right && self.top < self.bottom
    }

    /// Scale each axis independently
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self::new(
            self.left * sx,
            self.top * sy,
            self.right * sx,
            self.bottom * sy,
        )
    }

    pub fn contained_in(&self, size: ViewSize) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.right <= size.width as f32
            && self.bottom <= size.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_size_landscape() {
        assert_eq!(ViewSize::new(1080, 1920).to_landscape(), ViewSize::new(1920, 1080));
        assert_eq!(ViewSize::new(1920, 1080).to_landscape(), ViewSize::new(1920, 1080));
        assert!(ViewSize::new(0, 10).is_empty());
        assert!(!ViewSize::new(800, 800).is_portrait());
    }

    #[test]
    fn test_scan_rect_dimensions() {
        let rect = ScanRect::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 50.0);
        assert_eq!(rect.center(), Point::new(60.0, 45.0));
        assert!(rect.is_valid());
        assert!(!ScanRect::new(5.0, 5.0, 5.0, 6.0).is_valid());
        assert!(rect.contained_in(ViewSize::new(110, 70)));
        assert!(!rect.contained_in(ViewSize::new(100, 70)));
    }
}
