//! Geometry value types
//!
//! Plain data shared by every layer of the window manager. Client-space
//! coordinates are relative to the top-left corner of a window's drawable area.

use serde::{Deserialize, Serialize};

/// Size of a rectangular area in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent2D {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Extent2D {
    /// Zero-sized extent
    pub const ZERO: Self = Self { width: 0, height: 0 };

    /// Create a new extent
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Integral position, used for window and client-area origins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

impl Point2D {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Top-left position that centers `size` inside `display`.
    ///
    /// Windows larger than the display end up with a negative origin, the same
    /// as a native window manager would place them.
    pub fn centered(display: Extent2D, size: Extent2D) -> Self {
        let x = (i64::from(display.width) - i64::from(size.width)) / 2;
        let y = (i64::from(display.height) - i64::from(size.height)) / 2;
        Self {
            x: i32::try_from(x).unwrap_or(i32::MIN),
            y: i32::try_from(y).unwrap_or(i32::MIN),
        }
    }
}

/// Floating point 2D vector for cursor positions and scroll deltas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    /// Horizontal component
    pub x: f32,
    /// Vertical component
    pub y: f32,
}

impl Vector2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point2D> for Vector2 {
    #[allow(clippy::cast_precision_loss)]
    fn from(point: Point2D) -> Self {
        Self::new(point.x as f32, point.y as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_on_display() {
        let origin = Point2D::centered(Extent2D::new(1920, 1080), Extent2D::new(800, 600));
        assert_eq!(origin, Point2D::new(560, 240));
    }

    #[test]
    fn test_centered_larger_than_display() {
        let origin = Point2D::centered(Extent2D::new(800, 600), Extent2D::new(1000, 700));
        assert_eq!(origin, Point2D::new(-100, -50));
    }

    #[test]
    fn test_empty_extent() {
        assert!(Extent2D::ZERO.is_empty());
        assert!(Extent2D::new(0, 10).is_empty());
        assert!(!Extent2D::new(1, 1).is_empty());
    }
}
