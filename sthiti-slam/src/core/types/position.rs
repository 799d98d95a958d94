//! Robot position and odometry delta types.
//!
//! SLAM works in map-frame millimeters and degrees: the native units of the
//! scan ranges and of the hill-climbing mutations.

use serde::{Deserialize, Serialize};

/// Robot position in the map frame.
///
/// The map origin is its bottom-left pixel; a freshly started robot sits at
/// the map center, `(500·map_size_meters, 500·map_size_meters)` mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X position in millimeters
    pub x_mm: f32,
    /// Y position in millimeters
    pub y_mm: f32,
    /// Heading in degrees
    pub theta_deg: f32,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub fn new(x_mm: f32, y_mm: f32, theta_deg: f32) -> Self {
        Self {
            x_mm,
            y_mm,
            theta_deg,
        }
    }

    /// Starting position at the center of a square map of the given side.
    #[inline]
    pub fn map_center(map_size_meters: f32) -> Self {
        Self::new(500.0 * map_size_meters, 500.0 * map_size_meters, 0.0)
    }

    /// This position advanced by an odometry delta, componentwise.
    #[inline]
    pub fn advanced(&self, delta: &OdometryDelta) -> Position {
        Position::new(
            self.x_mm + delta.dx_mm,
            self.y_mm + delta.dy_mm,
            self.theta_deg + delta.dtheta_deg,
        )
    }
}

/// Relative motion reported by odometry since the previous scan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OdometryDelta {
    /// X displacement in millimeters
    pub dx_mm: f32,
    /// Y displacement in millimeters
    pub dy_mm: f32,
    /// Heading change in degrees
    pub dtheta_deg: f32,
}

impl OdometryDelta {
    /// Create a new delta.
    #[inline]
    pub fn new(dx_mm: f32, dy_mm: f32, dtheta_deg: f32) -> Self {
        Self {
            dx_mm,
            dy_mm,
            dtheta_deg,
        }
    }

    /// Velocities `(mm/s, deg/s)` over the scan period `dt_s`.
    #[inline]
    pub fn velocities(&self, dt_s: f32) -> (f32, f32) {
        let dxy = (self.dx_mm * self.dx_mm + self.dy_mm * self.dy_mm).sqrt();
        (dxy / dt_s, self.dtheta_deg / dt_s)
    }
}
