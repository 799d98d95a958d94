//! Scan container: raw LiDAR ranges to robot-relative point sets.
//!
//! Ranges arrive as integer millimeters over the detection arc. Each valid
//! ray becomes one or more points in the robot frame, with two corrections
//! applied while the scan "replays" across its sweep:
//!
//! - translation compensation: the robot moves `horz_mm` per swept degree,
//!   so later rays are pulled back by their angular offset,
//! - rotation compensation: the sweep angle is scaled by the heading rate
//!   over one revolution.
//!
//! The Y sign flips the math-convention sweep into the map's Y-down pixel
//! convention.

use serde::{Deserialize, Serialize};

/// Point value marking a detected obstacle.
pub const OBSTACLE: u16 = 0;
/// Point value marking a full-range ray with no return.
pub const NO_OBSTACLE: u16 = 65500;

/// Scan geometry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Points produced per ray.
    pub span: u32,
    /// Number of rays per scan.
    pub size: usize,
    /// Scan revolutions per second.
    pub rate_hz: f32,
    /// Total detection arc in degrees.
    pub detection_angle_deg: f32,
    /// Distance assigned to rays with no return, in millimeters.
    pub distance_no_detection_mm: f32,
}

/// One point of a processed scan, in robot-relative millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanPoint {
    /// X offset from the robot in millimeters
    pub x_mm: f32,
    /// Y offset from the robot in millimeters (map convention, Y down)
    pub y_mm: f32,
    /// `OBSTACLE` or `NO_OBSTACLE`
    pub value: u16,
    /// Measured (or assumed) range in millimeters
    pub distance_mm: f32,
}

impl ScanPoint {
    /// True when this point marks a detected obstacle.
    #[inline]
    pub fn is_obstacle(&self) -> bool {
        self.value == OBSTACLE
    }
}

/// Reusable scan point buffer.
#[derive(Debug, Clone)]
pub struct ScanBuffer {
    config: ScanConfig,
    points: Vec<ScanPoint>,
}

impl ScanBuffer {
    /// Create an empty buffer for the given geometry.
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            points: Vec::with_capacity(config.size * config.span as usize),
        }
    }

    /// The geometry this buffer was built for.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Points produced by the last `update`.
    pub fn points(&self) -> &[ScanPoint] {
        &self.points
    }

    /// Rebuild the point set from raw ranges.
    ///
    /// `distances_mm` holds one integer range per ray, `0` meaning no
    /// return. Rays shorter than half the hole width are discarded as
    /// too-close noise. `velocity` is `(mm/s, deg/s)` over the scan period
    /// and drives the motion compensation. The first and last rays are
    /// skipped (sweep seam).
    pub fn update(&mut self, distances_mm: &[i32], hole_width_mm: f32, velocity: (f32, f32)) {
        let (vxy_mm_s, vtheta_deg_s) = velocity;
        let degrees_per_second = (self.config.rate_hz * 360.0).floor();
        let horz_mm = vxy_mm_s / degrees_per_second;
        let rotation = 1.0 + vtheta_deg_s / degrees_per_second;

        self.points.clear();

        for i in 1..self.config.size.saturating_sub(1) {
            let range = distances_mm.get(i).copied().unwrap_or(0);
            if range == 0 {
                self.emit(i, self.config.distance_no_detection_mm, NO_OBSTACLE, rotation, horz_mm);
            } else if range as f32 > hole_width_mm / 2.0 {
                self.emit(i, range as f32, OBSTACLE, rotation, horz_mm);
            }
        }
    }

    /// Emit the points of ray `i` at range `r_mm`.
    fn emit(&mut self, i: usize, r_mm: f32, value: u16, rotation: f32, horz_mm: f32) {
        let span = self.config.span as usize;
        let total = (self.config.size * span - 1) as f32;
        for j in 0..span {
            let k = ((i * span + j) as f32) * self.config.detection_angle_deg / total;
            let angle_deg = -self.config.detection_angle_deg / 2.0 + k * rotation;
            let angle = angle_deg.to_radians();
            self.points.push(ScanPoint {
                x_mm: r_mm * angle.cos() - k * horz_mm,
                y_mm: -r_mm * angle.sin(),
                value,
                distance_mm: r_mm,
            });
        }
    }
}
