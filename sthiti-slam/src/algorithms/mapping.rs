//! Log-odds occupancy map with Bresenham ray updates.
//!
//! Each scan point casts a ray from the robot pixel to its endpoint pixel.
//! Intermediate cells collect free evidence, the endpoint zone collects
//! occupied evidence, and everything clamps to a fixed log-odds range.
//! Updates are weighted down with range: distant returns say less about any
//! one cell than close ones.
//!
//! Cells that have accumulated strong occupied evidence stop accepting free
//! updates (wall protection) so that rays drifting through a wall during a
//! bad match cannot erase it. Occupied evidence always lands.

use serde::{Deserialize, Serialize};

use crate::algorithms::scan::ScanBuffer;
use crate::core::types::{OccupancyGrid, Position, CELL_FREE, CELL_OCCUPIED, CELL_UNKNOWN};

/// Log-odds increment for an occupied observation, before weighting.
pub const LOG_ODDS_OCCUPIED: f32 = 0.85;
/// Log-odds increment for a free observation, before weighting.
pub const LOG_ODDS_FREE: f32 = -0.62;
/// Symmetric clamp on accumulated cell evidence.
pub const LOG_ODDS_CLAMP: f32 = 5.0;
/// Cells above this value no longer accept free updates.
pub const WALL_PROTECT_THRESHOLD: f32 = 2.0;
/// Floor on the range-based update weight.
pub const MIN_RAY_WEIGHT: f32 = 0.05;
/// Exported-grid thresholds: above +0.5 is occupied, below −0.5 is free.
const EXPORT_THRESHOLD: f32 = 0.5;
/// Cells before the endpoint that still take the occupied update.
const END_ZONE_CELLS: usize = 2;

/// Bresenham line iterator over grid cells.
///
/// Yields every cell from start to end inclusive; `x` and `y` may both
/// advance in one step, so the cell count is `max(|dx|, |dy|) + 1`.
struct BresenhamLine {
    x: i32,
    y: i32,
    end_x: i32,
    end_y: i32,
    dx: i32,
    dy: i32,
    step_x: i32,
    step_y: i32,
    error: i32,
    done: bool,
}

impl BresenhamLine {
    fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        Self {
            x: x0,
            y: y0,
            end_x: x1,
            end_y: y1,
            dx,
            dy,
            step_x: if x0 < x1 { 1 } else { -1 },
            step_y: if y0 < y1 { 1 } else { -1 },
            error: dx - dy,
            done: false,
        }
    }

    /// Number of cells the line will visit.
    fn cell_count(&self) -> usize {
        self.dx.max(self.dy) as usize + 1
    }
}

impl Iterator for BresenhamLine {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if self.done {
            return None;
        }
        let current = (self.x, self.y);
        if self.x == self.end_x && self.y == self.end_y {
            self.done = true;
            return Some(current);
        }

        let e2 = 2 * self.error;
        if e2 > -self.dy {
            self.error -= self.dy;
            self.x += self.step_x;
        }
        if e2 < self.dx {
            self.error += self.dx;
            self.y += self.step_y;
        }
        Some(current)
    }
}

/// Square log-odds occupancy map.
///
/// One preallocated dense `f32` buffer; cell value 0 is unknown, positive is
/// occupied evidence, negative is free evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogOddsMap {
    size_pixels: usize,
    size_meters: f32,
    pixels_per_mm: f32,
    cells: Vec<f32>,
}

impl LogOddsMap {
    /// Create a blank map of `size_pixels²` cells spanning `size_meters`.
    pub fn new(size_pixels: usize, size_meters: f32) -> Self {
        Self {
            size_pixels,
            size_meters,
            pixels_per_mm: size_pixels as f32 / (size_meters * 1000.0),
            cells: vec![0.0; size_pixels * size_pixels],
        }
    }

    /// Map side in pixels.
    pub fn size_pixels(&self) -> usize {
        self.size_pixels
    }

    /// Pixel density in pixels per millimeter.
    pub fn pixels_per_mm(&self) -> f32 {
        self.pixels_per_mm
    }

    /// Log-odds value at a cell; out-of-bounds reads as unknown.
    #[inline]
    pub fn log_odds(&self, x: usize, y: usize) -> f32 {
        if x < self.size_pixels && y < self.size_pixels {
            self.cells[y * self.size_pixels + x]
        } else {
            0.0
        }
    }

    /// Reset every cell to unknown.
    pub fn clear(&mut self) {
        self.cells.fill(0.0);
    }

    /// Integrate a processed scan taken at `position`.
    pub fn integrate_scan(&mut self, scan: &ScanBuffer, position: &Position) {
        let no_detection_mm = scan.config().distance_no_detection_mm;
        let theta = position.theta_deg.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();

        let robot_x = (position.x_mm * self.pixels_per_mm).round() as i32;
        let robot_y = (position.y_mm * self.pixels_per_mm).round() as i32;

        for point in scan.points() {
            let world_x = point.x_mm * cos_t - point.y_mm * sin_t;
            let world_y = point.x_mm * sin_t + point.y_mm * cos_t;
            let end_x = ((position.x_mm + world_x) * self.pixels_per_mm).round() as i32;
            let end_y = ((position.y_mm + world_y) * self.pixels_per_mm).round() as i32;

            let ratio = point.distance_mm / no_detection_mm;
            let weight = (1.0 - ratio * ratio).max(MIN_RAY_WEIGHT);
            let occupied_delta = LOG_ODDS_OCCUPIED * weight;
            let free_delta = LOG_ODDS_FREE * weight;

            let ray = BresenhamLine::new(robot_x, robot_y, end_x, end_y);
            let cell_count = ray.cell_count();
            let is_obstacle = point.is_obstacle();

            for (step, (cx, cy)) in ray.enumerate() {
                let in_end_zone = step + 1 + END_ZONE_CELLS >= cell_count;
                if in_end_zone && is_obstacle {
                    self.apply_occupied(cx, cy, occupied_delta);
                } else {
                    self.apply_free(cx, cy, free_delta);
                }
            }
        }
    }

    /// Occupied evidence: always lands, clamped.
    #[inline]
    fn apply_occupied(&mut self, x: i32, y: i32, delta: f32) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = (self.cells[idx] + delta).clamp(-LOG_ODDS_CLAMP, LOG_ODDS_CLAMP);
        }
    }

    /// Free evidence: skipped on wall-protected cells, clamped.
    #[inline]
    fn apply_free(&mut self, x: i32, y: i32, delta: f32) {
        if let Some(idx) = self.index(x, y) {
            if self.cells[idx] > WALL_PROTECT_THRESHOLD {
                return;
            }
            self.cells[idx] = (self.cells[idx] + delta).clamp(-LOG_ODDS_CLAMP, LOG_ODDS_CLAMP);
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.size_pixels && (y as usize) < self.size_pixels {
            Some(y as usize * self.size_pixels + x as usize)
        } else {
            None
        }
    }

    /// Grayscale rendering of the belief: occupied dark, free bright,
    /// unknown 128.
    pub fn grayscale(&self) -> Vec<u8> {
        self.cells
            .iter()
            .map(|&l| {
                let v = (((-l / LOG_ODDS_CLAMP) + 1.0) / 2.0 * 255.0).round();
                v.clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// Project the belief into a discrete occupancy grid.
    ///
    /// The map's Y-down pixel rows flip into the grid's Y-up world rows;
    /// the grid is centered on the world origin.
    pub fn to_occupancy_grid(&self) -> OccupancyGrid {
        let n = self.size_pixels;
        let mut data = vec![CELL_UNKNOWN; n * n];

        for y in 0..n {
            let source_row = (n - 1 - y) * n;
            let target_row = y * n;
            for x in 0..n {
                let l = self.cells[source_row + x];
                data[target_row + x] = if l > EXPORT_THRESHOLD {
                    CELL_OCCUPIED
                } else if l < -EXPORT_THRESHOLD {
                    CELL_FREE
                } else {
                    CELL_UNKNOWN
                };
            }
        }

        OccupancyGrid {
            resolution: self.size_meters / n as f32,
            width: n as u32,
            height: n as u32,
            origin_x: -self.size_meters / 2.0,
            origin_y: -self.size_meters / 2.0,
            origin_yaw: 0.0,
            frame_id: "map".to_owned(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::scan::{ScanBuffer, ScanConfig};
    use approx::assert_relative_eq;

    fn test_scan_config() -> ScanConfig {
        ScanConfig {
            span: 1,
            size: 360,
            rate_hz: 5.0,
            detection_angle_deg: 360.0,
            distance_no_detection_mm: 3500.0,
        }
    }

    fn scan_from_ranges(distances: &[i32]) -> ScanBuffer {
        let mut scan = ScanBuffer::new(test_scan_config());
        scan.update(distances, 600.0, (0.0, 0.0));
        scan
    }

    #[test]
    fn test_bresenham_cell_counts() {
        let line = BresenhamLine::new(0, 0, 5, 0);
        assert_eq!(line.cell_count(), 6);
        assert_eq!(line.count(), 6);

        let line = BresenhamLine::new(0, 0, 3, 7);
        assert_eq!(line.cell_count(), 8);
        assert_eq!(line.count(), 8);

        let line = BresenhamLine::new(2, 2, 2, 2);
        assert_eq!(line.cell_count(), 1);
        assert_eq!(line.count(), 1);
    }

    #[test]
    fn test_bresenham_endpoints_and_order() {
        let cells: Vec<(i32, i32)> = BresenhamLine::new(5, 5, 0, 0).collect();
        assert_eq!(cells.first(), Some(&(5, 5)));
        assert_eq!(cells.last(), Some(&(0, 0)));
    }

    #[test]
    fn test_ray_marks_free_and_occupied() {
        let mut map = LogOddsMap::new(800, 20.0);
        let mut distances = vec![0i32; 360];
        distances[180] = 2000;
        let scan = scan_from_ranges(&distances);
        let pose = Position::map_center(20.0);

        map.integrate_scan(&scan, &pose);

        // Robot pixel: rays start there and mark it free.
        let (rx, ry) = (400usize, 400usize);
        assert!(map.log_odds(rx, ry) < 0.0);

        // Endpoint of the 2 m ray straight ahead: 80 px to the right.
        assert!(
            map.log_odds(rx + 80, ry) > 0.0 || map.log_odds(rx + 80, ry - 1) > 0.0,
            "no occupied evidence near the endpoint"
        );
    }

    #[test]
    fn test_updates_clamp() {
        let mut map = LogOddsMap::new(100, 10.0);
        for _ in 0..1000 {
            map.apply_occupied(50, 50, LOG_ODDS_OCCUPIED);
            map.apply_free(10, 10, LOG_ODDS_FREE);
        }
        assert_relative_eq!(map.log_odds(50, 50), LOG_ODDS_CLAMP);
        assert_relative_eq!(map.log_odds(10, 10), -LOG_ODDS_CLAMP);
    }

    #[test]
    fn test_wall_protection_blocks_free_updates() {
        let mut map = LogOddsMap::new(100, 10.0);
        for _ in 0..4 {
            map.apply_occupied(50, 50, LOG_ODDS_OCCUPIED);
        }
        let protected = map.log_odds(50, 50);
        assert!(protected > WALL_PROTECT_THRESHOLD);

        for _ in 0..100 {
            map.apply_free(50, 50, LOG_ODDS_FREE);
        }
        assert_relative_eq!(map.log_odds(50, 50), protected);

        // Occupied evidence still lands on a protected cell.
        map.apply_occupied(50, 50, LOG_ODDS_OCCUPIED);
        assert!(map.log_odds(50, 50) > protected);
    }

    #[test]
    fn test_weak_cells_still_take_free_updates() {
        let mut map = LogOddsMap::new(100, 10.0);
        map.apply_occupied(50, 50, LOG_ODDS_OCCUPIED);
        let before = map.log_odds(50, 50);
        map.apply_free(50, 50, LOG_ODDS_FREE);
        assert!(map.log_odds(50, 50) < before);
    }

    #[test]
    fn test_range_weighting_shrinks_with_distance() {
        let mut map = LogOddsMap::new(800, 20.0);
        let mut distances = vec![0i32; 360];
        distances[180] = 500; // close return, weight ≈ 0.98
        let scan = scan_from_ranges(&distances);
        map.integrate_scan(&scan, &Position::map_center(20.0));
        let close_endpoint = (0..800)
            .flat_map(|y| (0..800).map(move |x| (x, y)))
            .map(|(x, y)| map.log_odds(x, y))
            .fold(f32::MIN, f32::max);

        let mut far_map = LogOddsMap::new(800, 20.0);
        let mut distances = vec![0i32; 360];
        distances[180] = 3400; // near max range, weight ≈ 0.06
        let scan = scan_from_ranges(&distances);
        far_map.integrate_scan(&scan, &Position::map_center(20.0));
        let far_endpoint = (0..800)
            .flat_map(|y| (0..800).map(move |x| (x, y)))
            .map(|(x, y)| far_map.log_odds(x, y))
            .fold(f32::MIN, f32::max);

        assert!(close_endpoint > far_endpoint);
        assert!(far_endpoint > 0.0);
    }

    #[test]
    fn test_out_of_bounds_rays_are_safe() {
        let mut map = LogOddsMap::new(50, 1.0); // tiny 1 m map
        let mut distances = vec![0i32; 360];
        distances[180] = 3000; // shoots far off the map
        let scan = scan_from_ranges(&distances);
        map.integrate_scan(&scan, &Position::map_center(1.0));
        // No panic; on-map portion of the ray is marked free.
        assert!(map.log_odds(25, 25) < 0.0);
    }

    #[test]
    fn test_grayscale_encoding() {
        let mut map = LogOddsMap::new(10, 1.0);
        map.apply_occupied(0, 0, LOG_ODDS_CLAMP);
        map.apply_free(1, 0, -LOG_ODDS_CLAMP);

        let bytes = map.grayscale();
        assert_eq!(bytes.len(), 100);
        assert_eq!(bytes[0], 0); // occupied: dark
        assert_eq!(bytes[1], 255); // free: bright
        assert_eq!(bytes[2], 128); // unknown: mid-gray
    }

    #[test]
    fn test_occupancy_grid_projection_flips_y() {
        let mut map = LogOddsMap::new(10, 1.0);
        // Pixel (2, 1) occupied, pixel (3, 8) free, in map (Y-down) rows.
        map.apply_occupied(2, 1, 2.0);
        map.apply_free(3, 8, -2.0);

        let grid = map.to_occupancy_grid();
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 10);
        assert_relative_eq!(grid.resolution, 0.1);
        assert_relative_eq!(grid.origin_x, -0.5);
        assert_relative_eq!(grid.origin_y, -0.5);
        assert_eq!(grid.frame_id, "map");

        assert_eq!(grid.cell(2, 8), Some(CELL_OCCUPIED));
        assert_eq!(grid.cell(3, 1), Some(CELL_FREE));
        assert_eq!(grid.cell(5, 5), Some(CELL_UNKNOWN));
    }

    #[test]
    fn test_occupancy_grid_values_are_discrete() {
        let mut map = LogOddsMap::new(100, 10.0);
        let mut distances = vec![0i32; 360];
        for (i, d) in distances.iter_mut().enumerate() {
            *d = 1000 + (i as i32 % 7) * 100;
        }
        let scan = scan_from_ranges(&distances);
        map.integrate_scan(&scan, &Position::map_center(10.0));

        for &cell in &map.to_occupancy_grid().data {
            assert!(
                cell == CELL_UNKNOWN || cell == CELL_FREE || cell == CELL_OCCUPIED,
                "unexpected cell value {}",
                cell
            );
        }
    }

    #[test]
    fn test_clear_resets_to_unknown() {
        let mut map = LogOddsMap::new(20, 2.0);
        map.apply_occupied(5, 5, 3.0);
        map.clear();
        assert_relative_eq!(map.log_odds(5, 5), 0.0);
        assert!(map.grayscale().iter().all(|&b| b == 128));
    }
}
