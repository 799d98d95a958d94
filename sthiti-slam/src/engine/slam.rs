//! The SLAM engine: one scan in, one corrected pose and map update out.
//!
//! Each update runs the full pipeline on the calling thread: rebuild the
//! scan point sets with motion compensation, hill-climb from the
//! odometry-predicted pose, gate the match against the prediction, clamp
//! onto the map, then integrate the scan at the committed pose.
//!
//! The whole engine sits behind a single mutex. `update` is not reentrant
//! and never suspends while holding the lock, so an exclusive scoped guard
//! is both correct and sufficient; the intended deployment is one worker
//! thread fed from a bounded queue at scan rate.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::algorithms::mapping::LogOddsMap;
use crate::algorithms::matching::{rmhc_search, scan_cost, SearchConfig};
use crate::algorithms::rng::ZigguratRng;
use crate::algorithms::scan::{ScanBuffer, ScanConfig};
use crate::core::types::{OccupancyGrid, OdometryDelta, Position};

/// Margin kept between the clamped position and the map edge, millimeters.
const EDGE_MARGIN_MM: f32 = 20.0;

/// SLAM engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlamConfig {
    /// Rays per scan.
    pub scan_size: usize,
    /// Scan revolutions per second.
    pub scan_rate_hz: f32,
    /// Detection arc in degrees.
    pub detection_angle_deg: f32,
    /// Range assigned to no-return rays, millimeters.
    pub distance_no_detection_mm: f32,
    /// Map side in pixels.
    pub map_size_pixels: usize,
    /// Map side in meters.
    pub map_size_meters: f32,
    /// Legacy map-update quality knob (0-255); kept for older map-update
    /// variants, unused by the log-odds updater.
    pub map_quality: u8,
    /// Returns closer than half this are discarded as noise, millimeters.
    pub hole_width_mm: f32,
    /// Initial position mutation sigma, millimeters.
    pub sigma_xy_mm: f32,
    /// Initial heading mutation sigma, degrees.
    pub sigma_theta_deg: f32,
    /// Search budget: consecutive non-improvements before stopping.
    pub max_search_iter: u32,
    /// Points per ray for the map-update scan (tunable; matching always
    /// uses 1).
    pub map_scan_span: u32,
    /// RNG seed; `None` seeds from the wall clock.
    pub seed: Option<u32>,
}

impl Default for SlamConfig {
    fn default() -> Self {
        Self {
            scan_size: 360,
            scan_rate_hz: 5.0,
            detection_angle_deg: 360.0,
            distance_no_detection_mm: 3500.0,
            map_size_pixels: 800,
            map_size_meters: 20.0,
            map_quality: 50,
            hole_width_mm: 600.0,
            sigma_xy_mm: 100.0,
            sigma_theta_deg: 20.0,
            max_search_iter: 1000,
            map_scan_span: 1,
            seed: None,
        }
    }
}

impl SlamConfig {
    /// True when the configuration can drive an update at all.
    fn is_usable(&self) -> bool {
        self.scan_size >= 3
            && self.scan_rate_hz > 0.0
            && self.map_size_pixels > 0
            && self.map_size_meters > 0.0
            && self.distance_no_detection_mm > 0.0
    }

    fn scan_config(&self, span: u32) -> ScanConfig {
        ScanConfig {
            span,
            size: self.scan_size,
            rate_hz: self.scan_rate_hz,
            detection_angle_deg: self.detection_angle_deg,
            distance_no_detection_mm: self.distance_no_detection_mm,
        }
    }

    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            sigma_xy_mm: self.sigma_xy_mm,
            sigma_theta_deg: self.sigma_theta_deg,
            max_iterations: self.max_search_iter,
        }
    }
}

/// Everything the engine mutates, owned behind the engine mutex.
struct EngineState {
    config: SlamConfig,
    map: LogOddsMap,
    position: Position,
    matching_scan: ScanBuffer,
    map_scan: ScanBuffer,
    rng: ZigguratRng,
    update_count: u64,
}

impl EngineState {
    fn new(config: SlamConfig) -> Self {
        Self {
            map: LogOddsMap::new(config.map_size_pixels, config.map_size_meters),
            position: Position::map_center(config.map_size_meters),
            matching_scan: ScanBuffer::new(config.scan_config(1)),
            map_scan: ScanBuffer::new(config.scan_config(config.map_scan_span)),
            rng: match config.seed {
                Some(seed) => ZigguratRng::new(seed),
                None => ZigguratRng::from_clock(),
            },
            update_count: 0,
            config,
        }
    }
}

/// Thread-safe 2D SLAM engine.
pub struct SlamEngine {
    state: Mutex<EngineState>,
}

impl SlamEngine {
    /// Create an engine with a blank map and the robot at the map center.
    pub fn new(config: SlamConfig) -> Self {
        Self {
            state: Mutex::new(EngineState::new(config)),
        }
    }

    /// Process one scan and optional odometry delta.
    ///
    /// Returns `false` (leaving all state untouched) when the scan length
    /// does not match the configuration or the configuration cannot drive
    /// an update.
    pub fn update(&self, distances_mm: &[i32], odometry: Option<OdometryDelta>) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.config.is_usable() {
            log::warn!("update skipped: unusable configuration");
            return false;
        }
        if distances_mm.len() != state.config.scan_size {
            log::warn!(
                "update skipped: scan length {} != configured {}",
                distances_mm.len(),
                state.config.scan_size
            );
            return false;
        }

        let delta = odometry.unwrap_or_default();
        let dt = 1.0 / state.config.scan_rate_hz;
        let velocity = delta.velocities(dt);
        state
            .matching_scan
            .update(distances_mm, state.config.hole_width_mm, velocity);
        state
            .map_scan
            .update(distances_mm, state.config.hole_width_mm, velocity);

        let odom_position = state.position.advanced(&delta);
        let search = state.config.search_config();
        let matched = rmhc_search(
            &state.map,
            &state.matching_scan,
            odom_position,
            &search,
            &mut state.rng,
        );

        // Quality gate: a matcher optimum only replaces the odometry
        // prediction when it scores at least as well. Spurious optima would
        // otherwise teleport the robot behind walls.
        let matched_cost = scan_cost(&state.map, &state.matching_scan, &matched);
        let odom_cost = scan_cost(&state.map, &state.matching_scan, &odom_position);
        let mut position = match (matched_cost, odom_cost) {
            (Some(_), None) => matched,
            (Some(m), Some(o)) if m <= o => matched,
            _ => odom_position,
        };

        let limit = state.config.map_size_meters * 1000.0 - EDGE_MARGIN_MM;
        position.x_mm = position.x_mm.clamp(EDGE_MARGIN_MM, limit);
        position.y_mm = position.y_mm.clamp(EDGE_MARGIN_MM, limit);

        state.position = position;
        state.map.integrate_scan(&state.map_scan, &state.position);
        state.update_count += 1;

        log::trace!(
            "update {}: pose ({:.0}, {:.0}, {:.1}°)",
            state.update_count,
            state.position.x_mm,
            state.position.y_mm,
            state.position.theta_deg
        );
        true
    }

    /// Current corrected position.
    pub fn position(&self) -> Position {
        self.state.lock().position
    }

    /// Grayscale rendering of the map (occupied dark, free bright,
    /// unknown 128), `map_size_pixels²` bytes.
    pub fn map_bytes(&self) -> Vec<u8> {
        self.state.lock().map.grayscale()
    }

    /// Current belief as a discrete occupancy grid.
    pub fn occupancy_grid(&self) -> OccupancyGrid {
        self.state.lock().map.to_occupancy_grid()
    }

    /// Log-odds value of one map cell (map pixel coordinates, Y down).
    pub fn log_odds_at(&self, x: usize, y: usize) -> f32 {
        self.state.lock().map.log_odds(x, y)
    }

    /// Number of successful updates since construction or reset.
    pub fn update_count(&self) -> u64 {
        self.state.lock().update_count
    }

    /// The configuration the engine runs with.
    pub fn config(&self) -> SlamConfig {
        self.state.lock().config
    }

    /// Override the heading without touching position or map.
    pub fn set_initial_heading(&self, theta_deg: f32) {
        self.state.lock().position.theta_deg = theta_deg;
    }

    /// Discard all state: blank map, center position, fresh RNG.
    pub fn reset(&self) {
        let mut guard = self.state.lock();
        let config = guard.config;
        *guard = EngineState::new(config);
        log::debug!("engine reset");
    }
}
