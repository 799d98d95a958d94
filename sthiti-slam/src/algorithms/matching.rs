//! Random-mutation hill climbing against the log-odds map.
//!
//! The cost of a candidate position is how badly the scan's obstacle points
//! miss occupied map cells: each in-bounds point contributes a pseudo-pixel
//! cost that shrinks as the underlying cell's occupied evidence grows. The
//! search mutates the current anchor with Gaussian noise and keeps strict
//! improvements, periodically re-anchoring and halving the noise once
//! progress is established.

use serde::{Deserialize, Serialize};

use crate::algorithms::mapping::LogOddsMap;
use crate::algorithms::rng::ZigguratRng;
use crate::algorithms::scan::ScanBuffer;
use crate::core::types::Position;

/// Pseudo-pixel cost of an unknown cell; occupied evidence subtracts from
/// it, free evidence adds.
const COST_MIDPOINT: f32 = 32768.0;
/// Log-odds to pseudo-pixel scale.
const COST_SCALE: f32 = 6000.0;
/// Pseudo-pixel ceiling.
const COST_MAX: f32 = 65535.0;

/// Search noise and iteration budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Initial position mutation sigma in millimeters.
    pub sigma_xy_mm: f32,
    /// Initial heading mutation sigma in degrees.
    pub sigma_theta_deg: f32,
    /// Consecutive non-improvements before the search stops.
    pub max_iterations: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sigma_xy_mm: 100.0,
            sigma_theta_deg: 20.0,
            max_iterations: 1000,
        }
    }
}

/// Map-matching cost of the scan's obstacle points at `position`.
///
/// Returns `None` when no obstacle point lands on the map; lower is better.
pub fn scan_cost(map: &LogOddsMap, scan: &ScanBuffer, position: &Position) -> Option<i64> {
    let theta = position.theta_deg.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let ppm = map.pixels_per_mm();
    let px = position.x_mm * ppm;
    let py = position.y_mm * ppm;
    let size = map.size_pixels() as i32;

    let mut sum: i64 = 0;
    let mut count: i64 = 0;

    for point in scan.points() {
        if !point.is_obstacle() {
            continue;
        }
        let x = (px + (point.x_mm * cos_t - point.y_mm * sin_t) * ppm).round() as i32;
        let y = (py + (point.x_mm * sin_t + point.y_mm * cos_t) * ppm).round() as i32;
        if x < 0 || y < 0 || x >= size || y >= size {
            continue;
        }

        let l = map.log_odds(x as usize, y as usize);
        let cost = (COST_MIDPOINT - l * COST_SCALE).clamp(0.0, COST_MAX);
        sum += cost as i64;
        count += 1;
    }

    if count == 0 {
        None
    } else {
        Some(sum * 1024 / count)
    }
}

/// Hill-climb from `start`, returning the best position found.
///
/// The counter only advances on non-improving candidates, so the budget
/// bounds wasted work rather than total work. Once a third of the budget
/// passes without beating the last anchor, the search re-anchors on the
/// best-so-far, resets the counter, and halves both sigmas to refine
/// locally.
pub fn rmhc_search(
    map: &LogOddsMap,
    scan: &ScanBuffer,
    start: Position,
    config: &SearchConfig,
    rng: &mut ZigguratRng,
) -> Position {
    let mut best = start;
    let mut last_best = start;
    let mut lowest = scan_cost(map, scan, &start);
    let mut last_lowest = lowest;
    let mut sigma_xy = config.sigma_xy_mm;
    let mut sigma_theta = config.sigma_theta_deg;
    let mut counter = 0u32;

    while counter < config.max_iterations {
        let candidate = Position::new(
            rng.gaussian(last_best.x_mm, sigma_xy),
            rng.gaussian(last_best.y_mm, sigma_xy),
            rng.gaussian(last_best.theta_deg, sigma_theta),
        );

        let cost = scan_cost(map, scan, &candidate);
        if beats(cost, lowest) {
            lowest = cost;
            best = candidate;
        } else {
            counter += 1;
        }

        if counter > config.max_iterations / 3 && beats(lowest, last_lowest) {
            last_best = best;
            last_lowest = lowest;
            counter = 0;
            sigma_xy *= 0.5;
            sigma_theta *= 0.5;
        }
    }

    best
}

/// True when `candidate` is a valid cost strictly better than `reference`.
#[inline]
fn beats(candidate: Option<i64>, reference: Option<i64>) -> bool {
    match (candidate, reference) {
        (Some(c), Some(r)) => c < r,
        (Some(_), None) => true,
        _ => false,
    }
}
