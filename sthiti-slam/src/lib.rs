//! SthitiSLAM - Real-time 2D SLAM for LiDAR-equipped mobile robots.
//!
//! A log-odds occupancy grid paired with a Random-Mutation Hill-Climbing
//! scan matcher: scans plus odometry deltas go in, a corrected pose and a
//! map come out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │        (thread-safe update/query facade)            │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Core algorithms
//! │          (rng, scan, mapping, matching)             │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                    (types)                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Pipeline
//!
//! Each `update` on the calling thread:
//!
//! 1. Rebuilds the scan point sets, compensating for motion during the
//!    sweep.
//! 2. Predicts the pose from odometry, then hill-climbs around the
//!    prediction against the current map.
//! 3. Gates the matched pose on its map-matching cost (a spurious optimum
//!    falls back to odometry).
//! 4. Clamps onto the map and integrates the scan with weighted,
//!    wall-protected log-odds ray updates.
//!
//! # Example
//!
//! ```
//! use sthiti_slam::{SlamConfig, SlamEngine};
//!
//! let engine = SlamEngine::new(SlamConfig {
//!     seed: Some(42),
//!     ..SlamConfig::default()
//! });
//!
//! let distances_mm = vec![1500i32; 360];
//! assert!(engine.update(&distances_mm, None));
//!
//! let pose = engine.position();
//! assert!((pose.x_mm - 10_000.0).abs() < 500.0);
//! ```

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Algorithms (depends on core)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Layer 3: SLAM engine (depends on core, algorithms)
// ============================================================================
pub mod engine;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

pub use crate::core::types::{OccupancyGrid, OdometryDelta, Position};
pub use crate::core::types::{CELL_FREE, CELL_OCCUPIED, CELL_UNKNOWN};

pub use algorithms::mapping::{
    LogOddsMap, LOG_ODDS_CLAMP, LOG_ODDS_FREE, LOG_ODDS_OCCUPIED, MIN_RAY_WEIGHT,
    WALL_PROTECT_THRESHOLD,
};
pub use algorithms::matching::{rmhc_search, scan_cost, SearchConfig};
pub use algorithms::rng::ZigguratRng;
pub use algorithms::scan::{ScanBuffer, ScanConfig, ScanPoint, NO_OBSTACLE, OBSTACLE};

pub use engine::{SlamConfig, SlamEngine};
