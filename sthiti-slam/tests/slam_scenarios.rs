//! End-to-end SLAM scenarios: a synthetic rectangular room driven through
//! the full engine pipeline.

use approx::assert_relative_eq;
use sthiti_slam::{OdometryDelta, SlamConfig, SlamEngine, CELL_FREE, CELL_OCCUPIED, CELL_UNKNOWN};

const SCAN_SIZE: usize = 360;

/// Ranges for a robot centered in an axis-aligned rectangular room.
///
/// Mirrors the scan container's sweep: ray `i` looks along
/// `-180° + i·360/359` in the sensor frame.
fn rectangle_ranges(half_x_mm: f32, half_y_mm: f32) -> Vec<i32> {
    let total = (SCAN_SIZE - 1) as f32;
    (0..SCAN_SIZE)
        .map(|i| {
            let angle = (-180.0 + i as f32 * 360.0 / total).to_radians();
            let (dir_x, dir_y) = (angle.cos(), angle.sin());
            let tx = if dir_x.abs() > 1e-6 {
                half_x_mm / dir_x.abs()
            } else {
                f32::INFINITY
            };
            let ty = if dir_y.abs() > 1e-6 {
                half_y_mm / dir_y.abs()
            } else {
                f32::INFINITY
            };
            tx.min(ty).round() as i32
        })
        .collect()
}

fn seeded_engine(seed: u32) -> SlamEngine {
    SlamEngine::new(SlamConfig {
        seed: Some(seed),
        ..SlamConfig::default()
    })
}

#[test]
fn test_stationary_robot_in_rectangle_room() {
    let engine = seeded_engine(42);
    let distances = rectangle_ranges(2000.0, 1500.0);

    for _ in 0..5 {
        assert!(engine.update(&distances, None));
    }
    assert_eq!(engine.update_count(), 5);

    // The robot never moved, so the corrected pose stays at the map center.
    let pose = engine.position();
    assert!(
        (pose.x_mm - 10_000.0).abs() < 200.0,
        "x drifted to {}",
        pose.x_mm
    );
    assert!(
        (pose.y_mm - 10_000.0).abs() < 200.0,
        "y drifted to {}",
        pose.y_mm
    );
    assert!(pose.theta_deg.abs() < 5.0, "theta drifted to {}", pose.theta_deg);

    // The map saw both walls (dark) and open floor (bright).
    let bytes = engine.map_bytes();
    assert_eq!(bytes.len(), 800 * 800);
    assert!(bytes.iter().any(|&b| b < 100), "no occupied cells in map");
    assert!(bytes.iter().any(|&b| b > 200), "no free cells in map");

    // And the discrete projection reports occupied cells.
    let grid = engine.occupancy_grid();
    assert!(grid.data.iter().any(|&c| c == CELL_OCCUPIED));
}

#[test]
fn test_identical_seeds_give_identical_trajectories() {
    let a = seeded_engine(777);
    let b = seeded_engine(777);
    let distances = rectangle_ranges(2000.0, 1500.0);
    let deltas = [
        OdometryDelta::new(0.0, 0.0, 0.0),
        OdometryDelta::new(40.0, -10.0, 1.0),
        OdometryDelta::new(-20.0, 30.0, -0.5),
        OdometryDelta::new(10.0, 10.0, 0.2),
    ];

    for delta in deltas {
        a.update(&distances, Some(delta));
        b.update(&distances, Some(delta));
        assert_eq!(a.position(), b.position());
    }
    assert_eq!(a.map_bytes(), b.map_bytes());
}

#[test]
fn test_corrupt_scan_falls_back_to_odometry_prediction() {
    let engine = seeded_engine(9);
    let distances = rectangle_ranges(2000.0, 1500.0);
    engine.update(&distances, None);

    let before = engine.position();
    let delta = OdometryDelta::new(80.0, -40.0, 2.0);

    // All-zero ranges carry no obstacles: the matcher has nothing to score,
    // so the pose must be exactly the odometry prediction.
    let corrupt = vec![0i32; SCAN_SIZE];
    assert!(engine.update(&corrupt, Some(delta)));

    let after = engine.position();
    assert_relative_eq!(after.x_mm, before.x_mm + 80.0, epsilon = 1e-3);
    assert_relative_eq!(after.y_mm, before.y_mm - 40.0, epsilon = 1e-3);
    assert_relative_eq!(after.theta_deg, before.theta_deg + 2.0, epsilon = 1e-3);
}

#[test]
fn test_wall_protection_survives_degraded_scans() {
    let engine = seeded_engine(31);
    let distances = rectangle_ranges(2000.0, 1500.0);
    for _ in 0..5 {
        engine.update(&distances, None);
    }

    // Cells with confident occupied evidence after the clean scans.
    let mut protected = Vec::new();
    for y in 0..800 {
        for x in 0..800 {
            if engine.log_odds_at(x, y) >= 2.0 {
                protected.push((x, y));
            }
        }
    }
    assert!(!protected.is_empty(), "no confident wall cells built");

    // Degrade every tenth ray to a no-return: those rays now cast long free
    // updates straight through the walls.
    let mut degraded = distances.clone();
    for i in (0..SCAN_SIZE).step_by(10) {
        degraded[i] = 0;
    }
    for _ in 0..20 {
        engine.update(&degraded, None);
    }

    for &(x, y) in &protected {
        assert!(
            engine.log_odds_at(x, y) >= 2.0,
            "protected cell ({}, {}) eroded to {}",
            x,
            y,
            engine.log_odds_at(x, y)
        );
    }
}

#[test]
fn test_reset_restores_blank_state() {
    let engine = seeded_engine(55);
    let distances = rectangle_ranges(2000.0, 1500.0);
    for _ in 0..4 {
        engine.update(&distances, Some(OdometryDelta::new(25.0, 5.0, 0.5)));
    }

    engine.reset();

    let pose = engine.position();
    assert_relative_eq!(pose.x_mm, 10_000.0);
    assert_relative_eq!(pose.y_mm, 10_000.0);
    assert_relative_eq!(pose.theta_deg, 0.0);
    assert!(engine.map_bytes().iter().all(|&b| b == 128));
    assert_eq!(engine.update_count(), 0);
}

#[test]
fn test_occupancy_export_is_three_valued() {
    let engine = seeded_engine(101);
    let distances = rectangle_ranges(2000.0, 1500.0);
    for _ in 0..3 {
        engine.update(&distances, None);
    }

    let grid = engine.occupancy_grid();
    assert_eq!(grid.width, 800);
    assert_eq!(grid.height, 800);
    assert_relative_eq!(grid.resolution, 0.025);
    assert_relative_eq!(grid.origin_x, -10.0);
    assert_relative_eq!(grid.origin_y, -10.0);
    assert_eq!(grid.frame_id, "map");

    for &cell in &grid.data {
        assert!(
            cell == CELL_UNKNOWN || cell == CELL_FREE || cell == CELL_OCCUPIED,
            "unexpected cell value {}",
            cell
        );
    }
}
