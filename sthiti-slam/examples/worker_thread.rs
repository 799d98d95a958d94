//! Intended deployment shape: a dedicated SLAM worker thread fed from a
//! bounded queue at scan rate.
//!
//! A producer thread plays the sensor role, pushing scans with small
//! odometry deltas; the worker drains the queue through the engine. The
//! bounded channel applies back-pressure if the producer ever outruns the
//! matcher.
//!
//! Run with: `cargo run --example worker_thread`

use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;
use sthiti_slam::{OdometryDelta, SlamConfig, SlamEngine};

/// One queue item: a scan and the odometry accumulated since the last one.
struct SensorFrame {
    distances_mm: Vec<i32>,
    odometry: OdometryDelta,
}

/// Ranges for a rectangular room seen from an offset position.
fn room_ranges(offset_x_mm: f32, offset_y_mm: f32) -> Vec<i32> {
    let (half_x, half_y) = (2000.0f32, 1500.0f32);
    let total = 359.0f32;
    (0..360)
        .map(|i| {
            let angle = (-180.0 + i as f32 * 360.0 / total).to_radians();
            let (dir_x, dir_y) = (angle.cos(), angle.sin());
            let tx = if dir_x.abs() > 1e-6 {
                ((if dir_x > 0.0 { half_x } else { -half_x }) - offset_x_mm) / dir_x
            } else {
                f32::INFINITY
            };
            let ty = if dir_y.abs() > 1e-6 {
                ((if dir_y > 0.0 { half_y } else { -half_y }) - offset_y_mm) / dir_y
            } else {
                f32::INFINITY
            };
            tx.min(ty).round() as i32
        })
        .collect()
}

fn main() {
    let engine = Arc::new(SlamEngine::new(SlamConfig {
        seed: Some(42),
        ..SlamConfig::default()
    }));

    // Scan-rate queue: a few frames of slack, then back-pressure.
    let (tx, rx) = bounded::<SensorFrame>(8);

    // Sensor producer: the robot inches forward 10 mm per scan.
    let producer = thread::Builder::new()
        .name("sensors".into())
        .spawn(move || {
            for step in 0..50 {
                let offset = step as f32 * 10.0;
                let frame = SensorFrame {
                    distances_mm: room_ranges(offset, 0.0),
                    odometry: OdometryDelta::new(10.0, 0.0, 0.0),
                };
                if tx.send(frame).is_err() {
                    break;
                }
            }
        })
        .expect("failed to spawn sensor thread");

    // SLAM worker: drains the queue to completion.
    let worker = {
        let engine = Arc::clone(&engine);
        thread::Builder::new()
            .name("slam".into())
            .spawn(move || {
                while let Ok(frame) = rx.recv() {
                    engine.update(&frame.distances_mm, Some(frame.odometry));
                }
            })
            .expect("failed to spawn SLAM thread")
    };

    producer.join().expect("sensor thread panicked");
    worker.join().expect("SLAM thread panicked");

    let pose = engine.position();
    println!(
        "processed {} scans, final pose: ({:.0} mm, {:.0} mm, {:.1}°)",
        engine.update_count(),
        pose.x_mm,
        pose.y_mm,
        pose.theta_deg
    );

    let grid = engine.occupancy_grid();
    let occupied = grid.data.iter().filter(|&&c| c == 100).count();
    let free = grid.data.iter().filter(|&&c| c == 0).count();
    println!(
        "map: {} occupied cells, {} free cells ({}x{} @ {:.3} m/cell)",
        occupied, free, grid.width, grid.height, grid.resolution
    );
}
