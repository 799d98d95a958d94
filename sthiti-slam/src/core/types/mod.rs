//! Core data types shared across the SLAM engine.

mod grid;
mod position;

pub use grid::{OccupancyGrid, CELL_FREE, CELL_OCCUPIED, CELL_UNKNOWN};
pub use position::{OdometryDelta, Position};
