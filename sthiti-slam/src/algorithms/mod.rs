//! Core SLAM algorithms: sampling, scan processing, mapping, matching.

pub mod mapping;
pub mod matching;
pub mod rng;
pub mod scan;
