//! Engine layer: orchestrates the algorithms behind a thread-safe facade.

pub mod slam;

pub use slam::{SlamConfig, SlamEngine};
