//! Error types for transform lookups.

use thiserror::Error;

/// Why a transform lookup failed.
///
/// The registry's public lookup collapses these to `None`; the distinct
/// variants exist for logging and for tests that care which way a lookup
/// failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// No entries buffered for the requested frame pair.
    #[error("no transform data for {parent} <- {child}")]
    NoData {
        /// Requested parent frame.
        parent: String,
        /// Requested child frame.
        child: String,
    },

    /// Requested time falls outside the buffered range by more than the
    /// jitter tolerance.
    #[error("time {requested:.6}s outside buffered range [{earliest:.6}s, {latest:.6}s]")]
    Extrapolation {
        /// The time that was asked for.
        requested: f64,
        /// Oldest buffered timestamp.
        earliest: f64,
        /// Newest buffered timestamp.
        latest: f64,
    },

    /// Both frames are known but not connected in the frame graph.
    #[error("frames {from} and {to} are not connected")]
    NoPath {
        /// Frame the search started from.
        from: String,
        /// Frame the search was aiming for.
        to: String,
    },
}

/// Result alias for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
