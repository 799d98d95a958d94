//! Time-ordered transform buffer for a single frame pair.
//!
//! Entries stay sorted by timestamp regardless of arrival order. Lookups
//! between two entries interpolate: linear for translation, SLERP for
//! rotation. A buffer with `max_age > 0` evicts entries older than
//! `newest − max_age` on every insert; `max_age == 0` marks a static buffer
//! that never evicts and always answers with its latest entry.

use std::collections::VecDeque;

use crate::error::{Result, TransformError};
use crate::stamped::StampedTransform;

/// Timestamps this close together are treated as the same instant.
const TIME_EPSILON: f64 = 1e-6;

/// Lookups this far outside the buffered range still snap to the nearest
/// end entry instead of failing (sensor stamp jitter).
const JITTER_TOLERANCE: f64 = 0.05;

/// Ordered transform history for one fixed `(parent, child)` pair.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    parent: String,
    child: String,
    max_age: f64,
    entries: VecDeque<StampedTransform>,
}

impl FrameBuffer {
    /// Create an empty buffer for the given pair.
    ///
    /// `max_age` is the retention window in seconds; `0` disables eviction
    /// (static transform).
    pub fn new(parent: &str, child: &str, max_age: f64) -> Self {
        Self {
            parent: parent.to_owned(),
            child: child.to_owned(),
            max_age,
            entries: VecDeque::new(),
        }
    }

    /// Parent frame of every entry.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Child frame of every entry.
    pub fn child(&self) -> &str {
        &self.child
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest entry, if any.
    pub fn latest(&self) -> Option<&StampedTransform> {
        self.entries.back()
    }

    /// Buffered time range `(oldest, newest)`.
    pub fn span(&self) -> Option<(f64, f64)> {
        let first = self.entries.front()?;
        let last = self.entries.back()?;
        Some((first.stamp, last.stamp))
    }

    /// Insert a transform, keeping entries sorted by timestamp.
    ///
    /// In-order arrivals append in O(1); out-of-order arrivals binary-search
    /// their slot. With a retention window set, entries that fall out of it
    /// are evicted afterwards.
    pub fn insert(&mut self, tf: StampedTransform) {
        debug_assert_eq!(tf.parent, self.parent);
        debug_assert_eq!(tf.child, self.child);

        match self.entries.back() {
            Some(last) if tf.stamp < last.stamp => {
                let idx = self.entries.partition_point(|e| e.stamp < tf.stamp);
                self.entries.insert(idx, tf);
            }
            _ => self.entries.push_back(tf),
        }

        if self.max_age > 0.0 {
            let newest = self.entries.back().map(|e| e.stamp).unwrap_or(0.0);
            let cutoff = newest - self.max_age;
            while self.entries.front().is_some_and(|e| e.stamp < cutoff) {
                self.entries.pop_front();
            }
        }
    }

    /// Look up the transform at time `t`.
    ///
    /// `t == 0` means "latest" (static-transform convention). An exact
    /// timestamp match (within 1 µs) returns the stored entry; a time
    /// between two entries interpolates; a time up to 50 ms outside the
    /// buffered range snaps to the nearest end.
    pub fn lookup(&self, t: f64) -> Result<StampedTransform> {
        let (first, last) = match (self.entries.front(), self.entries.back()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(TransformError::NoData {
                    parent: self.parent.clone(),
                    child: self.child.clone(),
                })
            }
        };

        if t == 0.0 {
            return Ok(last.clone());
        }

        let idx = self.entries.partition_point(|e| e.stamp < t);

        if idx < self.entries.len() && (self.entries[idx].stamp - t).abs() < TIME_EPSILON {
            return Ok(self.entries[idx].clone());
        }

        if idx == 0 {
            return if t >= first.stamp - JITTER_TOLERANCE {
                Ok(first.clone())
            } else {
                Err(self.extrapolation(t))
            };
        }

        if idx == self.entries.len() {
            return if t <= last.stamp + JITTER_TOLERANCE {
                Ok(last.clone())
            } else {
                Err(self.extrapolation(t))
            };
        }

        let before = &self.entries[idx - 1];
        let after = &self.entries[idx];
        let alpha = (t - before.stamp) / (after.stamp - before.stamp);

        Ok(StampedTransform {
            parent: self.parent.clone(),
            child: self.child.clone(),
            stamp: t,
            translation: before.translation.lerp(&after.translation, alpha),
            rotation: before.rotation.slerp(&after.rotation, alpha),
        })
    }

    fn extrapolation(&self, t: f64) -> TransformError {
        let (earliest, latest) = self.span().unwrap_or((0.0, 0.0));
        TransformError::Extrapolation {
            requested: t,
            earliest,
            latest,
        }
    }
}
