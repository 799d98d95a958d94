//! Stamped rigid-body transforms and the decoded broker message shape.

use serde::{Deserialize, Serialize};

use crate::quaternion::{Quaternion, Vector3};

/// A timestamped rigid-body transform between two named frames.
///
/// Maps a point expressed in `child` coordinates into `parent` coordinates:
/// `p_parent = rotation · p_child + translation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedTransform {
    /// Parent (target) frame name.
    pub parent: String,
    /// Child (source) frame name.
    pub child: String,
    /// Timestamp in seconds.
    pub stamp: f64,
    /// Translation in meters.
    pub translation: Vector3,
    /// Unit rotation.
    pub rotation: Quaternion,
}

impl StampedTransform {
    /// The identity transform from a frame to itself.
    pub fn identity(frame: &str, stamp: f64) -> Self {
        Self {
            parent: frame.to_owned(),
            child: frame.to_owned(),
            stamp,
            translation: Vector3::zero(),
            rotation: Quaternion::identity(),
        }
    }

    /// The inverse transform: child and parent swapped.
    pub fn inverse(&self) -> StampedTransform {
        let inv_rotation = self.rotation.inverse();
        StampedTransform {
            parent: self.child.clone(),
            child: self.parent.clone(),
            stamp: self.stamp,
            translation: inv_rotation.rotate(&self.translation.neg()),
            rotation: inv_rotation,
        }
    }

    /// Apply this transform to a point in `child` coordinates.
    pub fn apply(&self, point: &Vector3) -> Vector3 {
        self.rotation.rotate(point).add(&self.translation)
    }
}

/// Broker header stamp. Integer and floating wire forms both decode to f64.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stamp {
    /// Whole seconds.
    #[serde(default)]
    pub sec: f64,
    /// Nanoseconds past the second.
    #[serde(default)]
    pub nanosec: f64,
}

impl Stamp {
    /// Combined timestamp in seconds.
    #[inline]
    pub fn seconds(&self) -> f64 {
        self.sec + self.nanosec * 1e-9
    }
}

/// Broker message header: stamp plus the parent frame name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    /// Timestamp of the transform.
    #[serde(default)]
    pub stamp: Stamp,
    /// Parent frame name.
    #[serde(default)]
    pub frame_id: String,
}

/// Translation and rotation parts of a broker transform entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformParts {
    /// Translation in meters.
    #[serde(default)]
    pub translation: Vector3,
    /// Rotation quaternion.
    #[serde(default)]
    pub rotation: Quaternion,
}

/// One decoded entry of a stamped-transforms list from the broker.
///
/// Wire decoding happens upstream; entries with an empty `frame_id` or
/// `child_frame_id` are dropped during ingestion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformUpdate {
    /// Stamp and parent frame.
    #[serde(default)]
    pub header: Header,
    /// Child frame name.
    #[serde(default)]
    pub child_frame_id: String,
    /// The transform itself.
    #[serde(default)]
    pub transform: TransformParts,
}
