//! SthitiFrames - Time-buffered transform registry for mobile robots.
//!
//! Maintains a graph of named coordinate frames (`"map"`, `"odom"`,
//! `"base_link"`, ...) connected by timestamped rigid-body transforms, and
//! answers interpolated lookups between any two connected frames.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                registry                     │  ← frame graph, BFS,
//! │      (ingestion, lookup, observers)         │    chain composition
//! └─────────────────────────────────────────────┘
//!                      │
//! ┌─────────────────────────────────────────────┐
//! │                 buffer                      │  ← ordered per-pair
//! │    (ordered insert, interpolation, age)     │    transform history
//! └─────────────────────────────────────────────┘
//!                      │
//! ┌─────────────────────────────────────────────┐
//! │            quaternion / stamped             │  ← algebra + data types
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use sthiti_frames::{FrameRegistry, Header, Stamp, TransformParts, TransformUpdate};
//! use sthiti_frames::{Quaternion, Vector3};
//!
//! let mut registry = FrameRegistry::default();
//! registry.ingest(
//!     &[TransformUpdate {
//!         header: Header {
//!             stamp: Stamp { sec: 10.0, nanosec: 0.0 },
//!             frame_id: "map".to_owned(),
//!         },
//!         child_frame_id: "base_link".to_owned(),
//!         transform: TransformParts {
//!             translation: Vector3::new(1.0, 2.0, 0.0),
//!             rotation: Quaternion::identity(),
//!         },
//!     }],
//!     false,
//! );
//!
//! let (x, y, yaw) = registry.latest_pose("base_link", "map").unwrap();
//! assert!((x - 1.0).abs() < 1e-9 && (y - 2.0).abs() < 1e-9 && yaw.abs() < 1e-9);
//! ```

pub mod buffer;
pub mod error;
pub mod quaternion;
pub mod registry;
pub mod stamped;

pub use buffer::FrameBuffer;
pub use error::{Result, TransformError};
pub use quaternion::{Quaternion, Vector3};
pub use registry::{FrameRegistry, RegistryConfig, RegistryObserver};
pub use stamped::{Header, Stamp, StampedTransform, TransformParts, TransformUpdate};
