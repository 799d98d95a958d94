//! Frame registry: a tree of per-pair transform buffers with interpolated
//! lookups between any two connected frames.
//!
//! Transforms arrive as decoded broker entries and land in a static bucket
//! (latest always wins, never evicted) or a dynamic bucket (time-ordered,
//! age-limited). Lookups try the requested pair directly, then its inverse,
//! then fall back to a breadth-first search over the frame graph and compose
//! the chain.
//!
//! The registry is built for single-threaded cooperative use on the host's
//! update thread; wrap it in a shared lock if ingestion and lookups must
//! cross threads.

use std::collections::{BTreeSet, HashMap, VecDeque};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::buffer::FrameBuffer;
use crate::error::{Result, TransformError};
use crate::quaternion::{Quaternion, Vector3};
use crate::stamped::{StampedTransform, TransformUpdate};

/// Registry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Retention window for dynamic buffers, in seconds.
    pub buffer_duration: f64,
    /// Requested broker-side transform throttle in Hz; `0` disables
    /// throttling. Forwarded opaquely to the broker by the host, never
    /// interpreted here.
    pub tf_throttle_rate: f64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            buffer_duration: 30.0,
            tf_throttle_rate: 0.0,
        }
    }
}

/// Synchronous notifications of registry state changes.
///
/// Callbacks run on the ingestion thread, inside the mutation that caused
/// them. Implementers may fan out to channels or reactive streams.
pub trait RegistryObserver {
    /// The set of known frames grew.
    fn frames_changed(&self, _frames: &BTreeSet<String>) {}

    /// The registry became active (first transform seen) or was cleared.
    fn activity_changed(&self, _active: bool) {}
}

/// Directed buffer table: parent frame → child frame → buffer.
type BufferTable = HashMap<String, HashMap<String, FrameBuffer>>;

/// Registry of timed transforms between named coordinate frames.
pub struct FrameRegistry {
    config: RegistryConfig,
    dynamic: BufferTable,
    statics: BufferTable,
    adjacency: HashMap<String, BTreeSet<String>>,
    known_frames: BTreeSet<String>,
    active: bool,
    observers: Vec<Box<dyn RegistryObserver>>,
}

impl Default for FrameRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl FrameRegistry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            dynamic: BufferTable::new(),
            statics: BufferTable::new(),
            adjacency: HashMap::new(),
            known_frames: BTreeSet::new(),
            active: false,
            observers: Vec::new(),
        }
    }

    /// The configuration this registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Every frame seen so far, ordered.
    pub fn known_frames(&self) -> &BTreeSet<String> {
        &self.known_frames
    }

    /// True once any transform has been ingested.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Register an observer for frame-set and activity changes.
    pub fn observe(&mut self, observer: Box<dyn RegistryObserver>) {
        self.observers.push(observer);
    }

    /// Buffered time range for a directed pair, if that buffer exists.
    pub fn buffer_span(&self, parent: &str, child: &str) -> Option<(f64, f64)> {
        buffer_for(&self.dynamic, parent, child)
            .or_else(|| buffer_for(&self.statics, parent, child))
            .and_then(FrameBuffer::span)
    }

    /// Ingest a batch of decoded transform entries.
    ///
    /// `is_static` selects the bucket: static transforms never age out and
    /// always answer with their latest entry. Entries missing a frame name
    /// are dropped without error.
    pub fn ingest(&mut self, updates: &[TransformUpdate], is_static: bool) {
        let mut frames_grew = false;
        let mut ingested = false;

        for update in updates {
            let parent = update.header.frame_id.as_str();
            let child = update.child_frame_id.as_str();
            if parent.is_empty() || child.is_empty() {
                trace!("dropping transform entry with missing frame name");
                continue;
            }

            let tf = StampedTransform {
                parent: parent.to_owned(),
                child: child.to_owned(),
                stamp: update.header.stamp.seconds(),
                translation: update.transform.translation,
                rotation: update.transform.rotation.normalized(),
            };

            let max_age = if is_static {
                0.0
            } else {
                self.config.buffer_duration
            };
            let table = if is_static {
                &mut self.statics
            } else {
                &mut self.dynamic
            };
            table
                .entry(parent.to_owned())
                .or_default()
                .entry(child.to_owned())
                .or_insert_with(|| FrameBuffer::new(parent, child, max_age))
                .insert(tf);

            frames_grew |= self.known_frames.insert(parent.to_owned());
            frames_grew |= self.known_frames.insert(child.to_owned());
            self.adjacency
                .entry(parent.to_owned())
                .or_default()
                .insert(child.to_owned());
            self.adjacency
                .entry(child.to_owned())
                .or_default()
                .insert(parent.to_owned());
            ingested = true;
        }

        if frames_grew {
            debug!("frame set grew to {} frames", self.known_frames.len());
            for observer in &self.observers {
                observer.frames_changed(&self.known_frames);
            }
        }
        if ingested && !self.active {
            self.active = true;
            for observer in &self.observers {
                observer.activity_changed(true);
            }
        }
    }

    /// Drop all buffers, frames, and adjacency; deactivate.
    pub fn clear(&mut self) {
        self.dynamic.clear();
        self.statics.clear();
        self.adjacency.clear();
        self.known_frames.clear();
        let was_active = std::mem::replace(&mut self.active, false);

        for observer in &self.observers {
            observer.frames_changed(&self.known_frames);
            if was_active {
                observer.activity_changed(false);
            }
        }
    }

    /// Look up the transform mapping `child` coordinates into `parent` at
    /// time `t` (`0` means latest). Failures collapse to `None`; the caller
    /// re-queries on its next frame.
    pub fn lookup_transform(&self, parent: &str, child: &str, t: f64) -> Option<StampedTransform> {
        match self.lookup(parent, child, t) {
            Ok(tf) => Some(tf),
            Err(err) => {
                debug!("transform lookup {} <- {} failed: {}", parent, child, err);
                None
            }
        }
    }

    /// Planar pose `(x, y, yaw)` of `frame` expressed in `reference`, from
    /// the latest available transform.
    pub fn latest_pose(&self, frame: &str, reference: &str) -> Option<(f64, f64, f64)> {
        let tf = self.lookup_transform(reference, frame, 0.0)?;
        Some((tf.translation.x, tf.translation.y, tf.rotation.yaw()))
    }

    /// Fallible lookup keeping the error kind, for logging and tests.
    pub fn lookup(&self, parent: &str, child: &str, t: f64) -> Result<StampedTransform> {
        match self.lookup_pair(parent, child, t) {
            Ok(tf) => return Ok(tf),
            // No buffered pair either way round: fall back to graph search.
            Err(TransformError::NoData { .. }) => {}
            Err(err) => return Err(err),
        }

        let path = self
            .find_path(child, parent)
            .ok_or_else(|| TransformError::NoPath {
                from: child.to_owned(),
                to: parent.to_owned(),
            })?;

        let mut result = StampedTransform {
            parent: path[0].clone(),
            child: child.to_owned(),
            stamp: t,
            translation: Vector3::zero(),
            rotation: Quaternion::identity(),
        };

        for hop in path.windows(2) {
            let tf = self.lookup_pair(&hop[1], &hop[0], t)?;
            result.translation = tf.rotation.rotate(&result.translation).add(&tf.translation);
            result.rotation = tf.rotation.multiply(&result.rotation);
            result.parent = tf.parent.clone();
        }

        Ok(result)
    }

    /// Buffered lookup of one directed pair: static bucket first (latest),
    /// then dynamic at `t`; the inverse direction is consulted only when the
    /// direct one has no buffer.
    fn lookup_pair(&self, parent: &str, child: &str, t: f64) -> Result<StampedTransform> {
        if let Some(buffer) = buffer_for(&self.statics, parent, child) {
            return buffer.lookup(0.0);
        }
        if let Some(buffer) = buffer_for(&self.dynamic, parent, child) {
            return buffer.lookup(t);
        }
        if let Some(buffer) = buffer_for(&self.statics, child, parent) {
            return buffer.lookup(0.0).map(|tf| tf.inverse());
        }
        if let Some(buffer) = buffer_for(&self.dynamic, child, parent) {
            return buffer.lookup(t).map(|tf| tf.inverse());
        }
        Err(TransformError::NoData {
            parent: parent.to_owned(),
            child: child.to_owned(),
        })
    }

    /// Breadth-first path from `start` to `goal` over the frame graph.
    fn find_path(&self, start: &str, goal: &str) -> Option<Vec<String>> {
        if !self.adjacency.contains_key(start) || !self.adjacency.contains_key(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start.to_owned()]);
        }

        let mut came_from: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        came_from.insert(start, start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let Some(neighbors) = self.adjacency.get(current) else {
                continue;
            };
            for next in neighbors {
                if came_from.contains_key(next.as_str()) {
                    continue;
                }
                came_from.insert(next, current);
                if next == goal {
                    let mut path = vec![goal.to_owned()];
                    let mut cursor = goal;
                    while cursor != start {
                        cursor = came_from[cursor];
                        path.push(cursor.to_owned());
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }
}

fn buffer_for<'a>(table: &'a BufferTable, parent: &str, child: &str) -> Option<&'a FrameBuffer> {
    table.get(parent).and_then(|children| children.get(child))
}
