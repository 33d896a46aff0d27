use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Bounding box corners in pixel space of the square detection frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Bounds {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Box width, reported as an absolute value.
    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).abs()
    }

    /// Horizontal offset of the box center from the frame center.
    ///
    /// Zero means dead ahead, negative is left of center.
    pub fn center_offset(&self, frame_size: i32) -> i32 {
        self.x0 + self.x1 - frame_size
    }
}

/// A single detected object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Detection {
    /// Object class label.
    pub label: String,
    /// Detection confidence in the unit range.
    pub confidence: f32,
    /// Bounding box in frame pixels.
    pub bounds: Bounds,
}

/// All detections of one completed inference cycle.
///
/// A snapshot is immutable once published. Consumers hold a reference
/// counted copy, a newer cycle never mutates it in place.
#[derive(Clone, Debug, Default)]
pub struct DetectionSnapshot {
    seq: u64,
    detections: Vec<Detection>,
}

impl DetectionSnapshot {
    pub fn new(seq: u64, detections: Vec<Detection>) -> Self {
        Self { seq, detections }
    }

    /// Inference cycle sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// First detection carrying the given label.
    pub fn find(&self, label: &str) -> Option<&Detection> {
        self.detections.iter().find(|d| d.label == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.find(label).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Accumulator of every label seen since mission start.
///
/// Owned by the runtime and handed read-only to whoever renders history.
/// Cleared when a new mission starts.
#[derive(Debug, Default)]
pub struct LabelHistory {
    seen: BTreeSet<String>,
}

impl LabelHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every label of a snapshot.
    pub fn observe(&mut self, snapshot: &DetectionSnapshot) {
        for detection in snapshot.detections() {
            if self.seen.insert(detection.label.clone()) {
                debug!("First sighting of {}", detection.label);
            }
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.seen.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}
