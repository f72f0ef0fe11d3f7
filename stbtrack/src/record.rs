//! Detection records and the change metric shared by scoring and smoothing

use num::cast;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `detection_id` of a track that had no detection this frame
pub const NO_DETECTION: i32 = -1;
/// `track_id` of a raw record that has not been through association yet
pub const UNASSIGNED_TRACK: i32 = -1;

/// Center position and size of a detected object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub size: i32,
}

impl Roi {
    pub fn new(x: i32, y: i32, size: i32) -> Self {
        Self { x, y, size }
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Roi({}, {}, {})", self.x, self.y, self.size)
    }
}

/// One raw detector output for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Detection {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub confidence: i32,
}

impl Detection {
    pub fn new(x: i32, y: i32, size: i32, confidence: i32) -> Self {
        Self {
            x,
            y,
            size,
            confidence,
        }
    }

    pub fn roi(&self) -> Roi {
        Roi::new(self.x, self.y, self.size)
    }
}

/// Lifecycle of a track, derived from its retry count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Matched to a detection in the latest frame
    Tracked,
    /// Missing for the given number of consecutive frames
    Lost(u32),
}

/// A single entry of a history slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Index into the frame's raw detections, or [`NO_DETECTION`]
    pub detection_id: i32,
    /// Persistent track identifier, or [`UNASSIGNED_TRACK`] for raw input
    pub track_id: i32,
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub confidence: i32,
    /// Consecutive frames since the last real match
    pub retry_count: u32,
}

impl DetectionRecord {
    /// Raw record for the `index`-th detection of the newest frame
    pub fn from_detection(index: usize, detection: &Detection) -> Self {
        Self {
            detection_id: cast(index).unwrap_or(i32::MAX),
            track_id: UNASSIGNED_TRACK,
            x: detection.x,
            y: detection.y,
            size: detection.size,
            confidence: detection.confidence,
            retry_count: 0,
        }
    }

    pub fn roi(&self) -> Roi {
        Roi::new(self.x, self.y, self.size)
    }

    pub fn state(&self) -> TrackState {
        match self.retry_count {
            0 => TrackState::Tracked,
            n => TrackState::Lost(n),
        }
    }

    /// True once the record has been missing for longer than `threshold` frames
    pub fn is_expired(&self, threshold: u32) -> bool {
        self.retry_count > threshold
    }

    pub fn to_tracked(&self) -> TrackedObject {
        TrackedObject {
            track_id: self.track_id,
            detection_id: self.detection_id,
            x: self.x,
            y: self.y,
            size: self.size,
            confidence: self.confidence,
        }
    }
}

/// Stabilized, ID-tagged result handed to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub track_id: i32,
    pub detection_id: i32,
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub confidence: i32,
}

impl TrackedObject {
    pub fn roi(&self) -> Roi {
        Roi::new(self.x, self.y, self.size)
    }

    /// False when the track is being carried without a detection this frame
    pub fn is_detected(&self) -> bool {
        self.detection_id != NO_DETECTION
    }
}

/// Position and size change from `previous` to `current`, as integer percentages
/// of the previous size.
///
/// Returns `None` when the previous size is below 1, which is the only guard
/// against dividing by zero and also marks placeholder records.
pub fn change_percentages(current: &Roi, previous: &Roi) -> Option<(i32, i32)> {
    if previous.size < 1 {
        return None;
    }

    let pre_size = f64::from(previous.size);
    let dx = f64::from(previous.x) - f64::from(current.x);
    let dy = f64::from(previous.y) - f64::from(current.y);
    let displacement = (dx * dx + dy * dy).sqrt();
    let size_change = (f64::from(previous.size) - f64::from(current.size)).abs();

    Some((
        to_percent(displacement * 100.0 / pre_size),
        to_percent(size_change * 100.0 / pre_size),
    ))
}

fn to_percent(value: f64) -> i32 {
    cast(value.round()).unwrap_or(i32::MAX)
}
