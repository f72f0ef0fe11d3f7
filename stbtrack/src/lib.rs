//! Frame-to-frame face and body track stabilizer
//!
//! Raw per-frame detections (center, size, confidence) from an external
//! detector are associated with the previous frame's tracks, given persistent
//! track ids, steadied against small jitter, and kept alive for a configurable
//! number of frames after they disappear.
//!
//! # Usage
//!
//! ```rust
//! use stbtrack::{Detection, FrameDetections, StabilizerConfig, Tracker};
//!
//! let mut tracker = Tracker::new(StabilizerConfig::default())?;
//!
//! let frame = FrameDetections {
//!     faces: vec![Detection::new(120, 80, 40, 700)],
//!     bodies: Vec::new(),
//! };
//! let results = tracker.execute_frame(&frame)?;
//! assert_eq!(results.faces[0].track_id, 0);
//! # Ok::<(), stbtrack::StabilizerError>(())
//! ```
//!
//! The association core is also usable on its own through
//! [`CategoryTracker`] or [`stabilize`] with caller-owned [`Scratch`] buffers.

pub mod config;
pub mod distance;
pub mod error;
pub mod history;
pub mod record;
pub mod stabilizer;
pub mod steadiness;
pub mod tracker;

pub use config::{Category, ExecFlags, StabilizerConfig};
pub use distance::{similarity_score, DistanceTable, SENTINEL};
pub use error::{Result, StabilizerError};
pub use history::FrameHistory;
pub use record::{Detection, DetectionRecord, Roi, TrackState, TrackedObject};
pub use stabilizer::{stabilize, CategoryTracker, Scratch, StabilizeParams, StabilizeSummary};
pub use steadiness::{steady, SteadinessThresholds};
pub use tracker::{FrameDetections, FrameResults, Tracker};
