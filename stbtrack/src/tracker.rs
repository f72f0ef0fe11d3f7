//! Frame-level tracker driving the face and body categories
//!
//! Usage follows the detector loop: hand over a frame's detections with
//! [`Tracker::set_detections`], run [`Tracker::execute`], then read the
//! stabilized sets back with [`Tracker::result`] or [`Tracker::results`].

use crate::config::{check_retry_count, check_steadiness, Category, StabilizerConfig};
use crate::error::{Result, StabilizerError};
use crate::record::{Detection, TrackedObject};
use crate::stabilizer::{CategoryTracker, Scratch, StabilizeParams};
use crate::steadiness::SteadinessThresholds;
use serde::{Deserialize, Serialize};

/// Raw detections of one frame, per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub faces: Vec<Detection>,
    pub bodies: Vec<Detection>,
}

impl FrameDetections {
    pub fn get(&self, category: Category) -> &[Detection] {
        match category {
            Category::Face => &self.faces,
            Category::Body => &self.bodies,
        }
    }
}

/// Stabilized results of one frame, per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameResults {
    pub faces: Vec<TrackedObject>,
    pub bodies: Vec<TrackedObject>,
}

/// One enabled category with its own working buffers
#[derive(Debug, Clone)]
struct Lane {
    tracker: CategoryTracker,
    scratch: Scratch,
    pending: Vec<Detection>,
}

impl Lane {
    fn new(category: Category, config: &StabilizerConfig) -> Self {
        Self {
            tracker: CategoryTracker::new(
                category,
                config.history_depth,
                config.max_tracked_objects,
            ),
            scratch: Scratch::new(config.max_tracked_objects),
            pending: Vec::with_capacity(config.max_detections),
        }
    }

    fn run(&mut self, params: &StabilizeParams) {
        self.tracker
            .update(&self.pending, params, &mut self.scratch);
    }
}

#[derive(Debug, Clone)]
pub struct Tracker {
    config: StabilizerConfig,
    face: Option<Lane>,
    body: Option<Lane>,
}

impl Tracker {
    pub fn new(config: StabilizerConfig) -> Result<Self> {
        config.validate()?;

        log::info!(
            "Creating track stabilizer: face={}, body={}, max_tracked_objects={}, retry_count={}, steadiness=({}, {})",
            config.exec.face,
            config.exec.body,
            config.max_tracked_objects,
            config.retry_count_threshold,
            config.steadiness_position,
            config.steadiness_size
        );

        let lane = |category: Category| {
            config
                .exec
                .is_enabled(category)
                .then(|| Lane::new(category, &config))
        };
        let face = lane(Category::Face);
        let body = lane(Category::Body);

        Ok(Self { config, face, body })
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        self.lane(category).is_some()
    }

    fn lane(&self, category: Category) -> Option<&Lane> {
        match category {
            Category::Face => self.face.as_ref(),
            Category::Body => self.body.as_ref(),
        }
    }

    /// Per-category state, for inspection
    pub fn category_tracker(&self, category: Category) -> Option<&CategoryTracker> {
        self.lane(category).map(|lane| &lane.tracker)
    }

    /// Stage the next frame's detections.
    ///
    /// Detections for disabled categories are ignored. Nothing is staged if any
    /// enabled category has more detections than the configured limit.
    pub fn set_detections(&mut self, frame: &FrameDetections) -> Result<()> {
        let limit = self.config.detection_limit();
        for category in [Category::Face, Category::Body] {
            let count = frame.get(category).len();
            if self.is_enabled(category) && count > limit {
                return Err(StabilizerError::TooManyDetections {
                    category,
                    count,
                    max: limit,
                });
            }
        }

        for (lane, detections) in [
            (self.face.as_mut(), &frame.faces),
            (self.body.as_mut(), &frame.bodies),
        ] {
            if let Some(lane) = lane {
                lane.pending.clear();
                lane.pending.extend_from_slice(detections);
            }
        }
        Ok(())
    }

    /// Stabilize the staged detections of every enabled category
    pub fn execute(&mut self) {
        let params = self.config.stabilize_params();

        match (self.face.as_mut(), self.body.as_mut()) {
            (Some(face), Some(body)) if self.config.parallel_categories => {
                rayon::join(|| face.run(&params), || body.run(&params));
            }
            (face, body) => {
                if let Some(face) = face {
                    face.run(&params);
                }
                if let Some(body) = body {
                    body.run(&params);
                }
            }
        }
    }

    /// Stage, execute and collect one frame
    pub fn execute_frame(&mut self, frame: &FrameDetections) -> Result<FrameResults> {
        self.set_detections(frame)?;
        self.execute();
        Ok(self.results())
    }

    /// Stabilized set of `category` from the last [`execute`](Self::execute)
    pub fn result(&self, category: Category) -> Result<&[TrackedObject]> {
        self.lane(category)
            .map(|lane| lane.tracker.results())
            .ok_or(StabilizerError::CategoryDisabled(category))
    }

    /// Copy of every category's last results; disabled categories are empty
    pub fn results(&self) -> FrameResults {
        let collect = |lane: &Option<Lane>| {
            lane.as_ref()
                .map(|lane| lane.tracker.results().to_vec())
                .unwrap_or_default()
        };
        FrameResults {
            faces: collect(&self.face),
            bodies: collect(&self.body),
        }
    }

    /// Drop all tracks and restart track ids in every category
    pub fn clear(&mut self) {
        for lane in [self.face.as_mut(), self.body.as_mut()].into_iter().flatten() {
            lane.tracker.clear();
            lane.pending.clear();
        }
        log::info!("Track stabilizer cleared");
    }

    pub fn set_retry_count(&mut self, retry_count: u32) -> Result<()> {
        check_retry_count(retry_count)?;
        self.config.retry_count_threshold = retry_count;
        Ok(())
    }

    pub fn retry_count(&self) -> u32 {
        self.config.retry_count_threshold
    }

    pub fn set_steadiness(&mut self, position: i32, size: i32) -> Result<()> {
        check_steadiness("steadiness_position", position)?;
        check_steadiness("steadiness_size", size)?;
        self.config.steadiness_position = position;
        self.config.steadiness_size = size;
        Ok(())
    }

    pub fn steadiness(&self) -> SteadinessThresholds {
        self.config.steadiness()
    }
}
