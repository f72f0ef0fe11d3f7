/// Configuration for the track stabilizer
///
/// Defaults and accepted ranges follow the B5T-007001 stabilization library.
use crate::error::{Result, StabilizerError};
use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::stabilizer::StabilizeParams;
use crate::steadiness::SteadinessThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_RETRY_COUNT: u32 = 2;
pub const MIN_RETRY_COUNT: u32 = 0;
pub const MAX_RETRY_COUNT: u32 = 300;

pub const DEFAULT_STEADINESS: i32 = 30;
pub const MIN_STEADINESS: i32 = 0;
pub const MAX_STEADINESS: i32 = 100;

/// Upper bound for both tracked objects and raw detections per category
pub const MAX_OBJECTS: usize = 35;

/// Deepest accepted history ring; association only reads the two newest slots
pub const MAX_HISTORY_DEPTH: usize = 16;

/// Tracked object category; each one is stabilized independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Face,
    Body,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Face => write!(f, "face"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// Which categories are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecFlags {
    pub face: bool,
    pub body: bool,
}

impl Default for ExecFlags {
    fn default() -> Self {
        Self {
            face: true,
            body: true,
        }
    }
}

impl ExecFlags {
    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Face => self.face,
            Category::Body => self.body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Position change (% of previous size) at or below which the old position is kept
    pub steadiness_position: i32,
    /// Size change (% of previous size) at or below which the old size is kept
    pub steadiness_size: i32,
    /// Frames a lost track survives; it is dropped once its retry count exceeds this
    pub retry_count_threshold: u32,
    /// Capacity of every per-frame buffer, and the cap on output count
    pub max_tracked_objects: usize,
    /// Maximum raw detections accepted per category per frame
    pub max_detections: usize,
    /// Frames kept in each category's history ring
    pub history_depth: usize,
    pub exec: ExecFlags,
    /// Run face and body on separate rayon tasks
    pub parallel_categories: bool,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            steadiness_position: DEFAULT_STEADINESS,
            steadiness_size: DEFAULT_STEADINESS,
            retry_count_threshold: DEFAULT_RETRY_COUNT,
            max_tracked_objects: MAX_OBJECTS,
            max_detections: MAX_OBJECTS,
            history_depth: DEFAULT_HISTORY_DEPTH,
            exec: ExecFlags::default(),
            parallel_categories: false,
        }
    }
}

impl StabilizerConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_steadiness("steadiness_position", self.steadiness_position)?;
        check_steadiness("steadiness_size", self.steadiness_size)?;
        check_retry_count(self.retry_count_threshold)?;
        check_range(
            "max_tracked_objects",
            self.max_tracked_objects as i64,
            1,
            MAX_OBJECTS as i64,
        )?;
        check_range(
            "max_detections",
            self.max_detections as i64,
            1,
            MAX_OBJECTS as i64,
        )?;
        check_range(
            "history_depth",
            i64::try_from(self.history_depth).unwrap_or(i64::MAX),
            DEFAULT_HISTORY_DEPTH as i64,
            MAX_HISTORY_DEPTH as i64,
        )
    }

    pub fn steadiness(&self) -> SteadinessThresholds {
        SteadinessThresholds::new(self.steadiness_position, self.steadiness_size)
    }

    pub fn stabilize_params(&self) -> StabilizeParams {
        StabilizeParams {
            steadiness: self.steadiness(),
            retry_count_threshold: self.retry_count_threshold,
        }
    }

    /// Largest detection batch a category can accept in one frame
    pub fn detection_limit(&self) -> usize {
        self.max_detections.min(self.max_tracked_objects)
    }
}

pub(crate) fn check_steadiness(name: &'static str, value: i32) -> Result<()> {
    check_range(
        name,
        i64::from(value),
        i64::from(MIN_STEADINESS),
        i64::from(MAX_STEADINESS),
    )
}

pub(crate) fn check_retry_count(value: u32) -> Result<()> {
    check_range(
        "retry_count_threshold",
        i64::from(value),
        i64::from(MIN_RETRY_COUNT),
        i64::from(MAX_RETRY_COUNT),
    )
}

fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(StabilizerError::invalid_param(name, value, min, max))
    }
}
