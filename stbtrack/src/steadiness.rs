//! Hold/pass-through jitter filter
//!
//! Position and size are decided independently: a change at or below its
//! threshold keeps the previous value, anything larger jumps to the new one.
//! There is no blending between the two.

use crate::record::{change_percentages, Roi};
use serde::{Deserialize, Serialize};

/// Percentage thresholds at or below which a change counts as noise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteadinessThresholds {
    pub position: i32,
    pub size: i32,
}

impl SteadinessThresholds {
    pub fn new(position: i32, size: i32) -> Self {
        Self { position, size }
    }
}

/// Stabilized geometry for a matched `current` / `previous` pair
pub fn steady(current: Roi, previous: Roi, thresholds: SteadinessThresholds) -> Roi {
    let Some((position_pct, size_pct)) = change_percentages(&current, &previous) else {
        return current;
    };

    let (x, y) = if position_pct <= thresholds.position {
        (previous.x, previous.y)
    } else {
        (current.x, current.y)
    };

    let size = if size_pct <= thresholds.size {
        previous.size
    } else {
        current.size
    };

    Roi { x, y, size }
}
