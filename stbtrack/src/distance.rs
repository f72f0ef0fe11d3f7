//! Similarity table between previous tracks and current detections
//!
//! Scores are non-negative and lower is more similar. A pair whose previous
//! record has no usable size scores [`SENTINEL`] and is never matched.

use crate::record::{change_percentages, DetectionRecord, Roi};
use ndarray::{Array2, ArrayView2};

/// Score of a pair that must not be matched
pub const SENTINEL: i32 = i32::MAX;

/// Largest score a real pair can get; keeps it distinguishable from [`SENTINEL`]
const MAX_SCORE: i64 = SENTINEL as i64 - 1;

/// `(position% + 1) * (size% + 1)` between `current` and `previous`
pub fn similarity_score(current: &Roi, previous: &Roi) -> i32 {
    match change_percentages(current, previous) {
        None => SENTINEL,
        Some((position, size)) => {
            let score = (i64::from(position) + 1) * (i64::from(size) + 1);
            score.min(MAX_SCORE) as i32
        }
    }
}

/// Square `capacity x capacity` table indexed `[previous, current]`
#[derive(Debug, Clone)]
pub struct DistanceTable {
    table: Array2<i32>,
}

impl DistanceTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            table: Array2::from_elem((capacity, capacity), SENTINEL),
        }
    }

    pub fn capacity(&self) -> usize {
        self.table.nrows()
    }

    /// Reset every entry to the sentinel and score all live pairs
    pub fn fill(&mut self, previous: &[DetectionRecord], current: &[DetectionRecord]) {
        let capacity = self.capacity();
        assert!(
            previous.len() <= capacity && current.len() <= capacity,
            "distance table of capacity {} cannot hold {} previous x {} current records",
            capacity,
            previous.len(),
            current.len()
        );

        self.table.fill(SENTINEL);
        for (ip, pre) in previous.iter().enumerate() {
            let pre_roi = pre.roi();
            for (ic, cur) in current.iter().enumerate() {
                self.table[[ip, ic]] = similarity_score(&cur.roi(), &pre_roi);
            }
        }
    }

    pub fn get(&self, previous: usize, current: usize) -> i32 {
        self.table[[previous, current]]
    }

    pub fn view(&self) -> ArrayView2<'_, i32> {
        self.table.view()
    }

    /// Smallest non-sentinel entry within the live `prev_count x cur_count` block.
    ///
    /// Scans row by row with a strict `<`, so on ties the lowest previous index
    /// wins, then the lowest current index.
    pub fn global_minimum(&self, prev_count: usize, cur_count: usize) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        let mut best_score = SENTINEL;

        for ip in 0..prev_count {
            for ic in 0..cur_count {
                let score = self.table[[ip, ic]];
                if score < best_score {
                    best_score = score;
                    best = Some((ip, ic));
                }
            }
        }
        best
    }

    /// Take a matched pair out of play: its whole row and column become sentinels
    pub fn invalidate(&mut self, previous: usize, current: usize) {
        self.table.row_mut(previous).fill(SENTINEL);
        self.table.column_mut(current).fill(SENTINEL);
    }
}
