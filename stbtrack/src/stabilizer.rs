//! Frame-to-frame association and stabilization for one category
//!
//! Each frame the previous stabilized set is matched against the new raw
//! detections by repeatedly taking the single best pair left in the whole
//! distance table. This is a greedy approximation, not an optimal assignment.
//! Matched tracks keep their id and get steadied geometry, unmatched tracks are
//! carried forward with a growing retry count, and unmatched detections start
//! new tracks.

use crate::config::Category;
use crate::distance::DistanceTable;
use crate::history::FrameHistory;
use crate::record::{Detection, DetectionRecord, TrackedObject, NO_DETECTION};
use crate::steadiness::{steady, SteadinessThresholds};

/// Tunables read by [`stabilize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizeParams {
    pub steadiness: SteadinessThresholds,
    /// A previous record is dropped before matching once its retry count exceeds this
    pub retry_count_threshold: u32,
}

/// Working buffers for [`stabilize`], allocated once and reused every frame
#[derive(Debug, Clone)]
pub struct Scratch {
    distances: DistanceTable,
    prev_to_cur: Vec<Option<usize>>,
    cur_to_prev: Vec<Option<usize>>,
    output: Vec<DetectionRecord>,
}

impl Scratch {
    pub fn new(capacity: usize) -> Self {
        Self {
            distances: DistanceTable::new(capacity),
            prev_to_cur: vec![None; capacity],
            cur_to_prev: vec![None; capacity],
            output: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.distances.capacity()
    }

    /// Stabilized records written by the last [`stabilize`] call
    pub fn output(&self) -> &[DetectionRecord] {
        &self.output
    }

    pub fn distances(&self) -> &DistanceTable {
        &self.distances
    }
}

/// What happened to the records of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StabilizeSummary {
    /// Previous records dropped for exceeding the retry threshold
    pub evicted: usize,
    pub matched: usize,
    /// Previous tracks carried forward without a detection
    pub carried: usize,
    /// New tracks started from unmatched detections
    pub created: usize,
}

/// Drop records whose retry count exceeds `threshold`, keeping the order of the rest
pub fn evict_expired(records: &mut Vec<DetectionRecord>, threshold: u32) -> usize {
    let before = records.len();
    records.retain(|record| !record.is_expired(threshold));
    before - records.len()
}

/// Stabilize `current` raw records against the `previous` stabilized set.
///
/// `previous` is compacted in place by the eviction pre-step. The result is
/// left in [`Scratch::output`] and never holds more than the scratch capacity.
/// `next_track_id` is handed to each new track and then incremented. Once it
/// reaches `i32::MAX` no further tracks are created, so ids are never reused.
pub fn stabilize(
    current: &[DetectionRecord],
    previous: &mut Vec<DetectionRecord>,
    params: &StabilizeParams,
    next_track_id: &mut i32,
    scratch: &mut Scratch,
) -> StabilizeSummary {
    let capacity = scratch.capacity();
    let mut summary = StabilizeSummary {
        evicted: evict_expired(previous, params.retry_count_threshold),
        ..Default::default()
    };
    let previous: &[DetectionRecord] = previous;

    scratch.prev_to_cur.fill(None);
    scratch.cur_to_prev.fill(None);
    scratch.output.clear();
    scratch.distances.fill(previous, current);

    // Matched pairs, best score across the whole frame first
    while scratch.output.len() < capacity {
        let Some((ip, ic)) = scratch
            .distances
            .global_minimum(previous.len(), current.len())
        else {
            break;
        };

        log::trace!(
            "match track {} <- detection {} (score {})",
            previous[ip].track_id,
            current[ic].detection_id,
            scratch.distances.get(ip, ic)
        );

        scratch.prev_to_cur[ip] = Some(ic);
        scratch.cur_to_prev[ic] = Some(ip);
        scratch.distances.invalidate(ip, ic);

        let pre = &previous[ip];
        let cur = &current[ic];
        let roi = steady(cur.roi(), pre.roi(), params.steadiness);
        scratch.output.push(DetectionRecord {
            detection_id: cur.detection_id,
            track_id: pre.track_id,
            x: roi.x,
            y: roi.y,
            size: roi.size,
            confidence: average(cur.confidence, pre.confidence),
            retry_count: 0,
        });
        summary.matched += 1;
    }

    // Tracks with no detection this frame
    for (ip, pre) in previous.iter().enumerate() {
        if scratch.output.len() >= capacity {
            break;
        }
        if scratch.prev_to_cur[ip].is_none() {
            let carried = DetectionRecord {
                detection_id: NO_DETECTION,
                retry_count: pre.retry_count.saturating_add(1),
                ..*pre
            };
            log::trace!("carry track {} as {:?}", carried.track_id, carried.state());
            scratch.output.push(carried);
            summary.carried += 1;
        }
    }

    // Detections with no previous track
    for (ic, cur) in current.iter().enumerate() {
        if scratch.output.len() >= capacity {
            break;
        }
        if scratch.cur_to_prev[ic].is_none() {
            // i32::MAX marks an exhausted counter and is never handed out
            if *next_track_id == i32::MAX {
                log::warn!(
                    "track id counter exhausted, dropping detection {}",
                    cur.detection_id
                );
                continue;
            }
            scratch.output.push(DetectionRecord {
                track_id: *next_track_id,
                retry_count: 0,
                ..*cur
            });
            *next_track_id += 1;
            summary.created += 1;
        }
    }

    summary
}

fn average(a: i32, b: i32) -> i32 {
    ((i64::from(a) + i64::from(b)) / 2) as i32
}

/// History, id counter and last results of a single category
#[derive(Debug, Clone)]
pub struct CategoryTracker {
    category: Category,
    history: FrameHistory,
    next_track_id: i32,
    results: Vec<TrackedObject>,
    n_steps: u32,
}

impl CategoryTracker {
    pub fn new(category: Category, history_depth: usize, capacity: usize) -> Self {
        Self {
            category,
            history: FrameHistory::new(history_depth, capacity),
            next_track_id: 0,
            results: Vec::with_capacity(capacity),
            n_steps: 0,
        }
    }

    /// Run one frame: shift history, load `detections`, associate, and store
    /// the stabilized set back as the newest history slot.
    pub fn update(
        &mut self,
        detections: &[Detection],
        params: &StabilizeParams,
        scratch: &mut Scratch,
    ) -> &[TrackedObject] {
        self.history.shift();
        self.history.load_current(detections);

        let (current, previous) = self.history.current_and_previous_mut();
        let summary = stabilize(current, previous, params, &mut self.next_track_id, scratch);

        self.history.store_current(scratch.output());
        self.results.clear();
        self.results
            .extend(scratch.output().iter().map(DetectionRecord::to_tracked));
        self.n_steps += 1;

        if summary.evicted > 0 {
            log::debug!(
                "{}: evicted {} tracks lost for more than {} frames",
                self.category,
                summary.evicted,
                params.retry_count_threshold
            );
        }
        log::debug!(
            "{} frame {}: {} detections -> {} tracks (matched {}, lost {}, new {})",
            self.category,
            self.n_steps,
            detections.len(),
            self.results.len(),
            summary.matched,
            summary.carried,
            summary.created
        );

        &self.results
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Results of the last [`update`](Self::update)
    pub fn results(&self) -> &[TrackedObject] {
        &self.results
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    /// Live tracks, including the ones currently lost
    pub fn num_tracks(&self) -> usize {
        self.history.current().len()
    }

    /// Id the next new track will receive
    pub fn next_track_id(&self) -> i32 {
        self.next_track_id
    }

    pub fn step_count(&self) -> u32 {
        self.n_steps
    }

    /// Forget every track and restart ids from zero
    pub fn clear(&mut self) {
        self.history.clear();
        self.results.clear();
        self.next_track_id = 0;
        self.n_steps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::DEFAULT_HISTORY_DEPTH;

    fn params(position: i32, size: i32, retry: u32) -> StabilizeParams {
        StabilizeParams {
            steadiness: SteadinessThresholds::new(position, size),
            retry_count_threshold: retry,
        }
    }

    fn raw(detections: &[Detection]) -> Vec<DetectionRecord> {
        detections
            .iter()
            .enumerate()
            .map(|(i, d)| DetectionRecord::from_detection(i, d))
            .collect()
    }

    fn track(track_id: i32, x: i32, y: i32, size: i32, confidence: i32, retry: u32) -> DetectionRecord {
        DetectionRecord {
            detection_id: 0,
            track_id,
            x,
            y,
            size,
            confidence,
            retry_count: retry,
        }
    }

    #[test]
    fn test_matched_track_is_held_and_averaged() {
        let mut scratch = Scratch::new(4);
        let mut previous = vec![track(7, 100, 100, 50, 80, 0)];
        let current = raw(&[Detection::new(102, 101, 51, 90)]);
        let mut next_id = 8;

        let summary = stabilize(&current, &mut previous, &params(5, 5, 2), &mut next_id, &mut scratch);

        assert_eq!(summary.matched, 1);
        assert_eq!(next_id, 8);
        let out = scratch.output();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_id, 7);
        assert_eq!(out[0].detection_id, 0);
        assert_eq!((out[0].x, out[0].y, out[0].size), (100, 100, 50));
        assert_eq!(out[0].confidence, 85);
        assert_eq!(out[0].retry_count, 0);
    }

    #[test]
    fn test_lost_track_is_carried_with_retry() {
        let mut scratch = Scratch::new(4);
        let mut previous = vec![track(3, 10, 10, 20, 60, 2)];
        let mut next_id = 4;

        let summary = stabilize(&[], &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        assert_eq!(summary.evicted, 0);
        assert_eq!(summary.carried, 1);
        let out = scratch.output();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_id, 3);
        assert_eq!(out[0].detection_id, NO_DETECTION);
        assert_eq!(out[0].retry_count, 3);
        assert_eq!((out[0].x, out[0].y, out[0].size, out[0].confidence), (10, 10, 20, 60));
    }

    #[test]
    fn test_expired_track_is_evicted_before_matching() {
        let mut scratch = Scratch::new(4);
        let mut previous = vec![track(3, 10, 10, 20, 60, 3), track(4, 50, 50, 20, 60, 1)];
        let mut next_id = 5;

        let summary = stabilize(&[], &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        assert_eq!(summary.evicted, 1);
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].track_id, 4);
        assert_eq!(scratch.output().len(), 1);
        assert_eq!(scratch.output()[0].track_id, 4);
    }

    #[test]
    fn test_first_frame_creates_sequential_ids() {
        let mut scratch = Scratch::new(4);
        let mut previous = Vec::new();
        let current = raw(&[Detection::new(10, 10, 20, 70), Detection::new(80, 80, 20, 75)]);
        let mut next_id = 0;

        let summary = stabilize(&current, &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        assert_eq!(summary.created, 2);
        assert_eq!(next_id, 2);
        let out = scratch.output();
        assert_eq!(out[0].track_id, 0);
        assert_eq!(out[1].track_id, 1);
        assert_eq!(out[1].detection_id, 1);
        assert_eq!(out[1].confidence, 75);
        assert!(out.iter().all(|r| r.retry_count == 0));
    }

    #[test]
    fn test_output_order_matched_then_lost_then_new() {
        let mut scratch = Scratch::new(8);
        let mut previous = vec![track(1, 0, 0, 20, 50, 0), track(2, 500, 500, 0, 50, 0)];
        let current = raw(&[Detection::new(900, 0, 20, 50), Detection::new(1, 0, 20, 50)]);
        let mut next_id = 3;

        stabilize(&current, &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        let ids: Vec<(i32, i32)> = scratch
            .output()
            .iter()
            .map(|r| (r.track_id, r.detection_id))
            .collect();
        assert_eq!(ids, vec![(1, 1), (2, NO_DETECTION), (3, 0)]);
    }

    #[test]
    fn test_far_detection_still_matches() {
        let mut scratch = Scratch::new(4);
        let mut previous = vec![track(1, 0, 0, 20, 50, 0)];
        let current = raw(&[Detection::new(900, 0, 20, 50)]);
        let mut next_id = 2;

        let summary = stabilize(&current, &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        // no distance gate: any pair with a real previous size is matchable
        assert_eq!(summary.matched, 1);
        assert_eq!(scratch.output()[0].track_id, 1);
        assert_eq!(scratch.output()[0].x, 900);
    }

    #[test]
    fn test_zero_size_previous_is_never_matched() {
        let mut scratch = Scratch::new(4);
        let mut previous = vec![track(1, 10, 10, 0, 50, 0)];
        let current = raw(&[Detection::new(10, 10, 20, 50)]);
        let mut next_id = 2;

        let summary = stabilize(&current, &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        assert_eq!(summary.matched, 0);
        assert_eq!(summary.carried, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(scratch.output()[1].track_id, 2);
    }

    #[test]
    fn test_capacity_truncates_new_tracks() {
        let mut scratch = Scratch::new(2);
        // unmatchable previous track, so every pass competes for space
        let mut previous = vec![track(1, 0, 0, 0, 50, 1)];
        let current = raw(&[Detection::new(300, 300, 20, 50), Detection::new(600, 600, 20, 50)]);
        let mut next_id = 2;

        let summary = stabilize(&current, &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        assert_eq!(scratch.output().len(), 2);
        assert_eq!(summary.carried, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(next_id, 3);
    }

    #[test]
    fn test_exhausted_track_ids_are_not_reused() {
        let mut scratch = Scratch::new(4);
        let current = raw(&[Detection::new(100, 100, 20, 50), Detection::new(400, 400, 20, 50)]);
        let mut next_id = i32::MAX - 1;

        let summary = stabilize(&current, &mut Vec::new(), &params(30, 30, 2), &mut next_id, &mut scratch);

        assert_eq!(summary.created, 1);
        assert_eq!(scratch.output().len(), 1);
        assert_eq!(scratch.output()[0].track_id, i32::MAX - 1);
        assert_eq!(next_id, i32::MAX);

        let mut previous = scratch.output().to_vec();
        let current = raw(&[
            Detection::new(100, 100, 20, 50),
            Detection::new(700, 700, 20, 50),
            Detection::new(900, 900, 20, 50),
        ]);
        let summary = stabilize(&current, &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        assert_eq!(summary.matched, 1);
        assert_eq!(summary.created, 0);
        let ids: Vec<i32> = scratch.output().iter().map(|r| r.track_id).collect();
        assert_eq!(ids, vec![i32::MAX - 1]);
        assert_eq!(next_id, i32::MAX);
    }

    #[test]
    fn test_capacity_reached_by_matches_skips_other_passes() {
        let mut scratch = Scratch::new(1);
        let mut previous = vec![track(1, 0, 0, 20, 50, 0)];
        let current = raw(&[Detection::new(0, 0, 20, 50)]);
        let mut next_id = 2;

        let summary = stabilize(&current, &mut previous, &params(30, 30, 2), &mut next_id, &mut scratch);

        assert_eq!(summary.matched, 1);
        assert_eq!(summary.created, 0);
        assert_eq!(next_id, 2);
    }

    #[test]
    fn test_category_tracker_lifecycle() {
        let mut tracker = CategoryTracker::new(Category::Face, DEFAULT_HISTORY_DEPTH, 4);
        let mut scratch = Scratch::new(4);
        let p = params(30, 30, 1);

        let out = tracker.update(&[Detection::new(100, 100, 40, 80)], &p, &mut scratch);
        assert_eq!(out.len(), 1);
        let id = out[0].track_id;

        let out = tracker.update(&[Detection::new(103, 100, 41, 90)], &p, &mut scratch);
        assert_eq!(out[0].track_id, id);
        assert_eq!(out[0].roi().x, 100);
        assert_eq!(out[0].confidence, 85);

        // lost for two frames: retry 1 then 2
        tracker.update(&[], &p, &mut scratch);
        let out = tracker.update(&[], &p, &mut scratch);
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_detected());
        assert_eq!(tracker.history().current()[0].retry_count, 2);

        // retry 2 > threshold 1: dropped at the start of this frame
        let out = tracker.update(&[], &p, &mut scratch);
        assert!(out.is_empty());
        assert_eq!(tracker.num_tracks(), 0);
        assert_eq!(tracker.step_count(), 5);

        tracker.clear();
        assert_eq!(tracker.next_track_id(), 0);
        assert!(tracker.results().is_empty());
    }
}
