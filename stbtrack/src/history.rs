//! Rolling per-category frame history
//!
//! Slot 0 is the most recent frame. Every slot is allocated once with room for
//! `capacity` records and reused for the lifetime of the ring.

use crate::record::{Detection, DetectionRecord};

/// Default number of frames kept per category (current + previous)
pub const DEFAULT_HISTORY_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct FrameHistory {
    slots: Vec<Vec<DetectionRecord>>,
    capacity: usize,
}

impl FrameHistory {
    /// Ring of `depth` slots holding up to `capacity` records each.
    ///
    /// Panics when `depth < 2`; association needs a current and a previous slot.
    pub fn new(depth: usize, capacity: usize) -> Self {
        assert!(depth >= 2, "frame history needs at least 2 slots, got {}", depth);
        Self {
            slots: (0..depth).map(|_| Vec::with_capacity(capacity)).collect(),
            capacity,
        }
    }

    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Age every slot by one frame. The oldest slot's contents are dropped and
    /// slot 0 keeps a copy of itself until the next [`load_current`](Self::load_current).
    pub fn shift(&mut self) {
        for t in (1..self.slots.len()).rev() {
            let (newer, older) = self.slots.split_at_mut(t);
            older[0].clone_from(&newer[t - 1]);
        }
    }

    /// Write the newest raw detections into slot 0.
    ///
    /// Panics if there are more detections than a slot can hold.
    pub fn load_current(&mut self, detections: &[Detection]) {
        assert!(
            detections.len() <= self.capacity,
            "{} detections exceed frame history capacity {}",
            detections.len(),
            self.capacity
        );

        let current = &mut self.slots[0];
        current.clear();
        current.extend(
            detections
                .iter()
                .enumerate()
                .map(|(idx, det)| DetectionRecord::from_detection(idx, det)),
        );
    }

    /// Replace slot 0 with the stabilized records of this frame
    pub fn store_current(&mut self, records: &[DetectionRecord]) {
        assert!(
            records.len() <= self.capacity,
            "{} records exceed frame history capacity {}",
            records.len(),
            self.capacity
        );
        let current = &mut self.slots[0];
        current.clear();
        current.extend_from_slice(records);
    }

    pub fn current(&self) -> &[DetectionRecord] {
        &self.slots[0]
    }

    pub fn previous(&self) -> &[DetectionRecord] {
        &self.slots[1]
    }

    /// Slot 0 for reading and slot 1 for in-place editing, borrowed together
    pub fn current_and_previous_mut(&mut self) -> (&[DetectionRecord], &mut Vec<DetectionRecord>) {
        let (current, older) = self.slots.split_at_mut(1);
        (&current[0], &mut older[0])
    }

    /// Records `age` frames back, if the ring is that deep
    pub fn slot(&self, age: usize) -> Option<&[DetectionRecord]> {
        self.slots.get(age).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }
}
