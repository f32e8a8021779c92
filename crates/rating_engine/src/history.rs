//! Bounded history of accepted position samples.
//!
//! Feeds heading-based rules. Oldest entries are overwritten once the ring is
//! full; arrival order is kept even when timestamps go backwards.

use std::fmt;

use contracts::PositionSample;
use ringbuf::{traits::*, HeapRb};

pub struct PositionHistory {
    ring: HeapRb<PositionSample>,
    capacity: usize,
    evicted_count: u64,
    out_of_order_count: u64,
    last_timestamp: Option<f64>,
}

impl fmt::Debug for PositionHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionHistory")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.capacity)
            .field("evicted", &self.evicted_count)
            .finish()
    }
}

impl PositionHistory {
    /// Capacity below 1 is raised to 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: HeapRb::new(capacity),
            capacity,
            evicted_count: 0,
            out_of_order_count: 0,
            last_timestamp: None,
        }
    }

    #[inline]
    pub fn push(&mut self, sample: PositionSample) {
        if let Some(last) = self.last_timestamp {
            if sample.timestamp < last {
                self.out_of_order_count += 1;
            }
        }
        self.last_timestamp = Some(sample.timestamp);

        if self.ring.push_overwrite(sample).is_some() {
            self.evicted_count += 1;
        }
    }

    /// Samples in arrival order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &PositionSample> + '_ {
        self.ring.iter()
    }

    /// Retained samples as two contiguous runs, oldest first
    pub fn as_slices(&self) -> (&[PositionSample], &[PositionSample]) {
        self.ring.as_slices()
    }

    /// Most recently pushed sample
    pub fn latest(&self) -> Option<&PositionSample> {
        self.ring.iter().last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn evicted_count(&self) -> u64 {
        self.evicted_count
    }

    pub fn out_of_order_count(&self) -> u64 {
        self.out_of_order_count
    }

    /// Drop every retained sample and reset counters
    pub fn clear(&mut self) {
        self.ring.clear();
        self.evicted_count = 0;
        self.out_of_order_count = 0;
        self.last_timestamp = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(timestamp: f64) -> PositionSample {
        PositionSample {
            timestamp,
            latitude: 12.97,
            longitude: 77.59,
            speed_mps: 10.0,
            bearing_deg: 90.0,
            accuracy_m: 5.0,
        }
    }

    #[test]
    fn test_push_and_snapshot_order() {
        let mut history = PositionHistory::new(4);
        for t in [1.0, 2.0, 3.0] {
            history.push(fix(t));
        }
        let stamps: Vec<f64> = history.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![1.0, 2.0, 3.0]);
        assert_eq!(history.latest().map(|s| s.timestamp), Some(3.0));
    }

    #[test]
    fn test_overwrites_oldest_when_full() {
        let mut history = PositionHistory::new(3);
        for t in 0..5 {
            history.push(fix(t as f64));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.evicted_count(), 2);
        let stamps: Vec<f64> = history.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![2.0, 3.0, 4.0]);

        // Wrapped ring: the two runs together keep arrival order
        let (head, tail) = history.as_slices();
        let joined: Vec<f64> = head.iter().chain(tail).map(|s| s.timestamp).collect();
        assert_eq!(joined, stamps);
    }

    #[test]
    fn test_out_of_order_tracked() {
        let mut history = PositionHistory::new(8);
        history.push(fix(2.0));
        history.push(fix(1.0));
        history.push(fix(1.0));
        assert_eq!(history.out_of_order_count(), 1);
        // Arrival order is preserved
        assert_eq!(history.iter().next().map(|s| s.timestamp), Some(2.0));
    }

    #[test]
    fn test_clear() {
        let mut history = PositionHistory::new(2);
        history.push(fix(1.0));
        history.push(fix(2.0));
        history.push(fix(3.0));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.evicted_count(), 0);
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_zero_capacity_raised() {
        let mut history = PositionHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.push(fix(1.0));
        history.push(fix(2.0));
        assert_eq!(history.len(), 1);
    }
}
