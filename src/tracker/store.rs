use std::collections::VecDeque;

use super::sample::PositionSample;

pub const DEFAULT_CAPACITY: usize = 1440;

/// Bounded, insertion-ordered sample buffer.
///
/// Oldest samples are evicted once `capacity` is reached, so the length
/// never exceeds the capacity.
#[derive(Debug, Clone)]
pub struct SampleStore {
    capacity: usize,
    samples: VecDeque<PositionSample>,
    appended: u64,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SampleStore {
    /// Creates an empty store. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            appended: 0,
        }
    }

    pub fn append(&mut self, sample: PositionSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.appended += 1;
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> Vec<PositionSample> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sequence index the next appended sample should carry.
    pub fn next_sequence(&self) -> u64 {
        self.appended
    }

    pub fn latest(&self) -> Option<&PositionSample> {
        self.samples.back()
    }
}
