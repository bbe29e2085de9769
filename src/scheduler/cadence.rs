use std::time::Duration;

/// Decides which successful fetches also refresh the panel.
///
/// The first success always refreshes; after that every `divisor`-th one.
#[derive(Debug, Clone)]
pub struct DisplayCadence {
    divisor: u64,
    successes: u64,
}

impl DisplayCadence {
    pub fn new(divisor: u64) -> Self {
        Self {
            divisor: divisor.max(1),
            successes: 0,
        }
    }

    /// Counts a successful fetch and reports whether it is a display cycle.
    pub fn record_success(&mut self) -> bool {
        let display = self.successes % self.divisor == 0;
        self.successes += 1;
        display
    }

    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }
}

/// Time left in the sampling interval after a cycle took `elapsed`.
pub fn remaining_sleep(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}
