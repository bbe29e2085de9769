use chrono::{DateTime, Utc};

/// A single position reading as delivered by a position source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// True for a latitude in [-90, 90] and a longitude in [-180, 180].
pub fn in_range(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    pub fn into_sample(self, sequence: u64) -> PositionSample {
        PositionSample {
            sequence,
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp: self.timestamp,
        }
    }
}

/// A stored fix together with its arrival order.
///
/// `sequence` counts every sample ever appended to the store, so it keeps
/// increasing after older samples have been evicted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub sequence: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}
