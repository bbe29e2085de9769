mod projection;
mod sample;
mod store;

pub use projection::Projector;
pub use sample::{in_range, Fix, PositionSample};
pub use store::{SampleStore, DEFAULT_CAPACITY};
