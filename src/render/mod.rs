mod assets;
mod error;
pub mod raster;
mod renderer;

pub use assets::Assets;
pub use error::RenderError;
pub use raster::RasterPair;
pub use renderer::{RasterSize, TrajectoryRenderer};
