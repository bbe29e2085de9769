use serde::Deserialize;

/// Linear lat/lon to pixel mapping calibrated against a fixed base-map
/// image. The defaults match the 264x181 equirectangular world map.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Projector {
    pub x_scale: f64,
    pub x_offset: f64,
    pub y_scale: f64,
    pub y_offset: f64,
}

impl Default for Projector {
    fn default() -> Self {
        Self {
            x_scale: 0.733,
            x_offset: 132.0,
            y_scale: -1.006,
            y_offset: 90.5,
        }
    }
}

impl Projector {
    /// Maps a position to pixel coordinates. Points near the poles or the
    /// antimeridian may land slightly outside the raster; they are not
    /// clamped.
    pub fn project(&self, latitude: f64, longitude: f64) -> (i32, i32) {
        let x = (self.x_scale * longitude + self.x_offset).floor();
        let y = (self.y_scale * latitude + self.y_offset).floor();
        (x as i32, y as i32)
    }
}
