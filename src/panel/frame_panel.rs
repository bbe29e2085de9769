use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use super::error::DisplayError;
use super::Panel;
use crate::render::raster::INK;
use crate::render::RasterPair;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const RED: Rgb<u8> = Rgb([200, 0, 0]);

pub const LATEST_FRAME: &str = "latest.png";
pub const BASE_LAYER: &str = "base.png";
pub const OVERLAY_LAYER: &str = "overlay.png";

/// Stand-in for a black/red bistable panel that writes each refresh to
/// PNG files instead of driving hardware.
#[derive(Debug)]
pub struct FramePanel {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    powered: bool,
    refreshes: u64,
}

impl FramePanel {
    pub fn new(output_dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            width,
            height,
            powered: false,
            refreshes: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    fn ensure_powered(&self) -> Result<(), DisplayError> {
        if self.powered {
            Ok(())
        } else {
            Err(DisplayError::NotPowered)
        }
    }
}

impl Panel for FramePanel {
    fn power_on(&mut self) -> Result<(), DisplayError> {
        fs::create_dir_all(&self.output_dir)?;
        self.powered = true;
        log::debug!("Panel powered on");
        Ok(())
    }

    fn show_frame(&mut self, frame: &RasterPair) -> Result<(), DisplayError> {
        self.ensure_powered()?;
        frame.base.save(self.output_dir.join(BASE_LAYER))?;
        frame.overlay.save(self.output_dir.join(OVERLAY_LAYER))?;
        composite(frame).save(self.output_dir.join(LATEST_FRAME))?;
        self.refreshes += 1;
        log::info!(
            "Panel refreshed ({} so far), frame at {}",
            self.refreshes,
            self.output_dir.join(LATEST_FRAME).display()
        );
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.powered = false;
        log::debug!("Panel asleep");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.ensure_powered()?;
        composite(&RasterPair::blank(self.width, self.height))
            .save(self.output_dir.join(LATEST_FRAME))?;
        log::info!("Panel cleared");
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), DisplayError> {
        self.powered = false;
        log::info!("Panel power removed");
        Ok(())
    }
}

/// What the two-colour panel would show: overlay ink in red on top of the
/// black base layer.
pub fn composite(frame: &RasterPair) -> RgbImage {
    let (width, height) = frame.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        if frame.overlay.get_pixel(x, y) == &INK {
            RED
        } else if frame.base.get_pixel(x, y) == &INK {
            BLACK
        } else {
            WHITE
        }
    })
}
