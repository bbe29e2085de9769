use std::path::Path;

use image::GrayImage;

use super::error::RenderError;
use super::raster::binarize;

/// Read-only images the renderer draws from: the world map behind the
/// trajectory and the current-position icon.
#[derive(Debug, Clone)]
pub struct Assets {
    base_map: GrayImage,
    icon: GrayImage,
}

impl Assets {
    pub fn new(base_map: GrayImage, icon: GrayImage) -> Result<Self, RenderError> {
        if base_map.width() == 0 || base_map.height() == 0 {
            return Err(RenderError::EmptyAsset("base map"));
        }
        if icon.width() == 0 || icon.height() == 0 {
            return Err(RenderError::EmptyAsset("icon"));
        }
        Ok(Self { base_map, icon })
    }

    pub fn load(base_map: &Path, icon: &Path) -> Result<Self, RenderError> {
        let base_map = load_binary(base_map)?;
        let icon = load_binary(icon)?;
        log::info!(
            "Loaded assets: base map {}x{}, icon {}x{}",
            base_map.width(),
            base_map.height(),
            icon.width(),
            icon.height()
        );
        Self::new(base_map, icon)
    }

    pub fn base_map(&self) -> &GrayImage {
        &self.base_map
    }

    pub fn icon(&self) -> &GrayImage {
        &self.icon
    }
}

fn load_binary(path: &Path) -> Result<GrayImage, RenderError> {
    let img = image::open(path).map_err(|source| RenderError::Asset {
        path: path.display().to_string(),
        source,
    })?;
    Ok(binarize(&img))
}
