use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load asset {path}: {source}")]
    Asset {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("asset {0} has no pixels")]
    EmptyAsset(&'static str),
    #[error("icon {icon_width}x{icon_height} does not fit a {width}x{height} raster")]
    IconTooLarge {
        icon_width: u32,
        icon_height: u32,
        width: u32,
        height: u32,
    },
}
