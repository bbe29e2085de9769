use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] image::ImageError),
    #[error("panel is not powered on")]
    NotPowered,
}
