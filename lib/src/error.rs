use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced across the engine boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The input bytes could not be decoded as an image.
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// An option value was rejected before any pixel work started.
    #[error("invalid option: {0}")]
    InvalidOption(#[from] InvalidOption),

    /// `render` was called on an engine that has no prepared grid.
    #[error("render called before prepare")]
    NotPrepared,
}

/// Option validation failures. Values outside their documented range are
/// rejected, never clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidOption {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("quality must be between 1 and 9, got {0}")]
    Quality(u32),

    #[error("output_width must be at least 1")]
    ZeroWidth,

    #[error("unrecognized output format {0:?}, expected plain, ansi or html")]
    UnknownFormat(String),
}
