//! Error types for the glint-mask crate.

use std::path::PathBuf;

/// Errors that can occur while estimating reflectance and building masks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A processing parameter is outside its accepted range.
    #[error("invalid parameter {name}={value}: expected {expected}")]
    InvalidParameter {
        /// Parameter name as exposed to callers.
        name: &'static str,
        /// The rejected value, formatted.
        value: String,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },

    /// Exactly one of the input and output paths is a directory.
    #[error(
        "input and output must both be files or both be directories: {} vs {}",
        input.display(),
        output.display()
    )]
    PathMismatch {
        /// The input image path.
        input: PathBuf,
        /// The mask output path.
        output: PathBuf,
    },

    /// The specular estimate is constant over the whole image, so it cannot be normalized.
    #[error("degenerate input: specular estimate is constant across the image")]
    DegenerateInput,

    /// The image has zero width or height.
    #[error("image has no pixels")]
    EmptyImage,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while decoding or encoding an image file.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            expected,
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
