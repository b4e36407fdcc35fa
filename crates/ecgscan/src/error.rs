//! Error types that cross the library boundary.
//!
//! Only input problems are fatal. Calibration, low trace evidence and
//! path-search fallbacks are absorbed by the pipeline and surface through
//! the fields of [`crate::ExtractionResult`].

use std::path::PathBuf;

/// Fatal problems with the image handed to the digitizer.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The byte buffer is not a decodable raster image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    /// The image file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Width or height is zero.
    #[error("image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    /// The crop rectangle is empty once clamped to the image bounds.
    #[error("crop [{x1}, {y1}, {x2}, {y2}] is empty after clamping to {width}x{height}")]
    DegenerateCrop {
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        width: u32,
        height: u32,
    },
}

/// Problems loading a [`crate::DigitizeConfig`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
