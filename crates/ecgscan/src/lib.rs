//! ecgscan: digitize photographed or scanned single-lead ECG strips.
//!
//! One strip image in, one calibrated waveform out. The pipeline stages are:
//!
//! 1. **Classify** – mark trace-ink pixels (dark, blue, green) on pink grid paper.
//! 2. **Grid** – millimetre pitch from the autocorrelation of the grid profile.
//! 3. **Region** – pick the horizontal band holding the rhythm strip.
//! 4. **Path** – one row per column by Viterbi search over clustered
//!    candidates, with a centroid fallback when the search breaks.
//! 5. **Calibrate** – pixels to µV and seconds, resampling, baseline removal.
//! 6. **Quality** – composite score from grid confidence, coverage and range.
//!
//! When the classifier finds almost no ink, an injected [`ColorOracle`] (or a
//! caller-supplied [`TraceColorHint`]) may replace the mask.
//!
//! # Public API
//! - [`Digitizer`] and [`ExtractOptions`] as the entry point
//! - [`DigitizeConfig`] for tuning, loadable from JSON
//! - [`input`] helpers for decoding and cropping, [`report`] for the JSON document
//! - stage functions for callers that need intermediate products

mod api;
pub mod calibrate;
pub mod classify;
mod config;
mod error;
pub mod grid;
pub mod input;
pub mod mask;
pub mod oracle;
pub mod path;
mod pipeline;
pub mod quality;
pub mod region;
pub mod report;
mod signal;

#[cfg(test)]
mod test_utils;

pub use api::{Digitizer, ExtractOptions};
pub use calibrate::{CalibrationConfig, CalibrationParams, NormalizationConfig};
pub use classify::{classify, ClassifierConfig};
pub use config::DigitizeConfig;
pub use error::{ConfigError, InputError};
pub use grid::{estimate_grid_spacing, GridConfig, GridEstimate};
pub use input::{decode_image, load_image, CropRect, DecodedImage, StripImage};
pub use mask::TraceMask;
pub use oracle::{ColorOracle, OracleConfig, StaticColorOracle, TraceColorHint};
pub use path::{extract_path, FallbackReason, PathConfig, PathOutcome, PixelPath};
pub use quality::QualityConfig;
pub use region::{select_region, Region, RegionConfig};
pub use report::DigitizeReport;

/// How the trace mask was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExtractionMethod {
    /// Built-in colour rules.
    #[serde(rename = "viterbi_color")]
    ColorDp,
    /// Colour-hint mask from an oracle or caller hint.
    #[serde(rename = "viterbi_color_hint")]
    ColorDpWithOracle,
}

/// Which path extractor produced `signal_px`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PathSource {
    Viterbi,
    CentroidFallback { reason: FallbackReason },
}

/// Everything produced for one strip.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExtractionResult {
    /// Trace row per image column (image coordinates).
    pub signal_px: Vec<f64>,
    /// Calibrated, baseline-corrected samples in µV.
    pub signal_uv: Vec<f64>,
    /// Sampling rate of `signal_uv` (Hz).
    pub fs: u32,
    pub duration_s: f64,
    /// Composite quality in [0, 1].
    pub quality_score: f64,
    /// Pitch used for calibration (px/mm).
    pub grid_spacing_px: f64,
    pub grid_confidence: f64,
    /// `grid_spacing_px` is the nominal-width fallback, not an estimate.
    pub grid_fallback: bool,
    /// Rows searched for the trace.
    pub region: Region,
    /// Fraction of columns with trace pixels inside `region`.
    pub coverage: f64,
    /// Peak-to-peak amplitude of `signal_uv`.
    pub range_uv: f64,
    pub path_source: PathSource,
    pub method: ExtractionMethod,
    /// `[width, height]` of the processed image.
    pub image_size: [u32; 2],
    pub processing_time_ms: f64,
}
