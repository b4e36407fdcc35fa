//! High-level digitization API.
//!
//! [`Digitizer`] is the primary entry point. It wraps a [`DigitizeConfig`]
//! and runs the full pipeline on one strip image per call.

use std::path::Path;

use crate::calibrate::CalibrationParams;
use crate::config::DigitizeConfig;
use crate::error::{ConfigError, InputError};
use crate::grid::{estimate_grid_spacing, GridEstimate};
use crate::input::StripImage;
use crate::mask::TraceMask;
use crate::oracle::{ColorOracle, TraceColorHint};
use crate::pipeline;
use crate::{ExtractionMethod, ExtractionResult};

/// Per-call inputs besides the image.
#[derive(Default)]
pub struct ExtractOptions<'a> {
    pub params: CalibrationParams,
    /// Encoded image bytes, handed to the oracle.
    pub image_bytes: Option<&'a [u8]>,
    /// Precomputed trace colours; takes precedence over `oracle`.
    pub hint: Option<TraceColorHint>,
    pub oracle: Option<&'a dyn ColorOracle>,
}

impl<'a> ExtractOptions<'a> {
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn with_hint(mut self, hint: TraceColorHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_oracle(mut self, oracle: &'a dyn ColorOracle, image_bytes: &'a [u8]) -> Self {
        self.oracle = Some(oracle);
        self.image_bytes = Some(image_bytes);
        self
    }
}

impl std::fmt::Debug for ExtractOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("params", &self.params)
            .field("image_bytes", &self.image_bytes.map(<[u8]>::len))
            .field("hint", &self.hint)
            .field("oracle", &self.oracle.is_some())
            .finish()
    }
}

/// Primary digitization interface.
///
/// Holds configuration only; create once, extract from many images.
///
/// # Examples
///
/// ```no_run
/// use ecgscan::{CalibrationParams, Digitizer, ExtractOptions, StripImage};
/// use image::{Rgb, RgbImage};
///
/// let digitizer = Digitizer::new();
/// let image = RgbImage::from_pixel(1000, 400, Rgb([255, 255, 255]));
/// let options = ExtractOptions::new(CalibrationParams::default());
/// let result = digitizer.extract(StripImage::Rgb(&image), &options).unwrap();
/// println!("{} samples at {} Hz", result.signal_uv.len(), result.fs);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Digitizer {
    config: DigitizeConfig,
}

impl Digitizer {
    /// Digitizer with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with full config control.
    pub fn with_config(config: DigitizeConfig) -> Self {
        Self { config }
    }

    /// Load tuning from a JSON file.
    pub fn from_config_json_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::with_config(DigitizeConfig::from_json_file(path)?))
    }

    pub fn config(&self) -> &DigitizeConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut DigitizeConfig {
        &mut self.config
    }

    /// Digitize one strip. Fails only on an empty image.
    pub fn extract(
        &self,
        image: StripImage<'_>,
        options: &ExtractOptions<'_>,
    ) -> Result<ExtractionResult, InputError> {
        pipeline::run(image, options, &self.config)
    }

    /// Digitize with an oracle consulted when the classifier finds too little ink.
    pub fn extract_with_oracle(
        &self,
        image: StripImage<'_>,
        image_bytes: &[u8],
        oracle: &dyn ColorOracle,
        params: CalibrationParams,
    ) -> Result<ExtractionResult, InputError> {
        let options = ExtractOptions::new(params).with_oracle(oracle, image_bytes);
        self.extract(image, &options)
    }

    /// Trace mask the path search would see, after any hint override.
    pub fn trace_mask(
        &self,
        image: StripImage<'_>,
        options: &ExtractOptions<'_>,
    ) -> (TraceMask, ExtractionMethod) {
        pipeline::trace_mask(image, options, &self.config)
    }

    /// Grid pitch only, without extracting the trace.
    pub fn estimate_grid(&self, image: StripImage<'_>) -> GridEstimate {
        estimate_grid_spacing(image, &self.config.grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::StaticColorOracle;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn digitizer_is_shareable() {
        assert_send_sync::<Digitizer>();
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = image::RgbImage::new(0, 10);
        let err = Digitizer::new()
            .extract(StripImage::Rgb(&img), &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, InputError::EmptyImage { width: 0, height: 10 }));
    }

    #[test]
    fn options_builders_set_fields() {
        let oracle = StaticColorOracle::silent();
        let opts = ExtractOptions::new(CalibrationParams::default())
            .with_hint(TraceColorHint::from_colors(vec![[1, 1, 1]]))
            .with_oracle(&oracle, b"abc");
        assert!(opts.hint.is_some());
        assert_eq!(opts.image_bytes, Some(&b"abc"[..]));
        assert!(format!("{opts:?}").contains("image_bytes: Some(3)"));
    }
}
