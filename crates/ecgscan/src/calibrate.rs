//! Pixel path to physical signal.
//!
//! The grid pitch gives pixels per millimetre; paper speed (mm/s) and gain
//! (mm/mV) turn columns into seconds and row offsets into microvolts. The
//! trace is then resampled to the target rate, centred on its median and,
//! when its amplitude is implausible, rescaled into a typical ECG range.

use crate::grid::GridEstimate;
use crate::region::Region;
use crate::signal::{interp_extrapolate, linspace, median, peak_to_peak};

/// Recording parameters supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Paper speed in mm/s.
    pub speed_mm_per_s: f64,
    /// Gain in mm/mV.
    pub gain_mm_per_mv: f64,
    /// Output sampling rate in Hz.
    pub target_fs: u32,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            speed_mm_per_s: 25.0,
            gain_mm_per_mv: 10.0,
            target_fs: 500,
        }
    }
}

/// Fallback used when the grid pitch is missing or implausible.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Assumed strip width in millimetres; the fallback pitch is `W / this`.
    pub nominal_strip_width_mm: f64,
    /// Pitches below this (px) are not trusted.
    pub min_plausible_spacing_px: f64,
    /// Grid confidence reported with the fallback pitch.
    pub fallback_confidence: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            nominal_strip_width_mm: 250.0,
            min_plausible_spacing_px: 3.0,
            fallback_confidence: 0.3,
        }
    }
}

/// Amplitude rescaling of implausibly small or large signals.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub enable: bool,
    /// Non-zero peak-to-peak ranges below this (µV) are scaled up...
    pub low_range_uv: f64,
    /// ...to this range.
    pub low_target_uv: f64,
    /// Ranges above this (µV) are scaled down...
    pub high_range_uv: f64,
    /// ...to this range.
    pub high_target_uv: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            enable: true,
            low_range_uv: 200.0,
            low_target_uv: 1500.0,
            high_range_uv: 8000.0,
            high_target_uv: 3000.0,
        }
    }
}

/// Pitch actually used for conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSpacing {
    pub spacing_px: f64,
    pub confidence: f64,
    /// The estimate was replaced by the nominal-width fallback.
    pub degraded: bool,
}

/// Accept the grid estimate or substitute `W / nominal_strip_width_mm`.
pub fn resolve_spacing(grid: &GridEstimate, width: usize, config: &CalibrationConfig) -> ResolvedSpacing {
    match grid.spacing_px {
        Some(s) if s.is_finite() && s >= config.min_plausible_spacing_px => ResolvedSpacing {
            spacing_px: s,
            confidence: grid.confidence,
            degraded: false,
        },
        other => {
            let spacing_px = width as f64 / config.nominal_strip_width_mm;
            tracing::warn!(
                estimated = ?other,
                fallback_px = spacing_px,
                "grid pitch unavailable; assuming nominal strip width"
            );
            ResolvedSpacing {
                spacing_px,
                confidence: config.fallback_confidence,
                degraded: true,
            }
        }
    }
}

/// Vertical offset in pixels (positive = up) to microvolts.
pub fn pixels_to_microvolts(deviation_px: f64, spacing_px: f64, gain_mm_per_mv: f64) -> f64 {
    deviation_px / spacing_px / gain_mm_per_mv * 1000.0
}

/// Duration in seconds covered by `width` columns.
pub fn strip_duration_s(width: usize, spacing_px: f64, speed_mm_per_s: f64) -> f64 {
    (width as f64 / spacing_px) / speed_mm_per_s
}

/// `round(duration * fs)`.
pub fn sample_count(duration_s: f64, fs: u32) -> usize {
    let n = (duration_s * f64::from(fs)).round();
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// Resample `values`, taken as evenly spread over `[0, duration_s]`, to `n`
/// evenly spread samples over the same interval.
pub fn resample(values: &[f64], duration_s: f64, n: usize) -> Vec<f64> {
    if values.is_empty() {
        return vec![0.0; n];
    }
    let src_t = linspace(0.0, duration_s, values.len());
    linspace(0.0, duration_s, n)
        .into_iter()
        .map(|t| interp_extrapolate(&src_t, values, t))
        .collect()
}

/// Subtract the median in place; returns the removed offset.
pub fn remove_baseline(values: &mut [f64]) -> f64 {
    let offset = median(values).unwrap_or(0.0);
    values.iter_mut().for_each(|v| *v -= offset);
    offset
}

/// Rescale out-of-range amplitudes in place; returns the applied factor.
pub fn normalize_amplitude(values: &mut [f64], config: &NormalizationConfig) -> Option<f64> {
    if !config.enable {
        return None;
    }
    let range = peak_to_peak(values);
    let factor = if range > 0.0 && range < config.low_range_uv {
        config.low_target_uv / range
    } else if range > config.high_range_uv {
        config.high_target_uv / range
    } else {
        return None;
    };
    values.iter_mut().for_each(|v| *v *= factor);
    tracing::debug!(range, factor, "normalized signal amplitude");
    Some(factor)
}

/// Calibrated output of one strip.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedSignal {
    pub samples_uv: Vec<f64>,
    pub fs: u32,
    pub duration_s: f64,
    pub spacing: ResolvedSpacing,
}

/// Convert a pixel path into a baseline-corrected microvolt signal.
pub fn calibrate_path(
    path: &[f64],
    region: Region,
    grid: &GridEstimate,
    params: &CalibrationParams,
    calibration: &CalibrationConfig,
    normalization: &NormalizationConfig,
) -> CalibratedSignal {
    let spacing = resolve_spacing(grid, path.len(), calibration);
    let baseline = region.midpoint();
    let uv: Vec<f64> = path
        .iter()
        .map(|&y| pixels_to_microvolts(baseline - y, spacing.spacing_px, params.gain_mm_per_mv))
        .collect();

    let duration_s = strip_duration_s(path.len(), spacing.spacing_px, params.speed_mm_per_s);
    let n = sample_count(duration_s, params.target_fs);
    let mut samples_uv = resample(&uv, duration_s, n);
    remove_baseline(&mut samples_uv);
    normalize_amplitude(&mut samples_uv, normalization);

    CalibratedSignal {
        samples_uv,
        fs: params.target_fs,
        duration_s,
        spacing,
    }
}
