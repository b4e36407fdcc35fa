//! Composite extraction quality in `[0, 1]`.

use crate::signal::peak_to_peak;

/// Weights of the quality score components.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub grid_weight: f64,
    pub coverage_weight: f64,
    pub range_weight: f64,
    /// Signals spanning at least this many µV get full range credit.
    pub full_range_uv: f64,
    /// Signals spanning no more than this get `weak_range_quality`.
    pub min_range_uv: f64,
    pub weak_range_quality: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            grid_weight: 0.3,
            coverage_weight: 0.4,
            range_weight: 0.3,
            full_range_uv: 2000.0,
            min_range_uv: 500.0,
            weak_range_quality: 0.3,
        }
    }
}

/// Score with its inputs, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QualityBreakdown {
    pub grid_confidence: f64,
    pub coverage: f64,
    pub range_uv: f64,
    pub range_quality: f64,
    pub score: f64,
}

pub fn range_quality(range_uv: f64, config: &QualityConfig) -> f64 {
    if range_uv > config.min_range_uv {
        (range_uv / config.full_range_uv).min(1.0)
    } else {
        config.weak_range_quality
    }
}

pub fn score_quality(
    grid_confidence: f64,
    coverage: f64,
    signal_uv: &[f64],
    config: &QualityConfig,
) -> QualityBreakdown {
    let range_uv = peak_to_peak(signal_uv);
    let range_quality = range_quality(range_uv, config);
    let raw = config.grid_weight * grid_confidence
        + config.coverage_weight * coverage
        + config.range_weight * range_quality;
    QualityBreakdown {
        grid_confidence,
        coverage,
        range_uv,
        range_quality,
        score: raw.clamp(0.0, 1.0),
    }
}
