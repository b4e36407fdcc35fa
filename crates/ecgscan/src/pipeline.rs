//! Stage wiring: classify → (hint override) → grid → region → path →
//! calibrate → score.
//!
//! Algorithmic primitives live in their own modules; this layer only decides
//! call order, the oracle gate and what each stage hands to the next.

use std::time::Instant;

use crate::api::ExtractOptions;
use crate::calibrate::calibrate_path;
use crate::classify::classify;
use crate::config::DigitizeConfig;
use crate::error::InputError;
use crate::grid::estimate_grid_spacing;
use crate::input::StripImage;
use crate::mask::TraceMask;
use crate::oracle::{hint_override, TraceColorHint};
use crate::path::{evidence_coverage, extract_path, PathOutcome};
use crate::quality::score_quality;
use crate::region::select_region;
use crate::{ExtractionMethod, ExtractionResult, PathSource};

/// Classifier mask, possibly replaced by a colour-hint mask.
pub(crate) fn trace_mask(
    image: StripImage<'_>,
    options: &ExtractOptions<'_>,
    config: &DigitizeConfig,
) -> (TraceMask, ExtractionMethod) {
    let (mask, method) = classify_with_hint(image, options, config);
    let count = mask.count();
    if count < config.oracle.sparse_warn_pixels {
        tracing::warn!(
            trace_pixels = count,
            floor = config.oracle.sparse_warn_pixels,
            "very few trace pixels; extraction may be unreliable"
        );
    }
    (mask, method)
}

fn classify_with_hint(
    image: StripImage<'_>,
    options: &ExtractOptions<'_>,
    config: &DigitizeConfig,
) -> (TraceMask, ExtractionMethod) {
    let mask = classify(image, &config.classifier);
    let count = mask.count();
    tracing::debug!(trace_pixels = count, "classified trace pixels");
    if count >= config.oracle.pixel_floor {
        return (mask, ExtractionMethod::ColorDp);
    }

    let Some(hint) = resolve_hint(options) else {
        return (mask, ExtractionMethod::ColorDp);
    };
    match hint_override(image, &mask, &hint, &config.oracle) {
        Some(better) => {
            tracing::info!(
                before = count,
                after = better.count(),
                colors = ?hint.colors,
                "colour hint replaced the trace mask"
            );
            (better, ExtractionMethod::ColorDpWithOracle)
        }
        None => (mask, ExtractionMethod::ColorDp),
    }
}

/// A precomputed hint wins over asking the oracle.
fn resolve_hint(options: &ExtractOptions<'_>) -> Option<TraceColorHint> {
    if let Some(hint) = &options.hint {
        return Some(hint.clone());
    }
    match (options.oracle, options.image_bytes) {
        (Some(oracle), Some(bytes)) => {
            let hint = oracle.identify_trace_colors(bytes);
            if hint.is_none() {
                tracing::debug!("colour oracle returned no hint");
            }
            hint
        }
        _ => None,
    }
}

pub(crate) fn run(
    image: StripImage<'_>,
    options: &ExtractOptions<'_>,
    config: &DigitizeConfig,
) -> Result<ExtractionResult, InputError> {
    let (w, h) = image.dimensions();
    if image.is_empty() {
        return Err(InputError::EmptyImage { width: w, height: h });
    }
    let start = Instant::now();

    let (mask, method) = trace_mask(image, options, config);

    let t = Instant::now();
    let grid = estimate_grid_spacing(image, &config.grid);
    tracing::debug!(
        spacing_px = ?grid.spacing_px,
        confidence = grid.confidence,
        elapsed_ms = t.elapsed().as_secs_f64() * 1e3,
        "grid estimate"
    );

    let region = select_region(&mask, &config.region);

    let t = Instant::now();
    let outcome = extract_path(&mask, region, &config.path);
    let path_source = match &outcome {
        PathOutcome::Path(_) => PathSource::Viterbi,
        PathOutcome::Fallback(_, reason) => PathSource::CentroidFallback { reason: *reason },
    };
    tracing::debug!(
        elapsed_ms = t.elapsed().as_secs_f64() * 1e3,
        "path extraction"
    );
    let coverage = evidence_coverage(&mask, region);
    let signal_px = outcome.into_path();

    let calibrated = calibrate_path(
        &signal_px,
        region,
        &grid,
        &options.params,
        &config.calibration,
        &config.normalization,
    );
    let quality = score_quality(
        calibrated.spacing.confidence,
        coverage,
        &calibrated.samples_uv,
        &config.quality,
    );

    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    tracing::info!(
        samples = calibrated.samples_uv.len(),
        spacing_px = calibrated.spacing.spacing_px,
        quality = quality.score,
        coverage,
        ?method,
        ?path_source,
        elapsed_ms,
        "strip digitized"
    );

    Ok(ExtractionResult {
        signal_px,
        signal_uv: calibrated.samples_uv,
        fs: calibrated.fs,
        duration_s: calibrated.duration_s,
        quality_score: quality.score,
        grid_spacing_px: calibrated.spacing.spacing_px,
        grid_confidence: calibrated.spacing.confidence,
        grid_fallback: calibrated.spacing.degraded,
        region,
        coverage,
        range_uv: quality.range_uv,
        path_source,
        method,
        image_size: [w, h],
        processing_time_ms: elapsed_ms,
    })
}
