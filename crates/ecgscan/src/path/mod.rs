//! Waveform path reconstruction: one row coordinate per image column.
//!
//! The primary method is a Viterbi search over clustered per-column
//! candidates that trades pixel evidence against vertical jumps. When the
//! search cannot connect the first column to the last, the per-column
//! centroid method takes over. The fallback is reported through
//! [`PathOutcome`], never as an error.

mod candidates;
mod centroid;
mod viterbi;

pub use candidates::{build_candidates, CandidateTable};
pub use centroid::extract_centroid;
pub use viterbi::solve_viterbi;

use crate::mask::TraceMask;
use crate::region::Region;

/// One row coordinate (image rows, fractional) per image column.
pub type PixelPath = Vec<f64>;

/// Path-search tuning.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Largest allowed row change between neighbouring columns (px).
    pub max_jump: f64,
    /// Rows at most this far apart join the same candidate cluster.
    pub cluster_gap: usize,
    /// Per-pixel cost of a vertical move.
    pub jump_weight: f64,
    /// Fixed cost of every column transition.
    pub step_cost: f64,
    /// Centroid fallback needs at least this fraction of columns with evidence.
    pub min_centroid_coverage: f64,
    /// Median filter length applied to the centroid path.
    pub median_kernel: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_jump: 30.0,
            cluster_gap: 3,
            jump_weight: 0.5,
            step_cost: 1.0,
            min_centroid_coverage: 0.2,
            median_kernel: 5,
        }
    }
}

/// Why the Viterbi search was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FallbackReason {
    /// No candidate in `column` is within `max_jump` of a reachable state.
    Unreachable { column: usize },
    /// A candidate or accumulated cost in `column` was not finite.
    NonFinite { column: usize },
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable { column } => write!(f, "no reachable state at column {column}"),
            Self::NonFinite { column } => write!(f, "non-finite cost at column {column}"),
        }
    }
}

/// Result of path extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    /// Viterbi path.
    Path(PixelPath),
    /// Centroid path substituted after the Viterbi search gave up.
    Fallback(PixelPath, FallbackReason),
}

impl PathOutcome {
    pub fn path(&self) -> &[f64] {
        match self {
            Self::Path(p) | Self::Fallback(p, _) => p,
        }
    }

    pub fn into_path(self) -> PixelPath {
        match self {
            Self::Path(p) | Self::Fallback(p, _) => p,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Self::Path(_) => None,
            Self::Fallback(_, reason) => Some(*reason),
        }
    }
}

/// Extract the trace path inside `region`, falling back to centroids when
/// the Viterbi search cannot reach the last column.
pub fn extract_path(mask: &TraceMask, region: Region, config: &PathConfig) -> PathOutcome {
    let table = build_candidates(mask, region, config);
    match solve_viterbi(&table, config) {
        Ok(rows) => {
            let path = pad_to_width(
                rows.into_iter().map(|y| y + region.y_start as f64).collect(),
                mask.width(),
            );
            PathOutcome::Path(path)
        }
        Err(reason) => {
            tracing::info!(%reason, "viterbi search failed; using centroid path");
            PathOutcome::Fallback(extract_centroid(mask, region, config), reason)
        }
    }
}

/// Fraction of columns with at least one trace pixel inside `region`.
pub fn evidence_coverage(mask: &TraceMask, region: Region) -> f64 {
    let w = mask.width();
    if w == 0 {
        return 0.0;
    }
    let n = (0..w)
        .filter(|&x| mask.column_has_trace(x, region.y_start, region.y_end))
        .count();
    n as f64 / w as f64
}

/// Extend `path` to `width` by repeating its last value.
fn pad_to_width(mut path: PixelPath, width: usize) -> PixelPath {
    if let Some(&last) = path.last() {
        path.resize(width.max(path.len()), last);
    }
    path.truncate(width);
    path
}
