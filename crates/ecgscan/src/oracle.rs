//! Trace-colour hints from an external source.
//!
//! Some scans use inks the fixed classifier rules miss (pale blue, orange,
//! magenta pen plotters). When the classifier finds almost nothing, a
//! [`ColorOracle`] can name the ink colours and a tolerance mask built from
//! them replaces the default mask if it finds more trace.

use crate::classify::color_hint_mask;
use crate::input::StripImage;
use crate::mask::TraceMask;

/// Ink colours believed to belong to the trace.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct TraceColorHint {
    pub colors: Vec<[u8; 3]>,
    /// Human-readable colour names, parallel to `colors` where known.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub background: Option<String>,
}

impl TraceColorHint {
    pub fn from_colors(colors: Vec<[u8; 3]>) -> Self {
        Self {
            colors,
            confidence: 1.0,
            ..Self::default()
        }
    }
}

/// Source of trace-colour hints for an encoded image.
///
/// Implementations may be slow or remote; the pipeline only consults them
/// when the classifier mask is nearly empty. Returning `None` leaves the
/// default mask untouched.
pub trait ColorOracle {
    fn identify_trace_colors(&self, image_bytes: &[u8]) -> Option<TraceColorHint>;
}

impl<F> ColorOracle for F
where
    F: Fn(&[u8]) -> Option<TraceColorHint>,
{
    fn identify_trace_colors(&self, image_bytes: &[u8]) -> Option<TraceColorHint> {
        self(image_bytes)
    }
}

/// Oracle that always answers with the same hint.
#[derive(Debug, Clone, Default)]
pub struct StaticColorOracle {
    hint: Option<TraceColorHint>,
}

impl StaticColorOracle {
    pub fn new(hint: TraceColorHint) -> Self {
        Self { hint: Some(hint) }
    }

    /// An oracle that never knows.
    pub fn silent() -> Self {
        Self { hint: None }
    }
}

impl ColorOracle for StaticColorOracle {
    fn identify_trace_colors(&self, _image_bytes: &[u8]) -> Option<TraceColorHint> {
        self.hint.clone()
    }
}

/// When and how hints are applied.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Consult hints only when the default mask has fewer trace pixels.
    pub pixel_floor: usize,
    /// Final masks with fewer trace pixels are logged as unreliable.
    pub sparse_warn_pixels: usize,
    /// Euclidean RGB distance below which a pixel matches a hint colour.
    pub color_tolerance: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            pixel_floor: 500,
            sparse_warn_pixels: 100,
            color_tolerance: 60.0,
        }
    }
}

/// Build the hint mask and return it if it beats `current` strictly.
pub fn hint_override(
    image: StripImage<'_>,
    current: &TraceMask,
    hint: &TraceColorHint,
    config: &OracleConfig,
) -> Option<TraceMask> {
    if hint.colors.is_empty() {
        return None;
    }
    let candidate = color_hint_mask(image, &hint.colors, config.color_tolerance);
    let (before, after) = (current.count(), candidate.count());
    tracing::debug!(before, after, colors = hint.colors.len(), "evaluated colour hint");
    (after > before).then_some(candidate)
}
