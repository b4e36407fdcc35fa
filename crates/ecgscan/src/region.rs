//! Rhythm-strip selection: the horizontal band with the most continuous trace.

use crate::mask::TraceMask;

/// Band scoring weights.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Number of equal-height bands the mask is split into.
    pub n_bands: usize,
    /// The winning band grows by `band_height / margin_divisor` on each side.
    pub margin_divisor: usize,
    pub coverage_weight: f64,
    pub continuity_weight: f64,
    /// Density contributes `min(density_cap, density_weight * density)`.
    pub density_weight: f64,
    pub density_cap: f64,
    /// Continuity is `1 / (1 + transitions / transition_scale)`.
    pub transition_scale: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            n_bands: 5,
            margin_divisor: 3,
            coverage_weight: 0.5,
            continuity_weight: 0.3,
            density_weight: 2.0,
            density_cap: 0.2,
            transition_scale: 100.0,
        }
    }
}

/// Half-open row range `y_start..y_end` of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub y_start: usize,
    pub y_end: usize,
}

impl Region {
    pub fn new(y_start: usize, y_end: usize) -> Self {
        debug_assert!(y_start < y_end, "empty region {y_start}..{y_end}");
        Self { y_start, y_end }
    }

    pub fn height(&self) -> usize {
        self.y_end - self.y_start
    }

    /// Vertical midpoint in image rows.
    pub fn midpoint(&self) -> f64 {
        (self.y_start + self.y_end) as f64 / 2.0
    }
}

/// Score of one candidate band.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BandScore {
    pub region: Region,
    /// Fraction of columns with at least one trace pixel.
    pub coverage: f64,
    /// Fraction of trace pixels in the band.
    pub density: f64,
    /// `1 / (1 + transitions / scale)` over the per-column coverage indicator.
    pub continuity: f64,
    pub score: f64,
}

/// Score every band of `mask`. Empty when the mask is shorter than the band count.
pub fn score_bands(mask: &TraceMask, config: &RegionConfig) -> Vec<BandScore> {
    let (w, h) = (mask.width(), mask.height());
    let n_bands = config.n_bands.max(1);
    let band_h = h / n_bands;
    if band_h == 0 || w == 0 {
        return Vec::new();
    }

    (0..n_bands)
        .map(|i| {
            let y_start = i * band_h;
            let y_end = if i + 1 == n_bands { h } else { (i + 1) * band_h };
            let has_trace: Vec<bool> = (0..w)
                .map(|x| mask.column_has_trace(x, y_start, y_end))
                .collect();

            let coverage = has_trace.iter().filter(|&&v| v).count() as f64 / w as f64;
            let density =
                mask.count_rows(y_start, y_end) as f64 / (w * (y_end - y_start)) as f64;
            let transitions = has_trace.windows(2).filter(|p| p[0] != p[1]).count();
            let continuity = 1.0 / (1.0 + transitions as f64 / config.transition_scale);

            let score = config.coverage_weight * coverage
                + config.continuity_weight * continuity
                + (config.density_weight * density).min(config.density_cap);

            BandScore {
                region: Region::new(y_start, y_end),
                coverage,
                density,
                continuity,
                score,
            }
        })
        .collect()
}

/// Pick the best band (first one wins ties) and pad it by a third of a band.
pub fn select_region(mask: &TraceMask, config: &RegionConfig) -> Region {
    let h = mask.height();
    let bands = score_bands(mask, config);
    let Some(best) = bands
        .iter()
        .fold(None::<&BandScore>, |best, b| match best {
            Some(cur) if cur.score >= b.score => Some(cur),
            _ => Some(b),
        })
    else {
        return Region::new(0, h.max(1));
    };

    let band_h = h / config.n_bands.max(1);
    let margin = band_h / config.margin_divisor.max(1);
    let region = Region::new(
        best.region.y_start.saturating_sub(margin),
        (best.region.y_end + margin).min(h),
    );
    tracing::debug!(
        y_start = region.y_start,
        y_end = region.y_end,
        score = best.score,
        coverage = best.coverage,
        "selected rhythm strip"
    );
    region
}
