use crate::mask::TraceMask;
use crate::region::Region;
use crate::signal::{interp_extrapolate, median_filter};

use super::{PathConfig, PixelPath};

/// Per-column mean row of the trace pixels inside `region`.
///
/// Columns without evidence are interpolated from their neighbours (edge
/// values carried outward) and the result is median-filtered. With too few
/// evidence columns the path is the region's vertical midpoint throughout.
pub fn extract_centroid(mask: &TraceMask, region: Region, config: &PathConfig) -> PixelPath {
    let width = mask.width();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for x in 0..width {
        let (sum, n) = mask
            .column_rows(x, region.y_start, region.y_end)
            .fold((0usize, 0usize), |(s, n), y| (s + y, n + 1));
        if n > 0 {
            xs.push(x as f64);
            ys.push(sum as f64 / n as f64);
        }
    }

    let valid = xs.len() as f64 / width.max(1) as f64;
    if xs.is_empty() || valid < config.min_centroid_coverage {
        tracing::debug!(valid, "too little evidence for centroid path");
        return vec![region.midpoint(); width];
    }

    let (first, last) = (ys[0], ys[ys.len() - 1]);
    let (x_first, x_last) = (xs[0], xs[xs.len() - 1]);
    let filled: Vec<f64> = (0..width)
        .map(|x| {
            let x = x as f64;
            if x <= x_first {
                first
            } else if x >= x_last {
                last
            } else {
                interp_extrapolate(&xs, &ys, x)
            }
        })
        .collect();

    median_filter(&filled, config.median_kernel)
}
