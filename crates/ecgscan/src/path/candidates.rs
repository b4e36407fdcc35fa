use crate::mask::TraceMask;
use crate::region::Region;

use super::PathConfig;

/// Per-column candidate rows, stored densely with a fixed stride.
///
/// Rows are relative to the region's `y_start`. Every column holds at least
/// one candidate; columns without trace pixels carry an interpolated one.
/// The stride is the largest cluster count of any column.
#[derive(Debug, Clone)]
pub struct CandidateTable {
    width: usize,
    stride: usize,
    counts: Vec<usize>,
    ys: Vec<f64>,
}

impl CandidateTable {
    pub fn width(&self) -> usize {
        self.width
    }

    /// Slots reserved per column.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Candidate rows of column `x`, topmost first.
    pub fn column(&self, x: usize) -> &[f64] {
        let start = x * self.stride;
        &self.ys[start..start + self.counts[x]]
    }
}

/// Group the set rows of column `x` into runs whose gaps are at most
/// `max_gap` rows and return each run's mean row.
fn cluster_column(mask: &TraceMask, x: usize, region: Region, max_gap: usize) -> Vec<f64> {
    let mut clusters = Vec::new();
    let mut run: Option<(usize, usize, usize)> = None; // (sum, count, last)
    for y in mask.column_rows(x, region.y_start, region.y_end) {
        let rel = y - region.y_start;
        run = match run {
            Some((sum, n, last)) if rel - last <= max_gap => Some((sum + rel, n + 1, rel)),
            Some((sum, n, _)) => {
                clusters.push(sum as f64 / n as f64);
                Some((rel, 1, rel))
            }
            None => Some((rel, 1, rel)),
        };
    }
    if let Some((sum, n, _)) = run {
        clusters.push(sum as f64 / n as f64);
    }
    clusters
}

/// Cluster every column of `region` and fill columns without evidence.
///
/// An empty column takes the mean of the first candidate of the nearest
/// evidence column on each side, the single available side otherwise, and
/// the region's vertical centre when the whole region is empty.
pub fn build_candidates(mask: &TraceMask, region: Region, config: &PathConfig) -> CandidateTable {
    let width = mask.width();
    let mut columns: Vec<Vec<f64>> = (0..width)
        .map(|x| cluster_column(mask, x, region, config.cluster_gap))
        .collect();
    let evidence: Vec<bool> = columns.iter().map(|c| !c.is_empty()).collect();

    // Nearest evidence column to the left of each column.
    let mut left = vec![None; width];
    let mut last = None;
    for x in 0..width {
        if evidence[x] {
            last = Some(x);
        }
        left[x] = last;
    }
    let mut right = None;
    let centre = region.height() as f64 / 2.0;
    for x in (0..width).rev() {
        if evidence[x] {
            right = Some(x);
            continue;
        }
        let l = left[x].map(|i| columns[i][0]);
        let r = right.map(|i| columns[i][0]);
        let fill = match (l, r) {
            (Some(a), Some(b)) => 0.5 * (a + b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => centre,
        };
        columns[x].push(fill);
    }

    let stride = columns.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let mut ys = vec![f64::NAN; width * stride];
    let mut counts = Vec::with_capacity(width);
    for (x, c) in columns.iter().enumerate() {
        ys[x * stride..x * stride + c.len()].copy_from_slice(c);
        counts.push(c.len());
    }

    let filled = evidence.iter().filter(|&&e| !e).count();
    tracing::debug!(width, stride, filled, "built path candidates");

    CandidateTable {
        width,
        stride,
        counts,
        ys,
    }
}
