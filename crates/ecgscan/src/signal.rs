//! Small 1-D numeric helpers shared by path extraction and calibration.

/// `n` evenly spaced samples over `[start, stop]` (both ends included).
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Piecewise-linear interpolation of `(xs, ys)` at `x`, extrapolating linearly
/// past either end. `xs` must be strictly increasing.
pub fn interp_extrapolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    match xs.len() {
        0 => f64::NAN,
        1 => ys[0],
        n => {
            // Index of the segment [xs[i], xs[i + 1]] used for x.
            let i = match xs.partition_point(|&v| v <= x) {
                0 => 0,
                p => (p - 1).min(n - 2),
            };
            let (x0, x1, y0, y1) = (xs[i], xs[i + 1], ys[i], ys[i + 1]);
            y0 + (y1 - y0) * (x - x0) / (x1 - x0)
        }
    }
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    })
}

/// Sliding median of odd length `kernel`, replicating edge samples.
pub fn median_filter(values: &[f64], kernel: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || kernel <= 1 {
        return values.to_vec();
    }
    let half = kernel / 2;
    let mut window = Vec::with_capacity(2 * half + 1);
    (0..n)
        .map(|i| {
            window.clear();
            for k in 0..=2 * half {
                let j = (i + k).saturating_sub(half).min(n - 1);
                window.push(values[j]);
            }
            window.sort_by(|a, b| a.total_cmp(b));
            window[half]
        })
        .collect()
}

/// `max - min`, or 0 for an empty slice.
pub fn peak_to_peak(values: &[f64]) -> f64 {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if values.is_empty() {
        0.0
    } else {
        hi - lo
    }
}
