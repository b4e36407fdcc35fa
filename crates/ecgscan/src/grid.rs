//! Millimetre-grid pitch estimation by autocorrelation.
//!
//! ECG paper carries a pink/red grid with one thin line per millimetre. Those
//! lines stand out in `R - G/2`, so averaging that signal along rows produces
//! a periodic column profile whose first autocorrelation peak is the pitch in
//! pixels per millimetre. When the columns show no periodicity the same search
//! runs on the row profile.

use image::{GrayImage, RgbImage};

use crate::input::StripImage;

/// Tuning of the autocorrelation peak search.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Smallest lag (px) considered a plausible pitch.
    pub min_lag: usize,
    /// Largest lag (px), exclusive.
    pub max_lag: usize,
    /// The upper lag is also capped at `width / max_lag_width_divisor`.
    pub max_lag_width_divisor: usize,
    /// Minimum normalized autocorrelation at an accepted peak.
    pub min_peak_height: f64,
    /// Minimum separation (lags) between retained peaks.
    pub min_peak_distance: usize,
    /// Profiles with a lower standard deviation are treated as featureless.
    pub noise_floor_std: f64,
    /// Peak height to confidence multiplier (result capped at 1).
    pub confidence_gain: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_lag: 5,
            max_lag: 100,
            max_lag_width_divisor: 10,
            min_peak_height: 0.1,
            min_peak_distance: 3,
            noise_floor_std: 1.0,
            confidence_gain: 1.5,
        }
    }
}

/// Projection the pitch was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridAxis {
    /// Column profile (vertical grid lines).
    Columns,
    /// Row profile (horizontal grid lines).
    Rows,
}

/// Estimated grid pitch. `spacing_px == None` signals estimation failure.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridEstimate {
    /// Pixels per millimetre.
    pub spacing_px: Option<f64>,
    /// Confidence in [0, 1].
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<GridAxis>,
}

impl GridEstimate {
    pub fn failed() -> Self {
        Self {
            spacing_px: None,
            confidence: 0.0,
            axis: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ProfileSearch {
    Featureless,
    NoPeak,
    Peak { spacing: f64, height: f64 },
}

/// Estimate the grid pitch of `image`. Deterministic; never fails outright.
pub fn estimate_grid_spacing(image: StripImage<'_>, config: &GridConfig) -> GridEstimate {
    let (w, h) = (image.width() as usize, image.height() as usize);
    if w == 0 || h == 0 {
        return GridEstimate::failed();
    }
    let signal = match image {
        StripImage::Rgb(img) => grid_signal_rgb(img),
        StripImage::Gray(img) => grid_signal_gray(img),
    };

    let max_lag = config
        .max_lag
        .min(w / config.max_lag_width_divisor.max(1));

    let col_profile = column_means(&signal, w, h);
    let (search, axis) = match search_profile(&col_profile, max_lag, config) {
        ProfileSearch::Featureless => return GridEstimate::failed(),
        ProfileSearch::NoPeak => {
            tracing::debug!("no periodic column structure; trying row profile");
            let row_profile = row_means(&signal, w);
            (search_profile(&row_profile, max_lag, config), GridAxis::Rows)
        }
        found => (found, GridAxis::Columns),
    };

    match search {
        ProfileSearch::Peak { spacing, height } => GridEstimate {
            spacing_px: Some(spacing),
            confidence: (height * config.confidence_gain).min(1.0),
            axis: Some(axis),
        },
        _ => GridEstimate::failed(),
    }
}

fn grid_signal_rgb(img: &RgbImage) -> Vec<f64> {
    img.pixels()
        .map(|p| p[0] as f64 - 0.5 * p[1] as f64)
        .collect()
}

fn grid_signal_gray(img: &GrayImage) -> Vec<f64> {
    img.as_raw().iter().map(|&v| v as f64).collect()
}

fn column_means(signal: &[f64], w: usize, h: usize) -> Vec<f64> {
    let mut out = vec![0.0; w];
    for row in signal.chunks_exact(w) {
        for (acc, &v) in out.iter_mut().zip(row) {
            *acc += v;
        }
    }
    out.iter_mut().for_each(|v| *v /= h as f64);
    out
}

fn row_means(signal: &[f64], w: usize) -> Vec<f64> {
    signal
        .chunks_exact(w)
        .map(|row| row.iter().sum::<f64>() / w as f64)
        .collect()
}

fn search_profile(profile: &[f64], max_lag: usize, config: &GridConfig) -> ProfileSearch {
    let n = profile.len();
    if n == 0 {
        return ProfileSearch::Featureless;
    }
    let mean = profile.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = profile.iter().map(|v| v - mean).collect();
    let var = centered.iter().map(|v| v * v).sum::<f64>() / n as f64;
    if var.sqrt() < config.noise_floor_std {
        return ProfileSearch::Featureless;
    }

    let max_lag = max_lag.min(n);
    if max_lag <= config.min_lag {
        return ProfileSearch::NoPeak;
    }
    let ac = normalized_autocorrelation(&centered, max_lag);
    let window = &ac[config.min_lag..max_lag];
    let peaks = find_peaks(window, config.min_peak_height, config.min_peak_distance);
    let Some(&first) = peaks.first() else {
        return ProfileSearch::NoPeak;
    };

    let height = window[first];
    let lag = first + config.min_lag;
    ProfileSearch::Peak {
        spacing: refine_parabolic(&ac, lag, n),
        height,
    }
}

/// Biased autocorrelation for lags `0..max_lag`, normalized by lag 0.
fn normalized_autocorrelation(centered: &[f64], max_lag: usize) -> Vec<f64> {
    let n = centered.len();
    let mut ac: Vec<f64> = (0..max_lag)
        .map(|k| {
            centered[..n - k]
                .iter()
                .zip(&centered[k..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect();
    let norm = ac[0] + 1e-10;
    ac.iter_mut().for_each(|v| *v /= norm);
    ac
}

/// Local maxima of `x` (plateaus resolve to their middle sample; the first
/// and last samples never qualify), filtered by `min_height` and thinned so
/// that no two retained peaks are closer than `min_distance`, keeping the
/// higher one. Returned in increasing index order.
pub(crate) fn find_peaks(x: &[f64], min_height: f64, min_distance: usize) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left = i;
                let right = ahead - 1;
                peaks.push((left + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks.retain(|&p| x[p] >= min_height);
    if min_distance <= 1 || peaks.len() < 2 {
        return peaks;
    }

    // Visit peaks from highest to lowest; later indices win exact ties.
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]).then(a.cmp(&b)));
    let mut keep = vec![true; peaks.len()];
    for &i in order.iter().rev() {
        if !keep[i] {
            continue;
        }
        let mut j = i;
        while j > 0 && peaks[i] - peaks[j - 1] < min_distance {
            keep[j - 1] = false;
            j -= 1;
        }
        let mut j = i + 1;
        while j < peaks.len() && peaks[j] - peaks[i] < min_distance {
            keep[j] = false;
            j += 1;
        }
    }
    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(p))
        .collect()
}

/// Sub-sample peak position from a parabola through `ac[lag-1..=lag+1]`.
fn refine_parabolic(ac: &[f64], lag: usize, profile_len: usize) -> f64 {
    let spacing = lag as f64;
    if lag <= 1 || lag + 1 >= profile_len || lag + 1 >= ac.len() {
        return spacing;
    }
    let (y0, y1, y2) = (ac[lag - 1], ac[lag], ac[lag + 1]);
    let denom = y0 - 2.0 * y1 + y2;
    if denom.abs() > 1e-6 {
        spacing + 0.5 * (y0 - y2) / denom
    } else {
        spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{grid_paper_rgb, GridLines};
    use image::{Luma, Rgb};

    #[test]
    fn recovers_vertical_grid_pitch() {
        for pitch in [8usize, 10, 13] {
            let img = grid_paper_rgb(400, 120, pitch, GridLines::Vertical);
            let est = estimate_grid_spacing(StripImage::Rgb(&img), &GridConfig::default());
            let spacing = est.spacing_px.expect("grid should be found");
            assert!(
                (spacing - pitch as f64).abs() <= 0.5,
                "pitch {pitch}: estimated {spacing:.3}"
            );
            assert!(est.confidence > 0.5, "confidence {:.3}", est.confidence);
            assert_eq!(est.axis, Some(GridAxis::Columns));
        }
    }

    #[test]
    fn falls_back_to_row_profile() {
        // Column profile is a ramp: strong variation but no periodicity.
        let (w, h) = (200u32, 200u32);
        let img = RgbImage::from_fn(w, h, |x, y| {
            if y % 10 == 0 {
                Rgb([200, 60, 60])
            } else {
                Rgb([50 + x as u8, 255, 255])
            }
        });
        let est = estimate_grid_spacing(StripImage::Rgb(&img), &GridConfig::default());
        assert_eq!(est.axis, Some(GridAxis::Rows));
        let spacing = est.spacing_px.unwrap();
        assert!((spacing - 10.0).abs() <= 0.5, "estimated {spacing:.3}");
    }

    #[test]
    fn blank_paper_fails() {
        let img = RgbImage::from_pixel(300, 100, Rgb([255, 255, 255]));
        let est = estimate_grid_spacing(StripImage::Rgb(&img), &GridConfig::default());
        assert_eq!(est, GridEstimate::failed());
    }

    #[test]
    fn narrow_image_has_no_search_window() {
        // width / 10 <= min_lag leaves nothing to search.
        let img = GrayImage::from_fn(40, 40, |x, _| Luma([if x % 6 == 0 { 0 } else { 255 }]));
        let est = estimate_grid_spacing(StripImage::Gray(&img), &GridConfig::default());
        assert!(est.spacing_px.is_none());
    }

    #[test]
    fn gray_grid_is_recovered() {
        let img = GrayImage::from_fn(300, 60, |x, _| Luma([if x % 12 == 0 { 90 } else { 240 }]));
        let est = estimate_grid_spacing(StripImage::Gray(&img), &GridConfig::default());
        let spacing = est.spacing_px.unwrap();
        assert!((spacing - 12.0).abs() <= 0.5);
    }

    #[test]
    fn peak_finder_handles_plateaus_and_distance() {
        let x = [0.0, 0.5, 0.5, 0.5, 0.2, 0.9, 0.1, 0.3, 0.0];
        assert_eq!(find_peaks(&x, 0.1, 1), vec![2, 5, 7]);
        // A distance of 4 suppresses both neighbours of the tallest peak.
        assert_eq!(find_peaks(&x, 0.1, 4), vec![5]);
        assert_eq!(find_peaks(&x, 0.4, 1), vec![2, 5]);
    }

    #[test]
    fn parabolic_refinement_is_symmetric_for_symmetric_peak() {
        let ac = [1.0, 0.2, 0.6, 0.8, 0.6, 0.2];
        assert_eq!(refine_parabolic(&ac, 3, 6), 3.0);
        let skewed = [1.0, 0.2, 0.5, 0.8, 0.7, 0.2];
        assert!(refine_parabolic(&skewed, 3, 6) > 3.0);
    }
}
